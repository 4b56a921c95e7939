//! Parser harness: reads source text from standard input and pretty-prints
//! the resulting AST.

use std::io::Read as _;
use std::process::ExitCode;
use std::{env, io};

use stax::{parse, tokenize, AstPrinter, Reporter, StdOutput};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut out = StdOutput;

    if args.len() > 1 {
        Reporter::new(&mut out).error(&format!(
            "This program takes no arguments. Try {} < {} instead.",
            args[0], args[1]
        ));
        return ExitCode::FAILURE;
    }

    let mut source = String::new();
    if io::stdin().read_to_string(&mut source).is_err() {
        Reporter::new(&mut out).error("Failed to read input");
        return ExitCode::FAILURE;
    }

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            Reporter::new(&mut out).error(&err);
            return ExitCode::SUCCESS;
        }
    };
    match parse(tokens) {
        Ok(program) => AstPrinter::new(&mut out).print(&program),
        Err(err) => Reporter::new(&mut out).error(&err),
    }
    ExitCode::SUCCESS
}
