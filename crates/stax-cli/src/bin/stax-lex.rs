//! Scanner harness: reads source text from standard input and dumps one
//! token per line.

use std::io::Read as _;
use std::process::ExitCode;
use std::{env, io};

use stax::{tokenize, Reporter, StdOutput};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut out = StdOutput;
    let mut reporter = Reporter::new(&mut out);

    if args.len() > 1 {
        reporter.error(&format!(
            "This program takes no arguments. Try {} < {} instead.",
            args[0], args[1]
        ));
        return ExitCode::FAILURE;
    }

    let mut source = String::new();
    if io::stdin().read_to_string(&mut source).is_err() {
        reporter.error("Failed to read input");
        return ExitCode::FAILURE;
    }

    match tokenize(&source) {
        Ok(tokens) => {
            for token in tokens {
                reporter.info(&token.to_string());
            }
        }
        Err(err) => reporter.error(&err),
    }
    ExitCode::SUCCESS
}
