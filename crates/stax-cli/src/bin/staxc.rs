//! Compiler CLI: reads a program from standard input and writes the compiled
//! bytecode to a file (`program.o` unless `-o` says otherwise).
//!
//! Exit status is 0 on success, 1 on argument or I/O failure. A semantic
//! error in the program is reported and no output is written, but the exit
//! status stays 0.

use std::io::Read as _;
use std::process::ExitCode;
use std::{env, fs, io};

use stax::{Compilation, Reporter, StdOutput};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut out = StdOutput;
    let mut reporter = Reporter::new(&mut out);

    if args.len() > 3 {
        reporter.error("Too many arguments. Use \"-h\" for help.");
        return ExitCode::FAILURE;
    }

    let mut output_file = String::from("program.o");
    if args.len() > 1 {
        match args[1].as_str() {
            "-h" | "--help" => {
                reporter.info(&format!(
                    "Usage: {} [-h] [--help] [-o OUTPUT_FILE] < INPUT_FILE",
                    args[0]
                ));
                return ExitCode::SUCCESS;
            }
            "-o" if args.len() == 3 => {
                output_file = args[2].clone();
            }
            _ => {
                reporter.error("Invalid option. Use \"-h\" for help.");
                return ExitCode::FAILURE;
            }
        }
    }

    let mut source = String::new();
    if io::stdin().read_to_string(&mut source).is_err() {
        reporter.error("Failed to read input");
        return ExitCode::FAILURE;
    }

    let compilation = match Compilation::new(&source) {
        Ok(compilation) => compilation,
        Err(err) => {
            reporter.error(&err);
            return ExitCode::SUCCESS;
        }
    };

    if fs::write(&output_file, compilation.bytecode()).is_err() {
        reporter.error("Failed to write to output file");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
