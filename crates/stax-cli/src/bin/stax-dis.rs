//! Disassembler CLI: reads a compiled program file and prints an annotated
//! instruction listing. Unknown bytes are reported and skipped rather than
//! stopping the listing.

use std::env;
use std::fs::File;
use std::io::Read as _;
use std::process::ExitCode;

use stax::{ListingPrinter, Reporter, StdOutput};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut out = StdOutput;

    let program_file = match parse_args(&args, &mut out) {
        Ok(file) => file,
        Err(code) => return code,
    };

    let mut reporter = Reporter::new(&mut out);
    let mut file = match File::open(&program_file) {
        Ok(file) => file,
        Err(_) => {
            reporter.error("Failed to open input file");
            return ExitCode::FAILURE;
        }
    };
    let mut program = Vec::new();
    if file.read_to_end(&mut program).is_err() {
        reporter.error("Failed to read input file");
        return ExitCode::FAILURE;
    }
    drop(file);

    if let Err(err) = ListingPrinter::new(&mut out).print(&program) {
        Reporter::new(&mut out).error(&err);
    }
    ExitCode::SUCCESS
}

/// Accepts exactly one argument: `-h`/`--help` or the program file.
fn parse_args(args: &[String], out: &mut StdOutput) -> Result<String, ExitCode> {
    let mut reporter = Reporter::new(out);
    match args.len() {
        0 | 1 => {
            reporter.error("Too few arguments. Use \"-h\" for help.");
            Err(ExitCode::FAILURE)
        }
        2 => match args[1].as_str() {
            "-h" | "--help" => {
                reporter.info(&format!("Usage: {} [-h] [--help] INPUT_FILE", args[0]));
                Err(ExitCode::SUCCESS)
            }
            option if option.starts_with('-') => {
                reporter.error("Invalid option. Use \"-h\" for help.");
                Err(ExitCode::FAILURE)
            }
            file => Ok(file.to_owned()),
        },
        _ => {
            reporter.error("Too many arguments. Use \"-h\" for help.");
            Err(ExitCode::FAILURE)
        }
    }
}
