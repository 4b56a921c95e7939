//! Annotated-listing printer for compiled programs.
//!
//! Drives the [`Decoder`] with hooks that print one line per instruction
//! instead of executing anything. Unknown bytes are reported and skipped, so
//! the printer keeps going where the VM would fault.

use crate::io::{OutputWriter, Reporter};

use super::decoder::{Cursor, DecodeError, DecodeHooks, Decoder};

/// Prints a program's header fields and an instruction listing.
///
/// Output format:
///
/// ```text
/// PROGRAM INFO:
/// Total code size: 17 bytes
/// Magic value: 0x1337d00d
/// Memory size (number of 4-byte values): 1
///
/// CODE:
///  8: CONST_1B (0)
/// 10: CONST_1
/// 11: SWAP
/// 12: STORE
/// ...
/// ```
///
/// Program counters are right-aligned to the width of the last one.
pub struct ListingPrinter<'w> {
    out: &'w mut dyn OutputWriter,
}

impl<'w> ListingPrinter<'w> {
    pub fn new(out: &'w mut dyn OutputWriter) -> Self {
        Self { out }
    }

    /// Prints the listing for `program`.
    ///
    /// Returns `Err` only for a stream too damaged to walk (short header or
    /// an operand cut off by the end of the file).
    pub fn print(&mut self, program: &[u8]) -> Result<bool, DecodeError> {
        Decoder::new(program).run(self)
    }

    fn line(&mut self, text: &str) {
        Reporter::new(self.out).info(text);
    }

    fn code_line(&mut self, cur: Cursor, text: &str) -> bool {
        let width = cur.pc_at_end().to_string().len();
        self.line(&format!("{pc:>width$}: {text}", pc = cur.pc()));
        true
    }
}

impl DecodeHooks for ListingPrinter<'_> {
    fn prepare_environment(&mut self, cur: Cursor) -> bool {
        self.line("PROGRAM INFO:");
        self.line(&format!("Total code size: {} bytes", cur.program_size()));
        true
    }

    fn process_magic_number(&mut self, _cur: Cursor, number: u32) -> bool {
        self.line(&format!("Magic value: {number:#x}"));
        true
    }

    fn process_memory_size(&mut self, _cur: Cursor, size: u32) -> bool {
        self.line(&format!("Memory size (number of 4-byte values): {size}"));
        true
    }

    fn before_code_execution(&mut self, _cur: Cursor) -> bool {
        Reporter::new(self.out).blank();
        self.line("CODE:");
        true
    }

    fn process_inst_load(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "LOAD")
    }

    fn process_inst_store(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "STORE")
    }

    fn process_inst_const_1b(&mut self, cur: Cursor, value: i8) -> bool {
        self.code_line(cur, &format!("CONST_1B ({value})"))
    }

    fn process_inst_const_2b(&mut self, cur: Cursor, value: i16) -> bool {
        self.code_line(cur, &format!("CONST_2B ({value})"))
    }

    fn process_inst_const_4b(&mut self, cur: Cursor, value: i32) -> bool {
        self.code_line(cur, &format!("CONST_4B ({value})"))
    }

    fn process_inst_const_0(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "CONST_0")
    }

    fn process_inst_const_1(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "CONST_1")
    }

    fn process_inst_add(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "ADD")
    }

    fn process_inst_sub(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "SUB")
    }

    fn process_inst_mul(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "MUL")
    }

    fn process_inst_div(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "DIV")
    }

    fn process_inst_swap(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "SWAP")
    }

    fn process_inst_print(&mut self, cur: Cursor) -> bool {
        self.code_line(cur, "PRINT")
    }

    fn process_inst_unknown(&mut self, cur: Cursor, byte: u8) -> bool {
        self.code_line(cur, &format!("Unknown instruction ({byte:#04x})"))
    }
}
