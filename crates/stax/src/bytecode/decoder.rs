//! Reusable decoder for compiled programs.
//!
//! The decoder validates the header, then walks the code bytes exactly once,
//! advancing past each opcode and its inline operand and dispatching to one
//! hook per opcode on a caller-supplied [`DecodeHooks`] implementation. The
//! actual semantics live entirely in the hooks, so the same walk drives both
//! the virtual machine and the listing printer.
//!
//! Every hook returns a `bool`; returning `false` stops the walk immediately
//! and the later hooks (including `after_code_execution`) are not called.

use std::fmt;

use super::listing::HEADER_LEN;
use super::op::Opcode;

/// Structural error in the byte stream itself.
///
/// These are distinct from a hook declining to continue: a truncated stream
/// cannot be walked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The program is too short to contain the 8-byte header.
    TruncatedHeader { len: usize },
    /// The stream ended inside an instruction's inline operand.
    TruncatedOperand { pc: usize, op: Opcode },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedHeader { len } => {
                write!(f, "Program too small to contain a header ({len} bytes)")
            }
            DecodeError::TruncatedOperand { pc, op } => {
                write!(f, "Unexpected end of code in {op} operand at {pc}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Position information handed to every hook.
///
/// The program counter refers to the opcode byte of the instruction being
/// dispatched, as an absolute offset into the program image (the first
/// opcode therefore sits at offset 8, right after the header).
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pc: usize,
    program_size: usize,
}

impl Cursor {
    /// Program counter of the instruction currently being processed.
    #[must_use]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Index of the final byte of the program.
    #[must_use]
    pub fn pc_at_end(&self) -> usize {
        self.program_size.saturating_sub(1)
    }

    /// Total size of the program image in bytes.
    #[must_use]
    pub fn program_size(&self) -> usize {
        self.program_size
    }
}

/// Per-opcode hooks invoked by [`Decoder::run`].
///
/// Hook order over a well-formed program: `prepare_environment`,
/// `process_magic_number`, `process_memory_size`, `before_code_execution`,
/// one `process_*` call per instruction, `after_code_execution`. Inline
/// operands are decoded (big-endian, sign-extended) before the hook runs.
///
/// An unrecognised byte is routed to `process_inst_unknown`; returning `true`
/// from it resumes decoding at the next byte.
#[allow(unused_variables)]
pub trait DecodeHooks {
    /// First hook of every walk.
    fn prepare_environment(&mut self, cur: Cursor) -> bool {
        true
    }
    /// Receives the magic number found in the header.
    fn process_magic_number(&mut self, cur: Cursor, number: u32) -> bool;
    /// Receives the number of 4-byte memory locations from the header.
    fn process_memory_size(&mut self, cur: Cursor, size: u32) -> bool;
    /// Runs after the header hooks, before the first instruction.
    fn before_code_execution(&mut self, cur: Cursor) -> bool {
        true
    }
    /// Runs once the walk reaches the end of the stream cleanly.
    fn after_code_execution(&mut self, cur: Cursor) -> bool {
        true
    }

    fn process_inst_load(&mut self, cur: Cursor) -> bool;
    fn process_inst_store(&mut self, cur: Cursor) -> bool;
    fn process_inst_const_1b(&mut self, cur: Cursor, value: i8) -> bool;
    fn process_inst_const_2b(&mut self, cur: Cursor, value: i16) -> bool;
    fn process_inst_const_4b(&mut self, cur: Cursor, value: i32) -> bool;
    fn process_inst_const_0(&mut self, cur: Cursor) -> bool;
    fn process_inst_const_1(&mut self, cur: Cursor) -> bool;
    fn process_inst_add(&mut self, cur: Cursor) -> bool;
    fn process_inst_sub(&mut self, cur: Cursor) -> bool;
    fn process_inst_mul(&mut self, cur: Cursor) -> bool;
    fn process_inst_div(&mut self, cur: Cursor) -> bool;
    fn process_inst_swap(&mut self, cur: Cursor) -> bool;
    fn process_inst_print(&mut self, cur: Cursor) -> bool;
    fn process_inst_unknown(&mut self, cur: Cursor, byte: u8) -> bool;
}

/// Walks a program image and dispatches it to a set of hooks.
#[derive(Debug)]
pub struct Decoder<'p> {
    program: &'p [u8],
}

impl<'p> Decoder<'p> {
    #[must_use]
    pub fn new(program: &'p [u8]) -> Self {
        Self { program }
    }

    /// Runs the decode loop.
    ///
    /// Returns `Ok(true)` when the walk ran to completion, `Ok(false)` when a
    /// hook stopped it, and `Err` when the stream itself is malformed.
    pub fn run<H: DecodeHooks>(&self, hooks: &mut H) -> Result<bool, DecodeError> {
        let program = self.program;
        if !hooks.prepare_environment(self.cursor(0)) {
            return Ok(false);
        }
        if program.len() < HEADER_LEN {
            return Err(DecodeError::TruncatedHeader { len: program.len() });
        }

        let magic = u32::from_be_bytes([program[0], program[1], program[2], program[3]]);
        if !hooks.process_magic_number(self.cursor(0), magic) {
            return Ok(false);
        }
        let memory_size = u32::from_be_bytes([program[4], program[5], program[6], program[7]]);
        if !hooks.process_memory_size(self.cursor(4), memory_size) {
            return Ok(false);
        }
        if !hooks.before_code_execution(self.cursor(HEADER_LEN)) {
            return Ok(false);
        }

        let mut pc = HEADER_LEN;
        while pc < program.len() {
            let cur = self.cursor(pc);
            let byte = program[pc];
            let op = Opcode::from_repr(byte);
            let cont = match op {
                Some(Opcode::Load) => hooks.process_inst_load(cur),
                Some(Opcode::Store) => hooks.process_inst_store(cur),
                Some(Opcode::Const1B) => {
                    let operand = self.operand::<1>(pc, Opcode::Const1B)?;
                    hooks.process_inst_const_1b(cur, operand[0] as i8)
                }
                Some(Opcode::Const2B) => {
                    let operand = self.operand::<2>(pc, Opcode::Const2B)?;
                    hooks.process_inst_const_2b(cur, i16::from_be_bytes(operand))
                }
                Some(Opcode::Const4B) => {
                    let operand = self.operand::<4>(pc, Opcode::Const4B)?;
                    hooks.process_inst_const_4b(cur, i32::from_be_bytes(operand))
                }
                Some(Opcode::Const0) => hooks.process_inst_const_0(cur),
                Some(Opcode::Const1) => hooks.process_inst_const_1(cur),
                Some(Opcode::Add) => hooks.process_inst_add(cur),
                Some(Opcode::Sub) => hooks.process_inst_sub(cur),
                Some(Opcode::Mul) => hooks.process_inst_mul(cur),
                Some(Opcode::Div) => hooks.process_inst_div(cur),
                Some(Opcode::Swap) => hooks.process_inst_swap(cur),
                Some(Opcode::Print) => hooks.process_inst_print(cur),
                None => hooks.process_inst_unknown(cur, byte),
            };
            if !cont {
                return Ok(false);
            }
            pc += 1 + op.map_or(0, Opcode::operand_width);
        }

        Ok(hooks.after_code_execution(self.cursor(pc)))
    }

    fn cursor(&self, pc: usize) -> Cursor {
        Cursor { pc, program_size: self.program.len() }
    }

    /// Reads the `N` operand bytes following the opcode at `pc`.
    fn operand<const N: usize>(&self, pc: usize, op: Opcode) -> Result<[u8; N], DecodeError> {
        let start = pc + 1;
        let bytes = self
            .program
            .get(start..start + N)
            .ok_or(DecodeError::TruncatedOperand { pc, op })?;
        let mut operand = [0u8; N];
        operand.copy_from_slice(bytes);
        Ok(operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::listing::MAGIC;

    /// Hooks that record every call as a compact string.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        stop_at: Option<&'static str>,
        accept_unknown: bool,
    }

    impl Recorder {
        fn log(&mut self, event: String) -> bool {
            let stop = self.stop_at.is_some_and(|s| event.starts_with(s));
            self.events.push(event);
            !stop
        }
    }

    impl DecodeHooks for Recorder {
        fn prepare_environment(&mut self, _cur: Cursor) -> bool {
            self.log("prepare".to_owned())
        }
        fn process_magic_number(&mut self, _cur: Cursor, number: u32) -> bool {
            self.log(format!("magic:{number:#x}"))
        }
        fn process_memory_size(&mut self, _cur: Cursor, size: u32) -> bool {
            self.log(format!("mem:{size}"))
        }
        fn before_code_execution(&mut self, _cur: Cursor) -> bool {
            self.log("before".to_owned())
        }
        fn after_code_execution(&mut self, cur: Cursor) -> bool {
            self.log(format!("after@{}", cur.pc()))
        }
        fn process_inst_load(&mut self, cur: Cursor) -> bool {
            self.log(format!("load@{}", cur.pc()))
        }
        fn process_inst_store(&mut self, cur: Cursor) -> bool {
            self.log(format!("store@{}", cur.pc()))
        }
        fn process_inst_const_1b(&mut self, cur: Cursor, value: i8) -> bool {
            self.log(format!("c1b({value})@{}", cur.pc()))
        }
        fn process_inst_const_2b(&mut self, cur: Cursor, value: i16) -> bool {
            self.log(format!("c2b({value})@{}", cur.pc()))
        }
        fn process_inst_const_4b(&mut self, cur: Cursor, value: i32) -> bool {
            self.log(format!("c4b({value})@{}", cur.pc()))
        }
        fn process_inst_const_0(&mut self, cur: Cursor) -> bool {
            self.log(format!("c0@{}", cur.pc()))
        }
        fn process_inst_const_1(&mut self, cur: Cursor) -> bool {
            self.log(format!("c1@{}", cur.pc()))
        }
        fn process_inst_add(&mut self, cur: Cursor) -> bool {
            self.log(format!("add@{}", cur.pc()))
        }
        fn process_inst_sub(&mut self, cur: Cursor) -> bool {
            self.log(format!("sub@{}", cur.pc()))
        }
        fn process_inst_mul(&mut self, cur: Cursor) -> bool {
            self.log(format!("mul@{}", cur.pc()))
        }
        fn process_inst_div(&mut self, cur: Cursor) -> bool {
            self.log(format!("div@{}", cur.pc()))
        }
        fn process_inst_swap(&mut self, cur: Cursor) -> bool {
            self.log(format!("swap@{}", cur.pc()))
        }
        fn process_inst_print(&mut self, cur: Cursor) -> bool {
            self.log(format!("print@{}", cur.pc()))
        }
        fn process_inst_unknown(&mut self, cur: Cursor, byte: u8) -> bool {
            self.events.push(format!("unknown({byte:#04x})@{}", cur.pc()));
            self.accept_unknown
        }
    }

    fn image(code: &[u8]) -> Vec<u8> {
        let mut bytes = MAGIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(code);
        bytes
    }

    #[test]
    fn hook_order_and_program_counters() {
        // CONST_1B 5, CONST_2B 0x0102, CONST_1, ADD, PRINT
        let program = image(&[3, 5, 4, 1, 2, 13, 6, 11]);
        let mut hooks = Recorder::default();
        assert_eq!(Decoder::new(&program).run(&mut hooks), Ok(true));
        assert_eq!(
            hooks.events,
            vec![
                "prepare",
                "magic:0x1337d00d",
                "mem:1",
                "before",
                "c1b(5)@8",
                "c2b(258)@10",
                "c1@13",
                "add@14",
                "print@15",
                "after@16",
            ]
        );
    }

    #[test]
    fn operands_sign_extend() {
        let program = image(&[3, 0xFF, 4, 0xFF, 0xFE]);
        let mut hooks = Recorder::default();
        Decoder::new(&program).run(&mut hooks).unwrap();
        assert!(hooks.events.contains(&"c1b(-1)@8".to_owned()));
        assert!(hooks.events.contains(&"c2b(-2)@10".to_owned()));
    }

    #[test]
    fn hook_returning_false_stops_the_walk() {
        let program = image(&[13, 13, 13]);
        let mut hooks = Recorder { stop_at: Some("c1@9"), ..Recorder::default() };
        assert_eq!(Decoder::new(&program).run(&mut hooks), Ok(false));
        assert_eq!(hooks.events.last().map(String::as_str), Some("c1@9"));
    }

    #[test]
    fn unknown_byte_can_resume_or_stop() {
        let program = image(&[0xFF, 13]);

        let mut resume = Recorder { accept_unknown: true, ..Recorder::default() };
        assert_eq!(Decoder::new(&program).run(&mut resume), Ok(true));
        assert!(resume.events.contains(&"unknown(0xff)@8".to_owned()));
        assert!(resume.events.contains(&"c1@9".to_owned()));

        let mut stop = Recorder::default();
        assert_eq!(Decoder::new(&program).run(&mut stop), Ok(false));
        assert!(!stop.events.iter().any(|e| e.starts_with("c1@")));
    }

    #[test]
    fn truncated_operand_is_an_error() {
        let program = image(&[4, 1]);
        let mut hooks = Recorder::default();
        assert_eq!(
            Decoder::new(&program).run(&mut hooks),
            Err(DecodeError::TruncatedOperand { pc: 8, op: Opcode::Const2B })
        );
        assert!(!hooks.events.iter().any(|e| e.starts_with("after")));
    }

    #[test]
    fn short_program_is_an_error() {
        let mut hooks = Recorder::default();
        assert_eq!(
            Decoder::new(&[0x13, 0x37]).run(&mut hooks),
            Err(DecodeError::TruncatedHeader { len: 2 })
        );
    }

    #[test]
    fn empty_code_section_still_calls_after() {
        let program = image(&[]);
        let mut hooks = Recorder::default();
        assert_eq!(Decoder::new(&program).run(&mut hooks), Ok(true));
        assert_eq!(hooks.events.last().map(String::as_str), Some("after@8"));
    }
}
