//! The stack virtual machine.
//!
//! The VM specializes the [`Decoder`] walk: each hook implements the
//! semantics of one opcode over an operand stack and a main-memory vector of
//! 32-bit signed integers sized by the program header. Arithmetic wraps with
//! two's-complement semantics and division truncates toward zero.
//!
//! Every pop checks the stack depth and every memory access checks bounds; a
//! violation is a runtime fault that aborts execution with a diagnostic
//! identifying the program counter, and `after_code_execution` is skipped.

use std::fmt;

use smallvec::SmallVec;

use crate::io::OutputWriter;

use super::decoder::{Cursor, DecodeError, DecodeHooks, Decoder};
use super::listing::MAGIC;
use super::op::Opcode;

/// Fault that aborted execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The stream could not be decoded at all.
    Malformed(DecodeError),
    /// The file does not start with the expected magic number.
    BadMagic { found: u32 },
    /// An opcode needed more operands than the stack held.
    StackUnderflow { pc: usize, op: Opcode },
    /// A memory index fell outside the allocated memory.
    MemoryOutOfBounds { pc: usize, index: i32 },
    /// `DIV` with a zero divisor.
    DivisionByZero { pc: usize },
    /// A byte that is not an instruction.
    UnknownInstruction { pc: usize, byte: u8 },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Malformed(err) => err.fmt(f),
            RuntimeError::BadMagic { found } => {
                write!(f, "Invalid magic number ({found:#x})")
            }
            RuntimeError::StackUnderflow { pc, op } => {
                write!(f, "Stack underflow in {op} at {pc}")
            }
            RuntimeError::MemoryOutOfBounds { pc, index } => {
                write!(f, "Memory index {index} out of bounds at {pc}")
            }
            RuntimeError::DivisionByZero { pc } => {
                write!(f, "Division by zero at {pc}")
            }
            RuntimeError::UnknownInstruction { pc, byte } => {
                write!(f, "Unknown instruction ({byte:#04x}) at {pc}")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<DecodeError> for RuntimeError {
    fn from(err: DecodeError) -> Self {
        RuntimeError::Malformed(err)
    }
}

/// Executes compiled programs.
///
/// The machine owns its operand stack and memory across runs; both are reset
/// at the start of every execution. Whatever the program prints goes to the
/// writer handed to [`VirtualMachine::execute`].
#[derive(Debug, Default)]
pub struct VirtualMachine {
    stack: SmallVec<[i32; 16]>,
    memory: Vec<i32>,
    fault: Option<RuntimeError>,
}

impl VirtualMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `program` to completion or to its first fault.
    pub fn execute(
        &mut self,
        program: &[u8],
        out: &mut dyn OutputWriter,
    ) -> Result<(), RuntimeError> {
        self.fault = None;
        let mut hooks = ExecHooks { vm: self, out };
        match Decoder::new(program).run(&mut hooks) {
            Ok(true) => Ok(()),
            Ok(false) => Err(self
                .fault
                .take()
                .expect("aborted execution must record a fault")),
            Err(err) => Err(err.into()),
        }
    }

    /// Current operand stack, top last. Exposed for inspection in tests.
    #[must_use]
    pub fn stack(&self) -> &[i32] {
        &self.stack
    }

    /// Current main memory. Exposed for inspection in tests.
    #[must_use]
    pub fn memory(&self) -> &[i32] {
        &self.memory
    }

    fn fail(&mut self, fault: RuntimeError) -> bool {
        self.fault = Some(fault);
        false
    }

    fn pop(&mut self, cur: Cursor, op: Opcode) -> Result<i32, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { pc: cur.pc(), op })
    }

    fn slot(&mut self, cur: Cursor, index: i32) -> Result<&mut i32, RuntimeError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.memory.get_mut(i))
            .ok_or(RuntimeError::MemoryOutOfBounds { pc: cur.pc(), index })
    }

    /// Pops `v2` then `v1` and pushes `f(v1, v2)`.
    fn binary(&mut self, cur: Cursor, op: Opcode, f: fn(i32, i32) -> i32) -> bool {
        match self.binary_inner(cur, op, f) {
            Ok(()) => true,
            Err(fault) => self.fail(fault),
        }
    }

    fn binary_inner(
        &mut self,
        cur: Cursor,
        op: Opcode,
        f: fn(i32, i32) -> i32,
    ) -> Result<(), RuntimeError> {
        let v2 = self.pop(cur, op)?;
        let v1 = self.pop(cur, op)?;
        if op == Opcode::Div && v2 == 0 {
            return Err(RuntimeError::DivisionByZero { pc: cur.pc() });
        }
        self.stack.push(f(v1, v2));
        Ok(())
    }
}

/// One execution's view of the machine: the VM state plus the output writer.
struct ExecHooks<'a> {
    vm: &'a mut VirtualMachine,
    out: &'a mut dyn OutputWriter,
}

impl DecodeHooks for ExecHooks<'_> {
    fn prepare_environment(&mut self, _cur: Cursor) -> bool {
        self.vm.stack.clear();
        self.vm.memory.clear();
        true
    }

    fn process_magic_number(&mut self, _cur: Cursor, number: u32) -> bool {
        if number == MAGIC {
            true
        } else {
            self.vm.fail(RuntimeError::BadMagic { found: number })
        }
    }

    fn process_memory_size(&mut self, _cur: Cursor, size: u32) -> bool {
        self.vm.memory = vec![0; size as usize];
        true
    }

    fn process_inst_load(&mut self, cur: Cursor) -> bool {
        let result = self
            .vm
            .pop(cur, Opcode::Load)
            .and_then(|index| self.vm.slot(cur, index).map(|slot| *slot));
        match result {
            Ok(value) => {
                self.vm.stack.push(value);
                true
            }
            Err(fault) => self.vm.fail(fault),
        }
    }

    fn process_inst_store(&mut self, cur: Cursor) -> bool {
        let result = self.vm.pop(cur, Opcode::Store).and_then(|index| {
            let value = self.vm.pop(cur, Opcode::Store)?;
            *self.vm.slot(cur, index)? = value;
            Ok(())
        });
        match result {
            Ok(()) => true,
            Err(fault) => self.vm.fail(fault),
        }
    }

    fn process_inst_const_1b(&mut self, _cur: Cursor, value: i8) -> bool {
        self.vm.stack.push(i32::from(value));
        true
    }

    fn process_inst_const_2b(&mut self, _cur: Cursor, value: i16) -> bool {
        self.vm.stack.push(i32::from(value));
        true
    }

    fn process_inst_const_4b(&mut self, _cur: Cursor, value: i32) -> bool {
        self.vm.stack.push(value);
        true
    }

    fn process_inst_const_0(&mut self, _cur: Cursor) -> bool {
        self.vm.stack.push(0);
        true
    }

    fn process_inst_const_1(&mut self, _cur: Cursor) -> bool {
        self.vm.stack.push(1);
        true
    }

    fn process_inst_add(&mut self, cur: Cursor) -> bool {
        self.vm.binary(cur, Opcode::Add, i32::wrapping_add)
    }

    fn process_inst_sub(&mut self, cur: Cursor) -> bool {
        self.vm.binary(cur, Opcode::Sub, i32::wrapping_sub)
    }

    fn process_inst_mul(&mut self, cur: Cursor) -> bool {
        self.vm.binary(cur, Opcode::Mul, i32::wrapping_mul)
    }

    fn process_inst_div(&mut self, cur: Cursor) -> bool {
        self.vm.binary(cur, Opcode::Div, i32::wrapping_div)
    }

    fn process_inst_swap(&mut self, cur: Cursor) -> bool {
        let result = self.vm.pop(cur, Opcode::Swap).and_then(|v1| {
            let v2 = self.vm.pop(cur, Opcode::Swap)?;
            self.vm.stack.push(v1);
            self.vm.stack.push(v2);
            Ok(())
        });
        match result {
            Ok(()) => true,
            Err(fault) => self.vm.fail(fault),
        }
    }

    fn process_inst_print(&mut self, cur: Cursor) -> bool {
        match self.vm.pop(cur, Opcode::Print) {
            Ok(value) => {
                self.out.write_str(&value.to_string());
                self.out.write_char('\n');
                true
            }
            Err(fault) => self.vm.fail(fault),
        }
    }

    fn process_inst_unknown(&mut self, cur: Cursor, byte: u8) -> bool {
        self.vm
            .fail(RuntimeError::UnknownInstruction { pc: cur.pc(), byte })
    }
}
