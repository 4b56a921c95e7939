//! Code generation: lowers the AST into stack-machine bytecode.
//!
//! The generator is a visitor that does all of its emission in `post_visit`
//! hooks, which yields bottom-up code mirroring stack-machine evaluation: a
//! node's children have already pushed their results by the time the node's
//! own instruction runs.
//!
//! Like the symbol-table builder, the generator distinguishes the target of
//! an assignment from every other variable mention with a single mode flag:
//! an L-value emits only its memory index, an R-value emits the index
//! followed by `LOAD`.

use std::fmt;

use crate::ast::{
    Assignment, BinaryExpr, Number, Operator, Pos, Print, Program, UnaryExpr, Variable, Visitor,
};
use crate::symtab::SymbolTable;

use super::listing::{fits_in_i8, fits_in_i16, CodeListing};
use super::op::Opcode;

/// Error that aborts code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A number literal does not parse as a signed 32-bit integer.
    BadLiteral { pos: Pos, lexeme: String },
    /// A variable escaped the symbol-table builder.
    UnresolvedVariable { pos: Pos, name: String },
    /// A unary expression carries an operator that is not `+` or `-`.
    BadUnaryOperator { pos: Pos, op: Operator },
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::BadLiteral { pos, lexeme } => {
                write!(f, "Invalid number literal at {pos}; \"{lexeme}\" does not fit in 32 bits")
            }
            CodegenError::UnresolvedVariable { pos, name } => {
                write!(f, "Unresolved variable at {pos}; \"{name}\" has no symbol table record")
            }
            CodegenError::BadUnaryOperator { pos, op } => {
                write!(f, "Invalid unary operator '{op}' at {pos}")
            }
        }
    }
}

impl std::error::Error for CodegenError {}

/// Lowers a program into bytecode using an already-built symbol table.
#[derive(Debug)]
pub struct CodeGenerator<'t> {
    symbols: &'t SymbolTable,
    listing: CodeListing,
    lvalue_mode: bool,
}

impl<'t> CodeGenerator<'t> {
    /// Generates the complete bytecode image (header plus code) for
    /// `program`.
    ///
    /// On error the partial buffer is discarded.
    pub fn generate(program: &Program, symbols: &'t SymbolTable) -> Result<Vec<u8>, CodegenError> {
        let mut listing = CodeListing::new();
        listing.set_num_memory_locations(symbols.len() as u32);
        listing.emit_header();
        let mut generator = CodeGenerator { symbols, listing, lvalue_mode: false };
        program.accept(&mut generator)?;
        Ok(generator.listing.into_bytes())
    }

    /// Emits a literal value at the narrowest encoding: `CONST_0`/`CONST_1`
    /// for exactly 0 or 1, then `CONST_1B`, `CONST_2B`, `CONST_4B` by range.
    fn emit_literal(&mut self, value: i32) {
        match value {
            0 => self.listing.push_op(Opcode::Const0),
            1 => self.listing.push_op(Opcode::Const1),
            v if fits_in_i8(v) => {
                self.listing.push_op(Opcode::Const1B);
                self.listing.push_i8(v as i8);
            }
            v if fits_in_i16(v) => {
                self.listing.push_op(Opcode::Const2B);
                self.listing.push_i16(v as i16);
            }
            v => {
                self.listing.push_op(Opcode::Const4B);
                self.listing.push_i32(v);
            }
        }
    }

    /// Emits a memory index at the narrowest width.
    ///
    /// Indexes never use the `CONST_0`/`CONST_1` shorthands, so index 0 is
    /// `CONST_1B 0`; with at most 128 variables every index fits one byte.
    fn emit_index(&mut self, index: u32) {
        let index = index as i32;
        if fits_in_i8(index) {
            self.listing.push_op(Opcode::Const1B);
            self.listing.push_i8(index as i8);
        } else if fits_in_i16(index) {
            self.listing.push_op(Opcode::Const2B);
            self.listing.push_i16(index as i16);
        } else {
            self.listing.push_op(Opcode::Const4B);
            self.listing.push_i32(index);
        }
    }
}

impl Visitor for CodeGenerator<'_> {
    type Error = CodegenError;

    fn pre_visit_assignment(&mut self, _node: &Assignment) -> Result<(), CodegenError> {
        self.lvalue_mode = true;
        Ok(())
    }

    fn between_assignment_children(&mut self, _node: &Assignment) -> Result<(), CodegenError> {
        self.lvalue_mode = false;
        Ok(())
    }

    /// The children left the stack as `value, idx` (value on top); `STORE`
    /// wants the index on top, hence the `SWAP`.
    fn post_visit_assignment(&mut self, _node: &Assignment) -> Result<(), CodegenError> {
        self.listing.push_op(Opcode::Swap);
        self.listing.push_op(Opcode::Store);
        Ok(())
    }

    fn post_visit_print(&mut self, _node: &Print) -> Result<(), CodegenError> {
        self.listing.push_op(Opcode::Print);
        Ok(())
    }

    fn post_visit_number(&mut self, node: &Number) -> Result<(), CodegenError> {
        let value: i32 = node.lexeme.parse().map_err(|_| CodegenError::BadLiteral {
            pos: node.pos,
            lexeme: node.lexeme.clone(),
        })?;
        self.emit_literal(value);
        Ok(())
    }

    fn post_visit_variable(&mut self, node: &Variable) -> Result<(), CodegenError> {
        let record = self.symbols.lookup(&node.name).ok_or_else(|| {
            CodegenError::UnresolvedVariable { pos: node.pos, name: node.name.clone() }
        })?;
        self.emit_index(record.memory_index());
        if !self.lvalue_mode {
            self.listing.push_op(Opcode::Load);
        }
        Ok(())
    }

    /// Unary plus emits nothing; unary minus computes `0 - operand`.
    fn post_visit_unary(&mut self, node: &UnaryExpr) -> Result<(), CodegenError> {
        match node.op {
            Operator::Plus => Ok(()),
            Operator::Minus => {
                self.emit_literal(0);
                self.listing.push_op(Opcode::Swap);
                self.listing.push_op(Opcode::Sub);
                Ok(())
            }
            op => Err(CodegenError::BadUnaryOperator { pos: node.pos, op }),
        }
    }

    fn post_visit_binary(&mut self, node: &BinaryExpr) -> Result<(), CodegenError> {
        let op = match node.op {
            Operator::Plus => Opcode::Add,
            Operator::Minus => Opcode::Sub,
            Operator::Mul => Opcode::Mul,
            Operator::Div => Opcode::Div,
        };
        self.listing.push_op(op);
        Ok(())
    }
}
