#![doc = include_str!("../../../README.md")]

pub use crate::ast::{
    Assignment, BinaryExpr, Expr, Number, Operator, Pos, Print, Program, Statement, StatementList,
    UnaryExpr, Variable, VisitOrder, Visitor,
};
pub use crate::ast_printer::AstPrinter;
pub use crate::bytecode::{
    fits_in_i8, fits_in_i16, swap16, swap32, CodeGenerator, CodeListing, CodegenError, Cursor,
    DecodeError, DecodeHooks, Decoder, ListingPrinter, Opcode, RuntimeError, VirtualMachine,
    HEADER_LEN, MAGIC,
};
pub use crate::io::{
    CollectOutput, NullOutput, OutputWriter, Reporter, StdOutput, ERROR_PREFIX,
};
pub use crate::lex::{tokenize, ScanError, Token, TokenKind};
pub use crate::parse::{parse, ParseError};
pub use crate::run::{
    disassemble, execute, run_source, Compilation, CompileError, SourceError,
};
pub use crate::symtab::{Record, ScopeError, SymbolTable, SymbolTableBuilder};

mod ast;
mod ast_printer;
mod bytecode;
mod io;
mod lex;
mod parse;
mod run;
mod symtab;
