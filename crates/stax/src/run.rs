//! One-stop entry points over the whole pipeline.
//!
//! [`Compilation`] runs source text through the front end, the symbol-table
//! builder, and the code generator, holding on to every intermediate product
//! so callers can inspect the AST or the table as well as the bytecode. The
//! free functions cover the two consumer paths: executing a compiled image
//! and printing its listing.

use std::fmt;

use crate::ast::Program;
use crate::bytecode::{
    CodeGenerator, CodegenError, DecodeError, ListingPrinter, RuntimeError, VirtualMachine,
};
use crate::io::OutputWriter;
use crate::lex::{tokenize, ScanError};
use crate::parse::{parse, ParseError};
use crate::symtab::{ScopeError, SymbolTable, SymbolTableBuilder};

/// First error reported by whichever pass failed.
///
/// Errors do not chain across passes: a failed pass aborts the build and the
/// later passes never run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Scan(ScanError),
    Parse(ParseError),
    Scope(ScopeError),
    Codegen(CodegenError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Scan(err) => err.fmt(f),
            CompileError::Parse(err) => err.fmt(f),
            CompileError::Scope(err) => err.fmt(f),
            CompileError::Codegen(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ScanError> for CompileError {
    fn from(err: ScanError) -> Self {
        CompileError::Scan(err)
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<ScopeError> for CompileError {
    fn from(err: ScopeError) -> Self {
        CompileError::Scope(err)
    }
}

impl From<CodegenError> for CompileError {
    fn from(err: CodegenError) -> Self {
        CompileError::Codegen(err)
    }
}

/// A fully compiled program with its intermediate products.
#[derive(Debug)]
pub struct Compilation {
    ast: Program,
    symbols: SymbolTable,
    bytecode: Vec<u8>,
}

impl Compilation {
    /// Compiles source text down to bytecode.
    pub fn new(source: &str) -> Result<Self, CompileError> {
        let tokens = tokenize(source)?;
        let ast = parse(tokens)?;
        let mut symbols = SymbolTable::new();
        SymbolTableBuilder::build(&ast, &mut symbols)?;
        let bytecode = CodeGenerator::generate(&ast, &symbols)?;
        Ok(Self { ast, symbols, bytecode })
    }

    /// The complete bytecode image, header included.
    #[must_use]
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Consumes the compilation, keeping only the bytecode.
    #[must_use]
    pub fn into_bytecode(self) -> Vec<u8> {
        self.bytecode
    }

    #[must_use]
    pub fn ast(&self) -> &Program {
        &self.ast
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

/// Executes a compiled program, writing whatever it prints to `out`.
pub fn execute(program: &[u8], out: &mut dyn OutputWriter) -> Result<(), RuntimeError> {
    VirtualMachine::new().execute(program, out)
}

/// Prints the annotated instruction listing of a compiled program.
pub fn disassemble(program: &[u8], out: &mut dyn OutputWriter) -> Result<(), DecodeError> {
    ListingPrinter::new(out).print(program).map(|_| ())
}

/// Compiles and immediately executes `source`.
pub fn run_source(source: &str, out: &mut dyn OutputWriter) -> Result<(), SourceError> {
    let compilation = Compilation::new(source).map_err(SourceError::Compile)?;
    execute(compilation.bytecode(), out).map_err(SourceError::Runtime)
}

/// Error from [`run_source`]: either the build or the execution failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Compile(err) => err.fmt(f),
            SourceError::Runtime(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for SourceError {}
