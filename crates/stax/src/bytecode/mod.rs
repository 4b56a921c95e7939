//! Bytecode back end: instruction set, code generation, decoding, execution.
//!
//! # Module structure
//!
//! - `op` - opcode definitions
//! - `listing` - code buffer, file header, width and endian helpers
//! - `compiler` - AST to bytecode generator
//! - `decoder` - reusable stream walker dispatching to per-opcode hooks
//! - `printer` - annotated-listing printer built on the decoder
//! - `vm` - the stack virtual machine, also built on the decoder

pub use compiler::{CodeGenerator, CodegenError};
pub use decoder::{Cursor, DecodeError, DecodeHooks, Decoder};
pub use listing::{fits_in_i8, fits_in_i16, swap16, swap32, CodeListing, HEADER_LEN, MAGIC};
pub use op::Opcode;
pub use printer::ListingPrinter;
pub use vm::{RuntimeError, VirtualMachine};

mod compiler;
mod decoder;
mod listing;
mod op;
mod printer;
mod vm;
