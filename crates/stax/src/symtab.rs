//! Symbol table and the traversal that builds it.
//!
//! The table maps each declared variable name to a [`Record`] holding the
//! declaration position and the memory index the VM will use for it. Indexes
//! are handed out in insertion order starting at 0, so the table size equals
//! the number of memory locations the compiled program needs.

use std::fmt;

use ahash::AHashMap;

use crate::ast::{Assignment, Pos, Program, Variable, Visitor};

/// An entry in the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    name: String,
    pos: Pos,
    memory_index: u32,
}

impl Record {
    /// The identifier this record describes.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the identifier was declared.
    #[must_use]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// The main-memory slot assigned to the identifier.
    #[must_use]
    pub fn memory_index(&self) -> u32 {
        self.memory_index
    }
}

/// Mapping from identifier name to its [`Record`].
///
/// Iteration order is unspecified.
#[derive(Debug, Default)]
pub struct SymbolTable {
    records: AHashMap<String, Record>,
    next_index: u32,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the record for `name`, if one was inserted.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    /// Inserts `name`, assigning it the next free memory index.
    ///
    /// Returns `false` and leaves the table unchanged if the name is already
    /// present.
    pub fn insert(&mut self, name: &str, pos: Pos) -> bool {
        if self.records.contains_key(name) {
            return false;
        }
        let record = Record {
            name: name.to_owned(),
            pos,
            memory_index: self.next_index,
        };
        self.records.insert(name.to_owned(), record);
        self.next_index += 1;
        true
    }

    /// Number of records, which is also the number of memory locations the
    /// program needs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over all records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Removes every record and resets index assignment.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_index = 0;
    }
}

/// Scope-rule violation found while building the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A variable was read before any assignment declared it.
    Undeclared { pos: Pos, name: String },
    /// A variable was the target of a second assignment.
    Redefinition {
        pos: Pos,
        name: String,
        declared_at: Pos,
    },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Undeclared { pos, name } => {
                write!(f, "Invalid use of variable at {pos}; \"{name}\" has not yet been declared")
            }
            ScopeError::Redefinition { pos, name, declared_at } => {
                write!(
                    f,
                    "Redefinition of variable at {pos}; \"{name}\" was already declared at {declared_at}"
                )
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// Builds a [`SymbolTable`] from a program in a single traversal, enforcing
/// declare-before-use and forbidding redefinition.
///
/// The builder keeps one piece of state: a flag saying whether the traversal
/// currently sits on the right-hand side of an assignment. Entering an
/// assignment clears it, moving past the target to the value expression sets
/// it again, and a variable is only checked against the table while the flag
/// is set. The target itself is inserted on the way *out* of the assignment,
/// after the whole value expression has been checked, which is what makes
/// `a = a;` an undeclared use rather than a redefinition.
#[derive(Debug)]
pub struct SymbolTableBuilder<'t> {
    table: &'t mut SymbolTable,
    rvalue_mode: bool,
}

impl<'t> SymbolTableBuilder<'t> {
    /// Clears `table` and fills it from `program`.
    ///
    /// On error the table contents are unspecified and must be discarded.
    pub fn build(program: &Program, table: &'t mut SymbolTable) -> Result<(), ScopeError> {
        table.clear();
        let mut builder = SymbolTableBuilder { table, rvalue_mode: true };
        program.accept(&mut builder)
    }
}

impl Visitor for SymbolTableBuilder<'_> {
    type Error = ScopeError;

    fn pre_visit_assignment(&mut self, _node: &Assignment) -> Result<(), ScopeError> {
        self.rvalue_mode = false;
        Ok(())
    }

    fn between_assignment_children(&mut self, _node: &Assignment) -> Result<(), ScopeError> {
        self.rvalue_mode = true;
        Ok(())
    }

    fn post_visit_assignment(&mut self, node: &Assignment) -> Result<(), ScopeError> {
        let target = &node.target;
        if let Some(existing) = self.table.lookup(&target.name) {
            return Err(ScopeError::Redefinition {
                pos: node.pos,
                name: target.name.clone(),
                declared_at: existing.pos(),
            });
        }
        self.table.insert(&target.name, target.pos);
        Ok(())
    }

    fn visit_variable(&mut self, node: &Variable) -> Result<(), ScopeError> {
        if self.rvalue_mode && self.table.lookup(&node.name).is_none() {
            return Err(ScopeError::Undeclared {
                pos: node.pos,
                name: node.name.clone(),
            });
        }
        Ok(())
    }
}
