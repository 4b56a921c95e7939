//! Opcode definitions for the stack machine.

use strum::{Display, FromRepr, IntoStaticStr};

/// One-byte instruction identifiers.
///
/// The discriminant is the byte value of the instruction in the code stream.
/// Three of the opcodes (`Const1B`, `Const2B`, `Const4B`) are followed by an
/// inline big-endian operand of the matching width; all others are a single
/// byte.
///
/// Stack effects, with the top of the stack leftmost:
///
/// | Opcode    | Stack before → after    | Semantics |
/// |-----------|-------------------------|-----------|
/// | `Load`    | `idx` → `mem[idx]`      | push value at memory index |
/// | `Store`   | `idx, value` → ∅        | store value at memory index |
/// | `Const1B` | ∅ → `v`                 | push sign-extended 1-byte operand |
/// | `Const2B` | ∅ → `v`                 | push sign-extended 2-byte operand |
/// | `Const4B` | ∅ → `v`                 | push 4-byte operand |
/// | `Add`     | `v2, v1` → `v1 + v2`    | integer add |
/// | `Sub`     | `v2, v1` → `v1 - v2`    | integer subtract |
/// | `Mul`     | `v2, v1` → `v1 * v2`    | integer multiply |
/// | `Div`     | `v2, v1` → `v1 / v2`    | integer divide, truncating |
/// | `Swap`    | `v1, v2` → `v2, v1`     | swap top two |
/// | `Print`   | `v` → ∅                 | write integer + newline to output |
/// | `Const0`  | ∅ → `0`                 | push literal 0 |
/// | `Const1`  | ∅ → `1`                 | push literal 1 |
///
/// `v1` is the *second*-popped operand, so evaluating the left operand first
/// and the right second yields the conventional `lhs op rhs`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, IntoStaticStr)]
pub enum Opcode {
    #[strum(serialize = "LOAD")]
    Load = 1,
    #[strum(serialize = "STORE")]
    Store = 2,
    #[strum(serialize = "CONST_1B")]
    Const1B = 3,
    #[strum(serialize = "CONST_2B")]
    Const2B = 4,
    #[strum(serialize = "CONST_4B")]
    Const4B = 5,
    #[strum(serialize = "ADD")]
    Add = 6,
    #[strum(serialize = "SUB")]
    Sub = 7,
    #[strum(serialize = "MUL")]
    Mul = 8,
    #[strum(serialize = "DIV")]
    Div = 9,
    #[strum(serialize = "SWAP")]
    Swap = 10,
    #[strum(serialize = "PRINT")]
    Print = 11,
    #[strum(serialize = "CONST_0")]
    Const0 = 12,
    #[strum(serialize = "CONST_1")]
    Const1 = 13,
}

impl Opcode {
    /// Number of inline operand bytes following the opcode byte.
    #[must_use]
    pub fn operand_width(self) -> usize {
        match self {
            Opcode::Const1B => 1,
            Opcode::Const2B => 2,
            Opcode::Const4B => 4,
            _ => 0,
        }
    }
}
