//! Emulator for the LS-8, an 8-bit stored-program machine with 256 bytes
//! of memory, 8 general-purpose registers, and a descending call stack.
//!
//! Programs are images of binary-digit lines (see [`program`]) loaded into
//! memory at address 0 and executed by the [`machine::Machine`] until a
//! halt instruction or a fault.

pub mod machine;
pub mod opcode;
pub mod program;
