//! Bytecode model consumed by the `sable-ai` engine: a method body as a
//! dense instruction sequence with an exception-handler table, plus the
//! per-method precomputations the engine needs (join points, subroutine
//! membership, live local slots).
//!
//! Decoding a class-file format into this model is out of scope; the
//! engine assumes the body is well-formed.

mod analyses;
mod body;
mod instr;

#[cfg(test)]
mod tests;

pub use analyses::{JoinPcs, LiveSlots, SlotSet, SubroutineMembership};
pub use body::{Body, Handler};
pub use instr::{BinOp, FieldRef, IfCond, Instruction, MethodRef, Pc, TypeRef};
