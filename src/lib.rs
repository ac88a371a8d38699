//! Worklist-driven abstract interpretation for stack-machine bytecode.
//!
//! The engine lives in [`ai`]; the instruction set, method bodies, and
//! the static pre-analyses live in [`code`].

pub use sable_ai as ai;
pub use sable_code as code;

pub mod prelude {
    pub use sable_ai::{AiResult, Answer, Computation, Domain, Engine, Tracer, Update};
    pub use sable_code::{Body, Handler, Instruction, Pc};
}
