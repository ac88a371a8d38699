//! Worklist-driven abstract interpretation for stack-and-registers
//! bytecode.
//!
//! For every instruction of a [`sable_code::Body`] the engine computes,
//! through a pluggable [`Domain`], a sound over-approximation of the
//! operand-stack and local-variable contents *before* that instruction
//! executes, iterating joins at control-flow merge points to a fixpoint.
//!
//! The engine handles legacy subroutine (`Jsr`/`Ret`) bookkeeping via
//! explicit worklist sentinels and a snapshot stack, resolves abstract
//! exception flow against the handler table, and supports cooperative
//! interruption with exact resumption (see [`AiResult::Aborted`] and
//! [`Engine::resume`]).

mod answer;
mod dispatch;
mod domain;
mod entry;
mod error;
mod interpreter;
mod outcome;
mod result;
mod state;
mod subroutine;
mod throw;
mod tracer;
mod update;

pub use answer::Answer;
pub use domain::{Category, Domain, ImplicitException};
pub use entry::Entry;
pub use error::{AiError, FailureContext, FatalKind};
pub use interpreter::Engine;
pub use outcome::{Computation, Exceptions};
pub use result::{AiResult, Continuation, Snapshot};
pub use state::{Locals, Operands};
pub use tracer::{JoinOutcome, Tracer};
pub use update::Update;

pub use smallvec::{self, SmallVec};
