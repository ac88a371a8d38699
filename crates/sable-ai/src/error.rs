use sable_code::Pc;

use crate::entry::Entry;

/// What went wrong inside the interpreter.
///
/// These are engine failures (malformed input or violated internal
/// invariants), not abstract exceptions; those are handled by the
/// exception flow resolver and never surface as errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FatalKind {
    #[error("program counter outside the instruction sequence")]
    PcOutOfRange,
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("read of a dead or uninitialized local slot {slot}")]
    DeadLocal { slot: u16 },
    #[error("local slot {slot} outside the declared max-locals range")]
    LocalOutOfRange { slot: u16 },
    #[error("no stored state for a scheduled instruction")]
    MissingState,
    #[error("dynamic return without an enclosing subroutine")]
    RetOutsideSubroutine,
    #[error("local slot {slot} does not hold a single return address")]
    NotAReturnAddress { slot: u16 },
    #[error("malformed subroutine sentinel block in the worklist")]
    MalformedSentinels,
    #[error("unexpected worklist sentinel at the head")]
    UnexpectedSentinel,
}

/// Interpreter state captured when a fatal failure is raised: the current
/// PC, the pending worklist, and the evaluated history. The per-PC state
/// arrays are generic over the domain value and are intentionally not
/// embedded here.
#[derive(Clone, Debug)]
pub struct FailureContext {
    pub pc: Option<Pc>,
    pub worklist: Vec<Entry>,
    pub evaluated: Vec<Entry>,
}

/// Error type for interpretation failures.
#[derive(Debug, thiserror::Error)]
#[error("abstract interpretation failed at {pc:?}: {kind}", pc = context.pc)]
pub struct AiError {
    pub kind: FatalKind,
    pub context: Box<FailureContext>,
}

impl AiError {
    pub(crate) fn new(kind: FatalKind, context: FailureContext) -> Self {
        AiError {
            kind,
            context: Box::new(context),
        }
    }
}
