use sable_code::Pc;
use smallvec::SmallVec;

use crate::entry::Entry;
use crate::state::{Locals, Operands};

/// A full clone of the caller's per-PC arrays, taken when a subroutine is
/// entered and restored when it returns or is abruptly terminated. The
/// deep copy is deliberate: it makes restoration trivially correct at the
/// cost of one array clone per subroutine call, which legacy subroutines
/// are rare enough to absorb.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<V> {
    pub(crate) operands: Vec<Option<Operands<V>>>,
    pub(crate) locals: Vec<Option<Locals<V>>>,
}

impl<V> Snapshot<V> {
    pub(crate) fn new(
        operands: Vec<Option<Operands<V>>>,
        locals: Vec<Option<Locals<V>>>,
    ) -> Self {
        Snapshot { operands, locals }
    }
}

/// The exact continuation of an interrupted run. Opaque to callers;
/// passing it to [`Engine::resume`](crate::Engine::resume) reproduces the
/// uninterrupted result.
#[derive(Clone, Debug, PartialEq)]
pub struct Continuation<V> {
    pub(crate) worklist: Vec<Entry>,
    pub(crate) evaluated: Vec<Entry>,
    pub(crate) operands: Vec<Option<Operands<V>>>,
    pub(crate) locals: Vec<Option<Locals<V>>>,
    pub(crate) sub_operands: Vec<Option<Operands<V>>>,
    pub(crate) sub_locals: Vec<Option<Locals<V>>>,
    pub(crate) snapshots: Vec<Snapshot<V>>,
    pub(crate) pending_returns: Vec<SmallVec<[Pc; 2]>>,
    pub(crate) active_subroutines: Vec<Pc>,
}

/// Result of one interpretation run.
#[derive(Clone, Debug, PartialEq)]
pub enum AiResult<V> {
    /// The worklist ran empty: per-PC snapshots are final.
    Completed {
        /// PCs in dispatch order, including subroutine sentinels.
        evaluated: Vec<Entry>,
        /// Operand stack before each instruction; `None` = unreachable.
        operands: Vec<Option<Operands<V>>>,
        /// Local slots before each instruction; `None` = unreachable.
        locals: Vec<Option<Locals<V>>>,
    },
    /// The interruption predicate fired; the run can be resumed.
    Aborted(Continuation<V>),
}

impl<V> AiResult<V> {
    pub fn is_completed(&self) -> bool {
        matches!(self, AiResult::Completed { .. })
    }

    /// The operand stack before `pc`, if the run completed and reached it.
    pub fn operands_at(&self, pc: Pc) -> Option<&Operands<V>> {
        match self {
            AiResult::Completed { operands, .. } => {
                operands.get(pc.index()).and_then(|s| s.as_ref())
            }
            AiResult::Aborted(_) => None,
        }
    }

    /// The locals before `pc`, if the run completed and reached it.
    pub fn locals_at(&self, pc: Pc) -> Option<&Locals<V>> {
        match self {
            AiResult::Completed { locals, .. } => locals.get(pc.index()).and_then(|s| s.as_ref()),
            AiResult::Aborted(_) => None,
        }
    }

    /// Real PCs of the evaluated history, in dispatch order, sentinels
    /// filtered out.
    pub fn evaluated_pcs(&self) -> Vec<Pc> {
        let evaluated = match self {
            AiResult::Completed { evaluated, .. } => evaluated,
            AiResult::Aborted(c) => &c.evaluated,
        };
        evaluated.iter().filter_map(|e| e.as_pc()).collect()
    }

    /// Consume an aborted result into its continuation.
    pub fn into_continuation(self) -> Option<Continuation<V>> {
        match self {
            AiResult::Completed { .. } => None,
            AiResult::Aborted(c) => Some(c),
        }
    }
}
