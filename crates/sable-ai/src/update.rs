/// Classification of how much a join changed a stored state.
///
/// Controls rescheduling: a structural change requires the target to be
/// re-evaluated, a meta-information change only updates the stored state,
/// and `NoUpdate` ends the fixpoint iteration for that edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update<T> {
    /// The incoming state is already subsumed by the stored one.
    NoUpdate,
    /// The merge changed information that does not affect which
    /// successors are reachable (e.g. origin or provenance metadata).
    MetaInformation(T),
    /// The merge changed the computed values themselves; dependent
    /// instructions must be re-evaluated.
    Structural(T),
}

impl<T> Update<T> {
    pub fn is_no_update(&self) -> bool {
        matches!(self, Update::NoUpdate)
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Update::Structural(_))
    }

    /// The merged state, if any.
    pub fn into_merged(self) -> Option<T> {
        match self {
            Update::NoUpdate => None,
            Update::MetaInformation(t) | Update::Structural(t) => Some(t),
        }
    }
}
