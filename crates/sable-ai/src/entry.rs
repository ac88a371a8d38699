use std::fmt;

use sable_code::Pc;

/// One element of the worklist or the evaluated history.
///
/// Real program counters are mixed with subroutine-control sentinels.
/// Sentinels nest in strict LIFO order: each open subroutine contributes
/// the block `SubroutineStart, [SubroutineReturnAddressLocal],
/// SubroutineReturnTo, SubroutineMarker` to the worklist, and new PCs of
/// the current subroutine are always scheduled before its
/// `SubroutineStart`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    /// A real instruction address.
    Pc(Pc),
    /// Boundary of the currently explored subroutine body; reaching it as
    /// the worklist head means every path through the body was explored.
    SubroutineStart,
    /// The local slot holding the subroutine's return address, recorded
    /// eagerly when the call target stores it immediately, or lazily at
    /// the first dynamic return.
    SubroutineReturnAddressLocal(u16),
    /// The single return target of the current subroutine call (the
    /// instruction after the `Jsr`).
    SubroutineReturnTo(Pc),
    /// Outer boundary of one subroutine call frame; counted when abrupt
    /// termination unwinds nested levels.
    SubroutineMarker,
    /// Evaluated-history-only marker closing a `SubroutineStart` segment;
    /// never present in the worklist.
    SubroutineEnd,
}

impl Entry {
    pub fn as_pc(self) -> Option<Pc> {
        match self {
            Entry::Pc(pc) => Some(pc),
            _ => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Pc(pc) => write!(f, "{}", pc.0),
            Entry::SubroutineStart => f.write_str("sub-start"),
            Entry::SubroutineReturnAddressLocal(slot) => write!(f, "ret-addr@{slot}"),
            Entry::SubroutineReturnTo(pc) => write!(f, "ret-to:{}", pc.0),
            Entry::SubroutineMarker => f.write_str("sub-marker"),
            Entry::SubroutineEnd => f.write_str("sub-end"),
        }
    }
}
