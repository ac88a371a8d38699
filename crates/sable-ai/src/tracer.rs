use sable_code::Pc;

/// Observed classification of one join.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    NoUpdate,
    MetaInformation,
    Structural,
}

/// Observational extension points of one interpretation run.
///
/// Implementations must be purely observational: the engine never reads
/// anything back from a tracer, so a tracer cannot alter control flow.
/// Every method has a no-op default; `()` is the null tracer.
pub trait Tracer {
    /// An instruction was taken off the worklist and dispatched.
    fn instruction_evaluated(&mut self, _pc: Pc) {}

    /// A control-flow edge was established (state stored or joined).
    fn flow(&mut self, _pc: Pc, _target: Pc, _is_exceptional: bool) {}

    /// A join was performed at `pc` with the given outcome.
    fn join_outcome(&mut self, _pc: Pc, _outcome: JoinOutcome) {}

    /// `target` was put back on the worklist after its state changed.
    fn rescheduled(&mut self, _pc: Pc, _target: Pc) {}

    /// A subroutine call at `pc` entered the body at `entry`.
    fn subroutine_call(&mut self, _pc: Pc, _entry: Pc) {}

    /// The dynamic return at `ret_pc` was resolved to `target`.
    fn subroutine_return(&mut self, _ret_pc: Pc, _target: Pc) {}

    /// An exceptional edge left `unwound` subroutine levels.
    fn abrupt_subroutine_termination(&mut self, _pc: Pc, _target: Pc, _unwound: usize) {}

    /// An exception at `pc` matched no handler.
    fn abrupt_method_termination(&mut self, _pc: Pc) {}

    /// The run finished; `completed` is false for an interrupted run.
    fn result(&mut self, _completed: bool) {}
}

impl Tracer for () {}
