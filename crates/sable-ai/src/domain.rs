use sable_code::{BinOp, FieldRef, IfCond, MethodRef, Pc, TypeRef};

use crate::answer::Answer;
use crate::outcome::Computation;
use crate::state::{Locals, Operands};
use crate::update::Update;

/// Computational-type category of an abstract value: how many operand
/// stack slots it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Single,
    Double,
}

/// The implicit runtime faults the engine can synthesize, gated by the
/// domain's configuration flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImplicitException {
    NullPointer,
    ArrayIndexOutOfBounds,
    NegativeArraySize,
    ArrayStore,
    ClassCast,
    Arithmetic,
    IllegalMonitorState,
}

/// The capability surface the engine requires of an abstract domain.
///
/// One explicit trait: the engine depends only on this interface, and a
/// domain opts into behavior through the flag methods rather than through
/// structural extension. Operations that model bytecode with observable
/// failure modes return a [`Computation`], whose normal-result and
/// raised-exception sides are independent.
///
/// Operations take `&mut self` so domains may keep per-run bookkeeping
/// (origin tracking, constraints); the engine itself never relies on it.
pub trait Domain {
    /// Abstract representation of a single runtime value.
    type Value: Clone + std::fmt::Debug + PartialEq;

    // -- Value constructors -------------------------------------------------

    /// A known single-slot integer constant pushed at `pc`.
    fn int_const(&mut self, pc: Pc, value: i64) -> Self::Value;

    /// A known double-slot integer constant pushed at `pc`.
    fn long_const(&mut self, pc: Pc, value: i64) -> Self::Value;

    /// An integer known only to lie in `lo..=hi`.
    fn int_between(&mut self, pc: Pc, lo: i64, hi: i64) -> Self::Value;

    /// The null reference.
    fn null_const(&mut self, pc: Pc) -> Self::Value;

    /// A non-null value whose type is (at most) `tpe`.
    fn typed_value(&mut self, pc: Pc, tpe: TypeRef) -> Self::Value;

    /// The return address pushed by a subroutine call at `pc`; the single
    /// concrete target is `target`.
    fn return_address(&mut self, pc: Pc, target: Pc) -> Self::Value;

    /// An instance of one of the implicitly raised runtime faults.
    fn implicit_exception(&mut self, pc: Pc, kind: ImplicitException) -> Self::Value;

    // -- Queries ------------------------------------------------------------

    fn category(&self, value: &Self::Value) -> Category;

    fn is_null(&self, value: &Self::Value) -> Answer;

    /// Whether the (runtime type of the) value is a subtype of `supertype`.
    fn is_subtype_of(&self, value: &Self::Value, supertype: TypeRef) -> Answer;

    /// The single concrete target of a return-address value, or `None`
    /// if the value is not a (unique) return address.
    fn ret_address_of(&self, value: &Self::Value) -> Option<Pc>;

    // -- Refinement ---------------------------------------------------------

    fn refine_non_null(&mut self, pc: Pc, value: Self::Value) -> Self::Value;

    /// Narrow the value's upper type bound to `bound` (speculative handler
    /// match, successful cast).
    fn refine_upper_bound(&mut self, pc: Pc, value: Self::Value, bound: TypeRef) -> Self::Value;

    // -- Branch and switch oracles ------------------------------------------

    /// Verdict of comparing `value` against zero under `cond`.
    fn test_if(&mut self, pc: Pc, cond: IfCond, value: &Self::Value) -> Answer;

    /// Verdict of comparing `left` against `right` under `cond`.
    fn test_if_cmp(
        &mut self,
        pc: Pc,
        cond: IfCond,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Answer;

    /// Whether the switch key may equal `case`.
    fn switch_case_match(&mut self, pc: Pc, value: &Self::Value, case: i64) -> Answer;

    // -- Operations ---------------------------------------------------------

    fn binary_op(
        &mut self,
        pc: Pc,
        op: BinOp,
        left: Self::Value,
        right: Self::Value,
    ) -> Computation<Self::Value, Self::Value>;

    fn neg(&mut self, pc: Pc, value: Self::Value) -> Self::Value;

    fn new_object(&mut self, pc: Pc, tpe: TypeRef) -> Self::Value;

    fn new_array(
        &mut self,
        pc: Pc,
        count: Self::Value,
        tpe: TypeRef,
    ) -> Computation<Self::Value, Self::Value>;

    fn array_load(
        &mut self,
        pc: Pc,
        index: Self::Value,
        array: Self::Value,
    ) -> Computation<Self::Value, Self::Value>;

    fn array_store(
        &mut self,
        pc: Pc,
        value: Self::Value,
        index: Self::Value,
        array: Self::Value,
    ) -> Computation<(), Self::Value>;

    fn array_length(
        &mut self,
        pc: Pc,
        array: Self::Value,
    ) -> Computation<Self::Value, Self::Value>;

    /// Read an instance field; `receiver` has already been refined
    /// non-null when the engine explored the null path separately.
    fn get_field(
        &mut self,
        pc: Pc,
        receiver: Self::Value,
        field: FieldRef,
    ) -> Computation<Self::Value, Self::Value>;

    fn put_field(
        &mut self,
        pc: Pc,
        value: Self::Value,
        receiver: Self::Value,
        field: FieldRef,
    ) -> Computation<(), Self::Value>;

    fn get_static(&mut self, pc: Pc, field: FieldRef)
        -> Computation<Self::Value, Self::Value>;

    fn put_static(
        &mut self,
        pc: Pc,
        value: Self::Value,
        field: FieldRef,
    ) -> Computation<(), Self::Value>;

    /// Invoke a method; `receiver` is `None` for static calls. The normal
    /// result is `None` for void methods.
    fn invoke(
        &mut self,
        pc: Pc,
        method: MethodRef,
        receiver: Option<Self::Value>,
        args: Vec<Self::Value>,
    ) -> Computation<Option<Self::Value>, Self::Value>;

    fn monitor_enter(&mut self, pc: Pc, value: Self::Value) -> Computation<(), Self::Value>;

    fn monitor_exit(&mut self, pc: Pc, value: Self::Value) -> Computation<(), Self::Value>;

    /// A `return` instruction; the declared computation may still
    /// abruptly terminate (e.g. an unreleased monitor).
    fn normal_return(
        &mut self,
        _pc: Pc,
        _value: Option<Self::Value>,
    ) -> Computation<(), Self::Value> {
        Computation::Result(())
    }

    // -- Join ---------------------------------------------------------------

    /// Merge two abstract states at join point `pc`, classifying how much
    /// the stored state changed. Invoked only for control-flow join
    /// points; `join(s, s)` must be `NoUpdate` for any reachable `s`.
    #[allow(clippy::type_complexity)]
    fn join(
        &mut self,
        pc: Pc,
        old_operands: &Operands<Self::Value>,
        old_locals: &Locals<Self::Value>,
        new_operands: Operands<Self::Value>,
        new_locals: Locals<Self::Value>,
    ) -> Update<(Operands<Self::Value>, Locals<Self::Value>)>;

    // -- Lifecycle hooks ----------------------------------------------------

    /// Post-process a proposed successor state before it is stored.
    fn after_evaluation(
        &mut self,
        _pc: Pc,
        _target: Pc,
        _is_exceptional: bool,
        operands: Operands<Self::Value>,
        locals: Locals<Self::Value>,
    ) -> (Operands<Self::Value>, Locals<Self::Value>) {
        (operands, locals)
    }

    /// Called after every established control-flow edge.
    fn flow(&mut self, _pc: Pc, _successor: Pc, _is_exceptional: bool) {}

    /// An exception at `pc` matched no handler: the method terminates
    /// abruptly with `exception`.
    fn abrupt_termination(&mut self, _pc: Pc, _exception: &Self::Value) {}

    /// The fixpoint was reached and the result arrays are final.
    fn at_end(&mut self) {}

    // -- Implicit-exception configuration -----------------------------------

    fn throw_null_pointer_exception_on_field_access(&self) -> bool {
        true
    }
    fn throw_null_pointer_exception_on_method_call(&self) -> bool {
        true
    }
    fn throw_null_pointer_exception_on_array_access(&self) -> bool {
        true
    }
    fn throw_null_pointer_exception_on_monitor_access(&self) -> bool {
        true
    }
    fn throw_null_pointer_exception_on_throw(&self) -> bool {
        true
    }
    fn throw_class_cast_exception(&self) -> bool {
        true
    }
}
