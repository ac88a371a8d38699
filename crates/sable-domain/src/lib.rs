//! A ready-to-use abstract domain tracking integer intervals, reference
//! type bounds with nullness, and exact subroutine return addresses.
//!
//! This is deliberately a mid-precision domain: precise enough to
//! exercise every capability the engine's [`Domain`] trait exposes
//! (three-way branch verdicts, implicit-exception gating, join
//! classification), simple enough to read as a reference implementation.

use rustc_hash::FxHashMap;
use sable_ai::smallvec::smallvec;
use sable_ai::{
    Answer, Category, Computation, Domain, Exceptions, ImplicitException, Locals, Operands,
    Update,
};
use sable_code::{BinOp, FieldRef, IfCond, MethodRef, Pc, TypeRef};

pub mod hierarchy;
pub mod interval;

pub use hierarchy::TypeHierarchy;
pub use interval::{Bound, Interval};

// ============================================================================
// Values
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nullness {
    NonNull,
    MaybeNull,
}

/// One abstract runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Val {
    /// Single-slot integer, tracked as an interval.
    Int(Interval),
    /// Double-slot integer, tracked as an interval.
    Long(Interval),
    /// Non-null-or-maybe-null reference bounded above by a type.
    Ref { bound: TypeRef, nullness: Nullness },
    /// The null reference.
    Null,
    /// A subroutine return address with a single known target.
    RetAddr(Pc),
    /// Joined values of incompatible kinds; carries no information.
    Unknown,
}

impl Val {
    pub fn int(lo: i64, hi: i64) -> Val {
        Val::Int(Interval::new(lo, hi))
    }

    pub fn int_top() -> Val {
        Val::Int(Interval::top())
    }

    pub fn reference(bound: TypeRef) -> Val {
        Val::Ref {
            bound,
            nullness: Nullness::NonNull,
        }
    }

    pub fn nullable(bound: TypeRef) -> Val {
        Val::Ref {
            bound,
            nullness: Nullness::MaybeNull,
        }
    }
}

// ============================================================================
// The domain
// ============================================================================

/// Interval-and-types domain. Construct with [`TypeDomain::new`] and
/// adjust behavior through the `with_*` builders.
#[derive(Clone, Debug)]
pub struct TypeDomain {
    hierarchy: TypeHierarchy,
    /// Classify joins that only widen nullness as meta-information
    /// rather than structural updates.
    nullness_is_meta: bool,
    /// Joined intervals wider than this are widened to infinity on the
    /// bounds that moved, guaranteeing fixpoint termination.
    max_interval_width: i64,
    throw_arithmetic: bool,
    npe_on_field_access: bool,
    npe_on_method_call: bool,
    npe_on_array_access: bool,
    npe_on_monitor_access: bool,
    npe_on_throw: bool,
    class_cast: bool,
    field_values: FxHashMap<FieldRef, Val>,
    invoke_returns: FxHashMap<MethodRef, Val>,
    escaped: Vec<(Pc, Val)>,
}

impl TypeDomain {
    pub fn new() -> TypeDomain {
        TypeDomain {
            hierarchy: TypeHierarchy::with_throwables(),
            nullness_is_meta: false,
            max_interval_width: 32,
            throw_arithmetic: true,
            npe_on_field_access: true,
            npe_on_method_call: true,
            npe_on_array_access: true,
            npe_on_monitor_access: true,
            npe_on_throw: true,
            class_cast: true,
            field_values: FxHashMap::default(),
            invoke_returns: FxHashMap::default(),
            escaped: Vec::new(),
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    pub fn with_nullness_as_meta(mut self, enabled: bool) -> Self {
        self.nullness_is_meta = enabled;
        self
    }

    pub fn with_max_interval_width(mut self, width: i64) -> Self {
        self.max_interval_width = width;
        self
    }

    pub fn with_arithmetic_exceptions(mut self, enabled: bool) -> Self {
        self.throw_arithmetic = enabled;
        self
    }

    pub fn with_null_pointer_exceptions(mut self, enabled: bool) -> Self {
        self.npe_on_field_access = enabled;
        self.npe_on_method_call = enabled;
        self.npe_on_array_access = enabled;
        self.npe_on_monitor_access = enabled;
        self.npe_on_throw = enabled;
        self
    }

    pub fn with_class_cast_exceptions(mut self, enabled: bool) -> Self {
        self.class_cast = enabled;
        self
    }

    /// Fix the abstract value read from a field; unregistered fields
    /// read as [`Val::Unknown`].
    pub fn with_field_value(mut self, field: FieldRef, value: Val) -> Self {
        self.field_values.insert(field, value);
        self
    }

    /// Fix the abstract return value of a method.
    pub fn with_invoke_return(mut self, method: MethodRef, value: Val) -> Self {
        self.invoke_returns.insert(method, value);
        self
    }

    /// Exceptions that matched no handler, in termination order.
    pub fn escaped(&self) -> &[(Pc, Val)] {
        &self.escaped
    }

    fn exception_type(kind: ImplicitException) -> TypeRef {
        match kind {
            ImplicitException::NullPointer => hierarchy::NULL_POINTER_EXCEPTION,
            ImplicitException::ArrayIndexOutOfBounds => {
                hierarchy::INDEX_OUT_OF_BOUNDS_EXCEPTION
            }
            ImplicitException::NegativeArraySize => hierarchy::NEGATIVE_ARRAY_SIZE_EXCEPTION,
            ImplicitException::ArrayStore => hierarchy::ARRAY_STORE_EXCEPTION,
            ImplicitException::ClassCast => hierarchy::CLASS_CAST_EXCEPTION,
            ImplicitException::Arithmetic => hierarchy::ARITHMETIC_EXCEPTION,
            ImplicitException::IllegalMonitorState => {
                hierarchy::ILLEGAL_MONITOR_STATE_EXCEPTION
            }
        }
    }

    /// Join `b`'s interval state into `a`'s, widening any bound that
    /// moved once the result exceeds the configured width.
    fn widened_join(&self, a: &Interval, b: &Interval) -> Interval {
        let mut joined = a.join(b);
        if joined.width().is_none_or(|w| w > self.max_interval_width) {
            if joined.lo != a.lo {
                joined.lo = Bound::NegInf;
            }
            if joined.hi != a.hi {
                joined.hi = Bound::PosInf;
            }
        }
        joined
    }

    fn join_val(&self, a: &Val, b: &Val) -> Val {
        match (a, b) {
            (Val::Int(x), Val::Int(y)) => Val::Int(self.widened_join(x, y)),
            (Val::Long(x), Val::Long(y)) => Val::Long(self.widened_join(x, y)),
            (Val::Null, Val::Null) => Val::Null,
            (Val::Null, Val::Ref { bound, .. }) | (Val::Ref { bound, .. }, Val::Null) => {
                Val::Ref {
                    bound: *bound,
                    nullness: Nullness::MaybeNull,
                }
            }
            (
                Val::Ref {
                    bound: ba,
                    nullness: na,
                },
                Val::Ref {
                    bound: bb,
                    nullness: nb,
                },
            ) => Val::Ref {
                bound: self.hierarchy.lub(*ba, *bb),
                nullness: if *na == Nullness::NonNull && *nb == Nullness::NonNull {
                    Nullness::NonNull
                } else {
                    Nullness::MaybeNull
                },
            },
            (Val::RetAddr(p), Val::RetAddr(q)) if p == q => Val::RetAddr(*p),
            _ => Val::Unknown,
        }
    }

    /// Whether two values differ at most in nullness.
    fn same_modulo_nullness(a: &Val, b: &Val) -> bool {
        match (a, b) {
            (Val::Ref { bound: ba, .. }, Val::Ref { bound: bb, .. }) => ba == bb,
            _ => a == b,
        }
    }

    /// Record what a slot's join changed in the update classification
    /// flags.
    fn classify_change(&self, old: &Val, joined: &Val, structural: &mut bool, meta: &mut bool) {
        if joined != old {
            if self.nullness_is_meta && Self::same_modulo_nullness(joined, old) {
                *meta = true;
            } else {
                *structural = true;
            }
        }
    }

    fn integer_division(
        &mut self,
        op: BinOp,
        left: Interval,
        right: Interval,
        wrap: fn(Interval) -> Val,
    ) -> Computation<Val, Val> {
        let arith = || Val::reference(hierarchy::ARITHMETIC_EXCEPTION);
        let result = match (left.as_constant(), right.as_constant()) {
            (Some(a), Some(b)) if b != 0 => {
                let v = if op == BinOp::Div { a / b } else { a % b };
                wrap(Interval::constant(v))
            }
            _ => wrap(Interval::top()),
        };
        if !self.throw_arithmetic {
            return Computation::Result(result);
        }
        match right.as_constant() {
            Some(0) => Computation::throws(arith()),
            _ if right.contains(0) => Computation::ResultOrThrows(result, smallvec![arith()]),
            _ => Computation::Result(result),
        }
    }
}

impl Default for TypeDomain {
    fn default() -> Self {
        TypeDomain::new()
    }
}

impl Domain for TypeDomain {
    type Value = Val;

    // -- Value constructors --------------------------------------------------

    fn int_const(&mut self, _pc: Pc, value: i64) -> Val {
        Val::Int(Interval::constant(value))
    }

    fn long_const(&mut self, _pc: Pc, value: i64) -> Val {
        Val::Long(Interval::constant(value))
    }

    fn int_between(&mut self, _pc: Pc, lo: i64, hi: i64) -> Val {
        Val::int(lo, hi)
    }

    fn null_const(&mut self, _pc: Pc) -> Val {
        Val::Null
    }

    fn typed_value(&mut self, _pc: Pc, tpe: TypeRef) -> Val {
        Val::reference(tpe)
    }

    fn return_address(&mut self, _pc: Pc, target: Pc) -> Val {
        Val::RetAddr(target)
    }

    fn implicit_exception(&mut self, _pc: Pc, kind: ImplicitException) -> Val {
        Val::reference(Self::exception_type(kind))
    }

    // -- Queries -------------------------------------------------------------

    fn category(&self, value: &Val) -> Category {
        match value {
            Val::Long(_) => Category::Double,
            _ => Category::Single,
        }
    }

    fn is_null(&self, value: &Val) -> Answer {
        match value {
            Val::Null => Answer::Yes,
            Val::Ref {
                nullness: Nullness::MaybeNull,
                ..
            }
            | Val::Unknown => Answer::Unknown,
            _ => Answer::No,
        }
    }

    fn is_subtype_of(&self, value: &Val, supertype: TypeRef) -> Answer {
        match value {
            Val::Ref { bound, .. } => self.hierarchy.subtype_verdict(*bound, supertype),
            Val::Unknown => Answer::Unknown,
            _ => Answer::No,
        }
    }

    fn ret_address_of(&self, value: &Val) -> Option<Pc> {
        match value {
            Val::RetAddr(pc) => Some(*pc),
            _ => None,
        }
    }

    // -- Refinement ----------------------------------------------------------

    fn refine_non_null(&mut self, _pc: Pc, value: Val) -> Val {
        match value {
            Val::Ref { bound, .. } => Val::reference(bound),
            other => other,
        }
    }

    fn refine_upper_bound(&mut self, _pc: Pc, value: Val, bound: TypeRef) -> Val {
        match value {
            Val::Ref {
                bound: old,
                nullness,
            } => {
                let narrowed = if self.hierarchy.subtype_verdict(old, bound).is_yes() {
                    old
                } else {
                    bound
                };
                Val::Ref {
                    bound: narrowed,
                    nullness,
                }
            }
            Val::Unknown => Val::nullable(bound),
            other => other,
        }
    }

    // -- Branch and switch oracles -------------------------------------------

    fn test_if(&mut self, _pc: Pc, cond: IfCond, value: &Val) -> Answer {
        match value {
            Val::Int(i) | Val::Long(i) => i.compare(cond, &Interval::constant(0)),
            // References compared against the null word.
            Val::Null => match cond {
                IfCond::Eq => Answer::Yes,
                IfCond::Ne => Answer::No,
                _ => Answer::Unknown,
            },
            Val::Ref { nullness, .. } => match (cond, nullness) {
                (IfCond::Eq, Nullness::NonNull) => Answer::No,
                (IfCond::Ne, Nullness::NonNull) => Answer::Yes,
                _ => Answer::Unknown,
            },
            _ => Answer::Unknown,
        }
    }

    fn test_if_cmp(&mut self, _pc: Pc, cond: IfCond, left: &Val, right: &Val) -> Answer {
        match (left, right) {
            (Val::Int(a), Val::Int(b)) | (Val::Long(a), Val::Long(b)) => a.compare(cond, b),
            _ => Answer::Unknown,
        }
    }

    fn switch_case_match(&mut self, _pc: Pc, value: &Val, case: i64) -> Answer {
        match value {
            Val::Int(i) => i.compare(IfCond::Eq, &Interval::constant(case)),
            _ => Answer::Unknown,
        }
    }

    // -- Operations ----------------------------------------------------------

    fn binary_op(&mut self, _pc: Pc, op: BinOp, left: Val, right: Val) -> Computation<Val, Val> {
        let (a, b, wrap): (Interval, Interval, fn(Interval) -> Val) = match (left, right) {
            (Val::Int(a), Val::Int(b)) => (a, b, Val::Int),
            (Val::Long(a), Val::Long(b)) => (a, b, Val::Long),
            _ => return Computation::Result(Val::Unknown),
        };
        match op {
            BinOp::Add => Computation::Result(wrap(a.add(&b))),
            BinOp::Sub => Computation::Result(wrap(a.sub(&b))),
            BinOp::Mul => Computation::Result(wrap(a.mul(&b))),
            BinOp::Div | BinOp::Rem => self.integer_division(op, a, b, wrap),
        }
    }

    fn neg(&mut self, _pc: Pc, value: Val) -> Val {
        match value {
            Val::Int(i) => Val::Int(i.negate()),
            Val::Long(i) => Val::Long(i.negate()),
            other => other,
        }
    }

    fn new_object(&mut self, _pc: Pc, tpe: TypeRef) -> Val {
        Val::reference(tpe)
    }

    fn new_array(&mut self, _pc: Pc, count: Val, tpe: TypeRef) -> Computation<Val, Val> {
        let array = Val::reference(tpe);
        let negative = Val::reference(hierarchy::NEGATIVE_ARRAY_SIZE_EXCEPTION);
        let verdict = match &count {
            Val::Int(i) => i.compare(IfCond::Lt, &Interval::constant(0)),
            _ => Answer::Unknown,
        };
        match verdict {
            Answer::Yes => Computation::throws(negative),
            Answer::No => Computation::Result(array),
            Answer::Unknown => Computation::ResultOrThrows(array, smallvec![negative]),
        }
    }

    // Array lengths and element types are not tracked, so reads yield the
    // top value and index checks can only rule out definitely-negative
    // indices.
    fn array_load(&mut self, _pc: Pc, index: Val, _array: Val) -> Computation<Val, Val> {
        let oob = Val::reference(hierarchy::INDEX_OUT_OF_BOUNDS_EXCEPTION);
        if let Val::Int(i) = &index {
            if i.compare(IfCond::Lt, &Interval::constant(0)).is_yes() {
                return Computation::throws(oob);
            }
        }
        Computation::ResultOrThrows(Val::Unknown, smallvec![oob])
    }

    fn array_store(
        &mut self,
        _pc: Pc,
        value: Val,
        index: Val,
        _array: Val,
    ) -> Computation<(), Val> {
        let oob = Val::reference(hierarchy::INDEX_OUT_OF_BOUNDS_EXCEPTION);
        if let Val::Int(i) = &index {
            if i.compare(IfCond::Lt, &Interval::constant(0)).is_yes() {
                return Computation::throws(oob);
            }
        }
        let mut exceptions: Exceptions<Val> = smallvec![oob];
        if matches!(value, Val::Ref { .. } | Val::Null | Val::Unknown) {
            exceptions.push(Val::reference(hierarchy::ARRAY_STORE_EXCEPTION));
        }
        Computation::ResultOrThrows((), exceptions)
    }

    fn array_length(&mut self, _pc: Pc, _array: Val) -> Computation<Val, Val> {
        Computation::Result(Val::int(0, i32::MAX as i64))
    }

    fn get_field(&mut self, _pc: Pc, _receiver: Val, field: FieldRef) -> Computation<Val, Val> {
        Computation::Result(self.field_values.get(&field).cloned().unwrap_or(Val::Unknown))
    }

    fn put_field(
        &mut self,
        _pc: Pc,
        _value: Val,
        _receiver: Val,
        _field: FieldRef,
    ) -> Computation<(), Val> {
        Computation::Result(())
    }

    fn get_static(&mut self, _pc: Pc, field: FieldRef) -> Computation<Val, Val> {
        Computation::Result(self.field_values.get(&field).cloned().unwrap_or(Val::Unknown))
    }

    fn put_static(&mut self, _pc: Pc, _value: Val, _field: FieldRef) -> Computation<(), Val> {
        Computation::Result(())
    }

    fn invoke(
        &mut self,
        _pc: Pc,
        method: MethodRef,
        _receiver: Option<Val>,
        _args: Vec<Val>,
    ) -> Computation<Option<Val>, Val> {
        let result = method.returns_value.then(|| {
            self.invoke_returns
                .get(&method)
                .cloned()
                .unwrap_or(Val::Unknown)
        });
        Computation::Result(result)
    }

    fn monitor_enter(&mut self, _pc: Pc, _value: Val) -> Computation<(), Val> {
        Computation::Result(())
    }

    fn monitor_exit(&mut self, _pc: Pc, _value: Val) -> Computation<(), Val> {
        Computation::Result(())
    }

    // -- Join ----------------------------------------------------------------

    fn join(
        &mut self,
        _pc: Pc,
        old_operands: &Operands<Val>,
        old_locals: &Locals<Val>,
        new_operands: Operands<Val>,
        new_locals: Locals<Val>,
    ) -> Update<(Operands<Val>, Locals<Val>)> {
        debug_assert_eq!(old_operands.len(), new_operands.len());
        let mut structural = false;
        let mut meta = false;

        let mut operands = Operands::empty();
        for (o, n) in old_operands.values().iter().zip(new_operands.values()) {
            let joined = self.join_val(o, n);
            self.classify_change(o, &joined, &mut structural, &mut meta);
            operands.push(joined);
        }

        let mut locals = Locals::with_slots(old_locals.len() as u16);
        for (slot, (o, n)) in old_locals
            .slots()
            .iter()
            .zip(new_locals.slots())
            .enumerate()
        {
            match (o, n) {
                (Some(o), Some(n)) => {
                    let joined = self.join_val(o, n);
                    self.classify_change(o, &joined, &mut structural, &mut meta);
                    locals.set(slot as u16, joined);
                }
                (Some(_), None) => structural = true,
                _ => {}
            }
        }

        if structural {
            Update::Structural((operands, locals))
        } else if meta {
            Update::MetaInformation((operands, locals))
        } else {
            Update::NoUpdate
        }
    }

    // -- Lifecycle -----------------------------------------------------------

    fn abrupt_termination(&mut self, pc: Pc, exception: &Val) {
        self.escaped.push((pc, exception.clone()));
    }

    // -- Implicit-exception configuration ------------------------------------

    fn throw_null_pointer_exception_on_field_access(&self) -> bool {
        self.npe_on_field_access
    }

    fn throw_null_pointer_exception_on_method_call(&self) -> bool {
        self.npe_on_method_call
    }

    fn throw_null_pointer_exception_on_array_access(&self) -> bool {
        self.npe_on_array_access
    }

    fn throw_null_pointer_exception_on_monitor_access(&self) -> bool {
        self.npe_on_monitor_access
    }

    fn throw_null_pointer_exception_on_throw(&self) -> bool {
        self.npe_on_throw
    }

    fn throw_class_cast_exception(&self) -> bool {
        self.class_cast
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(values: Vec<Val>) -> Operands<Val> {
        let mut ops = Operands::empty();
        for v in values {
            ops.push(v);
        }
        ops
    }

    fn slots(values: Vec<Option<Val>>) -> Locals<Val> {
        let mut locals = Locals::with_slots(values.len() as u16);
        for (i, v) in values.into_iter().enumerate() {
            if let Some(v) = v {
                locals.set(i as u16, v);
            }
        }
        locals
    }

    #[test]
    fn joining_a_state_with_itself_is_no_update() {
        let mut d = TypeDomain::new();
        let ops = stack(vec![Val::int(0, 5), Val::Null]);
        let locals = slots(vec![Some(Val::reference(hierarchy::OBJECT)), None]);
        let update = d.join(Pc(7), &ops, &locals, ops.clone(), locals.clone());
        assert!(update.is_no_update());
    }

    #[test]
    fn widening_an_interval_is_structural() {
        let mut d = TypeDomain::new();
        let old = stack(vec![Val::int(0, 1)]);
        let new = stack(vec![Val::int(0, 9)]);
        let locals = slots(vec![]);
        let update = d.join(Pc(0), &old, &locals, new, locals.clone());
        assert!(update.is_structural());
        let (ops, _) = update.into_merged().unwrap();
        assert_eq!(ops.values(), &[Val::int(0, 9)]);
    }

    #[test]
    fn a_local_dying_at_a_join_is_structural() {
        let mut d = TypeDomain::new();
        let ops = stack(vec![]);
        let old = slots(vec![Some(Val::int(1, 1)), Some(Val::Null)]);
        let new = slots(vec![None, Some(Val::Null)]);
        let update = d.join(Pc(0), &ops, &old, ops.clone(), new);
        assert!(update.is_structural());
        let (_, locals) = update.into_merged().unwrap();
        assert!(locals.get(0).is_none());
        assert_eq!(locals.get(1), Some(&Val::Null));
    }

    #[test]
    fn nullness_widening_can_be_meta_information() {
        let t = hierarchy::THROWABLE;
        let old = stack(vec![Val::reference(t)]);
        let new = stack(vec![Val::Null]);
        let locals = slots(vec![]);

        let mut strict = TypeDomain::new();
        assert!(strict
            .join(Pc(0), &old, &locals, new.clone(), locals.clone())
            .is_structural());

        let mut relaxed = TypeDomain::new().with_nullness_as_meta(true);
        let update = relaxed.join(Pc(0), &old, &locals, new, locals.clone());
        assert!(!update.is_structural());
        assert!(!update.is_no_update());
    }

    #[test]
    fn wide_joins_widen_to_infinity() {
        let d = TypeDomain::new().with_max_interval_width(4);
        let j = d.widened_join(&Interval::new(0, 2), &Interval::new(0, 40));
        assert_eq!(
            j,
            Interval {
                lo: Bound::Finite(0),
                hi: Bound::PosInf
            }
        );
        // Narrow joins keep their exact bounds.
        let j = d.widened_join(&Interval::new(0, 2), &Interval::new(3, 4));
        assert_eq!(j, Interval::new(0, 4));
    }

    #[test]
    fn incompatible_kinds_join_to_unknown() {
        let d = TypeDomain::new();
        assert_eq!(
            d.join_val(&Val::int(0, 1), &Val::Null),
            Val::Unknown
        );
        assert_eq!(
            d.join_val(&Val::RetAddr(Pc(3)), &Val::RetAddr(Pc(5))),
            Val::Unknown
        );
        assert_eq!(
            d.join_val(&Val::RetAddr(Pc(3)), &Val::RetAddr(Pc(3))),
            Val::RetAddr(Pc(3))
        );
    }

    #[test]
    fn division_by_a_possible_zero_forks() {
        let mut d = TypeDomain::new();
        let c = d.binary_op(Pc(0), BinOp::Div, Val::int(1, 10), Val::int(0, 3));
        assert!(c.may_throw());
        assert!(c.returns_normally());

        let c = d.binary_op(Pc(0), BinOp::Div, Val::int(1, 10), Val::int(2, 3));
        assert!(!c.may_throw());

        let c = d.binary_op(Pc(0), BinOp::Div, Val::int(1, 10), Val::int(0, 0));
        assert!(!c.returns_normally());
    }

    #[test]
    fn branch_verdicts_follow_intervals_and_nullness() {
        let mut d = TypeDomain::new();
        assert_eq!(d.test_if(Pc(0), IfCond::Lt, &Val::int(-5, -1)), Answer::Yes);
        assert_eq!(d.test_if(Pc(0), IfCond::Lt, &Val::int(0, 4)), Answer::No);
        assert_eq!(
            d.test_if(Pc(0), IfCond::Eq, &Val::int(-1, 1)),
            Answer::Unknown
        );
        assert_eq!(d.test_if(Pc(0), IfCond::Eq, &Val::Null), Answer::Yes);
        assert_eq!(
            d.test_if(Pc(0), IfCond::Eq, &Val::reference(hierarchy::OBJECT)),
            Answer::No
        );
        assert_eq!(
            d.test_if(Pc(0), IfCond::Eq, &Val::nullable(hierarchy::OBJECT)),
            Answer::Unknown
        );
    }
}
