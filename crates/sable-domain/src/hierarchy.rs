//! A single-inheritance type hierarchy over opaque [`TypeRef`]s.

use rustc_hash::FxHashMap;
use sable_ai::Answer;
use sable_code::TypeRef;

pub const OBJECT: TypeRef = TypeRef(0);
pub const THROWABLE: TypeRef = TypeRef(1);
pub const RUNTIME_EXCEPTION: TypeRef = TypeRef(2);
pub const NULL_POINTER_EXCEPTION: TypeRef = TypeRef(3);
pub const ARITHMETIC_EXCEPTION: TypeRef = TypeRef(4);
pub const CLASS_CAST_EXCEPTION: TypeRef = TypeRef(5);
pub const INDEX_OUT_OF_BOUNDS_EXCEPTION: TypeRef = TypeRef(6);
pub const ARRAY_STORE_EXCEPTION: TypeRef = TypeRef(7);
pub const NEGATIVE_ARRAY_SIZE_EXCEPTION: TypeRef = TypeRef(8);
pub const ILLEGAL_MONITOR_STATE_EXCEPTION: TypeRef = TypeRef(9);

/// Maps each declared type to its direct supertype; `OBJECT` is the root.
#[derive(Clone, Debug, Default)]
pub struct TypeHierarchy {
    parents: FxHashMap<TypeRef, TypeRef>,
}

impl TypeHierarchy {
    /// An empty hierarchy containing only `OBJECT`.
    pub fn new() -> Self {
        TypeHierarchy::default()
    }

    /// A hierarchy preloaded with the throwable types the engine can
    /// synthesize implicitly.
    pub fn with_throwables() -> Self {
        let mut h = TypeHierarchy::new();
        h.declare(THROWABLE, OBJECT);
        h.declare(RUNTIME_EXCEPTION, THROWABLE);
        for t in [
            NULL_POINTER_EXCEPTION,
            ARITHMETIC_EXCEPTION,
            CLASS_CAST_EXCEPTION,
            INDEX_OUT_OF_BOUNDS_EXCEPTION,
            ARRAY_STORE_EXCEPTION,
            NEGATIVE_ARRAY_SIZE_EXCEPTION,
            ILLEGAL_MONITOR_STATE_EXCEPTION,
        ] {
            h.declare(t, RUNTIME_EXCEPTION);
        }
        h
    }

    pub fn declare(&mut self, subtype: TypeRef, supertype: TypeRef) {
        self.parents.insert(subtype, supertype);
    }

    fn is_ancestor(&self, supertype: TypeRef, mut t: TypeRef) -> bool {
        loop {
            if t == supertype {
                return true;
            }
            match self.parents.get(&t) {
                Some(&p) => t = p,
                None => return supertype == OBJECT && t == OBJECT,
            }
        }
    }

    /// Whether a value bounded above by `bound` is a subtype of
    /// `supertype`. `Yes` when every type under the bound qualifies,
    /// `No` when the two branches are disjoint, `Unknown` when the
    /// runtime type could fall either way.
    pub fn subtype_verdict(&self, bound: TypeRef, supertype: TypeRef) -> Answer {
        if supertype == OBJECT || self.is_ancestor(supertype, bound) {
            Answer::Yes
        } else if self.is_ancestor(bound, supertype) {
            Answer::Unknown
        } else {
            Answer::No
        }
    }

    /// Least common ancestor of two types.
    pub fn lub(&self, a: TypeRef, b: TypeRef) -> TypeRef {
        let mut seen = vec![a];
        let mut t = a;
        while let Some(&p) = self.parents.get(&t) {
            seen.push(p);
            t = p;
        }
        let mut t = b;
        loop {
            if seen.contains(&t) {
                return t;
            }
            match self.parents.get(&t) {
                Some(&p) => t = p,
                None => return OBJECT,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throwables_are_runtime_exceptions() {
        let h = TypeHierarchy::with_throwables();
        assert_eq!(
            h.subtype_verdict(NULL_POINTER_EXCEPTION, RUNTIME_EXCEPTION),
            Answer::Yes
        );
        assert_eq!(
            h.subtype_verdict(NULL_POINTER_EXCEPTION, ARITHMETIC_EXCEPTION),
            Answer::No
        );
        assert_eq!(
            h.subtype_verdict(THROWABLE, RUNTIME_EXCEPTION),
            Answer::Unknown
        );
    }

    #[test]
    fn lub_meets_at_the_common_ancestor() {
        let h = TypeHierarchy::with_throwables();
        assert_eq!(
            h.lub(NULL_POINTER_EXCEPTION, CLASS_CAST_EXCEPTION),
            RUNTIME_EXCEPTION
        );
        assert_eq!(h.lub(THROWABLE, NULL_POINTER_EXCEPTION), THROWABLE);
        assert_eq!(h.lub(OBJECT, ARITHMETIC_EXCEPTION), OBJECT);
    }
}
