use smallvec::SmallVec;

/// The abstract exceptions raised by one domain operation.
pub type Exceptions<V> = SmallVec<[V; 2]>;

/// Outcome of a domain operation: it may return normally, raise abstract
/// exceptions, or both; the two are independent.
///
/// `R` is `()` for effect-only operations (stores, monitor operations)
/// and `Option<V>` for calls to void methods.
#[derive(Clone, Debug)]
pub enum Computation<R, V> {
    /// The operation completes normally.
    Result(R),
    /// The operation never completes normally.
    Throws(Exceptions<V>),
    /// The operation may complete normally or raise.
    ResultOrThrows(R, Exceptions<V>),
}

impl<R, V> Computation<R, V> {
    pub fn throws(exception: V) -> Self {
        Computation::Throws(SmallVec::from_iter([exception]))
    }

    pub fn returns_normally(&self) -> bool {
        matches!(self, Computation::Result(_) | Computation::ResultOrThrows(..))
    }

    pub fn may_throw(&self) -> bool {
        matches!(self, Computation::Throws(_) | Computation::ResultOrThrows(..))
    }

    /// Split into the normal result (if any) and the raised exceptions.
    pub fn into_parts(self) -> (Option<R>, Exceptions<V>) {
        match self {
            Computation::Result(r) => (Some(r), SmallVec::new()),
            Computation::Throws(x) => (None, x),
            Computation::ResultOrThrows(r, x) => (Some(r), x),
        }
    }
}
