//! Saturating integer intervals over extended bounds.

use sable_ai::Answer;
use sable_code::IfCond;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    NegInf,
    Finite(i64),
    PosInf,
}

impl Bound {
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, b) | (b, Bound::PosInf) => b,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.min(b)),
        }
    }

    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::NegInf, b) | (b, Bound::NegInf) => b,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.max(b)),
        }
    }

    pub fn less_than(self, other: Self) -> bool {
        match (self, other) {
            (Bound::NegInf, Bound::NegInf) => false,
            (Bound::NegInf, _) => true,
            (_, Bound::NegInf) => false,
            (Bound::PosInf, _) => false,
            (_, Bound::PosInf) => true,
            (Bound::Finite(a), Bound::Finite(b)) => a < b,
        }
    }

    pub fn less_eq(self, other: Self) -> bool {
        self == other || self.less_than(other)
    }

    fn saturating_add(self, other: Self) -> Self {
        match (self, other) {
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_add(b)),
        }
    }

    fn saturating_mul(self, other: Self) -> Self {
        match (self, other) {
            (Bound::Finite(0), _) | (_, Bound::Finite(0)) => Bound::Finite(0),
            (Bound::NegInf, Bound::NegInf) | (Bound::PosInf, Bound::PosInf) => Bound::PosInf,
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => Bound::NegInf,
            (Bound::NegInf, Bound::Finite(b)) | (Bound::Finite(b), Bound::NegInf) => {
                if b > 0 {
                    Bound::NegInf
                } else {
                    Bound::PosInf
                }
            }
            (Bound::PosInf, Bound::Finite(b)) | (Bound::Finite(b), Bound::PosInf) => {
                if b > 0 {
                    Bound::PosInf
                } else {
                    Bound::NegInf
                }
            }
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_mul(b)),
        }
    }

    fn negate(self) -> Self {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::PosInf => Bound::NegInf,
            Bound::Finite(v) => Bound::Finite(v.saturating_neg()),
        }
    }
}

/// A non-empty interval `[lo, hi]` of integers.
///
/// Unreachable states are never stored by the engine, so unlike a full
/// lattice there is no bottom element here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub lo: Bound,
    pub hi: Bound,
}

impl Interval {
    pub fn new(lo: i64, hi: i64) -> Self {
        debug_assert!(lo <= hi);
        Interval {
            lo: Bound::Finite(lo),
            hi: Bound::Finite(hi),
        }
    }

    pub fn constant(v: i64) -> Self {
        Interval::new(v, v)
    }

    pub fn top() -> Self {
        Interval {
            lo: Bound::NegInf,
            hi: Bound::PosInf,
        }
    }

    pub fn as_constant(&self) -> Option<i64> {
        match (self.lo, self.hi) {
            (Bound::Finite(a), Bound::Finite(b)) if a == b => Some(a),
            _ => None,
        }
    }

    /// Width `hi - lo`, or `None` when a bound is infinite.
    pub fn width(&self) -> Option<i64> {
        match (self.lo, self.hi) {
            (Bound::Finite(lo), Bound::Finite(hi)) => Some(hi.saturating_sub(lo)),
            _ => None,
        }
    }

    pub fn contains(&self, v: i64) -> bool {
        self.lo.less_eq(Bound::Finite(v)) && Bound::Finite(v).less_eq(self.hi)
    }

    pub fn join(&self, other: &Self) -> Self {
        Interval {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Interval {
            lo: self.lo.saturating_add(other.lo),
            hi: self.hi.saturating_add(other.hi),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    pub fn mul(&self, other: &Self) -> Self {
        let products = [
            self.lo.saturating_mul(other.lo),
            self.lo.saturating_mul(other.hi),
            self.hi.saturating_mul(other.lo),
            self.hi.saturating_mul(other.hi),
        ];
        Interval {
            lo: products.iter().copied().fold(Bound::PosInf, Bound::min),
            hi: products.iter().copied().fold(Bound::NegInf, Bound::max),
        }
    }

    pub fn negate(&self) -> Self {
        Interval {
            lo: self.hi.negate(),
            hi: self.lo.negate(),
        }
    }

    /// Three-valued comparison of this interval against `other`.
    pub fn compare(&self, cond: IfCond, other: &Self) -> Answer {
        match cond {
            IfCond::Eq => {
                if let (Some(a), Some(b)) = (self.as_constant(), other.as_constant()) {
                    return Answer::from(a == b);
                }
                if self.hi.less_than(other.lo) || other.hi.less_than(self.lo) {
                    Answer::No
                } else {
                    Answer::Unknown
                }
            }
            IfCond::Ne => self.compare(IfCond::Eq, other).negate(),
            IfCond::Lt => {
                if self.hi.less_than(other.lo) {
                    Answer::Yes
                } else if other.hi.less_eq(self.lo) {
                    Answer::No
                } else {
                    Answer::Unknown
                }
            }
            IfCond::Le => {
                if self.hi.less_eq(other.lo) {
                    Answer::Yes
                } else if other.hi.less_than(self.lo) {
                    Answer::No
                } else {
                    Answer::Unknown
                }
            }
            IfCond::Gt => other.compare(IfCond::Lt, self),
            IfCond::Ge => other.compare(IfCond::Le, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_widens_both_ends() {
        let a = Interval::new(0, 3);
        let b = Interval::new(-2, 1);
        assert_eq!(a.join(&b), Interval::new(-2, 3));
    }

    #[test]
    fn arithmetic_saturates() {
        let big = Interval::new(i64::MAX - 1, i64::MAX);
        assert_eq!(big.add(&big).hi, Bound::Finite(i64::MAX));
        assert_eq!(
            Interval::top().mul(&Interval::constant(0)),
            Interval::constant(0)
        );
    }

    #[test]
    fn comparison_verdicts() {
        let small = Interval::new(0, 2);
        let large = Interval::new(3, 9);
        assert_eq!(small.compare(IfCond::Lt, &large), Answer::Yes);
        assert_eq!(large.compare(IfCond::Lt, &small), Answer::No);
        assert_eq!(small.compare(IfCond::Eq, &large), Answer::No);
        let overlap = Interval::new(1, 5);
        assert_eq!(small.compare(IfCond::Lt, &overlap), Answer::Unknown);
        assert_eq!(
            Interval::constant(4).compare(IfCond::Eq, &Interval::constant(4)),
            Answer::Yes
        );
    }
}
