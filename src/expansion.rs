use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, Mul};
use std::rc::Rc;

/// A lazily produced run of strings.
pub type Sequence = Box<dyn Iterator<Item = String>>;

/// The number of strings a pattern matches.
///
/// Counts are exact while they fit in a `u128`. Past that they are carried as
/// an `f64` approximation, and only a value too large even for that becomes
/// [`Count::Infinite`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Count {
    Finite(u128),
    /// Larger than `u128::MAX`, known to `f64` precision.
    Approx(f64),
    Infinite,
}

impl Default for Count {
    fn default() -> Self {
        Count::ZERO
    }
}

impl Count {
    pub const ZERO: Count = Count::Finite(0);
    pub const ONE: Count = Count::Finite(1);

    pub fn is_zero(self) -> bool {
        self == Count::ZERO
    }

    /// The exact value, if there is one.
    pub fn finite(self) -> Option<u128> {
        match self {
            Count::Finite(n) => Some(n),
            Count::Approx(_) | Count::Infinite => None,
        }
    }

    /// The result of arithmetic that no longer fits a `u128`.
    fn approx(value: f64) -> Count {
        if value.is_finite() {
            Count::Approx(value)
        } else {
            Count::Infinite
        }
    }

    /// `self` raised to `exp`.
    pub fn pow(self, exp: u32) -> Count {
        // 0 repetitions of anything is only the empty string
        if exp == 0 {
            return Count::ONE;
        }
        match self {
            Count::Finite(n) => n
                .checked_pow(exp)
                .map_or_else(|| Count::approx((n as f64).powf(exp as f64)), Count::Finite),
            Count::Approx(x) => Count::approx(x.powf(exp as f64)),
            Count::Infinite => Count::Infinite,
        }
    }

    /// One less, never below zero. An approximate or capped value is left
    /// as it is.
    pub fn decrement(self) -> Count {
        match self {
            Count::Finite(n) => Count::Finite(n.saturating_sub(1)),
            other => other,
        }
    }

    /// Approximate value, for weighting choices between huge counts.
    pub fn as_f64(self) -> f64 {
        match self {
            Count::Finite(n) => n as f64,
            Count::Approx(x) => x,
            Count::Infinite => f64::INFINITY,
        }
    }
}

impl From<u128> for Count {
    fn from(n: u128) -> Self {
        Count::Finite(n)
    }
}

impl From<usize> for Count {
    fn from(n: usize) -> Self {
        Count::Finite(n as u128)
    }
}

impl Add for Count {
    type Output = Count;

    fn add(self, rhs: Count) -> Count {
        match (self, rhs) {
            (Count::Infinite, _) | (_, Count::Infinite) => Count::Infinite,
            (Count::Finite(a), Count::Finite(b)) => a
                .checked_add(b)
                .map_or_else(|| Count::approx(a as f64 + b as f64), Count::Finite),
            (a, b) => Count::approx(a.as_f64() + b.as_f64()),
        }
    }
}

impl Mul for Count {
    type Output = Count;

    fn mul(self, rhs: Count) -> Count {
        match (self, rhs) {
            (Count::Finite(0), _) | (_, Count::Finite(0)) => Count::ZERO,
            (Count::Infinite, _) | (_, Count::Infinite) => Count::Infinite,
            (Count::Finite(a), Count::Finite(b)) => a
                .checked_mul(b)
                .map_or_else(|| Count::approx(a as f64 * b as f64), Count::Finite),
            (a, b) => Count::approx(a.as_f64() * b.as_f64()),
        }
    }
}

impl Sum for Count {
    fn sum<I: Iterator<Item = Count>>(iter: I) -> Count {
        iter.fold(Count::ZERO, Add::add)
    }
}

impl Product for Count {
    fn product<I: Iterator<Item = Count>>(iter: I) -> Count {
        iter.fold(Count::ONE, Mul::mul)
    }
}

impl PartialEq<u128> for Count {
    fn eq(&self, other: &u128) -> bool {
        *self == Count::Finite(*other)
    }
}

/// Plain digits below `1e30`, scientific notation from there on.
impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Count::Finite(n) if (n as f64) < 1e30 => write!(f, "{n}"),
            Count::Finite(n) => write!(f, "{:e}", n as f64),
            Count::Approx(x) => write!(f, "{x:e}"),
            Count::Infinite => f.write_str("Infinity"),
        }
    }
}

/// Every string matched by a pattern (or by one node of it): how many there
/// are, and a way to produce them.
///
/// # Note
///
/// Producing is restartable. Each call to [`iter`](Expansion::iter) starts an
/// independent sequence that, run to completion, yields exactly
/// [`count`](Expansion::count) strings. The multiset is always the same, the
/// order usually differs between calls.
#[derive(Clone)]
pub struct Expansion {
    count: Count,
    factory: Rc<dyn Fn() -> Sequence>,
}

impl Expansion {
    pub fn new(count: Count, factory: impl Fn() -> Sequence + 'static) -> Self {
        Self {
            count,
            factory: Rc::new(factory),
        }
    }

    /// Matches only the empty string.
    pub fn blank() -> Self {
        Self::new(Count::ONE, || Box::new(std::iter::once(String::new())))
    }

    /// Matches nothing at all.
    pub fn empty() -> Self {
        Self::new(Count::ZERO, || Box::new(std::iter::empty()))
    }

    /// A fixed list of strings, produced in the given order.
    pub fn from_values(values: Vec<String>) -> Self {
        let values: Rc<[String]> = values.into();
        Self::new(values.len().into(), move || {
            let values = values.clone();
            Box::new((0..values.len()).map(move |i| values[i].clone()))
        })
    }

    pub fn count(&self) -> Count {
        self.count
    }

    /// Start a fresh sequence of the matched strings.
    pub fn iter(&self) -> Sequence {
        if self.count.is_zero() {
            return Box::new(std::iter::empty());
        }
        (self.factory)()
    }
}

impl fmt::Debug for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expansion")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl IntoIterator for &Expansion {
    type Item = String;
    type IntoIter = Sequence;

    fn into_iter(self) -> Sequence {
        self.iter()
    }
}
