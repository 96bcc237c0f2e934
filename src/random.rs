//! The randomization primitives every expansion order is built from.
//!
//! All randomness flows through one [`Entropy`] source per expansion, so a
//! seeded generator reproduces an order exactly and [`Ordered`] removes the
//! randomness entirely.

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::expansion::Count;

/// A source of uniformly distributed integers.
pub trait Entropy {
    /// A uniformly chosen integer in `0..bound`. Returns 0 when `bound <= 1`.
    fn below(&mut self, bound: u128) -> u128;
}

impl<R: RngCore> Entropy for R {
    fn below(&mut self, bound: u128) -> u128 {
        if bound <= 1 {
            return 0;
        }
        self.gen_range(0..bound)
    }
}

/// Entropy that always answers 0.
///
/// Shuffles keep their input order and weighted choices take the first
/// candidate with a non-zero weight, so expansions come out in canonical
/// order: classes in universe order, alternatives left to right.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ordered;

impl Entropy for Ordered {
    fn below(&mut self, _bound: u128) -> u128 {
        0
    }
}

/// Entropy shared by every lazy sequence of one expansion.
pub type SharedEntropy = Rc<RefCell<dyn Entropy>>;

pub(crate) fn seeded(seed: u64) -> SharedEntropy {
    Rc::new(RefCell::new(Pcg64Mcg::seed_from_u64(seed)))
}

pub(crate) fn from_entropy() -> SharedEntropy {
    Rc::new(RefCell::new(Pcg64Mcg::from_entropy()))
}

pub(crate) fn ordered() -> SharedEntropy {
    Rc::new(RefCell::new(Ordered))
}

/// Fisher-Yates shuffle: every permutation of `items` is equally likely.
pub fn shuffle<T>(entropy: &mut dyn Entropy, items: &mut [T]) {
    let len = items.len();
    for i in 0..len.saturating_sub(1) {
        let j = i + entropy.below((len - i) as u128) as usize;
        items.swap(i, j);
    }
}

/// Choose an index with probability proportional to its weight.
///
/// Returns `None` when every weight is zero.
///
/// # Implementation Details
///
/// Exact weights are walked in `u128`. Once a weight is only approximate,
/// or the exact total overflows, the walk happens in `f64` with 53 bits of
/// resolution. Infinite weights dominate every other one, so when any are
/// present the choice is uniform among them.
pub fn weighted_index(entropy: &mut dyn Entropy, weights: &[Count]) -> Option<usize> {
    let infinite: Vec<usize> = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w == Count::Infinite)
        .map(|(i, _)| i)
        .collect();
    if !infinite.is_empty() {
        let pick = entropy.below(infinite.len() as u128) as usize;
        return Some(infinite[pick]);
    }

    let exact = weights
        .iter()
        .map(|w| w.finite())
        .collect::<Option<Vec<u128>>>();
    let Some(exact) = exact else {
        return approximate_index(entropy, weights);
    };
    match exact.iter().try_fold(0u128, |total, &w| total.checked_add(w)) {
        Some(0) => None,
        Some(total) => {
            let mut r = entropy.below(total);
            for (i, &w) in exact.iter().enumerate() {
                if r < w {
                    return Some(i);
                }
                r -= w;
            }
            None
        }
        None => approximate_index(entropy, weights),
    }
}

fn approximate_index(entropy: &mut dyn Entropy, weights: &[Count]) -> Option<usize> {
    const RESOLUTION: u128 = 1 << 53;
    let total: f64 = weights.iter().map(|w| w.as_f64()).sum();
    if total <= 0.0 {
        return None;
    }
    let r = entropy.below(RESOLUTION) as f64 / RESOLUTION as f64 * total;
    let mut cumulative = 0.0;
    let mut last = None;
    for (i, w) in weights.iter().enumerate() {
        if w.is_zero() {
            continue;
        }
        cumulative += w.as_f64();
        if r < cumulative {
            return Some(i);
        }
        last = Some(i);
    }
    // rounding can leave r at the very top of the range
    last
}
