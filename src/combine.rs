//! Combining several expansions into one without materializing any of them.
//!
//! [`merge`] produces the union of its sources (alternation, and the
//! different repetition counts of a quantifier). [`permute`] produces their
//! ordered concatenation (a sequence of terms, and `k` copies of a repeated
//! term).

use std::cell::RefCell;
use std::rc::Rc;

use crate::expander::Captures;
use crate::expansion::{Count, Expansion, Sequence};
use crate::random::{shuffle, weighted_index, SharedEntropy};

/// Every value of every source.
///
/// # Implementation Details
///
/// Each pull picks a source that still has values, weighted by how many it
/// has left, so small sources are not drained first and large ones are not
/// starved. A source's sequence is only started the first time it is picked.
///
/// Sources are alternatives to one another: each one sees the capture table
/// as it stood when the merged sequence started, never a group value left
/// behind by a sibling.
pub fn merge(
    entropy: SharedEntropy,
    captures: Rc<RefCell<Captures>>,
    sources: Vec<Expansion>,
) -> Expansion {
    let mut sources: Vec<Expansion> = sources
        .into_iter()
        .filter(|source| !source.count().is_zero())
        .collect();
    if sources.len() <= 1 {
        return sources.pop().unwrap_or_else(Expansion::empty);
    }

    let count = sources.iter().map(Expansion::count).sum();
    let sources: Rc<[Expansion]> = sources.into();
    Expansion::new(count, move || {
        Box::new(Merge::new(entropy.clone(), captures.clone(), &sources)) as Sequence
    })
}

struct Merge {
    entropy: SharedEntropy,
    captures: Rc<RefCell<Captures>>,
    base: Captures,
    live: Vec<Source>,
}

struct Source {
    expansion: Expansion,
    sequence: Option<Sequence>,
    remaining: Count,
}

impl Merge {
    fn new(
        entropy: SharedEntropy,
        captures: Rc<RefCell<Captures>>,
        sources: &[Expansion],
    ) -> Self {
        let mut live: Vec<Source> = sources
            .iter()
            .map(|expansion| Source {
                expansion: expansion.clone(),
                sequence: None,
                remaining: expansion.count(),
            })
            .collect();
        shuffle(&mut *entropy.borrow_mut(), &mut live);
        let base = captures.borrow().clone();
        Self {
            entropy,
            captures,
            base,
            live,
        }
    }
}

impl Iterator for Merge {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let weights: Vec<Count> = self.live.iter().map(|s| s.remaining).collect();
            let index = weighted_index(&mut *self.entropy.borrow_mut(), &weights)?;

            self.captures.borrow_mut().clone_from(&self.base);
            let source = &mut self.live[index];
            let sequence = source
                .sequence
                .get_or_insert_with(|| source.expansion.iter());
            match sequence.next() {
                Some(value) => {
                    source.remaining = source.remaining.decrement();
                    if source.remaining.is_zero() {
                        self.live.remove(index);
                    }
                    return Some(value);
                }
                // only reachable for approximate or capped counts
                None => {
                    self.live.remove(index);
                }
            }
        }
    }
}

/// Every concatenation of one value from each part, in part order.
///
/// # Implementation Details
///
/// Values of the first part are drawn lazily. Each drawn value opens a
/// branch that walks the permutation of the remaining parts behind it. Every
/// pull chooses between the open branches (weighted by what they have left)
/// and opening a new one (weighted by everything not yet opened), so the
/// order is unbiased while only the open branches are held in memory.
///
/// A branch also remembers the capture table as it stood when its first
/// value was drawn, and puts it back before each pull, so a backreference
/// in a later part always sees the group value of its own prefix.
pub fn permute(
    entropy: SharedEntropy,
    captures: Rc<RefCell<Captures>>,
    parts: Vec<Expansion>,
) -> Expansion {
    permutation(entropy, captures, Parts::List(parts.into()))
}

/// `times` values of `part` in a row, as [`permute`] would produce them from
/// `times` copies of it.
pub fn permute_repeat(
    entropy: SharedEntropy,
    captures: Rc<RefCell<Captures>>,
    part: Expansion,
    times: usize,
) -> Expansion {
    permutation(entropy, captures, Parts::Repeat { part, times })
}

fn permutation(entropy: SharedEntropy, captures: Rc<RefCell<Captures>>, parts: Parts) -> Expansion {
    let count = parts.count_from(0);
    if count.is_zero() {
        return Expansion::empty();
    }
    match parts.len() {
        0 => return Expansion::blank(),
        1 => return parts.get(0).clone(),
        _ => {}
    }

    Expansion::new(count, move || {
        Box::new(Permutation::new(
            entropy.clone(),
            captures.clone(),
            parts.clone(),
            0,
        )) as Sequence
    })
}

/// The parts of a permutation: listed one by one, or a single part repeated.
#[derive(Clone)]
enum Parts {
    List(Rc<[Expansion]>),
    Repeat { part: Expansion, times: usize },
}

impl Parts {
    fn len(&self) -> usize {
        match self {
            Parts::List(parts) => parts.len(),
            Parts::Repeat { times, .. } => *times,
        }
    }

    fn get(&self, index: usize) -> &Expansion {
        match self {
            Parts::List(parts) => &parts[index],
            Parts::Repeat { part, .. } => part,
        }
    }

    /// How many strings the parts from `start` on produce together.
    fn count_from(&self, start: usize) -> Count {
        match self {
            Parts::List(parts) => parts[start..].iter().map(Expansion::count).product(),
            Parts::Repeat { part, times } => {
                let remaining = times.saturating_sub(start);
                match u32::try_from(remaining) {
                    Ok(exp) => part.count().pow(exp),
                    Err(_) => (0..remaining).map(|_| part.count()).product(),
                }
            }
        }
    }
}

struct Permutation {
    entropy: SharedEntropy,
    captures: Rc<RefCell<Captures>>,
    parts: Parts,
    /// Index of the head part in `parts`.
    start: usize,
    /// The capture table as it stood when this sequence started.
    base: Captures,
    head: Sequence,
    head_remaining: Count,
    tail_count: Count,
    branches: Vec<Branch>,
}

struct Branch {
    prefix: String,
    rest: Sequence,
    remaining: Count,
    captures: Captures,
}

impl Permutation {
    fn new(
        entropy: SharedEntropy,
        captures: Rc<RefCell<Captures>>,
        parts: Parts,
        start: usize,
    ) -> Self {
        let head = parts.get(start).iter();
        let head_remaining = parts.get(start).count();
        let tail_count = parts.count_from(start + 1);
        let base = captures.borrow().clone();
        Self {
            entropy,
            captures,
            parts,
            start,
            base,
            head,
            head_remaining,
            tail_count,
            branches: vec![],
        }
    }

    fn rest(&self) -> Sequence {
        let next = self.start + 1;
        if next + 1 == self.parts.len() {
            self.parts.get(next).iter()
        } else {
            Box::new(Permutation::new(
                self.entropy.clone(),
                self.captures.clone(),
                self.parts.clone(),
                next,
            ))
        }
    }

    fn open_branch(&mut self) -> bool {
        self.captures.borrow_mut().clone_from(&self.base);
        let Some(prefix) = self.head.next() else {
            self.head_remaining = Count::ZERO;
            return false;
        };
        self.head_remaining = self.head_remaining.decrement();
        let captures = self.captures.borrow().clone();
        let rest = self.rest();
        self.branches.push(Branch {
            prefix,
            rest,
            remaining: self.tail_count,
            captures,
        });
        true
    }
}

impl Iterator for Permutation {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let mut weights: Vec<Count> = self.branches.iter().map(|b| b.remaining).collect();
            weights.push(self.head_remaining * self.tail_count);
            let index = weighted_index(&mut *self.entropy.borrow_mut(), &weights)?;

            if index == self.branches.len() && !self.open_branch() {
                continue;
            }

            let branch = &mut self.branches[index];
            self.captures.borrow_mut().clone_from(&branch.captures);
            match branch.rest.next() {
                Some(suffix) => {
                    let value = format!("{}{suffix}", branch.prefix);
                    branch.remaining = branch.remaining.decrement();
                    if branch.remaining.is_zero() {
                        self.branches.remove(index);
                    }
                    return Some(value);
                }
                None => {
                    self.branches.remove(index);
                }
            }
        }
    }
}
