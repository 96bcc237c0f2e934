//! The traversal that turns a normalized tree into an [`Expansion`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{
    Backreference, Char, CharKind, CharacterClass, Flags, Group, Node, QuantifierKind, Repetition,
};
use crate::chars;
use crate::combine::{merge, permute, permute_repeat};
use crate::error::Error;
use crate::expansion::{Count, Expansion};
use crate::random::{shuffle, SharedEntropy};

/// The upper bound that replaces an unbounded quantifier like `*` or `{2,}`.
pub const REPETITION_CAP: u32 = 100;

/// What a backreference produces when its group has not produced a value.
pub const UNSET_BACKREFERENCE: &str = "undefined";

/// The most recent value produced by each capturing group.
///
/// One table lives for exactly one call to [`Expander::expand`] and is
/// shared by every sequence that call creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    numbered: HashMap<u32, String>,
    named: HashMap<String, String>,
}

impl Captures {
    fn record(&mut self, number: Option<u32>, name: Option<&str>, value: &str) {
        if let Some(number) = number {
            self.numbered.insert(number, value.to_owned());
        }
        if let Some(name) = name {
            self.named.insert(name.to_owned(), value.to_owned());
        }
    }

    fn lookup(&self, reference: &Backreference) -> String {
        let value = match reference {
            Backreference::Number(number) => self.numbered.get(number),
            Backreference::Name(name) => self.named.get(name),
        };
        value.map_or_else(|| UNSET_BACKREFERENCE.to_owned(), String::clone)
    }
}

/// Expands the nodes of one normalized tree.
///
/// # Note
///
/// Every node kind maps to exactly one expansion rule. Meta characters,
/// decimal escapes and shorthand quantifiers must have been rewritten by
/// [`normalize`](crate::normalize::normalize) first; meeting one here is an
/// [`Error::Internal`].
pub struct Expander {
    flags: Flags,
    captures: Rc<RefCell<Captures>>,
    entropy: SharedEntropy,
}

impl Expander {
    pub fn new(flags: Flags, entropy: SharedEntropy) -> Self {
        Self {
            flags,
            captures: Rc::default(),
            entropy,
        }
    }

    /// Expand one node. A missing node (an empty body, group or alternative)
    /// matches only the empty string.
    pub fn expand(&self, node: Option<&Node>) -> Result<Expansion, Error> {
        let Some(node) = node else {
            return Ok(Expansion::blank());
        };
        match node {
            Node::Char(c) => self.expand_char(c),
            Node::CharacterClass(class) => Ok(self.expand_class(class)),
            Node::Alternative(nodes) => self.expand_alternative(nodes),
            Node::Disjunction(left, right) => {
                let sources = vec![self.expand(left.as_deref())?, self.expand(right.as_deref())?];
                Ok(merge(self.entropy.clone(), self.captures.clone(), sources))
            }
            Node::Group(group) => self.expand_group(group),
            Node::Backreference(reference) => Ok(self.expand_backreference(reference)),
            Node::Repetition(repetition) => self.expand_repetition(repetition),
            // zero-width: lookaround bodies are never expanded
            Node::Assertion(_) => Ok(Expansion::blank()),
        }
    }

    fn expand_char(&self, c: &Char) -> Result<Expansion, Error> {
        match c.kind {
            CharKind::Meta(_) => {
                return Err(Error::Internal(format!(
                    "meta character {c} was not rewritten as a character class"
                )))
            }
            CharKind::Decimal => {
                return Err(Error::Internal(format!(
                    "decimal escape {c} was not rewritten as a character"
                )))
            }
            _ => {}
        }
        // a lone surrogate cannot appear in a string
        let Some(c) = c.as_char() else {
            return Ok(Expansion::empty());
        };
        if self.flags.ignore_case {
            Ok(self.shuffled(chars::case_variants(c).into_iter().collect()))
        } else {
            Ok(Expansion::from_values(vec![c.to_string()]))
        }
    }

    fn expand_class(&self, class: &CharacterClass) -> Expansion {
        self.shuffled(chars::class_members(class, self.flags.ignore_case))
    }

    fn expand_alternative(&self, nodes: &[Node]) -> Result<Expansion, Error> {
        let parts = nodes
            .iter()
            .map(|node| self.expand(Some(node)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(permute(self.entropy.clone(), self.captures.clone(), parts))
    }

    /// A capturing group records each value before yielding it, so anything
    /// pulled after it in the same expansion can refer back to it.
    fn expand_group(&self, group: &Group) -> Result<Expansion, Error> {
        let inner = self.expand(group.expression.as_deref())?;
        if group.number.is_none() && group.name.is_none() {
            return Ok(inner);
        }

        let number = group.number;
        let name: Option<Rc<str>> = group.name.as_deref().map(Rc::from);
        let captures = self.captures.clone();
        Ok(Expansion::new(inner.count(), move || {
            let name = name.clone();
            let captures = captures.clone();
            Box::new(inner.iter().inspect(move |value| {
                captures.borrow_mut().record(number, name.as_deref(), value);
            }))
        }))
    }

    /// The group value is looked up when the reference is pulled, not when
    /// its sequence is created.
    fn expand_backreference(&self, reference: &Backreference) -> Expansion {
        let reference = reference.clone();
        let captures = self.captures.clone();
        Expansion::new(Count::ONE, move || {
            let reference = reference.clone();
            let captures = captures.clone();
            Box::new(std::iter::once_with(move || {
                captures.borrow().lookup(&reference)
            }))
        })
    }

    /// Every occurrence count in `from..=to` is a separate source, and `k`
    /// occurrences are the repeated node `k` times in a row.
    fn expand_repetition(&self, repetition: &Repetition) -> Result<Expansion, Error> {
        let QuantifierKind::Range { from, to } = repetition.quantifier.kind else {
            return Err(Error::Internal(format!(
                "quantifier {} was not rewritten as a range",
                repetition.quantifier
            )));
        };
        let to = to.unwrap_or(REPETITION_CAP.max(from));

        let once = self.expand(Some(&repetition.expression))?;
        let sources = (from..=to)
            .map(|occurrences| {
                permute_repeat(
                    self.entropy.clone(),
                    self.captures.clone(),
                    once.clone(),
                    occurrences as usize,
                )
            })
            .collect();
        Ok(merge(self.entropy.clone(), self.captures.clone(), sources))
    }

    /// A fixed set of values, reshuffled every time a sequence starts.
    fn shuffled(&self, values: Vec<String>) -> Expansion {
        let values: Rc<[String]> = values.into();
        let entropy = self.entropy.clone();
        Expansion::new(values.len().into(), move || {
            let mut order = values.to_vec();
            shuffle(&mut *entropy.borrow_mut(), &mut order);
            Box::new(order.into_iter())
        })
    }
}
