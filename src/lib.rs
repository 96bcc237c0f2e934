//! Count and expand every string a regular expression matches.
//!
//! ```
//! let strings = regex_strings::expand_all("[ab]c{1,2}")?;
//! assert_eq!(strings.len(), 4);
//! assert_eq!(regex_strings::count(r"/\d{3}/")?, 1000);
//! # Ok::<(), regex_strings::Error>(())
//! ```
//!
//! Patterns use ECMAScript syntax. Text that looks like a regular expression
//! literal (`/body/flags`) is read as one, anything else is taken to be a
//! pattern body.
//!
//! # Note
//!
//! Unbounded quantifiers are capped at [`REPETITION_CAP`] occurrences, and
//! "any character" means any character of a fixed catalogue of a few hundred
//! (ASCII, Latin-1 and the Windows-1252 display characters). Even so, counts
//! grow quickly: check [`count`] before collecting everything with
//! [`expand_all`].

use std::sync::OnceLock;

use log::debug;
use regex_automata::meta::Regex;

pub mod ast;
mod chars;
mod combine;
mod error;
mod expander;
mod expansion;
mod normalize;
pub mod parser;
mod random;

pub use ast::{Flags, RegExp};
pub use error::Error;
pub use expander::{REPETITION_CAP, UNSET_BACKREFERENCE};
pub use expansion::{Count, Expansion, Sequence};

/// A pattern to expand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern<'a> {
    /// No pattern at all. Matches nothing.
    Null,
    /// Either a `/body/flags` literal or a bare pattern body.
    Text(&'a str),
    /// An already parsed expression, used as it is.
    Regex(RegExp),
}

impl<'a> From<&'a str> for Pattern<'a> {
    fn from(text: &'a str) -> Self {
        Pattern::Text(text)
    }
}

impl<'a> From<&'a String> for Pattern<'a> {
    fn from(text: &'a String) -> Self {
        Pattern::Text(text)
    }
}

impl From<RegExp> for Pattern<'_> {
    fn from(regexp: RegExp) -> Self {
        Pattern::Regex(regexp)
    }
}

impl<'a, T: Into<Pattern<'a>>> From<Option<T>> for Pattern<'a> {
    fn from(pattern: Option<T>) -> Self {
        pattern.map_or(Pattern::Null, Into::into)
    }
}

/// Options for expanding patterns.
///
/// ```
/// use regex_strings::Config;
///
/// let strings = Config::new().ordered(true).expand_all("[ab]{2}")?;
/// assert_eq!(strings, ["aa", "ab", "ba", "bb"]);
/// # Ok::<(), regex_strings::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    seed: Option<u64>,
    ordered: bool,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Seed the random order, so that every expansion made through this
    /// config produces its strings in the same order.
    pub fn seed(mut self, seed: u64) -> Config {
        self.seed = Some(seed);
        self
    }

    /// Produce strings in canonical order instead of a random one: class
    /// members in catalogue order, alternatives left to right and fewer
    /// repetitions first. Takes precedence over [`seed`](Config::seed).
    pub fn ordered(mut self, yes: bool) -> Config {
        self.ordered = yes;
        self
    }

    fn entropy(&self) -> random::SharedEntropy {
        match (self.ordered, self.seed) {
            (true, _) => random::ordered(),
            (false, Some(seed)) => random::seeded(seed),
            (false, None) => random::from_entropy(),
        }
    }

    /// How many strings `pattern` matches.
    ///
    /// The count does not depend on the order, so no generator is seeded.
    pub fn count<'a>(&self, pattern: impl Into<Pattern<'a>>) -> Result<Count, Error> {
        Ok(self.expand_with(pattern, random::ordered())?.count())
    }

    /// Every string `pattern` matches, produced lazily.
    ///
    /// [`Pattern::Null`] matches nothing and empty text matches only the
    /// empty string.
    pub fn expand<'a>(&self, pattern: impl Into<Pattern<'a>>) -> Result<Expansion, Error> {
        self.expand_with(pattern, self.entropy())
    }

    fn expand_with<'a>(
        &self,
        pattern: impl Into<Pattern<'a>>,
        entropy: random::SharedEntropy,
    ) -> Result<Expansion, Error> {
        let mut regexp = match pattern.into() {
            Pattern::Null => return Ok(Expansion::empty()),
            Pattern::Text("") => return Ok(Expansion::blank()),
            pattern => match to_regexp(pattern)? {
                Some(regexp) => regexp,
                None => return Ok(Expansion::empty()),
            },
        };
        normalize::normalize(&mut regexp)?;

        let expansion = expander::Expander::new(regexp.flags, entropy)
            .expand(regexp.body.as_ref())?;
        debug!("{regexp} matches {} strings", expansion.count());
        Ok(expansion)
    }

    /// Up to `n` strings matched by `pattern`.
    pub fn expand_n<'a>(
        &self,
        pattern: impl Into<Pattern<'a>>,
        n: usize,
    ) -> Result<Vec<String>, Error> {
        Ok(self.expand(pattern)?.iter().take(n).collect())
    }

    /// Every string matched by `pattern`.
    ///
    /// # Note
    ///
    /// This collects [`count`](Config::count) strings into memory.
    pub fn expand_all<'a>(&self, pattern: impl Into<Pattern<'a>>) -> Result<Vec<String>, Error> {
        Ok(self.expand(pattern)?.iter().collect())
    }
}

/// How many strings `pattern` matches.
///
/// Counting never draws on randomness and never produces a string.
pub fn count<'a>(pattern: impl Into<Pattern<'a>>) -> Result<Count, Error> {
    Config::new().count(pattern)
}

/// Every string `pattern` matches, produced lazily in random order.
pub fn expand<'a>(pattern: impl Into<Pattern<'a>>) -> Result<Expansion, Error> {
    Config::new().expand(pattern)
}

/// Up to `n` strings matched by `pattern`, in random order.
pub fn expand_n<'a>(pattern: impl Into<Pattern<'a>>, n: usize) -> Result<Vec<String>, Error> {
    Config::new().expand_n(pattern, n)
}

/// Every string matched by `pattern`, in random order.
pub fn expand_all<'a>(pattern: impl Into<Pattern<'a>>) -> Result<Vec<String>, Error> {
    Config::new().expand_all(pattern)
}

/// Turn a pattern into a parsed expression.
///
/// Text that looks like a `/body/flags` literal is parsed as one, with the
/// `s` and `x` flags and group names compiled away. Other text is parsed as
/// a pattern body without flags, and a [`RegExp`] is returned unchanged.
/// [`Pattern::Null`] has no expression.
pub fn to_regexp<'a>(pattern: impl Into<Pattern<'a>>) -> Result<Option<RegExp>, Error> {
    match pattern.into() {
        Pattern::Null => Ok(None),
        Pattern::Regex(regexp) => Ok(Some(regexp)),
        Pattern::Text(text) if looks_like_literal(text.trim())? => {
            let mut regexp = parser::parse(text.trim())?;
            normalize::transpile(&mut regexp);
            debug!("read {text:?} as {regexp}");
            Ok(Some(regexp))
        }
        Pattern::Text(text) => parser::parse_body(text, Flags::default()).map(Some),
    }
}

/// Whether `text` has the shape of a `/body/flags` literal: slashes inside
/// the body are escaped or inside a class.
fn looks_like_literal(text: &str) -> Result<bool, Error> {
    static LITERAL: OnceLock<Regex> = OnceLock::new();
    if let Some(literal) = LITERAL.get() {
        return Ok(literal.is_match(text));
    }
    let literal = Regex::new(r"^/(?:[^/\[\\]|\\.|\[(?:[^\]\\]|\\.)*\])*/[a-zA-Z]*$")
        .map_err(|err| Error::Internal(err.to_string()))?;
    Ok(LITERAL.get_or_init(|| literal).is_match(text))
}
