//! The pattern tree produced by [`parser`](crate::parser) and rewritten by
//! [`normalize`](crate::normalize).
//!
//! Every node renders back to pattern text through [`Display`](fmt::Display),
//! so a tree can always be printed as the `/body/flags` literal it stands for.

use std::fmt::{self, Write as _};

use crate::error::Error;

/// A parsed regular expression literal: `/body/flags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExp {
    pub body: Option<Node>,
    pub flags: Flags,
}

/// Modifier flags of a regular expression.
///
/// Only `i` and `s` influence expansion. The rest are accepted so that any
/// literal a JavaScript engine accepts can be expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub sticky: bool,
    pub extended: bool,
}

impl Flags {
    /// Parse a flag string like `"gim"`. Unknown or repeated letters are errors.
    pub fn parse(flags: &str) -> Result<Self, Error> {
        let mut parsed = Flags::default();
        for (i, c) in flags.char_indices() {
            let slot = match c {
                'd' => &mut parsed.has_indices,
                'g' => &mut parsed.global,
                'i' => &mut parsed.ignore_case,
                'm' => &mut parsed.multiline,
                's' => &mut parsed.dot_all,
                'u' => &mut parsed.unicode,
                'y' => &mut parsed.sticky,
                'x' => &mut parsed.extended,
                _ => return Err(Error::parse(i, format!("invalid flag '{c}'"))),
            };
            if *slot {
                return Err(Error::parse(i, format!("duplicate flag '{c}'")));
            }
            *slot = true;
        }
        Ok(parsed)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = [
            (self.has_indices, 'd'),
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
            (self.unicode, 'u'),
            (self.sticky, 'y'),
            (self.extended, 'x'),
        ];
        for (set, letter) in letters {
            if set {
                f.write_char(letter)?;
            }
        }
        Ok(())
    }
}

/// One node of the pattern tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Char(Char),
    CharacterClass(CharacterClass),
    /// A sequence of at least two nodes matched one after another.
    Alternative(Vec<Node>),
    /// `left|right`. Either side may be empty. Wider alternations nest to the right.
    Disjunction(Option<Box<Node>>, Option<Box<Node>>),
    Group(Group),
    Backreference(Backreference),
    Repetition(Repetition),
    Assertion(Assertion),
}

impl Node {
    /// The kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Char(_) => "Char",
            Node::CharacterClass(_) => "CharacterClass",
            Node::Alternative(_) => "Alternative",
            Node::Disjunction(..) => "Disjunction",
            Node::Group(_) => "Group",
            Node::Backreference(_) => "Backreference",
            Node::Repetition(_) => "Repetition",
            Node::Assertion(_) => "Assertion",
        }
    }
}

/// A single character, or a meta character standing for a set of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Char {
    pub kind: CharKind,
    /// The code point denoted. For [`CharKind::Decimal`] this is the decimal
    /// value of the escape digits, for [`CharKind::Meta`] it is unused.
    ///
    /// Inside a character class this may be a lone UTF-16 surrogate.
    pub code_point: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharKind {
    /// A character written as itself.
    Simple,
    /// A backslash escape of a single character, like `\.` or `\n`.
    Escaped,
    /// `\cX`
    Control,
    /// `\xHH`
    Hex,
    /// `\uHHHH`
    Unicode,
    /// `\0`, `\012`
    Octal,
    /// `\N` that is not a back-reference.
    Decimal,
    Meta(Meta),
}

/// Meta characters: `.` and the shorthand classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meta {
    Any,
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
}

impl Char {
    pub fn simple(c: char) -> Self {
        Char {
            kind: CharKind::Simple,
            code_point: c as u32,
        }
    }

    pub fn escaped(c: char) -> Self {
        Char {
            kind: CharKind::Escaped,
            code_point: c as u32,
        }
    }

    pub fn meta(meta: Meta) -> Self {
        Char {
            kind: CharKind::Meta(meta),
            code_point: 0,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.kind, CharKind::Meta(_))
    }

    /// The character this node denotes, if it is a Unicode scalar value.
    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.code_point)
    }
}

/// `[...]` or `[^...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterClass {
    pub negative: bool,
    pub items: Vec<ClassItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    Char(Char),
    Range(Char, Char),
}

impl ClassItem {
    pub fn range(from: char, to: char) -> Self {
        ClassItem::Range(Char::simple(from), Char::simple(to))
    }

    pub fn contains(&self, code_point: u32) -> bool {
        match self {
            ClassItem::Char(c) => c.code_point == code_point,
            ClassItem::Range(from, to) => (from.code_point..=to.code_point).contains(&code_point),
        }
    }
}

/// `( )`, `(?<name> )` or `(?: )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The 1-based capture number; `None` for non-capturing groups.
    pub number: Option<u32>,
    pub name: Option<String>,
    pub expression: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backreference {
    Number(u32),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    pub expression: Box<Node>,
    pub quantifier: Quantifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    /// Kept for rendering only. Generation does not depend on it.
    pub greedy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `{from}`, `{from,}` or `{from,to}`; `to == None` is unbounded.
    Range { from: u32, to: Option<u32> },
}

/// Zero-width assertions. Lookaround bodies are kept but never expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Start,
    End,
    WordBoundary,
    NonWordBoundary,
    Lookahead {
        negative: bool,
        expression: Option<Box<Node>>,
    },
    Lookbehind {
        negative: bool,
        expression: Option<Box<Node>>,
    },
}

fn write_opt(f: &mut fmt::Formatter<'_>, node: &Option<Box<Node>>) -> fmt::Result {
    match node {
        Some(node) => write!(f, "{node}"),
        None => Ok(()),
    }
}

fn write_code_point(f: &mut fmt::Formatter<'_>, code_point: u32) -> fmt::Result {
    match char::from_u32(code_point) {
        Some(c) => f.write_char(c),
        None => write!(f, "\\u{code_point:04X}"),
    }
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('/')?;
        if let Some(body) = &self.body {
            write!(f, "{body}")?;
        }
        write!(f, "/{}", self.flags)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Char(c) => write!(f, "{c}"),
            Node::CharacterClass(class) => write!(f, "{class}"),
            Node::Alternative(nodes) => nodes.iter().try_for_each(|n| write!(f, "{n}")),
            Node::Disjunction(left, right) => {
                write_opt(f, left)?;
                f.write_char('|')?;
                write_opt(f, right)
            }
            Node::Group(group) => {
                f.write_char('(')?;
                match (&group.name, group.number) {
                    (Some(name), _) => write!(f, "?<{name}>")?,
                    (None, None) => f.write_str("?:")?,
                    (None, Some(_)) => {}
                }
                write_opt(f, &group.expression)?;
                f.write_char(')')
            }
            Node::Backreference(Backreference::Number(n)) => write!(f, "\\{n}"),
            Node::Backreference(Backreference::Name(name)) => write!(f, "\\k<{name}>"),
            Node::Repetition(rep) => write!(f, "{}{}", rep.expression, rep.quantifier),
            Node::Assertion(assertion) => write!(f, "{assertion}"),
        }
    }
}

impl fmt::Display for Char {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cp = self.code_point;
        match self.kind {
            CharKind::Simple => write_code_point(f, cp),
            CharKind::Escaped => match cp {
                0x09 => f.write_str("\\t"),
                0x0A => f.write_str("\\n"),
                0x0B => f.write_str("\\v"),
                0x0C => f.write_str("\\f"),
                0x0D => f.write_str("\\r"),
                _ => {
                    f.write_char('\\')?;
                    write_code_point(f, cp)
                }
            },
            CharKind::Control => match char::from_u32(cp + 0x40) {
                Some(letter) => write!(f, "\\c{letter}"),
                None => write!(f, "\\u{cp:04X}"),
            },
            CharKind::Hex => write!(f, "\\x{cp:02X}"),
            CharKind::Unicode => write!(f, "\\u{cp:04X}"),
            CharKind::Octal if cp == 0 => f.write_str("\\0"),
            CharKind::Octal => write!(f, "\\0{cp:o}"),
            CharKind::Decimal => write!(f, "\\{cp}"),
            CharKind::Meta(meta) => f.write_str(match meta {
                Meta::Any => ".",
                Meta::Digit => "\\d",
                Meta::NotDigit => "\\D",
                Meta::Word => "\\w",
                Meta::NotWord => "\\W",
                Meta::Space => "\\s",
                Meta::NotSpace => "\\S",
            }),
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        if self.negative {
            f.write_char('^')?;
        }
        for item in &self.items {
            match item {
                ClassItem::Char(c) => write!(f, "{c}")?,
                ClassItem::Range(from, to) => write!(f, "{from}-{to}")?,
            }
        }
        f.write_char(']')
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            QuantifierKind::Optional => f.write_char('?')?,
            QuantifierKind::ZeroOrMore => f.write_char('*')?,
            QuantifierKind::OneOrMore => f.write_char('+')?,
            QuantifierKind::Range { from, to: None } => write!(f, "{{{from},}}")?,
            QuantifierKind::Range { from, to: Some(to) } if from == to => write!(f, "{{{from}}}")?,
            QuantifierKind::Range { from, to: Some(to) } => write!(f, "{{{from},{to}}}")?,
        }
        if !self.greedy {
            f.write_char('?')?;
        }
        Ok(())
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, expression) = match self {
            Assertion::Start => return f.write_char('^'),
            Assertion::End => return f.write_char('$'),
            Assertion::WordBoundary => return f.write_str("\\b"),
            Assertion::NonWordBoundary => return f.write_str("\\B"),
            Assertion::Lookahead { negative, expression } => {
                (if *negative { "(?!" } else { "(?=" }, expression)
            }
            Assertion::Lookbehind { negative, expression } => {
                (if *negative { "(?<!" } else { "(?<=" }, expression)
            }
        };
        f.write_str(open)?;
        write_opt(f, expression)?;
        f.write_char(')')
    }
}
