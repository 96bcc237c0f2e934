//! Parses regular expression literals (ECMAScript syntax) into the
//! [pattern tree](crate::ast).
//!
//! Reference grammar:
//!
//! ```text
//! disjunction ::= alternative ('|' disjunction)?
//! alternative ::= term*
//! term        ::= assertion | atom quantifier?
//! assertion   ::= '^' | '$' | '\b' | '\B' | '(?=' disjunction ')' | '(?!' ... | '(?<=' ... | '(?<!' ...
//! quantifier  ::= ('?' | '*' | '+' | '{' n '}' | '{' n ',}' | '{' n ',' m '}') '?'?
//! atom        ::= '.' | char | '\' escape | '[' class ']' | '(' group ')'
//! group       ::= ('?:' | '?<' name '>')? disjunction
//! ```
//!
//! A `{` that does not start a well-formed quantifier is an ordinary
//! character, and an escape of a character without special meaning stands for
//! the character itself (`\R` is `R`), like ECMAScript engines do outside of
//! unicode mode.

use crate::ast::{
    Assertion, Backreference, Char, CharKind, CharacterClass, ClassItem, Flags, Group, Meta, Node,
    Quantifier, QuantifierKind, RegExp, Repetition,
};
use crate::error::Error;

/// Parse a `/body/flags` literal.
pub fn parse(literal: &str) -> Result<RegExp, Error> {
    let rest = literal
        .strip_prefix('/')
        .ok_or_else(|| Error::parse(0, "expected '/' at start of regular expression literal"))?;
    let end = rest
        .rfind('/')
        .ok_or_else(|| Error::parse(literal.len(), "unterminated regular expression literal"))?;
    let flags = Flags::parse(&rest[end + 1..])?;
    parse_body(&rest[..end], flags)
}

/// Parse a pattern body with the given flags.
pub fn parse_body(body: &str, flags: Flags) -> Result<RegExp, Error> {
    let stripped;
    let body = if flags.extended {
        stripped = strip_free_spacing(body);
        &stripped
    } else {
        body
    };
    let mut parser = Parser::new(body);
    let body = parser.disjunction()?;
    if let Some(c) = parser.peek() {
        // disjunction only stops early on an unmatched ')'
        return Err(Error::parse(parser.pos, format!("unmatched '{c}'")));
    }
    parser.check_named_references()?;
    Ok(RegExp { body, flags })
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    // capturing groups in the whole pattern, to tell `\N` back-references from escapes
    total_groups: u32,
    next_group: u32,
    names: Vec<String>,
    named_references: Vec<(usize, String)>,
    // groups whose closing parenthesis has been read
    closed: Vec<(u32, Option<String>)>,
}

impl Parser {
    fn new(body: &str) -> Self {
        let chars: Vec<char> = body.chars().collect();
        let total_groups = count_capturing_groups(&chars);
        Self {
            chars,
            pos: 0,
            total_groups,
            next_group: 0,
            names: vec![],
            named_references: vec![],
            closed: vec![],
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn looking_at(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, Error> {
        Err(Error::parse(self.pos, message))
    }

    fn disjunction(&mut self) -> Result<Option<Node>, Error> {
        let left = self.alternative()?;
        if self.eat('|') {
            let right = self.disjunction()?;
            Ok(Some(Node::Disjunction(
                left.map(Box::new),
                right.map(Box::new),
            )))
        } else {
            Ok(left)
        }
    }

    fn alternative(&mut self) -> Result<Option<Node>, Error> {
        let mut terms = vec![];
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            terms.push(self.term()?);
        }
        Ok(match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Node::Alternative(terms)),
        })
    }

    fn term(&mut self) -> Result<Node, Error> {
        if let Some(assertion) = self.assertion()? {
            if self.quantifier()?.is_some() {
                return self.error("nothing to repeat");
            }
            return Ok(Node::Assertion(assertion));
        }

        let atom = self.atom()?;
        let Some(quantifier) = self.quantifier()? else {
            return Ok(atom);
        };
        if self.peek() == Some('+') {
            return Err(Error::unsupported("possessive quantifier"));
        }
        if self.quantifier()?.is_some() {
            return self.error("nothing to repeat");
        }
        // a reference inside or ahead of its own group has no settled value to repeat
        if let Node::Backreference(reference) = &atom {
            if !self.is_closed(reference) {
                return Err(Error::unsupported("quantified backreference"));
            }
        }
        Ok(Node::Repetition(Repetition {
            expression: Box::new(atom),
            quantifier,
        }))
    }

    fn assertion(&mut self) -> Result<Option<Assertion>, Error> {
        let simple = match self.peek() {
            Some('^') => Some((1, Assertion::Start)),
            Some('$') => Some((1, Assertion::End)),
            Some('\\') if self.peek_at(1) == Some('b') => Some((2, Assertion::WordBoundary)),
            Some('\\') if self.peek_at(1) == Some('B') => Some((2, Assertion::NonWordBoundary)),
            _ => None,
        };
        if let Some((len, assertion)) = simple {
            self.pos += len;
            return Ok(Some(assertion));
        }

        let lookaround = [
            ("(?=", false, false),
            ("(?!", true, false),
            ("(?<=", false, true),
            ("(?<!", true, true),
        ]
        .into_iter()
        .find(|(open, ..)| self.looking_at(open));
        let Some((open, negative, behind)) = lookaround else {
            return Ok(None);
        };
        self.pos += open.chars().count();
        let expression = self.disjunction()?.map(Box::new);
        if !self.eat(')') {
            return self.error("unterminated group");
        }
        Ok(Some(if behind {
            Assertion::Lookbehind {
                negative,
                expression,
            }
        } else {
            Assertion::Lookahead {
                negative,
                expression,
            }
        }))
    }

    fn quantifier(&mut self) -> Result<Option<Quantifier>, Error> {
        let kind = match self.peek() {
            Some('?') => QuantifierKind::Optional,
            Some('*') => QuantifierKind::ZeroOrMore,
            Some('+') => QuantifierKind::OneOrMore,
            Some('{') => match self.range_quantifier()? {
                Some(kind) => kind,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        if !matches!(kind, QuantifierKind::Range { .. }) {
            self.pos += 1;
        }
        let greedy = !self.eat('?');
        Ok(Some(Quantifier { kind, greedy }))
    }

    /// `{n}`, `{n,}` or `{n,m}`. Leaves the position untouched if the text is
    /// not a well-formed quantifier.
    fn range_quantifier(&mut self) -> Result<Option<QuantifierKind>, Error> {
        let start = self.pos;
        self.pos += 1;
        let Some(from) = self.decimal()? else {
            self.pos = start;
            return Ok(None);
        };
        let to = if self.eat(',') {
            self.decimal()?
        } else {
            Some(from)
        };
        if !self.eat('}') {
            self.pos = start;
            return Ok(None);
        }
        if let Some(to) = to {
            if to < from {
                return self.error("numbers out of order in {} quantifier");
            }
        }
        Ok(Some(QuantifierKind::Range { from, to }))
    }

    fn decimal(&mut self) -> Result<Option<u32>, Error> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        match digits.parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(Error::parse(start, "number too large")),
        }
    }

    fn atom(&mut self) -> Result<Node, Error> {
        let Some(c) = self.bump() else {
            return self.error("unexpected end of pattern");
        };
        match c {
            '.' => Ok(Node::Char(Char::meta(Meta::Any))),
            '(' => self.group(),
            '[' => self.class(),
            '\\' => self.atom_escape(),
            '*' | '+' | '?' => {
                self.pos -= 1;
                self.error("nothing to repeat")
            }
            '{' => {
                self.pos -= 1;
                if self.range_quantifier()?.is_some() {
                    return self.error("nothing to repeat");
                }
                self.pos += 1;
                Ok(Node::Char(Char::simple('{')))
            }
            '/' => {
                self.pos -= 1;
                self.error("unescaped '/'")
            }
            c => Ok(Node::Char(Char::simple(c))),
        }
    }

    fn group(&mut self) -> Result<Node, Error> {
        let open = self.pos - 1;
        let (number, name) = if self.eat('?') {
            match self.bump() {
                Some(':') => (None, None),
                Some('<') => {
                    let name = self.group_name()?;
                    if self.names.contains(&name) {
                        return Err(Error::parse(open, format!("duplicate capture group name '{name}'")));
                    }
                    self.names.push(name.clone());
                    self.next_group += 1;
                    (Some(self.next_group), Some(name))
                }
                other => return Err(unsupported_group(open, other, self.peek())),
            }
        } else {
            self.next_group += 1;
            (Some(self.next_group), None)
        };

        let expression = self.disjunction()?.map(Box::new);
        if !self.eat(')') {
            return Err(Error::parse(open, "unterminated group"));
        }
        if let Some(number) = number {
            self.closed.push((number, name.clone()));
        }
        Ok(Node::Group(Group {
            number,
            name,
            expression,
        }))
    }

    fn is_closed(&self, reference: &Backreference) -> bool {
        self.closed.iter().any(|(number, name)| match reference {
            Backreference::Number(n) => number == n,
            Backreference::Name(wanted) => name.as_deref() == Some(wanted.as_str()),
        })
    }

    fn group_name(&mut self) -> Result<String, Error> {
        let start = self.pos;
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('>') if !name.is_empty() => return Ok(name),
                Some(c) if is_name_char(c, name.is_empty()) => name.push(c),
                _ => return Err(Error::parse(start, "invalid capture group name")),
            }
        }
    }

    fn atom_escape(&mut self) -> Result<Node, Error> {
        let Some(c) = self.peek() else {
            return self.error("\\ at end of pattern");
        };
        match c {
            '1'..='9' => {
                let start = self.pos;
                if let Some(n) = self.decimal()? {
                    if n <= self.total_groups {
                        return Ok(Node::Backreference(Backreference::Number(n)));
                    }
                }
                self.pos = start;
                Ok(Node::Char(self.char_escape()?))
            }
            'k' if self.peek_at(1) == Some('<') => {
                let start = self.pos;
                self.pos += 2;
                let name = self.group_name()?;
                self.named_references.push((start, name.clone()));
                Ok(Node::Backreference(Backreference::Name(name)))
            }
            _ => Ok(Node::Char(self.char_escape()?)),
        }
    }

    /// An escape that stands for one character, with the leading `\` consumed.
    fn char_escape(&mut self) -> Result<Char, Error> {
        let Some(c) = self.bump() else {
            return self.error("\\ at end of pattern");
        };
        let meta = match c {
            'd' => Some(Meta::Digit),
            'D' => Some(Meta::NotDigit),
            'w' => Some(Meta::Word),
            'W' => Some(Meta::NotWord),
            's' => Some(Meta::Space),
            'S' => Some(Meta::NotSpace),
            _ => None,
        };
        if let Some(meta) = meta {
            return Ok(Char::meta(meta));
        }

        let escaped = |code_point| Char {
            kind: CharKind::Escaped,
            code_point,
        };
        Ok(match c {
            't' => escaped(0x09),
            'n' => escaped(0x0A),
            'v' => escaped(0x0B),
            'f' => escaped(0x0C),
            'r' => escaped(0x0D),
            '0' => {
                let mut code_point = 0;
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code_point = code_point * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                Char {
                    kind: CharKind::Octal,
                    code_point,
                }
            }
            '1'..='9' => {
                self.pos -= 1;
                let code_point = self.decimal()?.unwrap_or_default();
                Char {
                    kind: CharKind::Decimal,
                    code_point,
                }
            }
            'c' => match self.peek() {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    self.pos += 1;
                    Char {
                        kind: CharKind::Control,
                        code_point: letter as u32 % 32,
                    }
                }
                _ => escaped('c' as u32),
            },
            'x' => match self.hex_digits(2) {
                Some(code_point) => Char {
                    kind: CharKind::Hex,
                    code_point,
                },
                None => escaped('x' as u32),
            },
            'u' => match self.hex_digits(4) {
                Some(code_point) => Char {
                    kind: CharKind::Unicode,
                    code_point: self.low_surrogate(code_point),
                },
                None => escaped('u' as u32),
            },
            c => escaped(c as u32),
        })
    }

    fn hex_digits(&mut self, len: usize) -> Option<u32> {
        let mut value = 0;
        for i in 0..len {
            value = value * 16 + self.peek_at(i)?.to_digit(16)?;
        }
        self.pos += len;
        Some(value)
    }

    /// Joins an escaped surrogate pair like `\uD835\uDCB3` into one code point.
    fn low_surrogate(&mut self, high: u32) -> u32 {
        if !(0xD800..0xDC00).contains(&high) || !self.looking_at("\\u") {
            return high;
        }
        let start = self.pos;
        self.pos += 2;
        match self.hex_digits(4) {
            Some(low) if (0xDC00..0xE000).contains(&low) => {
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            _ => {
                self.pos = start;
                high
            }
        }
    }

    fn class(&mut self) -> Result<Node, Error> {
        let open = self.pos - 1;
        let negative = self.eat('^');
        let mut items = vec![];
        // the second UTF-16 unit of an astral character, waiting to be read
        let mut pending: Option<Char> = None;

        loop {
            let from = match pending.take() {
                Some(unit) => unit,
                None => match self.peek() {
                    None => return Err(Error::parse(open, "unterminated character class")),
                    Some(']') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => self.class_atom(&mut pending)?,
                },
            };

            let is_range = pending.is_none()
                && self.peek() == Some('-')
                && !matches!(self.peek_at(1), Some(']') | None);
            if !is_range {
                items.push(ClassItem::Char(from));
                continue;
            }
            self.pos += 1;
            let mut to_pending = None;
            let to = self.class_atom(&mut to_pending)?;

            if from.is_meta() || to.is_meta() {
                items.push(ClassItem::Char(from));
                items.push(ClassItem::Char(Char::escaped('-')));
                items.push(ClassItem::Char(to));
            } else if from.code_point > to.code_point {
                return self.error("range out of order in character class");
            } else {
                items.push(ClassItem::Range(from, to));
            }
            pending = to_pending;
        }

        Ok(Node::CharacterClass(CharacterClass { negative, items }))
    }

    /// Reads one class member. An astral character is split into UTF-16
    /// units: the high unit is returned and the low unit left in `pending`.
    fn class_atom(&mut self, pending: &mut Option<Char>) -> Result<Char, Error> {
        let Some(c) = self.bump() else {
            return self.error("unterminated character class");
        };
        if c == '\\' {
            return match self.peek() {
                Some('b') => {
                    self.pos += 1;
                    Ok(Char::escaped('\u{8}'))
                }
                Some('-') => {
                    self.pos += 1;
                    Ok(Char::escaped('-'))
                }
                _ => self.char_escape(),
            };
        }

        let code_point = c as u32;
        if code_point > 0xFFFF {
            let offset = code_point - 0x10000;
            *pending = Some(Char {
                kind: CharKind::Simple,
                code_point: 0xDC00 + (offset & 0x3FF),
            });
            return Ok(Char {
                kind: CharKind::Simple,
                code_point: 0xD800 + (offset >> 10),
            });
        }
        Ok(Char::simple(c))
    }

    fn check_named_references(&self) -> Result<(), Error> {
        match self
            .named_references
            .iter()
            .find(|(_, name)| !self.names.contains(name))
        {
            Some((position, name)) => Err(Error::parse(
                *position,
                format!("invalid named reference '{name}'"),
            )),
            None => Ok(()),
        }
    }
}

/// In free-spacing mode (`x`) whitespace and `#` comments outside of
/// classes are not part of the pattern.
fn strip_free_spacing(body: &str) -> String {
    let mut stripped = String::with_capacity(body.len());
    let mut chars = body.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                stripped.push(c);
                stripped.extend(chars.next());
            }
            '[' if !in_class => {
                in_class = true;
                stripped.push(c);
            }
            ']' if in_class => {
                in_class = false;
                stripped.push(c);
            }
            _ if in_class => stripped.push(c),
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {}
            c => stripped.push(c),
        }
    }
    stripped
}

fn is_name_char(c: char, first: bool) -> bool {
    c == '_' || c == '$' || c.is_alphabetic() || (!first && c.is_numeric())
}

fn unsupported_group(open: usize, after_question: Option<char>, next: Option<char>) -> Error {
    match after_question {
        Some('>') => Error::unsupported("atomic group"),
        Some('(') => Error::unsupported("conditional group"),
        Some('|') => Error::unsupported("branch reset group"),
        Some('#') => Error::unsupported("comment group"),
        Some('\'') => Error::unsupported("quoted capture group name"),
        Some('P') => Error::unsupported("Python-style named group"),
        Some('&') => Error::unsupported("named subroutine call"),
        Some('R') | Some('0'..='9') | Some('+') => Error::unsupported("recursion"),
        Some('-') if next.is_some_and(|c| c.is_ascii_digit()) => Error::unsupported("recursion"),
        Some(c) if c == '-' || c == '^' || c.is_ascii_alphabetic() => {
            Error::unsupported("inline mode modifier")
        }
        _ => Error::parse(open, "invalid group"),
    }
}

/// Counts capturing groups, skipping escapes and character classes.
fn count_capturing_groups(chars: &[char]) -> u32 {
    let mut count = 0;
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => in_class = true,
            ']' => in_class = false,
            '(' if !in_class => {
                let named = chars.get(i + 1) == Some(&'?')
                    && chars.get(i + 2) == Some(&'<')
                    && !matches!(chars.get(i + 3), Some('=') | Some('!'));
                if chars.get(i + 1) != Some(&'?') || named {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    count
}
