//! Rewrites a parsed tree into the subset of nodes the expander understands.
//!
//! Three rules apply, each idempotent and independent of the others:
//!
//! * a decimal escape that is not a backreference (`\12`) is read as octal
//!   and becomes the literal character it denotes,
//! * meta characters (`.`, `\d`, `\W`, ...) become character classes spelled
//!   out from the [`chars`](crate::chars) sub-ranges,
//! * the shorthand quantifiers `?`, `*` and `+` become `{0,1}`, `{0,}` and
//!   `{1,}`.

use std::collections::HashMap;

use log::trace;

use crate::ast::{
    Assertion, Backreference, Char, CharKind, CharacterClass, ClassItem, Group, Meta, Node,
    Quantifier, QuantifierKind, RegExp,
};
use crate::chars;
use crate::error::Error;

/// Apply every rewrite rule to the whole tree, lookaround bodies included.
pub fn normalize(regexp: &mut RegExp) -> Result<(), Error> {
    let dot_all = regexp.flags.dot_all;
    if let Some(body) = &mut regexp.body {
        normalize_node(body, dot_all)?;
    }
    Ok(())
}

fn normalize_node(node: &mut Node, dot_all: bool) -> Result<(), Error> {
    match node {
        Node::Char(c) => {
            let c = *c;
            if let CharKind::Meta(meta) = c.kind {
                let class = CharacterClass {
                    negative: false,
                    items: meta_items(meta, dot_all),
                };
                trace!("rewrote meta character {c} as {class}");
                *node = Node::CharacterClass(class);
            } else if c.kind == CharKind::Decimal {
                *node = Node::Char(octal(c)?);
            }
        }
        Node::CharacterClass(class) => normalize_class(class, dot_all)?,
        Node::Alternative(nodes) => {
            for node in nodes {
                normalize_node(node, dot_all)?;
            }
        }
        Node::Disjunction(left, right) => {
            for side in [left, right].into_iter().flatten() {
                normalize_node(side, dot_all)?;
            }
        }
        Node::Group(group) => {
            if let Some(expression) = &mut group.expression {
                normalize_node(expression, dot_all)?;
            }
        }
        Node::Repetition(repetition) => {
            normalize_node(&mut repetition.expression, dot_all)?;
            normalize_quantifier(&mut repetition.quantifier);
        }
        Node::Assertion(
            Assertion::Lookahead { expression, .. } | Assertion::Lookbehind { expression, .. },
        ) => {
            if let Some(expression) = expression {
                normalize_node(expression, dot_all)?;
            }
        }
        Node::Assertion(_) | Node::Backreference(_) => {}
    }
    Ok(())
}

/// Meta characters inside a class are spliced into the class itself.
fn normalize_class(class: &mut CharacterClass, dot_all: bool) -> Result<(), Error> {
    if !class.items.iter().any(needs_rewrite) {
        return Ok(());
    }

    let mut items = Vec::with_capacity(class.items.len());
    for item in &class.items {
        match *item {
            ClassItem::Char(Char {
                kind: CharKind::Meta(meta),
                ..
            }) => {
                let spliced = meta_items(meta, dot_all);
                trace!("spliced meta character {} into class", Char::meta(meta));
                items.extend(spliced);
            }
            ClassItem::Char(c) if c.kind == CharKind::Decimal => {
                items.push(ClassItem::Char(octal(c)?));
            }
            ClassItem::Range(from, to) => {
                let from = if from.kind == CharKind::Decimal { octal(from)? } else { from };
                let to = if to.kind == CharKind::Decimal { octal(to)? } else { to };
                items.push(ClassItem::Range(from, to));
            }
            item => items.push(item),
        }
    }
    class.items = items;
    Ok(())
}

fn needs_rewrite(item: &ClassItem) -> bool {
    match item {
        ClassItem::Char(c) => c.is_meta() || c.kind == CharKind::Decimal,
        ClassItem::Range(from, to) => from.kind == CharKind::Decimal || to.kind == CharKind::Decimal,
    }
}

fn normalize_quantifier(quantifier: &mut Quantifier) {
    let (from, to) = match quantifier.kind {
        QuantifierKind::Optional => (0, Some(1)),
        QuantifierKind::ZeroOrMore => (0, None),
        QuantifierKind::OneOrMore => (1, None),
        QuantifierKind::Range { .. } => return,
    };
    let range = Quantifier {
        kind: QuantifierKind::Range { from, to },
        greedy: quantifier.greedy,
    };
    trace!("rewrote quantifier {quantifier} as {range}");
    *quantifier = range;
}

/// Read the digits of a decimal escape as an octal number, the way legacy
/// engines do: `\12` is a line feed, and `\18` keeps only its octal prefix `\1`.
fn octal(c: Char) -> Result<Char, Error> {
    let digits = c.code_point.to_string();
    let octal_digits: String = digits.chars().take_while(|d| d.is_digit(8)).collect();
    let character = u32::from_str_radix(&octal_digits, 8)
        .ok()
        .and_then(char::from_u32)
        .ok_or(Error::unsupported("decimal escape without octal digits"))?;

    let rewritten = if is_syntax_character(character) {
        Char::escaped(character)
    } else {
        Char::simple(character)
    };
    trace!("rewrote decimal escape {c} as {rewritten}");
    Ok(rewritten)
}

fn is_syntax_character(c: char) -> bool {
    "|\\{}()[]^$+*?.-/".contains(c)
}

/// The class items a meta character stands for. Together with their
/// negations they split the character universe without overlap.
fn meta_items(meta: Meta, dot_all: bool) -> Vec<ClassItem> {
    let parts: Vec<Vec<ClassItem>> = match meta {
        Meta::Any => {
            let mut parts = vec![
                chars::alphabetic(),
                chars::digit(),
                chars::inline_whitespace(),
                chars::other(),
                chars::underscore(),
                chars::extended(),
            ];
            if dot_all {
                parts.push(chars::newline());
            }
            parts
        }
        Meta::Word => vec![chars::alphabetic(), chars::digit(), chars::underscore()],
        Meta::NotWord => vec![chars::whitespace(), chars::other(), chars::extended()],
        Meta::Digit => vec![chars::digit()],
        Meta::NotDigit => vec![
            chars::alphabetic(),
            chars::whitespace(),
            chars::other(),
            chars::underscore(),
            chars::extended(),
        ],
        Meta::Space => vec![chars::whitespace()],
        Meta::NotSpace => vec![
            chars::alphabetic(),
            chars::digit(),
            chars::other(),
            chars::underscore(),
            chars::extended(),
        ],
    };
    parts.concat()
}

/// Compile away syntax that older engines do not understand, keeping what
/// the pattern matches: the `s` flag (every `.` becomes `[\0-\uFFFF]`), the
/// `x` flag (already applied while parsing) and group names (named
/// backreferences become numbered ones).
pub fn transpile(regexp: &mut RegExp) {
    if let Some(body) = &mut regexp.body {
        let mut numbers = HashMap::new();
        visit(body, &mut |node| {
            if let Node::Group(Group {
                number: Some(number),
                name: Some(name),
                ..
            }) = node
            {
                numbers.insert(name.clone(), *number);
            }
        });

        let dot_all = regexp.flags.dot_all;
        visit(body, &mut |node| {
            let replacement = match node {
                Node::Char(c) if dot_all && c.kind == CharKind::Meta(Meta::Any) => {
                    Some(Node::CharacterClass(any_code_unit()))
                }
                Node::Backreference(Backreference::Name(name)) => numbers
                    .get(name.as_str())
                    .map(|&number| Node::Backreference(Backreference::Number(number))),
                Node::Group(group) => {
                    group.name = None;
                    None
                }
                _ => None,
            };
            if let Some(replacement) = replacement {
                trace!("transpiled {node} as {replacement}");
                *node = replacement;
            }
        });
    }
    regexp.flags.dot_all = false;
    regexp.flags.extended = false;
}

/// `[\0-\uFFFF]`
fn any_code_unit() -> CharacterClass {
    let nul = Char {
        kind: CharKind::Octal,
        code_point: 0,
    };
    let last = Char {
        kind: CharKind::Unicode,
        code_point: 0xFFFF,
    };
    CharacterClass {
        negative: false,
        items: vec![ClassItem::Range(nul, last)],
    }
}

/// Calls `f` on `node`, then on every node below it.
fn visit(node: &mut Node, f: &mut dyn FnMut(&mut Node)) {
    f(node);
    match node {
        Node::Alternative(nodes) => {
            for node in nodes {
                visit(node, f);
            }
        }
        Node::Disjunction(left, right) => {
            for side in [left, right].into_iter().flatten() {
                visit(side, f);
            }
        }
        Node::Group(Group {
            expression: Some(expression),
            ..
        })
        | Node::Assertion(
            Assertion::Lookahead {
                expression: Some(expression),
                ..
            }
            | Assertion::Lookbehind {
                expression: Some(expression),
                ..
            },
        ) => visit(expression, f),
        Node::Repetition(repetition) => visit(&mut repetition.expression, f),
        _ => {}
    }
}
