//! The character universe: the closed set of characters that stand in for
//! "any character" whenever a class or meta character has to be enumerated.
//!
//! Expanding against the whole of Unicode would be neither finite in practice
//! nor useful, so classes are intersected with this catalogue instead.

use std::collections::HashSet;
use std::sync::OnceLock;

use tinyvec::ArrayVec;

use crate::ast::{Char, CharacterClass, ClassItem};

const WHITESPACE: &str = " \t\r\n\u{a0}";
const DIGITS: &str = "0123456789";
const BASIC_LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const BASIC_UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASIC_SPECIAL: &str = "~`!@#$%^&*()-_=+<,>.?/[]{}|\\:;\"'";
const EXTENDED_LOWERCASE: &str = "àáâãäåæçèéêëìíîïðñòóôõöøùúûüýþÿ";
const EXTENDED_UPPERCASE: &str = "ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖØÙÚÛÜÝÞß";
const EXTENDED_SPECIAL: &str = "¡¢£¤¥¦§¨©ª«¬®¯°±²³´µ¶·¸¹º»¼½¾¿×÷\u{ad}";
// Windows-1252 display characters in the 0x80..0x9F block
const WINDOWS_1252_SPECIAL: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Every character of the universe, in catalogue order.
pub fn all() -> &'static [char] {
    static ALL: OnceLock<Vec<char>> = OnceLock::new();
    ALL.get_or_init(|| {
        [
            WHITESPACE,
            DIGITS,
            BASIC_LOWERCASE,
            BASIC_UPPERCASE,
            BASIC_SPECIAL,
            EXTENDED_LOWERCASE,
            EXTENDED_UPPERCASE,
            EXTENDED_SPECIAL,
            WINDOWS_1252_SPECIAL,
        ]
        .iter()
        .flat_map(|block| block.chars())
        .collect()
    })
}

// Named sub-ranges used to spell out meta characters as classes. Together
// they cover the universe exactly once.

pub fn alphabetic() -> Vec<ClassItem> {
    vec![ClassItem::range('a', 'z'), ClassItem::range('A', 'Z')]
}

pub fn digit() -> Vec<ClassItem> {
    vec![ClassItem::range('0', '9')]
}

pub fn underscore() -> Vec<ClassItem> {
    vec![ClassItem::Char(Char::escaped('_'))]
}

/// Whitespace that `.` still matches.
pub fn inline_whitespace() -> Vec<ClassItem> {
    simple_items(" \t\u{a0}")
}

pub fn line_breaks() -> Vec<ClassItem> {
    simple_items("\r\n")
}

pub fn newline() -> Vec<ClassItem> {
    simple_items("\n")
}

pub fn whitespace() -> Vec<ClassItem> {
    let mut items = inline_whitespace();
    items.extend(line_breaks());
    items
}

/// ASCII punctuation other than `_`.
pub fn other() -> Vec<ClassItem> {
    let mut items = simple_items("~`!@#$%^&*()=+<,>.?/[{}|:;\"'");
    items.extend(['-', ']', '\\'].map(|c| ClassItem::Char(Char::escaped(c))));
    items
}

/// Everything past Latin-1 whitespace: the Latin-1 supplement and the
/// Windows-1252 display block.
pub fn extended() -> Vec<ClassItem> {
    vec![ClassItem::range('\u{a1}', '\u{ffff}')]
}

fn simple_items(chars: &str) -> Vec<ClassItem> {
    chars.chars().map(|c| ClassItem::Char(Char::simple(c))).collect()
}

/// The case variants of `c`: lower then upper when they differ, otherwise `c`
/// alone. Full case mapping applies, so `ß` pairs with `SS`.
pub fn case_variants(c: char) -> ArrayVec<[String; 2]> {
    let lower: String = c.to_lowercase().collect();
    let upper: String = c.to_uppercase().collect();
    let mut variants = ArrayVec::new();
    if lower == upper {
        variants.push(c.to_string());
    } else {
        variants.push(lower);
        variants.push(upper);
    }
    variants
}

/// Members of the universe a class matches, in catalogue order, each
/// followed by its other case when `ignore_case` is set. A case variant
/// already produced by an earlier member is not repeated.
pub fn class_members(class: &CharacterClass, ignore_case: bool) -> Vec<String> {
    let mut members = vec![];
    let mut seen = HashSet::new();
    for &c in all() {
        let referenced = class.items.iter().any(|item| item.contains(c as u32));
        if referenced == class.negative {
            continue;
        }
        if ignore_case {
            for variant in case_variants(c) {
                if seen.insert(variant.clone()) {
                    members.push(variant);
                }
            }
        } else {
            members.push(c.to_string());
        }
    }
    members
}
