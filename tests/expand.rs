use std::collections::HashSet;

use regex_strings::{count, expand, expand_all, expand_n, parser, Config, Count, Error, Pattern};

fn ordered<'a>(pattern: impl Into<Pattern<'a>>) -> Vec<String> {
    Config::new().ordered(true).expand_all(pattern).unwrap()
}

fn set(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn null_and_empty_patterns() {
    assert!(expand_all(None::<&str>).unwrap().is_empty());
    assert_eq!(count(Pattern::Null).unwrap(), 0);
    assert_eq!(expand_all("").unwrap(), [""]);
    assert_eq!(expand_all(Some("")).unwrap(), [""]);
    assert_eq!(expand_all("foob{0}").unwrap(), ["foo"]);
    assert_eq!(expand_all("foo(bar){0}").unwrap(), ["foo"]);
}

#[test]
fn malformed_patterns() {
    for pattern in ["(", "[0-9", "*", "\\", "[z-a]", "/a", "a/", "a{2,1}", "a)"] {
        assert!(
            matches!(expand_all(pattern), Err(Error::Parse { .. })),
            "{pattern}"
        );
    }
}

#[test]
fn static_patterns() {
    assert_eq!(ordered("abcáï®"), ["abcáï®"]);
    assert_eq!(ordered("abc†|xyz‡"), ["abc†", "xyz‡"]);
    assert_eq!(ordered("ba(r)"), ["bar"]);
    assert_eq!(ordered("ba(r|z)"), ["bar", "baz"]);
    assert_eq!(
        ordered("M(a(ine|ryland|ssachusetts))"),
        ["Maine", "Maryland", "Massachusetts"]
    );
    assert_eq!(ordered("foo(|)"), ["foo", "foo"]);
    assert_eq!(ordered("ba(|r)"), ["ba", "bar"]);
}

#[test]
fn quantifiers() {
    for pattern in ["/abc?/", "/abc??/"] {
        assert_eq!(ordered(pattern), ["ab", "abc"]);
    }
    for pattern in ["/a(bc)?/", "/a(bc)??/"] {
        assert_eq!(ordered(pattern), ["a", "abc"]);
    }
    let ordered_n =
        |pattern: &str, n: usize| Config::new().ordered(true).expand_n(pattern, n).unwrap();
    assert_eq!(ordered_n("/abc*/", 5), ["ab", "abc", "abcc", "abccc", "abcccc"]);
    assert_eq!(ordered_n("/a(bc)+?/", 4), ["abc", "abcbc", "abcbcbc", "abcbcbcbc"]);
    assert_eq!(ordered_n("/ab…+/", 3), ["ab…", "ab……", "ab………"]);
    assert_eq!(ordered_n("/a{3,}/", 3), ["aaa", "aaaa", "aaaaa"]);
    assert_eq!(ordered("/a{5}?/"), ["aaaaa"]);
    assert_eq!(ordered("/a{2,6}/"), ["aa", "aaa", "aaaa", "aaaaa", "aaaaaa"]);
}

#[test]
fn character_classes() {
    assert_eq!(ordered("[aeiou]"), ["a", "e", "i", "o", "u"]);
    assert_eq!(ordered("[ÁÉÍÓÚÝ]"), ["Á", "É", "Í", "Ó", "Ú", "Ý"]);
    assert_eq!(ordered("[a-f]"), ["a", "b", "c", "d", "e", "f"]);
    assert_eq!(ordered("[ab]c[de]f"), ["acdf", "acef", "bcdf", "bcef"]);

    let twos: Vec<String> = (0..100).map(|n| format!("{n:02}")).collect();
    assert_eq!(ordered(r"/\d{2}/"), twos);
}

#[test]
fn negated_class_counts() {
    for (pattern, expected) in [
        ("[^abc]", 218),
        ("[^246]", 218),
        ("[^ÁÉÍÓÚÝ]", 215),
        ("[^a-p]", 205),
        ("[^0-8]", 212),
        ("[^À-Æ]", 214),
        ("[^aeiou0-5A-Tð-ö]", 183),
        (r"[^\W]", 63),
    ] {
        assert_eq!(count(pattern).unwrap(), expected, "{pattern}");
    }
}

#[test]
fn impossible_classes_are_empty() {
    for pattern in [r"[^\w\W]", r"[^\d\D]", r"[^\s\S]", r"[^\w\D]", r"[^\W\S]", r"[^0-9\D]"] {
        assert!(expand_all(pattern).unwrap().is_empty(), "{pattern}");
    }
}

#[test]
fn whole_universe() {
    let all: HashSet<String> = expand_all(r"[\s\S]").unwrap().into_iter().collect();
    assert_eq!(all.len(), 221);
    for pattern in [r"[\w\W]", r"[\d\D]"] {
        let strings = expand_all(pattern).unwrap();
        assert_eq!(strings.len(), 221);
        assert_eq!(strings.into_iter().collect::<HashSet<_>>(), all);
    }

    let regexp = parser::parse(r"/(.|\r)/s").unwrap();
    let strings = expand_all(regexp).unwrap();
    assert_eq!(strings.len(), 221);
    assert_eq!(strings.into_iter().collect::<HashSet<_>>(), all);
}

#[test]
fn dot_and_newline() {
    for pattern in [".", "/./"] {
        let strings = expand_all(pattern).unwrap();
        assert_eq!(strings.len(), 219);
        assert!(!strings.iter().any(|s| s == "\n"), "{pattern}");
    }
    assert!(expand_all("/./s").unwrap().iter().any(|s| s == "\n"));
}

#[test]
fn nested_order() {
    let expected = [
        "af", "afg", "bf", "bfg", "ccf", "ccfg", "cdf", "cdfg", "cef", "cefg", "dcf", "dcfg",
        "ddf", "ddfg", "def", "defg", "ecf", "ecfg", "edf", "edfg", "eef", "eefg", "cccf",
        "cccfg", "ccdf", "ccdfg", "ccef", "ccefg", "cdcf", "cdcfg", "cddf", "cddfg", "cdef",
        "cdefg", "cecf", "cecfg", "cedf", "cedfg", "ceef", "ceefg", "dccf", "dccfg", "dcdf",
        "dcdfg", "dcef", "dcefg", "ddcf", "ddcfg", "dddf", "dddfg", "ddef", "ddefg", "decf",
        "decfg", "dedf", "dedfg", "deef", "deefg", "eccf", "eccfg", "ecdf", "ecdfg", "ecef",
        "ecefg", "edcf", "edcfg", "eddf", "eddfg", "edef", "edefg", "eecf", "eecfg", "eedf",
        "eedfg", "eeef", "eeefg",
    ];
    let pattern = "([ab]|(c|[d-e]){2,3})f(g?)";
    assert_eq!(ordered(pattern), expected);
    assert_eq!(count(pattern).unwrap(), 76);
}

#[test]
fn assertions_produce_nothing() {
    assert_eq!(ordered(r"\bzz\b \Bzzz\B \bzzzz\B"), ["zz zzz zzzz"]);
    assert_eq!(ordered("$foo bar^"), ["foo bar"]);
    for pattern in [r"foo (?=\w+)", r"foo (?!\w+)", r"foo (?<=\w+)", r"foo (?<!\w+)"] {
        assert_eq!(ordered(pattern), ["foo "], "{pattern}");
    }
}

#[test]
fn escaped_characters() {
    for pattern in [r"/\+/", r"/\53/", r"/\053/", r"/\x2B/", r"/\u002B/"] {
        assert_eq!(ordered(pattern), ["+"], "{pattern}");
    }
    for (pattern, expected) in [
        (r"\t", "\t"),
        (r"\n", "\n"),
        (r"\v", "\u{b}"),
        (r"\f", "\u{c}"),
        (r"\0", "\0"),
        (r"\cJ", "\n"),
        (r"\cj", "\n"),
        (r"\cM", "\r"),
        ("\r", "\r"),
    ] {
        assert_eq!(ordered(pattern), [expected], "{pattern:?}");
    }
}

#[test]
fn backreferences() {
    assert_eq!(ordered(r"(a) \1 (z) \2"), ["a a z z"]);
    assert_eq!(ordered(r"(?:ignored) (a) \1"), ["ignored a a"]);
    assert_eq!(ordered(r"(?<foo>a) \k<foo> (?<bar>z) \k<bar>"), ["a a z z"]);
    assert_eq!(
        ordered(r"(?<foo>a) \k<foo> \1 (?<bar>z) \2 \k<bar>"),
        ["a a a z z z"]
    );
    assert_eq!(
        ordered(r"(a|b) \1 (y|z) \2"),
        ["a a y y", "a a z z", "b b y y", "b b z z"]
    );
    assert_eq!(
        ordered(r"(?<foo>a|b) \k<foo> \1 (?<bar>y|z) \2 \k<bar>"),
        ["a a a y y y", "a a a z z z", "b b b y y y", "b b b z z z"]
    );
    assert_eq!(count(r"/(?<foo>a|b) \k<foo> \1/").unwrap(), 2);
}

#[test]
fn backreference_before_its_group() {
    assert_eq!(ordered(r"\k<x> (?<x>ab)"), ["undefined ab"]);
    let strings = expand_all(r"(?<x>ab)? \k<x>").unwrap();
    assert_eq!(strings.into_iter().collect::<HashSet<_>>(), set(&[" undefined", "ab ab"]));
}

#[test]
fn repeated_backreferences() {
    assert_eq!(ordered(r"(a|b)\1{2}"), ["aaa", "bbb"]);
    assert_eq!(
        expand_all(r"(ab)\1?").unwrap().into_iter().collect::<HashSet<_>>(),
        set(&["ab", "abab"])
    );
    assert_eq!(count(r"(a|b)\1*").unwrap(), 202);
    assert_eq!(ordered(r"(?<x>[12])-\k<x>+")[..2], ["1-1", "1-11"]);
}

#[test]
fn concurrent_expansions_keep_their_own_groups() {
    let config = Config::new().ordered(true);
    for (first, second) in [
        (r"(a|b) \1", r"(y|z) \1"),
        (r"(?<foo>a|b) \k<foo>", r"(?<foo>y|z) \k<foo>"),
    ] {
        let mut first = config.expand(first).unwrap().iter();
        let mut second = config.expand(second).unwrap().iter();
        assert_eq!(first.next().as_deref(), Some("a a"));
        assert_eq!(second.next().as_deref(), Some("y y"));
        assert_eq!(first.next().as_deref(), Some("b b"));
        assert_eq!(second.next().as_deref(), Some("z z"));
    }

    let expansion = expand(r"([a-c])-\1").unwrap();
    let mut left = expansion.iter();
    let mut right = expansion.iter();
    let mut seen = vec![];
    while let (Some(l), Some(r)) = (left.next(), right.next()) {
        seen.push(l);
        seen.push(r);
    }
    assert_eq!(seen.len(), 6);
    for value in seen {
        assert_eq!(value[..1], value[2..], "{value}");
    }
}

#[test]
fn random_order_varies() {
    for pattern in [r"/\d/", "/a+/", "/(a|b|c|d|e|f|g)/", "/aaaaaaaa/i", "/[A-I]/"] {
        let runs: HashSet<String> = (0..20)
            .map(|_| expand_all(pattern).unwrap().join(","))
            .collect();
        assert!(runs.len() > 1, "{pattern}");
    }

    let lengths: HashSet<usize> = (0..50)
        .flat_map(|_| expand_n("/[ab]{1,2}/", 2).unwrap())
        .map(|s| s.len())
        .collect();
    assert!(lengths.len() > 1);
}

#[test]
fn random_order_reaches_every_level() {
    for pattern in [r"/\w\w\w/", r"/\w{3}/", "/[a-z][a-z][a-z]/i"] {
        let strings = expand_n(pattern, 50).unwrap();
        for level in 0..3 {
            let chars: HashSet<char> = strings
                .iter()
                .filter_map(|s| s.chars().nth(level))
                .collect();
            assert!(chars.len() > 1, "{pattern} at {level}");
        }
    }
}

#[test]
fn random_order_is_complete() {
    for (pattern, expected) in [
        (r"/\d/", set(&["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"])),
        ("/a{0,5}/", set(&["", "a", "aa", "aaa", "aaaa", "aaaaa"])),
        ("/[ab]{3}/", set(&["aaa", "aab", "aba", "abb", "baa", "bab", "bba", "bbb"])),
        ("/aAä/i", set(&["aaä", "aaÄ", "aAä", "AaÄ", "Aaä", "aAÄ", "AAä", "AAÄ"])),
    ] {
        let strings = expand_all(pattern).unwrap();
        assert_eq!(strings.len(), expected.len(), "{pattern}");
        assert_eq!(strings.into_iter().collect::<HashSet<_>>(), expected);
    }
}

#[test]
fn seeded_order_repeats() {
    let config = Config::new().seed(1234);
    let first = config.expand_all(r"([a-c]|x{1,3})\d").unwrap();
    assert_eq!(first, config.expand_all(r"([a-c]|x{1,3})\d").unwrap());
    assert_eq!(first.len(), 60);
}

#[test]
fn case_insensitive() {
    for pattern in ["/aB/", r"/\141\102/", r"/\x61\x42/", r"/\u0061\u0042/"] {
        assert_eq!(ordered(pattern), ["aB"], "{pattern}");
    }
    for pattern in ["/aB/i", r"/\141\102/i", r"/\x61\x42/i", r"/\u0061\u0042/i"] {
        assert_eq!(ordered(pattern), ["ab", "aB", "Ab", "AB"], "{pattern}");
    }
    assert_eq!(ordered("/àÑ/i"), ["àñ", "àÑ", "Àñ", "ÀÑ"]);
    assert_eq!(ordered("/4%/i"), ["4%"]);
    assert_eq!(ordered("/©×/i"), ["©×"]);
    assert_eq!(count("/aAa/i").unwrap(), 8);
}

#[test]
fn case_insensitive_classes() {
    for pattern in ["/[aB]/i", r"/[\141\102]/i", r"/[\x61\x42]/i", r"/[\u0061\u0042]/i"] {
        assert_eq!(ordered(pattern), ["a", "A", "b", "B"], "{pattern}");
    }
    assert_eq!(ordered("/[àÑ]/i"), ["à", "À", "ñ", "Ñ"]);
    assert_eq!(ordered("/[4%]/i"), ["4", "%"]);
    assert_eq!(ordered("/[©×]/i"), ["©", "×"]);
    for pattern in ["/[a-d]/i", r"/[\141-\144]/i", r"/[\x61-\x64]/i", r"/[\u0061-\u0064]/i"] {
        assert_eq!(
            ordered(pattern),
            ["a", "A", "b", "B", "c", "C", "d", "D"],
            "{pattern}"
        );
    }
    for pattern in ["/[Ì-Ï]/", r"/[\314-\317]/", r"/[\xCC-\xCF]/", r"/[\u00CC-\u00CF]/"] {
        assert_eq!(ordered(pattern), ["Ì", "Í", "Î", "Ï"], "{pattern}");
    }
    for pattern in ["/[Ì-Ï]/i", r"/[\314-\317]/i", r"/[\xCC-\xCF]/i", r"/[\u00CC-\u00CF]/i"] {
        assert_eq!(
            ordered(pattern),
            ["ì", "Ì", "í", "Í", "î", "Î", "ï", "Ï"],
            "{pattern}"
        );
    }
    for pattern in ["/[1-4]/i", r"/[\61-\64]/i", "/[¼-¿]/i", r"/[\274-\277]/i"] {
        assert_eq!(ordered(pattern).len(), 4, "{pattern}");
    }
    assert_eq!(ordered("/[¼-¿]/i"), ["¼", "½", "¾", "¿"]);
}

#[test]
fn unsupported_syntax() {
    let patterns = [
        "a?+",
        "a*+",
        "a++",
        "a{1,2}+",
        "a{1,}+",
        "(?'x'abc)",
        "(?P<x>abc)",
        "(?<x>a)|(?<x>b)",
        "(?<20>a)",
        "(?<-17>abc)",
        "(?<x>a) (?P=x)",
        r"(?<x>a\k<x>?)",
        r"(?<x>a\k<x>?){3}",
        r"(\k<x>?(?<x>a)){3}",
        "[[.span-ll.]]",
        "a(?#foobar)b",
        r"(x)(?|(a)|(bc)|(def))\2",
        "a(?>bc|b)c",
        "(?(?<=a)b|c)",
        r"(?(\d{2})7|c)",
        "(a)?(?(1)b|c)",
        "(a)?(?(+1)b|c)",
        "(a)?(?(-1)b|c)",
        "(?<one>a)?(?(one)b|c)",
        r"(?<l>\w)+\w?(\k<l>(?<-l>))+(?(l)(?!))",
        "a(?R)?z",
        "a(?0)?z",
        "a(b(?1)?y)z",
        "a(b(?-1)?y)z",
        "(?+1)x([ab])",
        "a(?<x>b(?&x)?y)z",
        "(?(DEFINE)([ab]))x(?1)y(?1)z",
        "/[𝒳-𝒵]/u",
    ];
    for pattern in patterns {
        assert!(expand_all(pattern).is_err(), "{pattern}");
    }
    assert!(matches!(
        expand_all("a++"),
        Err(Error::Unsupported { construct: "possessive quantifier" })
    ));
}

#[test]
fn mode_modifiers_are_unsupported() {
    for modifier in ["^", "i", "c", "x", "xx", "s", "m", "n", "J", "U", "X"] {
        for pattern in [
            format!("(?{modifier})test"),
            format!("te(?{modifier})st"),
            format!("(?-{modifier})test"),
            format!("(?{modifier}-i)test"),
            format!("(?i-{modifier})test"),
            format!("(?{modifier}-i:te)st"),
        ] {
            assert!(expand_all(&pattern).is_err(), "{pattern}");
        }
    }
}

#[test]
fn unrecognized_syntax_is_literal() {
    assert_eq!(ordered(r"/\x{2B}/"), ["x{2B}"]);
    assert_eq!(ordered(r"/\u{002B}/"), ["u{002B}"]);
    assert_eq!(ordered(r"/\R/"), ["R"]);
    assert_eq!(ordered(r"/\N/"), ["N"]);
    for pattern in ["/a{,5}/", "/a{,5}?/"] {
        assert_eq!(ordered(pattern).pop().as_deref(), Some("a{,5}"));
    }
    assert_ne!(ordered("/[𝒳𝒴]/u"), ["𝒳", "𝒴"]);

    let c_to_i = ["c", "d", "e", "f", "g", "h", "i"];
    for pattern in ["/[c-m-[j-z]]/", "/[a-i&&c-z]/", "/[a-i&&[c-z]]/"] {
        assert_ne!(ordered(pattern), c_to_i, "{pattern}");
    }
}

#[test]
fn posix_classes_are_literal() {
    for class in ["alnum", "alpha", "digit", "space", "word", "xdigit", "d", "w", "V"] {
        for pattern in [format!("[[:{class}:]]"), format!("[[:^{class}:]]")] {
            assert_eq!(ordered(&pattern).pop().as_deref(), Some(":]"), "{pattern}");
        }
    }
    assert_eq!(ordered("[[=e=]]"), ["e]", "=]", "[]"]);
}

#[test]
fn unicode_properties_are_literal() {
    for pattern in [
        r"\p{Alnum}",
        r"\p{IsAlpha}",
        r"\p{Latin-1_Supplement}",
        r"\p{InLatin-1 Supplement}",
        r"\p{L&}",
        r"\p{^L&}",
    ] {
        let strings = ordered(pattern);
        assert_eq!(strings.len(), 1, "{pattern}");
        assert!(strings[0].starts_with("p{"), "{pattern}");
    }
    assert!(ordered(r"\P{^L&}")[0].starts_with("P{"));
    for category in ["L", "M", "Z", "S", "N", "P", "C"] {
        let pattern = format!(r"\p{category}");
        assert_eq!(ordered(&pattern), [format!("p{category}")]);
    }
}

#[test]
fn recursion_lookalikes_are_not_recursive() {
    let strings = ordered(r"a\g<0>?z");
    assert_eq!(strings.len(), 2);
    assert!(!strings.contains(&"aaazzz".to_owned()));
}

#[test]
fn counts() {
    assert_eq!(count("/a*/").unwrap(), 101);
    assert_eq!(count("/a{150,}/").unwrap(), 1);
    assert_eq!(count("a{0,20000}").unwrap(), 20_001);
    assert_eq!(count(r"/(a)|b\1/").unwrap(), 2);
    assert_eq!(count("(").err().map(|err| matches!(err, Error::Parse { .. })), Some(true));
}

#[test]
fn huge_counts_are_approximate() {
    let close_to = |pattern: &str, expected: f64| match count(pattern).unwrap() {
        Count::Approx(value) => assert!((value / expected - 1.0).abs() < 1e-9, "{pattern}"),
        other => panic!("{pattern} counted {other:?}"),
    };
    close_to(r"\d{40}", 1e40);
    close_to(r"/\w{30}/", 63f64.powi(30));
    close_to(".{20}", 219f64.powi(20));
    assert_eq!(count(r"\d{38}").unwrap(), 10u128.pow(38));
}

#[test]
fn expand_n_is_bounded_by_count() {
    assert_eq!(expand_n("[ab]", 5).unwrap().len(), 2);
    assert_eq!(expand_n(r"\w\w\w", 1000).unwrap().len(), 1000);
    assert!(expand_n("[ab]", 0).unwrap().is_empty());
    for value in expand_n(r"(\w\d\s)", 1000).unwrap() {
        assert_eq!(value.chars().count(), 3);
    }
}
