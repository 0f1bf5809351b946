//! Best-effort textual repair for near-JSON input.
//!
//! An ordered list of pure rewrite rules followed by a bracket-balancing
//! scan. The pass is heuristic: it always produces output, the output may
//! still fail validation, and repairing twice is not guaranteed to be a
//! no-op. Callers re-validate afterwards and rely on the undo history for
//! rollback.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

enum Rewrite {
    /// Straight `$n` template substitution.
    Template(&'static str),
    /// Template substitution, skipped when the byte immediately after the
    /// match is another `"` (stands in for the lookahead the original
    /// patterns used).
    UnlessQuoteFollows(&'static str),
}

pub struct RewriteRule {
    pub name: &'static str,
    pattern: Regex,
    rewrite: Rewrite,
}

impl RewriteRule {
    fn new(name: &'static str, pattern: &str, rewrite: Rewrite) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("rewrite rule pattern"),
            rewrite,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.rewrite {
            Rewrite::Template(rep) => self.pattern.replace_all(text, *rep).into_owned(),
            Rewrite::UnlessQuoteFollows(rep) => self.apply_guarded(text, rep),
        }
    }

    fn apply_guarded(&self, text: &str, rep: &str) -> String {
        let mut out = String::with_capacity(text.len() + 8);
        let mut last = 0;
        for caps in self.pattern.captures_iter(text) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            out.push_str(&text[last..whole.start()]);
            if text[whole.end()..].starts_with('"') {
                out.push_str(whole.as_str());
            } else {
                caps.expand(rep, &mut out);
            }
            last = whole.end();
        }
        out.push_str(&text[last..]);
        out
    }
}

/// The rewrite chain, in application order. Kept as data so each rule can
/// be exercised on its own.
static RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| {
    vec![
        // {key: 1} -> {"key": 1}
        RewriteRule::new(
            "quote-bare-keys",
            r#"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#,
            Rewrite::Template(r#"${1}"${2}":"#),
        ),
        // [1, 2,] -> [1, 2]
        RewriteRule::new(
            "drop-trailing-commas",
            r#",(\s*[\]}])"#,
            Rewrite::Template("${1}"),
        ),
        // } "x" -> }, "x"
        RewriteRule::new(
            "comma-brace-quote",
            r#"\}(\s*)""#,
            Rewrite::UnlessQuoteFollows("},${1}\""),
        ),
        // ] "x" -> ], "x"
        RewriteRule::new(
            "comma-bracket-quote",
            r#"\](\s*)""#,
            Rewrite::UnlessQuoteFollows("],${1}\""),
        ),
        // } { -> }, {
        RewriteRule::new(
            "comma-brace-brace",
            r#"\}(\s*)\{"#,
            Rewrite::Template("},${1}{"),
        ),
        // ] { -> ], {
        RewriteRule::new(
            "comma-bracket-brace",
            r#"\](\s*)\{"#,
            Rewrite::Template("],${1}{"),
        ),
        // } [ -> }, [
        RewriteRule::new(
            "comma-brace-bracket",
            r#"\}(\s*)\["#,
            Rewrite::Template("},${1}["),
        ),
        // ] [ -> ], [
        RewriteRule::new(
            "comma-bracket-bracket",
            r#"\](\s*)\["#,
            Rewrite::Template("],${1}["),
        ),
        // "a"\n"b" -> "a",\n"b"
        RewriteRule::new(
            "comma-quote-newline-quote",
            "\"(\\s*\\n\\s*)\"",
            Rewrite::UnlessQuoteFollows("\",${1}\""),
        ),
        // 1 "x" / 1 { / 1 [ -> 1, ...
        RewriteRule::new(
            "comma-digit-open",
            r#"(\d)(\s+)(["{\[])"#,
            Rewrite::Template("${1},${2}${3}"),
        ),
        // "x" 1 -> "x", 1
        RewriteRule::new(
            "comma-quote-digit",
            r#""(\s+)(\d)"#,
            Rewrite::Template("\",${1}${2}"),
        ),
        // true "x" etc. -> true, "x"
        RewriteRule::new(
            "comma-literal-open",
            r#"(true|false|null)(\s+)(["{\[])"#,
            Rewrite::Template("${1},${2}${3}"),
        ),
        // "x" true -> "x", true
        RewriteRule::new(
            "comma-quote-literal",
            r#""(\s+)(true|false|null)"#,
            Rewrite::Template("\",${1}${2}"),
        ),
    ]
});

pub fn rules() -> &'static [RewriteRule] {
    &RULES
}

/// Run the full repair pass: trim, apply every rewrite rule in order, then
/// balance brackets. The result is not guaranteed to parse; callers must
/// re-validate.
pub fn repair(text: &str) -> String {
    let mut fixed = text.trim().to_string();

    for rule in rules() {
        let rewritten = rule.apply(&fixed);
        if rewritten != fixed {
            debug!(rule = rule.name, "repair rule rewrote buffer");
            fixed = rewritten;
        }
    }

    balance_brackets(&fixed)
}

/// Character scan with a bracket stack: closers that do not match the stack
/// top are dropped; closers for everything still open are appended in pop
/// order (innermost first).
pub fn balance_brackets(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut fixed = String::with_capacity(text.len() + 4);

    for ch in text.chars() {
        match ch {
            '{' | '[' => {
                stack.push(ch);
                fixed.push(ch);
            }
            '}' | ']' => {
                let expected = if ch == '}' { '{' } else { '[' };
                if stack.last() == Some(&expected) {
                    stack.pop();
                    fixed.push(ch);
                }
                // Mismatched closer: dropped.
            }
            _ => fixed.push(ch),
        }
    }

    while let Some(open) = stack.pop() {
        fixed.push(if open == '{' { '}' } else { ']' });
    }

    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{validate, ValidationStatus};

    fn rule(name: &str) -> &'static RewriteRule {
        rules()
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no rule named {}", name))
    }

    #[test]
    fn test_quote_bare_keys() {
        assert_eq!(
            rule("quote-bare-keys").apply(r#"{a:1, b_2:2}"#),
            r#"{"a":1, "b_2":2}"#
        );
    }

    #[test]
    fn test_drop_trailing_commas() {
        assert_eq!(
            rule("drop-trailing-commas").apply("[1, 2,\n]"),
            "[1, 2\n]"
        );
    }

    #[test]
    fn test_comma_between_close_and_quote() {
        assert_eq!(rule("comma-brace-quote").apply(r#"} "b""#), r#"}, "b""#);
        assert_eq!(rule("comma-bracket-quote").apply(r#"] "b""#), r#"], "b""#);
    }

    #[test]
    fn test_quote_guard_blocks_rewrite() {
        // A second quote right after the match leaves the text alone.
        assert_eq!(rule("comma-brace-quote").apply(r#"}"""#), r#"}"""#);
    }

    #[test]
    fn test_comma_between_adjacent_containers() {
        assert_eq!(rule("comma-brace-brace").apply("} {"), "}, {");
        assert_eq!(rule("comma-bracket-bracket").apply("] ["), "], [");
    }

    #[test]
    fn test_comma_across_newline_strings() {
        assert_eq!(
            rule("comma-quote-newline-quote").apply("\"a\"\n\"b\""),
            "\"a\",\n\"b\""
        );
    }

    #[test]
    fn test_comma_around_numbers_and_literals() {
        assert_eq!(rule("comma-digit-open").apply(r#"1 "x""#), r#"1, "x""#);
        assert_eq!(rule("comma-quote-digit").apply(r#""x" 1"#), r#""x", 1"#);
        assert_eq!(rule("comma-literal-open").apply(r#"true "x""#), r#"true, "x""#);
        assert_eq!(rule("comma-quote-literal").apply(r#""x" null"#), r#""x", null"#);
    }

    #[test]
    fn test_balance_appends_missing_closers_in_pop_order() {
        assert_eq!(balance_brackets(r#"{"a": [1, 2"#), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_balance_drops_mismatched_closers() {
        assert_eq!(balance_brackets("[1, 2}"), "[1, 2]");
        assert_eq!(balance_brackets("}]"), "");
    }

    #[test]
    fn test_repair_bare_keys_and_trailing_comma() {
        let fixed = repair("{a:1, b:2,}");
        assert_eq!(fixed, r#"{"a":1, "b":2}"#);
        assert!(validate(&fixed).is_valid());
    }

    #[test]
    fn test_repair_unterminated_object() {
        let fixed = repair(r#"{"a":1"#);
        assert_eq!(fixed, r#"{"a":1}"#);
        assert!(validate(&fixed).is_valid());
    }

    #[test]
    fn test_repair_missing_separators() {
        let fixed = repair("{\"a\": 1 \"b\": {\"c\": 2} \"d\": [3]}");
        match validate(&fixed) {
            ValidationStatus::Valid { items, .. } => {
                assert_eq!(items, crate::validate::ItemCount::Items(3));
            }
            other => panic!("expected repaired text to validate, got {:?}", other),
        }
    }

    #[test]
    fn test_repair_output_still_may_fail() {
        // Not everything is fixable; the pass must still return output.
        let fixed = repair("\"a\" \"b\"");
        assert!(!validate(&fixed).is_valid());
    }

    #[test]
    fn test_repair_converges_on_documented_examples() {
        // Idempotence is not guaranteed in general; on the documented
        // examples a second pass is a no-op.
        for input in ["{a:1, b:2,}", r#"{"a":1"#, "[1, 2}"] {
            let once = repair(input);
            assert_eq!(repair(&once), once, "input: {}", input);
        }
    }
}
