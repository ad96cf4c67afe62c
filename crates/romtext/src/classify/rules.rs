//! Ordered classifier rules. The first rule whose predicate holds decides.

use crate::config::ClassifierConfig;

use super::stats::TextStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

pub type Predicate = fn(&TextStats, &ClassifierConfig) -> bool;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub verdict: Verdict,
    pub applies: Predicate,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("verdict", &self.verdict)
            .finish()
    }
}

/// Name reported when no rule matched
pub const FALLBACK_RULE: &str = "default";

pub static RULES: &[Rule] = &[
    Rule {
        name: "too_short",
        verdict: Verdict::Reject,
        applies: |s, c| s.trimmed_len < c.min_trimmed_chars,
    },
    Rule {
        name: "too_long",
        verdict: Verdict::Reject,
        applies: |s, c| s.len > c.max_total_chars,
    },
    Rule {
        name: "control_chars",
        verdict: Verdict::Reject,
        applies: |s, c| s.control_frac() > c.max_control_frac,
    },
    Rule {
        name: "no_letters",
        verdict: Verdict::Reject,
        applies: |s, c| s.native < c.min_native_override && s.latin_digits < c.min_latin_digits,
    },
    Rule {
        name: "unprintable",
        verdict: Verdict::Reject,
        applies: |s, c| s.printable_frac() < c.min_printable_frac,
    },
    Rule {
        name: "escape_heavy",
        verdict: Verdict::Reject,
        applies: |s, c| s.escape_tokens > 0 && s.escape_frac() > c.max_escape_frac,
    },
    // Real kana/kanji content wins over every heuristic below
    Rule {
        name: "native_dialogue",
        verdict: Verdict::Accept,
        applies: |s, c| {
            s.native >= c.min_native_override && (s.escape_tokens as f64) < s.len as f64 * 0.5
        },
    },
    Rule {
        name: "short_latin",
        verdict: Verdict::Reject,
        applies: |s, c| s.native == 0 && s.printable < c.min_non_native_printable,
    },
    Rule {
        name: "few_latin",
        verdict: Verdict::Reject,
        applies: |s, c| s.native == 0 && s.latin_digits < c.min_latin_digits,
    },
    Rule {
        name: "repeated_pattern",
        verdict: Verdict::Reject,
        applies: |s, _| {
            let repeated = s.is_single_char() || s.repeat_block.is_some();
            let single_native = s.is_single_char() && s.first_char_native;
            repeated && !single_native
        },
    },
    Rule {
        name: "native_latin_prefix",
        verdict: Verdict::Reject,
        applies: |s, _| s.native_then_latin,
    },
    Rule {
        name: "short_code_prefix",
        verdict: Verdict::Reject,
        applies: |s, _| {
            (1..=3).contains(&s.leading_alnum) && s.leading_alnum < s.prefix_len && s.len < 8
        },
    },
];

/// Find the first rule that applies
pub fn first_match(stats: &TextStats, config: &ClassifierConfig) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.applies)(stats, config))
}
