//! Heuristic separation of real dialogue from decoded binary noise.
//!
//! Arbitrary data often decodes to something, so every candidate string goes
//! through an ordered cascade of cheap statistical rules (see [`RULES`]). The
//! first rule that applies decides; a string no rule objects to is accepted.

mod rules;
mod stats;

pub use rules::{FALLBACK_RULE, Predicate, RULES, Rule, Verdict, first_match};
pub use stats::{PREFIX_SAMPLE_CHARS, TextStats, is_control, is_native, is_printable};

use tracing::trace;

use crate::config::ClassifierConfig;

/// Outcome of classifying one string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Name of the deciding rule
    pub rule: &'static str,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        self.verdict == Verdict::Accept
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Run the rule cascade and report which rule decided
    pub fn decide(&self, text: &str) -> Decision {
        let stats = TextStats::compute(text, &self.config);
        let decision = match first_match(&stats, &self.config) {
            Some(rule) => Decision {
                verdict: rule.verdict,
                rule: rule.name,
            },
            None => Decision {
                verdict: Verdict::Accept,
                rule: FALLBACK_RULE,
            },
        };
        trace!(
            "{:?} by {} (len={}, native={}, latin={}, escapes={})",
            decision.verdict, decision.rule, stats.len, stats.native, stats.latin_digits,
            stats.escape_tokens
        );
        decision
    }

    /// Whether `text` looks like genuine dialogue; absent text never does
    pub fn is_valid(&self, text: Option<&str>) -> bool {
        text.is_some_and(|t| self.decide(t).is_accept())
    }
}
