//! Follow-up classification.
//!
//! Decides whether an utterance continues the previous exchange (so the
//! stored context is echoed back) or starts a fresh top-level question.
//! The policy is a strategy object so a smarter classifier can replace the
//! keyword heuristic without touching the orchestrator.

/// Short affirmations that always continue the previous exchange.
pub const AFFIRMATIONS: &[&str] = &[
    "y", "yes", "yeah", "yup", "sure", "ok", "okay", "please", "do it", "go ahead",
];

/// Tokens that hint at acting on the previous answer (substring match).
pub const CONTINUATION_HINTS: &[&str] = &[
    "detail",
    "details",
    "report",
    "list",
    "show",
    "view",
    "csv",
    "export",
    "download",
    "chart",
    "png",
    "image",
    "graph",
    "compare",
    "last week",
    "week",
    "draft",
    "send",
];

/// Maps raw user text to "continues the prior exchange" or not.
///
/// Implementations never fail; they only guess.
pub trait FollowupClassifier: Send + Sync {
    fn classify(&self, text: &str) -> bool;
}

/// Keyword heuristic: exact affirmation match, then hint substring match.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    affirmations: Vec<String>,
    hints: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(AFFIRMATIONS, CONTINUATION_HINTS)
    }
}

impl KeywordClassifier {
    /// Build a classifier from custom word lists. Entries are lower-cased.
    pub fn new<S: AsRef<str>>(affirmations: &[S], hints: &[S]) -> Self {
        let lower = |items: &[S]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            affirmations: lower(affirmations),
            hints: lower(hints),
        }
    }
}

impl FollowupClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> bool {
        let t = text.trim().to_lowercase();
        if t.is_empty() {
            return false;
        }
        if self.affirmations.iter().any(|a| *a == t) {
            return true;
        }
        self.hints.iter().any(|h| t.contains(h.as_str()))
    }
}
