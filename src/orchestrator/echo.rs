//! Echo classification for recognizer finals that arrive mid-reply.
//!
//! When barge-in is enabled the recognizer keeps running while the assistant
//! speaks, so it hears the assistant through the speakers. A final that is a
//! fragment (or superset) of the sentence currently being spoken is almost
//! always that feedback, not the user. Both strings are reduced to bare
//! alphanumerics and compared by mutual containment.
//!
//! The containment test is deliberately coarse. A user who interrupts with a
//! phrase contained in the reply ("sunny today" while the assistant says
//! "The weather is sunny today") is misread as echo, and a mishearing that
//! drops the overlap passes through as a genuine interruption. Utterances
//! with no substring relation to the reply are always let through.

/// Strip everything but letters and digits, lowercased.
///
/// Unicode-aware on both counts, so Latvian diacritics survive.
pub(crate) fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Remembers what the assistant is currently saying, in both raw and
/// normalized form. Created when a reply starts speaking, dropped when the
/// turn ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SpokenTextMemo {
    text: String,
    normalized: String,
}

impl SpokenTextMemo {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = normalize(&text);
        Self { text, normalized }
    }

    /// The reply text exactly as handed to the speech output.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Classify a recognizer final heard while this text is being spoken.
    ///
    /// Blank finals count as echo: the recognizer produced nothing worth
    /// interrupting for.
    pub fn is_echo(&self, recognized: &str) -> bool {
        let heard = normalize(recognized);
        if heard.is_empty() {
            return true;
        }
        self.normalized.contains(&heard) || heard.contains(&self.normalized)
    }
}
