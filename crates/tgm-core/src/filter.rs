use tracing::info;

/// Keyword / blocked-word gate for source messages.
///
/// Both lists are expected lower-cased (config does that). Matching is a
/// case-insensitive substring test on the message text.
#[derive(Clone, Debug, Default)]
pub struct ContentFilter {
    keywords: Vec<String>,
    blocked_words: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Blocked { word: String },
    NoKeyword,
}

impl ContentFilter {
    pub fn new(keywords: Vec<String>, blocked_words: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            blocked_words: blocked_words
                .into_iter()
                .map(|b| b.to_lowercase())
                .collect(),
        }
    }

    /// Blocked words win over keywords; an empty keyword list accepts
    /// everything that is not blocked.
    pub fn evaluate(&self, text: &str) -> Verdict {
        let lower = text.to_lowercase();

        if let Some(word) = self.blocked_words.iter().find(|w| lower.contains(w.as_str())) {
            return Verdict::Blocked { word: word.clone() };
        }

        if !self.keywords.is_empty() && !self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            return Verdict::NoKeyword;
        }

        Verdict::Accept
    }

    pub fn should_copy(&self, text: &str) -> bool {
        match self.evaluate(text) {
            Verdict::Accept => {
                info!("All filters passed");
                true
            }
            Verdict::Blocked { word } => {
                info!(%word, "Blocked: contains blocked word");
                false
            }
            Verdict::NoKeyword => {
                info!("Skipped: no keywords match");
                false
            }
        }
    }
}
