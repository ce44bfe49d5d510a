pub mod gemini;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Response mode selected from the overlay input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    #[default]
    General,
    Fix,
    Ask,
    Polite,
    Meme,
    Save,
}

impl CommandKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "fix" => Some(Self::Fix),
            "ask" => Some(Self::Ask),
            "polite" => Some(Self::Polite),
            "meme" => Some(Self::Meme),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Fix => "fix",
            Self::Ask => "ask",
            Self::Polite => "polite",
            Self::Meme => "meme",
            Self::Save => "save",
        }
    }
}

/// Accumulated output of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResult {
    pub text: String,
    /// Base64-encoded image payloads.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub source_urls: BTreeSet<String>,
}

impl StreamResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Each chunk carries the full text so far, so it replaces what was shown.
    pub fn apply_chunk(&mut self, accumulated_text: &str) {
        self.text.clear();
        self.text.push_str(accumulated_text);
    }

    /// Folds in the terminal result. Its text wins unless it is empty.
    pub fn finish(&mut self, final_result: StreamResult) {
        if !final_result.text.is_empty() || self.text.is_empty() {
            self.text = final_result.text;
        }
        self.images = final_result.images;
        self.source_urls.extend(final_result.source_urls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_replace_instead_of_append() {
        let mut result = StreamResult::default();
        for chunk in ["a", "ab", "abc"] {
            result.apply_chunk(chunk);
        }
        assert_eq!(result.text, "abc");
    }

    #[test]
    fn test_finish_keeps_streamed_text_when_final_is_empty() {
        let mut result = StreamResult::text("streamed");
        result.finish(StreamResult {
            text: String::new(),
            images: vec!["aGk=".to_string()],
            source_urls: BTreeSet::from(["https://a.example".to_string()]),
        });
        assert_eq!(result.text, "streamed");
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.source_urls.len(), 1);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(CommandKind::from_keyword("FIX"), Some(CommandKind::Fix));
        assert_eq!(CommandKind::from_keyword("Polite"), Some(CommandKind::Polite));
        assert_eq!(CommandKind::from_keyword("save"), None);
        assert_eq!(CommandKind::from_keyword("fixes"), None);
    }
}
