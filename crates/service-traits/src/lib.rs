//! Service boundaries consumed by the reply engine.
//!
//! The engine only sees these traits; HTTP adapters live in
//! `talapker-providers` and tests substitute in-process fakes.

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    talapker_common::{Language, Turn},
};

/// Failures reported by a service boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no content for topic {topic} ({language})")]
    NotFound { topic: String, language: Language },
    #[error("advisor unavailable: {message}")]
    AdvisorUnavailable { message: String },
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl Error {
    #[must_use]
    pub fn not_found(topic: impl Into<String>, language: Language) -> Self {
        Self::NotFound {
            topic: topic.into(),
            language,
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::AdvisorUnavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn malformed(message: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Content ─────────────────────────────────────────────────────────────────

/// Localized content for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub title: String,
    pub body: String,
}

impl Content {
    /// Text as sent to the user.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch `topic` in `language`. Language fallback is the provider's
    /// business; `NotFound` means no usable row exists at all.
    async fn get(&self, topic: &str, language: Language) -> Result<Content>;
}

// ── Advisor ─────────────────────────────────────────────────────────────────

/// Category the remote classifier uses for casual chat.
pub const SMALLTALK: &str = "smalltalk";

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: String,
    /// In `[0, 1]`.
    pub confidence: f64,
}

impl Classification {
    #[must_use]
    pub fn is_smalltalk(&self) -> bool {
        self.category == SMALLTALK
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub short_answer: Option<String>,
    pub long_answer: String,
}

impl Generation {
    /// The non-blank short answer if there is one, else the non-blank long
    /// answer.
    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        self.short_answer
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| Some(self.long_answer.as_str()).filter(|s| !s.trim().is_empty()))
    }
}

/// Remote intent classification and answer generation.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification>;

    /// Answer `text` in `language`, given the recent history (which already
    /// ends with the user turn for `text`).
    async fn generate(&self, text: &str, language: Language, history: &[Turn])
    -> Result<Generation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_answer_order() {
        let both = Generation {
            short_answer: Some("short".into()),
            long_answer: "long".into(),
        };
        assert_eq!(both.preferred(), Some("short"));

        let blank_short = Generation {
            short_answer: Some("  ".into()),
            long_answer: "long".into(),
        };
        assert_eq!(blank_short.preferred(), Some("long"));

        let nothing = Generation {
            short_answer: None,
            long_answer: "\n".into(),
        };
        assert_eq!(nothing.preferred(), None);
    }

    #[test]
    fn content_render() {
        let c = Content {
            title: "Гранты".into(),
            body: "Список грантов".into(),
        };
        assert_eq!(c.render(), "Гранты\n\nСписок грантов");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::not_found("grants", Language::Kz).to_string(),
            "no content for topic grants (kz)"
        );
        assert_eq!(
            Error::unavailable("timeout").to_string(),
            "advisor unavailable: timeout"
        );
    }
}
