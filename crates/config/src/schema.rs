/// Config schema types (telegram, content api, advisor, routing).
use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    talapker_common::Language,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TalapkerConfig {
    pub telegram: TelegramConfig,
    pub content_api: ContentApiConfig,
    pub advisor: AdvisorConfig,
    pub routing: RoutingConfig,
}

/// Telegram bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
        }
    }
}

impl TelegramConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Structured content HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentApiConfig {
    /// Base URL, e.g. `http://content-api:8080`.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Language tried when a topic has no row in the requested language.
    pub fallback_language: Language,
}

impl Default for ContentApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".into(),
            timeout_secs: 5,
            fallback_language: Language::Ru,
        }
    }
}

impl ContentApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Remote intent/generation service. Disabled when `url` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Request timeout in seconds. Generation is slow on CPU-only hosts.
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 20,
        }
    }
}

impl AdvisorConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// Dialogue routing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Minimum classifier confidence for a category to be acted upon.
    pub confidence_threshold: f64,
    /// Number of follow-up turns kept in casual-chat mode after it fires.
    pub smalltalk_window: u32,
    /// Treat a confident non-smalltalk classifier category as a menu topic.
    pub route_classified_topics: bool,
    /// Drop conversations idle for longer than this (seconds). 0 keeps them forever.
    pub idle_ttl_secs: u64,
    /// How often the idle sweep runs (seconds).
    pub sweep_interval_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.65,
            smalltalk_window: 1,
            route_classified_topics: false,
            idle_ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 10 * 60,
        }
    }
}

impl RoutingConfig {
    #[must_use]
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let cfg = TalapkerConfig::default();
        assert!(!cfg.telegram.has_token());
        assert_eq!(cfg.telegram.poll_timeout_secs, 30);
        assert_eq!(cfg.content_api.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.content_api.fallback_language, Language::Ru);
        assert!(!cfg.advisor.enabled());
        assert_eq!(cfg.advisor.timeout(), Duration::from_secs(20));
        assert!((cfg.routing.confidence_threshold - 0.65).abs() < f64::EPSILON);
        assert_eq!(cfg.routing.smalltalk_window, 1);
        assert!(!cfg.routing.route_classified_topics);
    }

    #[test]
    fn deserialize_partial_toml() {
        let raw = r#"
            [telegram]
            token = "123:ABC"

            [advisor]
            url = "http://nlp:8000"

            [routing]
            smalltalk_window = 3
            idle_ttl_secs = 0
        "#;
        let cfg: TalapkerConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert!(cfg.advisor.enabled());
        assert_eq!(cfg.routing.smalltalk_window, 3);
        assert!(cfg.routing.idle_ttl().is_none());
        // untouched sections keep defaults
        assert_eq!(cfg.content_api.url, "http://localhost:8080");
    }

    #[test]
    fn blank_advisor_url_is_disabled() {
        let cfg = AdvisorConfig {
            url: Some("  ".into()),
            ..Default::default()
        };
        assert!(!cfg.enabled());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("secret-token".into()),
            ..Default::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
