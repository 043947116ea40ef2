//! Semantic validation of a loaded configuration.
//!
//! Parsing already rejects type errors; this pass catches values that parse
//! but would make the bot misbehave at runtime.

use crate::schema::TalapkerConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "routing.confidence_threshold"
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate a configuration.
#[must_use]
pub fn validate(config: &TalapkerConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !config.telegram.has_token() {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token is empty (set it in the config file or TELEGRAM_TOKEN)",
        );
    }

    if !is_http_url(&config.content_api.url) {
        result.push(
            Severity::Error,
            "content_api.url",
            format!("expected an http(s) URL, got {:?}", config.content_api.url),
        );
    }
    if config.content_api.timeout_secs == 0 {
        result.push(Severity::Error, "content_api.timeout_secs", "must be > 0");
    }

    match config.advisor.url.as_deref() {
        _ if !config.advisor.enabled() => result.push(
            Severity::Warning,
            "advisor.url",
            "advisor is not configured; only menu navigation will work",
        ),
        Some(url) if !is_http_url(url) => result.push(
            Severity::Error,
            "advisor.url",
            format!("expected an http(s) URL, got {url:?}"),
        ),
        _ => {},
    }
    if config.advisor.timeout_secs == 0 {
        result.push(Severity::Error, "advisor.timeout_secs", "must be > 0");
    }

    let threshold = config.routing.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        result.push(
            Severity::Error,
            "routing.confidence_threshold",
            format!("must be within [0, 1], got {threshold}"),
        );
    }
    if config.routing.smalltalk_window == 0 {
        result.push(
            Severity::Warning,
            "routing.smalltalk_window",
            "0 disables casual-chat stickiness",
        );
    }

    result
}
