//! NLP service client.
//!
//! * `POST {base}/ask` `{"text"}` → `{"slug","confidence","best_phrase"}`
//! * `POST {base}/chat_plus` `{"text","history"}` →
//!   `{"intent_slug","intent_confidence","mini_answer","llm_answer"}`
//!
//! The history sent to `chat_plus` starts with a system turn carrying the
//! reply-language instruction.

use std::time::Duration;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    talapker_common::{Language, Turn},
    talapker_config::AdvisorConfig,
    talapker_routing::texts,
    talapker_service_traits::{self as services, Advisor, Classification, Generation},
    tracing::{debug, warn},
};

use crate::{Error, Result, endpoint};

#[derive(Serialize)]
struct AskRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    slug: String,
    confidence: f64,
    #[serde(default)]
    best_phrase: Option<String>,
}

#[derive(Serialize)]
struct WireTurn<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatPlusRequest<'a> {
    text: &'a str,
    history: Vec<WireTurn<'a>>,
}

#[derive(Deserialize)]
struct ChatPlusResponse {
    #[serde(default)]
    intent_slug: Option<String>,
    #[serde(default)]
    intent_confidence: Option<f64>,
    #[serde(default)]
    mini_answer: Option<String>,
    #[serde(default)]
    llm_answer: String,
}

pub struct NlpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl NlpApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// `None` when no advisor URL is configured.
    pub fn from_config(config: &AdvisorConfig) -> Result<Option<Self>> {
        if !config.enabled() {
            return Ok(None);
        }
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::message("advisor url missing"))?;
        Self::new(url.trim(), config.timeout()).map(Some)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> services::Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, timeout = e.is_timeout(), "nlp request failed");
                services::Error::unavailable(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(path, %status, "nlp api error status");
            return Err(services::Error::unavailable(format!("nlp status {status}")));
        }

        let text = resp.text().await.map_err(services::Error::unavailable)?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(path, error = %e, "undecodable nlp response");
            services::Error::malformed(e)
        })
    }
}

/// History as sent on the wire, led by the language instruction.
fn wire_history(language: Language, history: &[Turn]) -> Vec<WireTurn<'_>> {
    std::iter::once(WireTurn {
        role: "system",
        content: texts(language).system_instruction,
    })
    .chain(history.iter().map(|t| WireTurn {
        role: t.role.as_str(),
        content: &t.text,
    }))
    .collect()
}

#[async_trait]
impl Advisor for NlpApiClient {
    async fn classify(&self, text: &str) -> services::Result<Classification> {
        let resp: AskResponse = self.post("ask", &AskRequest { text }).await?;
        debug!(
            category = %resp.slug,
            confidence = resp.confidence,
            best_phrase = resp.best_phrase.as_deref().unwrap_or(""),
            "classified"
        );
        Ok(Classification {
            category: resp.slug,
            confidence: resp.confidence.clamp(0.0, 1.0),
        })
    }

    async fn generate(
        &self,
        text: &str,
        language: Language,
        history: &[Turn],
    ) -> services::Result<Generation> {
        let request = ChatPlusRequest {
            text,
            history: wire_history(language, history),
        };
        let resp: ChatPlusResponse = self.post("chat_plus", &request).await?;
        debug!(
            intent = resp.intent_slug.as_deref().unwrap_or("unknown"),
            confidence = resp.intent_confidence.unwrap_or_default(),
            has_mini = resp.mini_answer.is_some(),
            "generated"
        );
        Ok(Generation {
            short_answer: resp.mini_answer,
            long_answer: resp.llm_answer,
        })
    }
}
