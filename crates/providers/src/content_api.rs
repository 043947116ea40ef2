//! Content store client: `GET {base}/content?slug=..&lang=..`.

use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::StatusCode,
    talapker_common::Language,
    talapker_config::ContentApiConfig,
    talapker_service_traits::{self as services, Content, ContentProvider},
    tracing::{debug, warn},
};

use crate::{Result, endpoint};

pub struct ContentApiClient {
    client: reqwest::Client,
    base_url: String,
    fallback: Language,
}

impl ContentApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, fallback: Language) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            fallback,
        })
    }

    pub fn from_config(config: &ContentApiConfig) -> Result<Self> {
        Self::new(&config.url, config.timeout(), config.fallback_language)
    }

    /// One lookup. `Ok(None)` on 404.
    async fn fetch(&self, topic: &str, language: Language) -> services::Result<Option<Content>> {
        let url = endpoint(&self.base_url, "content");
        let resp = self
            .client
            .get(&url)
            .query(&[("slug", topic), ("lang", language.code())])
            .send()
            .await
            .map_err(|e| {
                warn!(topic, %language, error = %e, timeout = e.is_timeout(), "content request failed");
                services::Error::unavailable(e)
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                warn!(topic, %language, %status, "content api error status");
                return Err(services::Error::unavailable(format!("content api status {status}")));
            },
            _ => {},
        }

        let body = resp.text().await.map_err(services::Error::unavailable)?;
        let content: Content = serde_json::from_str(&body).map_err(|e| {
            warn!(topic, %language, error = %e, "undecodable content body");
            services::Error::malformed(e)
        })?;
        Ok(Some(content))
    }
}

#[async_trait]
impl ContentProvider for ContentApiClient {
    async fn get(&self, topic: &str, language: Language) -> services::Result<Content> {
        if let Some(content) = self.fetch(topic, language).await? {
            return Ok(content);
        }
        if language != self.fallback {
            debug!(topic, %language, fallback = %self.fallback, "content missing, trying fallback language");
            if let Some(content) = self.fetch(topic, self.fallback).await? {
                return Ok(content);
            }
        }
        Err(services::Error::not_found(topic, language))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, mockito::Matcher};

    fn client(url: &str) -> ContentApiClient {
        ContentApiClient::new(url, Duration::from_secs(2), Language::Ru).unwrap()
    }

    fn query(slug: &str, lang: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("slug".into(), slug.into()),
            Matcher::UrlEncoded("lang".into(), lang.into()),
        ])
    }

    #[tokio::test]
    async fn fetches_requested_language() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/content")
            .match_query(query("grants", "kz"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"title":"Гранттар","body":"Мемлекеттік гранттар"}"#)
            .create_async()
            .await;

        let content = client(&server.url()).get("grants", Language::Kz).await.unwrap();
        assert_eq!(content.title, "Гранттар");
        assert_eq!(content.body, "Мемлекеттік гранттар");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn falls_back_to_russian_on_404() {
        let mut server = mockito::Server::new_async().await;
        let kz = server
            .mock("GET", "/content")
            .match_query(query("dorm", "kz"))
            .with_status(404)
            .create_async()
            .await;
        let ru = server
            .mock("GET", "/content")
            .match_query(query("dorm", "ru"))
            .with_status(200)
            .with_body(r#"{"title":"Общежитие","body":"Есть места"}"#)
            .create_async()
            .await;

        let content = client(&server.url()).get("dorm", Language::Kz).await.unwrap();
        assert_eq!(content.title, "Общежитие");
        kz.assert_async().await;
        ru.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_when_no_row_exists() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/content")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        // Russian is already the fallback: exactly one request.
        let err = client(&server.url()).get("grants", Language::Ru).await.unwrap_err();
        assert!(matches!(err, services::Error::NotFound { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/content")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = client(&server.url()).get("grants", Language::Kz).await.unwrap_err();
        assert!(matches!(err, services::Error::AdvisorUnavailable { .. }));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/content")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = client(&server.url()).get("grants", Language::Ru).await.unwrap_err();
        assert!(matches!(err, services::Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        let err = client("http://127.0.0.1:1").get("grants", Language::Ru).await.unwrap_err();
        assert!(matches!(err, services::Error::AdvisorUnavailable { .. }));
    }
}
