//! Page sources: how a URL becomes HTML text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::browser::Browser;
use crate::config::{BrowserConfig, HttpConfig};
use crate::error::FetchError;

/// Anything that can turn a URL into its HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Box<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

/// How a source site is fetched. Chosen once per site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Plain request/response, for static pages
    Http,
    /// Full browser render, for pages filled in by scripts
    Browser,
}

/// Build the page source for a strategy.
pub fn build_source(
    strategy: FetchStrategy,
    http: &HttpConfig,
    browser: &BrowserConfig,
) -> Result<Box<dyn PageSource>, FetchError> {
    Ok(match strategy {
        FetchStrategy::Http => Box::new(HttpSource::new(http)?),
        FetchStrategy::Browser => Box::new(Browser::new(browser.clone())),
    })
}

/// Lightweight request/response fetcher.
pub struct HttpSource {
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let language = HeaderValue::from_str(&config.accept_language).map_err(|_| {
            FetchError::Client(format!(
                "invalid accept_language {:?}",
                config.accept_language
            ))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let wrap = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(wrap)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(wrap)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;

    #[tokio::test]
    async fn test_boxed_source_delegates() {
        let scripted = ScriptedSource::new().page("https://example.com/", "<html></html>");
        let calls = scripted.calls();
        let source: Box<dyn PageSource> = Box::new(scripted);

        assert_eq!(source.fetch("https://example.com/").await.unwrap(), "<html></html>");
        assert!(matches!(
            source.fetch("https://example.com/missing").await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_strategy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: FetchStrategy,
        }
        let parsed: Wrapper = config::Config::builder()
            .set_override("strategy", "browser")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(parsed.strategy, FetchStrategy::Browser);
    }

    #[test]
    fn test_http_source_builds_from_defaults() {
        assert!(HttpSource::new(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_accept_language_is_rejected() {
        let config = HttpConfig {
            accept_language: "en-US\nX-Injected: 1".to_string(),
            ..HttpConfig::default()
        };
        match HttpSource::new(&config) {
            Err(FetchError::Client(message)) => assert!(message.contains("accept_language")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a build error"),
        }
    }
}
