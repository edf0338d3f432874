//! Script-executing page source using chromiumoxide.
//!
//! Every fetch launches its own Chrome, loads exactly one page and shuts the
//! browser down again. Sessions are never reused across units.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig as ChromeConfig};
use futures::StreamExt;
use rand::Rng;
use tracing::debug;

use super::source::PageSource;
use crate::config::BrowserConfig;
use crate::error::FetchError;

/// Browser-rendering page source
pub struct Browser {
    config: BrowserConfig,
}

impl Browser {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn chrome_path(&self) -> String {
        if let Some(path) = &self.config.chrome_path {
            return path.clone();
        }
        if cfg!(target_os = "macos") {
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".to_string()
        } else if cfg!(target_os = "windows") {
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe".to_string()
        } else {
            "google-chrome".to_string()
        }
    }

    fn launch_config(&self) -> Result<ChromeConfig, String> {
        let builder = ChromeConfig::builder()
            .chrome_executable(self.chrome_path())
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", self.config.user_agent))
            .arg(format!("--lang={}", self.config.locale))
            .request_timeout(self.timeout())
            .window_size(1920, 1080);

        let builder = if self.config.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        builder.build()
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    /// Random post-load wait before the rendered DOM is read
    fn settle_delay(&self) -> Duration {
        let min = self.config.settle_min_ms;
        let max = self.config.settle_max_ms.max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    async fn render(&self, browser: &ChromeBrowser, url: &str) -> Result<String, FetchError> {
        let failed = |e: chromiumoxide::error::CdpError| FetchError::Browser {
            url: url.to_string(),
            message: e.to_string(),
        };

        let page = tokio::time::timeout(self.timeout(), browser.new_page(url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout(),
            })?
            .map_err(failed)?;

        tokio::time::sleep(self.settle_delay()).await;

        let html = page.content().await.map_err(failed);
        let _ = page.close().await;
        html
    }
}

#[async_trait]
impl PageSource for Browser {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let config = self.launch_config().map_err(|message| FetchError::Browser {
            url: url.to_string(),
            message,
        })?;

        let (mut browser, mut handler) =
            ChromeBrowser::launch(config).await.map_err(|e| FetchError::Browser {
                url: url.to_string(),
                message: format!("failed to launch browser: {}", e),
            })?;

        // Handler must keep running for the browser to work
        let handle = tokio::spawn(async move {
            // Errors on individual events are not fatal
            while handler.next().await.is_some() {}
        });

        debug!("Rendering {}", url);
        let result = self.render(&browser, url).await;

        let _ = browser.close().await;
        let _ = browser.wait().await;
        handle.abort();

        result
    }
}
