//! Headless-browser rendering seam
//!
//! Article search only exists as a JavaScript-rendered page, so it needs a
//! real browser. The trait keeps the rest of the crate independent of any
//! particular automation stack: the default backend reports itself
//! unavailable and callers degrade, while the `browser` feature provides a
//! Chromium-driven implementation.

use crate::error::{Error, Result};
use async_trait::async_trait;

#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Whether this backend can actually render pages
    fn available(&self) -> bool;

    /// Navigate to `url`, wait for it to settle and return the final markup
    async fn rendered_html(&self, url: &str) -> Result<String>;
}

/// Backend used when no browser automation is compiled in or configured
#[derive(Debug, Default)]
pub struct NoBrowser;

#[async_trait]
impl RenderBackend for NoBrowser {
    fn name(&self) -> &'static str {
        "none"
    }

    fn available(&self) -> bool {
        false
    }

    async fn rendered_html(&self, _url: &str) -> Result<String> {
        Err(Error::BrowserUnavailable(
            "no browser backend configured".to_string(),
        ))
    }
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumBackend;

#[cfg(feature = "browser")]
mod chromium {
    use super::*;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tracing::debug;

    /// Headless Chromium backend, one browser launch per render
    #[derive(Debug, Default)]
    pub struct ChromiumBackend;

    #[async_trait]
    impl RenderBackend for ChromiumBackend {
        fn name(&self) -> &'static str {
            "chromium"
        }

        fn available(&self) -> bool {
            true
        }

        async fn rendered_html(&self, url: &str) -> Result<String> {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .window_size(1920, 1080)
                .build()
                .map_err(Error::BrowserUnavailable)?;

            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| Error::BrowserUnavailable(e.to_string()))?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let result = render_page(&browser, url).await;

            if let Err(e) = browser.close().await {
                debug!(error = %e, "browser close failed");
            }
            handle.abort();

            result
        }
    }

    async fn render_page(browser: &Browser, url: &str) -> Result<String> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| Error::BrowserUnavailable(e.to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| Error::BrowserUnavailable(e.to_string()))?;

        page.content()
            .await
            .map_err(|e| Error::BrowserUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_browser_reports_unavailable() {
        let backend = NoBrowser;
        assert!(!backend.available());
        assert!(matches!(
            backend.rendered_html("https://example.com").await,
            Err(Error::BrowserUnavailable(_))
        ));
    }
}
