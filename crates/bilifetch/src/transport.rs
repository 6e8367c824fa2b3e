//! Outbound HTTP transport
//!
//! One place owns headers, cookies, the courtesy delay and status mapping,
//! so every retrieval path gets the same request discipline.

use crate::api::ApiResponse;
use crate::error::{Error, Result};
use rand::seq::IndexedRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, ORIGIN, REFERER,
    USER_AGENT,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Desktop user-agent pool; one is picked at random per request
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

pub(crate) const DEFAULT_API_BASE: &str = "https://api.bilibili.com";
pub(crate) const DEFAULT_WWW_BASE: &str = "https://www.bilibili.com";
pub(crate) const DEFAULT_SEARCH_BASE: &str = "https://search.bilibili.com";

/// Fixed courtesy delay before every outbound request
pub(crate) const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Per-request timeout
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP transport for all retrieval paths
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    cookie: Option<HeaderValue>,
    user_agent: Option<HeaderValue>,
    pub(crate) api_base: String,
    pub(crate) www_base: String,
    pub(crate) search_base: String,
    delay: Duration,
}

pub(crate) struct TransportConfig {
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub api_base: String,
    pub www_base: String,
    pub search_base: String,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            cookie: None,
            user_agent: None,
            api_base: DEFAULT_API_BASE.to_string(),
            www_base: DEFAULT_WWW_BASE.to_string(),
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            delay: DEFAULT_REQUEST_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Transport {
    pub(crate) fn new(config: TransportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.bilibili.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.bilibili.com"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(Error::ClientBuild)?;

        let cookie = config.cookie.as_deref().and_then(|c| {
            let trimmed = c.trim();
            if trimmed.is_empty() {
                return None;
            }
            match HeaderValue::from_str(trimmed) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("cookie contains invalid header characters, ignoring");
                    None
                }
            }
        });

        let user_agent = config
            .user_agent
            .as_deref()
            .and_then(|ua| HeaderValue::from_str(ua).ok());

        Ok(Self {
            http,
            cookie,
            user_agent,
            api_base: config.api_base,
            www_base: config.www_base,
            search_base: config.search_base,
            delay: config.delay,
        })
    }

    pub(crate) fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    fn pick_user_agent(&self) -> HeaderValue {
        if let Some(ua) = &self.user_agent {
            return ua.clone();
        }
        let ua = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        HeaderValue::from_static(ua)
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        // Fixed anti-throttle delay, deliberately not adaptive
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut req = self
            .http
            .get(url)
            .header(USER_AGENT, self.pick_user_agent());
        if let Some(cookie) = &self.cookie {
            req = req.header(COOKIE, cookie.clone());
        }
        if !params.is_empty() {
            req = req.query(params);
        }

        debug!(url, "sending request");
        let response = req.send().await.map_err(Error::from_reqwest)?;

        let status = response.status();
        if status.as_u16() == 412 {
            return Err(Error::RateLimited);
        }
        if status.as_u16() == 404 {
            return Err(Error::NotFound(url.to_string()));
        }
        if status.as_u16() == 403 {
            return Err(Error::Forbidden(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::BadStatus(status.as_u16()));
        }

        Ok(response)
    }

    /// Call a JSON API endpoint relative to `api_base` and unwrap its
    /// `{code, message, data}` envelope, returning `data`
    pub(crate) async fn call_api(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.api_base, path);
        let response = self.get(&url, params).await?;

        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("malformed response body: {e}")))?;

        if envelope.code != 0 {
            return Err(Error::from_api_code(envelope.code, &envelope.message));
        }

        Ok(envelope.data)
    }

    /// Fetch a page or raw resource as text from an absolute URL
    pub(crate) async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url, &[]).await?;
        response
            .text()
            .await
            .map_err(|e| Error::Network(format!("failed to read body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_pool_is_desktop_only() {
        for ua in USER_AGENTS {
            assert!(ua.starts_with("Mozilla/5.0"));
            assert!(!ua.contains("Mobile"));
        }
    }

    #[test]
    fn test_transport_rejects_bad_cookie_silently() {
        let transport = Transport::new(TransportConfig {
            cookie: Some("bad\ncookie".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(!transport.has_cookie());
    }

    #[test]
    fn test_transport_keeps_good_cookie() {
        let transport = Transport::new(TransportConfig {
            cookie: Some("SESSDATA=abc; bili_jct=def".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(transport.has_cookie());
    }
}
