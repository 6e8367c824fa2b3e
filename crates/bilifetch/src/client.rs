//! Async client and its builder

use crate::error::{Error, Result};
use crate::render::{NoBrowser, RenderBackend};
use crate::retrieve;
use crate::retrieve::comments::CommentProfile;
use crate::transport::{Transport, TransportConfig};
use crate::types::{
    ArticleHit, ArticleRecord, CommentRecord, DanmakuTrack, Envelope, FetchStrategy, VideoHit,
    VideoRecord,
};
use crate::validate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default number of results for search and comment operations
pub const DEFAULT_COUNT: usize = 10;

/// Async client for the platform's public content surfaces
///
/// Cheap to clone; all clones share the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    transport: Transport,
    render: Arc<dyn RenderBackend>,
}

/// Builder for [`Client`]
///
/// ```no_run
/// use bilifetch::Client;
///
/// # fn main() -> Result<(), bilifetch::Error> {
/// let client = Client::builder()
///     .cookie("SESSDATA=...; bili_jct=...")
///     .request_delay(std::time::Duration::from_millis(250))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    cookie: Option<String>,
    user_agent: Option<String>,
    api_base: String,
    www_base: String,
    search_base: String,
    delay: Duration,
    timeout: Duration,
    render: Arc<dyn RenderBackend>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        let defaults = TransportConfig::default();
        Self {
            cookie: None,
            user_agent: None,
            api_base: defaults.api_base,
            www_base: defaults.www_base,
            search_base: defaults.search_base,
            delay: defaults.delay,
            timeout: defaults.timeout,
            render: Arc::new(NoBrowser),
        }
    }
}

impl ClientBuilder {
    /// Session cookie string for operations that require a login
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Fixed user agent instead of the per-request random pick
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Courtesy delay inserted before every outbound request
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the JSON API origin (useful against a local test server)
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Override the main site origin serving watch and article pages
    pub fn www_base(mut self, base: impl Into<String>) -> Self {
        self.www_base = base.into();
        self
    }

    /// Override the search site origin
    pub fn search_base(mut self, base: impl Into<String>) -> Self {
        self.search_base = base.into();
        self
    }

    /// Browser backend used for rendered-page retrieval
    pub fn render_backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        self.render = backend;
        self
    }

    pub fn build(self) -> Result<Client> {
        for base in [&self.api_base, &self.www_base, &self.search_base] {
            url::Url::parse(base)
                .map_err(|e| Error::InvalidId(format!("invalid base url {base}: {e}")))?;
        }

        let transport = Transport::new(TransportConfig {
            cookie: self.cookie,
            user_agent: self.user_agent,
            api_base: trim_base(self.api_base),
            www_base: trim_base(self.www_base),
            search_base: trim_base(self.search_base),
            delay: self.delay,
            timeout: self.timeout,
        })?;

        Ok(Client {
            transport,
            render: self.render,
        })
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client with all defaults and no credential
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Whether a session cookie was configured at build time
    pub fn has_credential(&self) -> bool {
        self.transport.has_cookie()
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Search videos by keyword, via the chosen strategy
    pub async fn search_videos(
        &self,
        keyword: &str,
        count: usize,
        strategy: FetchStrategy,
    ) -> Envelope<Vec<VideoHit>> {
        let result = match strategy {
            FetchStrategy::Api => {
                retrieve::search::videos_via_api(&self.transport, keyword, count).await
            }
            FetchStrategy::Script => {
                retrieve::search::videos_via_script(&self.transport, keyword, count).await
            }
        };
        Envelope::from_result(result, strategy)
    }

    /// Search articles by keyword
    ///
    /// Needs a browser backend; without one, or when rendering fails or
    /// yields nothing, the result degrades to placeholder hits flagged
    /// `synthetic` so callers can tell them apart from real data.
    pub async fn search_articles(&self, keyword: &str, count: usize) -> Envelope<Vec<ArticleHit>> {
        let hits = if self.render.available() {
            let url = format!(
                "{}/article?keyword={}",
                self.transport.search_base,
                urlencoding::encode(keyword)
            );
            match self.render.rendered_html(&url).await {
                Ok(html) => {
                    let hits = retrieve::search::parse_article_search(
                        &html,
                        count,
                        &self.transport.www_base,
                    );
                    if hits.is_empty() {
                        info!("rendered page held no article cards, using placeholders");
                        retrieve::search::synthetic_article_hits(
                            keyword,
                            count,
                            &self.transport.www_base,
                        )
                    } else {
                        hits
                    }
                }
                Err(e) => {
                    warn!(backend = self.render.name(), error = %e, "render failed, using placeholders");
                    retrieve::search::synthetic_article_hits(
                        keyword,
                        count,
                        &self.transport.www_base,
                    )
                }
            }
        } else {
            retrieve::search::synthetic_article_hits(keyword, count, &self.transport.www_base)
        };

        Envelope::ok(hits, FetchStrategy::Script)
    }

    /// Full metadata for one video
    pub async fn video_info(&self, bvid: &str, strategy: FetchStrategy) -> Envelope<VideoRecord> {
        if let Err(e) = check_bvid(bvid) {
            return Envelope::fail(e.to_string());
        }
        let result = match strategy {
            FetchStrategy::Api => retrieve::video::via_api(&self.transport, bvid).await,
            FetchStrategy::Script => retrieve::video::via_script(&self.transport, bvid).await,
        };
        Envelope::from_result(result, strategy)
    }

    /// Raw danmaku track for a video, resolving the cid when not given
    pub async fn danmaku(&self, bvid: &str, cid: Option<u64>) -> Envelope<DanmakuTrack> {
        if let Err(e) = check_bvid(bvid) {
            return Envelope::fail(e.to_string());
        }
        let result = retrieve::danmaku::fetch(&self.transport, bvid, cid).await;
        Envelope::from_result(result, FetchStrategy::Api)
    }

    /// Top-level comments, optionally with a bounded reply thread each
    ///
    /// Requires a session cookie.
    pub async fn comments(
        &self,
        bvid: &str,
        count: usize,
        include_replies: bool,
        reply_count: usize,
    ) -> Envelope<Vec<CommentRecord>> {
        self.comments_with_profile(
            bvid,
            count,
            include_replies,
            reply_count,
            CommentProfile::interactive(),
        )
        .await
    }

    pub(crate) async fn comments_with_profile(
        &self,
        bvid: &str,
        count: usize,
        include_replies: bool,
        reply_count: usize,
        profile: CommentProfile,
    ) -> Envelope<Vec<CommentRecord>> {
        if let Err(e) = check_bvid(bvid) {
            return Envelope::fail(e.to_string());
        }
        let result = retrieve::comments::fetch(
            &self.transport,
            bvid,
            count,
            include_replies,
            reply_count,
            profile,
        )
        .await;
        Envelope::from_result(result, FetchStrategy::Api)
    }

    /// Full article content by its numeric cv id
    pub async fn article(&self, cv_id: &str) -> Envelope<ArticleRecord> {
        if !validate::is_valid_cv_id(cv_id) {
            return Envelope::fail(
                Error::InvalidId(format!("cv id must be numeric, got {cv_id:?}")).to_string(),
            );
        }
        let result = retrieve::article::fetch(&self.transport, cv_id).await;
        Envelope::from_result(result, FetchStrategy::Script)
    }
}

fn check_bvid(bvid: &str) -> Result<()> {
    if validate::is_valid_bvid(bvid) {
        Ok(())
    } else {
        Err(Error::InvalidId(format!(
            "{bvid:?} is not a BV id (expected BV followed by 10 alphanumerics)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_bvid_fails_without_network() {
        let client = Client::new().unwrap();
        let envelope = client.video_info("not-a-bvid", FetchStrategy::Api).await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("BV id"));
    }

    #[tokio::test]
    async fn test_invalid_cv_id_fails_without_network() {
        let client = Client::new().unwrap();
        let envelope = client.article("cv123").await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("numeric"));
    }

    #[tokio::test]
    async fn test_comments_require_credential() {
        let client = Client::new().unwrap();
        assert!(!client.has_credential());
        let envelope = client.comments("BV1xx411c7mD", 5, false, 0).await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("session cookie"));
    }

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let result = Client::builder().api_base("not a url").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = Client::builder()
            .api_base("http://127.0.0.1:1234/")
            .build()
            .unwrap();
        assert_eq!(client.transport().api_base, "http://127.0.0.1:1234");
    }

    #[tokio::test]
    async fn test_article_search_degrades_to_synthetic() {
        let client = Client::new().unwrap();
        let envelope = client.search_articles("rust", 3).await;
        assert!(envelope.success);
        let hits = envelope.data.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.synthetic));
    }
}
