//! Blocking facade over the async client
//!
//! Owns a single-threaded runtime instead of sniffing for an ambient one, so
//! it behaves the same whether or not the caller has an async runtime
//! elsewhere in the process. Must not be used from inside an async context.
//!
//! Comment retrieval here runs the constrained pagination profile, since
//! blocking callers are typically latency-bound tool hosts.

use crate::error::{Error, Result};
use crate::retrieve::comments::CommentProfile;
use crate::types::{
    ArticleHit, ArticleRecord, CommentRecord, DanmakuTrack, Envelope, FetchStrategy, VideoHit,
    VideoRecord,
};
use tokio::runtime::Runtime;

/// Blocking client wrapping [`crate::Client`]
pub struct Client {
    inner: crate::Client,
    runtime: Runtime,
}

/// Builder for the blocking [`Client`]
#[derive(Default)]
pub struct ClientBuilder {
    inner: crate::ClientBuilder,
}

macro_rules! forward_builder {
    ($(#[$doc:meta] $name:ident: $ty:ty),* $(,)?) => {
        $(
            #[$doc]
            pub fn $name(mut self, value: $ty) -> Self {
                self.inner = self.inner.$name(value);
                self
            }
        )*
    };
}

impl ClientBuilder {
    forward_builder! {
        /// Session cookie string for operations that require a login
        cookie: String,
        /// Fixed user agent instead of the per-request random pick
        user_agent: String,
        /// Courtesy delay inserted before every outbound request
        request_delay: std::time::Duration,
        /// Per-request timeout
        timeout: std::time::Duration,
        /// Override the JSON API origin
        api_base: String,
        /// Override the main site origin
        www_base: String,
        /// Override the search site origin
        search_base: String,
    }

    pub fn build(self) -> Result<Client> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Network(format!("failed to start runtime: {e}")))?;

        Ok(Client {
            inner: self.inner.build()?,
            runtime,
        })
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn has_credential(&self) -> bool {
        self.inner.has_credential()
    }

    pub fn search_videos(
        &self,
        keyword: &str,
        count: usize,
        strategy: FetchStrategy,
    ) -> Envelope<Vec<VideoHit>> {
        self.runtime
            .block_on(self.inner.search_videos(keyword, count, strategy))
    }

    pub fn search_articles(&self, keyword: &str, count: usize) -> Envelope<Vec<ArticleHit>> {
        self.runtime
            .block_on(self.inner.search_articles(keyword, count))
    }

    pub fn video_info(&self, bvid: &str, strategy: FetchStrategy) -> Envelope<VideoRecord> {
        self.runtime.block_on(self.inner.video_info(bvid, strategy))
    }

    pub fn danmaku(&self, bvid: &str, cid: Option<u64>) -> Envelope<DanmakuTrack> {
        self.runtime.block_on(self.inner.danmaku(bvid, cid))
    }

    pub fn comments(
        &self,
        bvid: &str,
        count: usize,
        include_replies: bool,
        reply_count: usize,
    ) -> Envelope<Vec<CommentRecord>> {
        self.runtime.block_on(self.inner.comments_with_profile(
            bvid,
            count,
            include_replies,
            reply_count,
            CommentProfile::constrained(),
        ))
    }

    pub fn article(&self, cv_id: &str) -> Envelope<ArticleRecord> {
        self.runtime.block_on(self.inner.article(cv_id))
    }
}
