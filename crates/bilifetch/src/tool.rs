//! Tool builder and contract for embedding the client in a tool host

use crate::client::{Client, DEFAULT_COUNT};
use crate::error::Result;
use crate::render::RenderBackend;
use crate::types::{Envelope, FetchStrategy};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

fn default_count() -> usize {
    DEFAULT_COUNT
}

fn default_reply_count() -> usize {
    5
}

/// One tool invocation, discriminated by `op`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Search videos by keyword
    SearchVideos {
        keyword: String,
        #[serde(default = "default_count")]
        count: usize,
        #[serde(default)]
        method: FetchStrategy,
    },
    /// Search articles by keyword
    SearchArticles {
        keyword: String,
        #[serde(default = "default_count")]
        count: usize,
    },
    /// Full metadata for one video
    GetVideoInfo {
        bvid: String,
        #[serde(default)]
        method: FetchStrategy,
    },
    /// Raw danmaku track for a video
    GetDanmaku {
        bvid: String,
        #[serde(default)]
        cid: Option<u64>,
    },
    /// Top-level comments, optionally with replies (requires a cookie)
    GetComments {
        bvid: String,
        #[serde(default = "default_count")]
        count: usize,
        #[serde(default)]
        include_replies: bool,
        #[serde(default = "default_reply_count")]
        reply_count: usize,
    },
    /// Full article content by numeric cv id
    GetArticle { cv_id: String },
}

/// Builder for configuring the tool
#[derive(Default)]
pub struct ToolBuilder {
    cookie: Option<String>,
    user_agent: Option<String>,
    request_delay: Option<Duration>,
    api_base: Option<String>,
    www_base: Option<String>,
    search_base: Option<String>,
    render: Option<Arc<dyn RenderBackend>>,
    enable_comments: bool,
}

impl ToolBuilder {
    /// Create a new tool builder with all operations enabled
    pub fn new() -> Self {
        Self {
            enable_comments: true,
            ..Default::default()
        }
    }

    /// Session cookie for comment retrieval
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Fixed User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Courtesy delay before each request
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    /// Override the JSON API origin
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Override the main site origin
    pub fn www_base(mut self, base: impl Into<String>) -> Self {
        self.www_base = Some(base.into());
        self
    }

    /// Override the search site origin
    pub fn search_base(mut self, base: impl Into<String>) -> Self {
        self.search_base = Some(base.into());
        self
    }

    /// Browser backend for rendered-page retrieval
    pub fn render_backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        self.render = Some(backend);
        self
    }

    /// Expose the comments operation (off when no cookie can be provided)
    pub fn enable_comments(mut self, enable: bool) -> Self {
        self.enable_comments = enable;
        self
    }

    /// Build the tool
    pub fn build(self) -> Result<Tool> {
        let mut builder = Client::builder();
        if let Some(cookie) = self.cookie {
            builder = builder.cookie(cookie);
        }
        if let Some(ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }
        if let Some(delay) = self.request_delay {
            builder = builder.request_delay(delay);
        }
        if let Some(base) = self.api_base {
            builder = builder.api_base(base);
        }
        if let Some(base) = self.www_base {
            builder = builder.www_base(base);
        }
        if let Some(base) = self.search_base {
            builder = builder.search_base(base);
        }
        if let Some(render) = self.render {
            builder = builder.render_backend(render);
        }

        Ok(Tool {
            client: builder.build()?,
            enable_comments: self.enable_comments,
        })
    }
}

/// Configured tool wrapping a shared [`Client`]
#[derive(Clone)]
pub struct Tool {
    client: Client,
    enable_comments: bool,
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Get input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(ToolRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Get output schema as JSON
    pub fn output_schema(&self) -> serde_json::Value {
        let schema = schema_for!(Envelope<serde_json::Value>);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Execute one request, always returning an envelope value
    ///
    /// Failures surface inside the envelope rather than as an `Err`, so tool
    /// hosts get one uniform shape back.
    pub async fn execute(&self, req: ToolRequest) -> serde_json::Value {
        match req {
            ToolRequest::SearchVideos {
                keyword,
                count,
                method,
            } => to_value(self.client.search_videos(&keyword, count, method).await),
            ToolRequest::SearchArticles { keyword, count } => {
                to_value(self.client.search_articles(&keyword, count).await)
            }
            ToolRequest::GetVideoInfo { bvid, method } => {
                to_value(self.client.video_info(&bvid, method).await)
            }
            ToolRequest::GetDanmaku { bvid, cid } => {
                to_value(self.client.danmaku(&bvid, cid).await)
            }
            ToolRequest::GetComments {
                bvid,
                count,
                include_replies,
                reply_count,
            } => {
                if !self.enable_comments {
                    return to_value(Envelope::<()>::fail(
                        "comment retrieval is disabled on this tool",
                    ));
                }
                to_value(
                    self.client
                        .comments(&bvid, count, include_replies, reply_count)
                        .await,
                )
            }
            ToolRequest::GetArticle { cv_id } => to_value(self.client.article(&cv_id).await),
        }
    }
}

fn to_value<T: Serialize>(envelope: Envelope<T>) -> serde_json::Value {
    serde_json::to_value(&envelope)
        .unwrap_or_else(|e| serde_json::to_value(Envelope::<()>::fail(e.to_string())).unwrap_or_default())
}
