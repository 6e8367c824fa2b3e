//! bilifetch - content retrieval library for the Bilibili platform
//!
//! This crate provides a typed client for video metadata, keyword search,
//! danmaku tracks, comments and articles, over both the platform's JSON API
//! and its rendered pages. Every operation returns a uniform result envelope
//! so callers and tool hosts see one shape for success and failure.

mod api;
pub mod blocking;
mod client;
mod error;
mod extract;
mod render;
mod retrieve;
mod tool;
mod transport;
mod types;
mod validate;

pub use client::{Client, ClientBuilder, DEFAULT_COUNT};
pub use error::{Error, Result};
pub use extract::{date_to_epoch, number_with_unit, plain_text};
pub use render::{NoBrowser, RenderBackend};
#[cfg(feature = "browser")]
pub use render::ChromiumBackend;
pub use tool::{Tool, ToolBuilder, ToolRequest};
pub use types::{
    ArticleHit, ArticleRecord, CommentRecord, ContentBlock, DanmakuTrack, Envelope, FetchStrategy,
    ReplyRecord, VideoHit, VideoRecord,
};
pub use validate::{is_not_found_page, is_valid_bvid, is_valid_cv_id, PageKind};

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Retrieves public content from Bilibili: video metadata, keyword search for videos and articles, danmaku tracks, comments and full article text.

- Videos can be fetched via the JSON API or scraped from the watch page
- Comments require a session cookie and are paginated with bounded limits
- Article search needs a browser backend and degrades to synthetic placeholders without one
- All operations return a uniform {success, data, error, method} envelope"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# Bilifetch Tool

Retrieves public content from the Bilibili platform.

## Operations
- `search_videos`: keyword search for videos (`method`: "api" or "script")
- `search_articles`: keyword search for articles (rendered page; placeholder
  results flagged `synthetic: true` when no browser backend is available)
- `get_video_info`: full metadata for one video by BV id
- `get_danmaku`: raw danmaku XML for a video (cid resolved automatically)
- `get_comments`: top-level comments with optional bounded reply threads
  (requires a session cookie)
- `get_article`: full article text, images and stats by numeric cv id

## Input Parameters
Every request carries an `op` field naming the operation, plus:
- `keyword` (search ops): the query string
- `count` (search and comments): maximum results, default 10
- `bvid` (video ops): "BV" followed by 10 alphanumerics
- `cv_id` (get_article): numeric article id without the "cv" prefix
- `cid` (get_danmaku, optional): explicit track id
- `method` (optional): "api" (default) or "script"
- `include_replies`, `reply_count` (get_comments): reply thread controls

## Output
A `{success, data, error, method}` envelope. Exactly one of `data` and
`error` is present; `method` names the retrieval path used on success.

## Examples

### Search videos
```json
{"op": "search_videos", "keyword": "rust", "count": 5}
```

### Fetch video metadata by scraping the watch page
```json
{"op": "get_video_info", "bvid": "BV1xx411c7mD", "method": "script"}
```

### Fetch comments with replies
```json
{"op": "get_comments", "bvid": "BV1xx411c7mD", "count": 20, "include_replies": true, "reply_count": 3}
```

## Error Handling
- Malformed BV / cv ids fail before any network traffic
- Platform API status codes map to friendly messages (-404 not found,
  -403 forbidden, -101 not logged in, ...)
- HTTP 412 means the platform rate-limited the client; slow down and retry
- Comment pagination keeps partial results when a later page fails
"#;
