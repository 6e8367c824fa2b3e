//! Core record types and the result envelope

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a retrieval operation obtains its data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Structured JSON API call
    #[default]
    Api,
    /// Rendered-page scraping fallback
    Script,
}

impl FromStr for FetchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(FetchStrategy::Api),
            "script" => Ok(FetchStrategy::Script),
            _ => Err("invalid strategy: must be api or script".to_string()),
        }
    }
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Api => write!(f, "api"),
            FetchStrategy::Script => write!(f, "script"),
        }
    }
}

/// Full video metadata record
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Video identifier (BV prefix + 10 alphanumerics)
    pub bvid: String,
    pub title: String,
    pub desc: String,
    /// Cover image URL
    pub pic: String,
    /// Publish time as epoch seconds
    pub pubdate: i64,
    /// Duration in seconds
    pub duration: u64,
    pub view: u64,
    pub danmaku: u64,
    pub reply: u64,
    pub favorite: u64,
    pub coin: u64,
    pub share: u64,
    pub like: u64,
    pub owner_name: String,
    pub owner_mid: u64,
    /// Category name
    pub tname: String,
    pub tags: Vec<String>,
}

/// Partial video record as it appears in search results
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VideoHit {
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub play: u64,
    /// Danmaku count (the search API calls this `video_review`)
    #[serde(default, alias = "video_review")]
    pub danmaku: u64,
    /// Duration as displayed, e.g. "12:34"
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub pubdate: i64,
}

/// Partial article record as it appears in search results
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ArticleHit {
    /// Numeric article id (without the cv prefix)
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub reply: u64,
    #[serde(default)]
    pub like: u64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub url: String,
    /// True for placeholder records produced in degraded mode
    #[serde(default)]
    pub synthetic: bool,
}

/// One block of article body content, in original reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { content: String },
    Image { url: String },
}

/// Full article record (script-only retrieval)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ArticleRecord {
    pub cv_id: String,
    pub title: String,
    pub author: String,
    pub author_avatar: String,
    /// Publish time as displayed on the page
    pub publish_time: String,
    /// All text paragraphs joined with blank lines
    pub content: String,
    pub images: Vec<String>,
    /// Text and image blocks interleaved in reading order
    pub blocks: Vec<ContentBlock>,
    pub tags: Vec<String>,
    pub like_count: u64,
    pub coin_count: u64,
    pub favorite_count: u64,
    pub share_count: u64,
    pub reply_count: u64,
    pub url: String,
}

/// A reply nested under a top-level comment (one level only)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReplyRecord {
    pub user: String,
    pub message: String,
    pub like: u64,
    /// Comment time as epoch seconds
    pub ctime: i64,
}

/// A top-level comment with its bounded reply list
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CommentRecord {
    pub user: String,
    pub message: String,
    pub like: u64,
    pub ctime: i64,
    pub replies: Vec<ReplyRecord>,
}

/// Raw danmaku track payload, returned opaque
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DanmakuTrack {
    pub bvid: String,
    pub cid: u64,
    /// The subtitle/track XML as served by the platform
    pub xml: String,
}

/// Uniform success/error wrapper returned by every operation
///
/// Exactly one of `data` and `error` is populated, and `success` says which.
/// Use [`Envelope::ok`] / [`Envelope::fail`] rather than building by hand.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Which retrieval path produced the data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<FetchStrategy>,
}

impl<T> Envelope<T> {
    /// Successful result obtained via `method`
    pub fn ok(data: T, method: FetchStrategy) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            method: Some(method),
        }
    }

    /// Failed result with a non-empty message
    pub fn fail(error: impl Into<String>) -> Self {
        let error = error.into();
        debug_assert!(!error.is_empty());
        Self {
            success: false,
            data: None,
            error: Some(error),
            method: None,
        }
    }

    /// Wrap an internal result, tagging successes with the strategy used
    pub fn from_result(result: crate::error::Result<T>, method: FetchStrategy) -> Self {
        match result {
            Ok(data) => Self::ok(data, method),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(FetchStrategy::from_str("api").unwrap(), FetchStrategy::Api);
        assert_eq!(FetchStrategy::from_str("API").unwrap(), FetchStrategy::Api);
        assert_eq!(
            FetchStrategy::from_str("script").unwrap(),
            FetchStrategy::Script
        );
        assert!(FetchStrategy::from_str("browser").is_err());
    }

    #[test]
    fn test_strategy_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&FetchStrategy::Script).unwrap(),
            "\"script\""
        );
    }

    #[test]
    fn test_envelope_invariant() {
        let ok: Envelope<u32> = Envelope::ok(7, FetchStrategy::Api);
        assert!(ok.success);
        assert_eq!(ok.data, Some(7));
        assert!(ok.error.is_none());
        assert_eq!(ok.method, Some(FetchStrategy::Api));

        let fail: Envelope<u32> = Envelope::fail("boom");
        assert!(!fail.success);
        assert!(fail.data.is_none());
        assert_eq!(fail.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_envelope_from_result() {
        let ok = Envelope::from_result(Ok(1u32), FetchStrategy::Script);
        assert!(ok.success && ok.data == Some(1));

        let fail: Envelope<u32> = Envelope::from_result(
            Err(crate::error::Error::Unauthenticated),
            FetchStrategy::Api,
        );
        assert!(!fail.success);
        assert!(fail.error.unwrap().contains("session cookie"));
    }

    #[test]
    fn test_envelope_serialization_omits_empty() {
        let ok: Envelope<&str> = Envelope::ok("x", FetchStrategy::Api);
        let json = serde_json::to_string(&ok).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"method\":\"api\""));

        let fail: Envelope<&str> = Envelope::fail("nope");
        let json = serde_json::to_string(&fail).unwrap();
        assert!(!json.contains("data"));
        assert!(!json.contains("method"));
    }

    #[test]
    fn test_video_hit_alias() {
        let hit: VideoHit = serde_json::from_str(
            r#"{"bvid":"BV1xx411c7mD","title":"t","video_review":12}"#,
        )
        .unwrap();
        assert_eq!(hit.danmaku, 12);
    }

    #[test]
    fn test_content_block_tagging() {
        let block = ContentBlock::Image {
            url: "https://i0.hdslb.com/a.png".to_string(),
        };
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"image\""));
    }
}
