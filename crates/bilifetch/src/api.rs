//! Wire models for the platform's JSON API (partial, fields we consume)

use serde::Deserialize;
use serde_json::Value;

/// The platform's uniform `{code, message, data}` envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// `/x/web-interface/view` response body
#[derive(Debug, Deserialize)]
pub(crate) struct VideoView {
    pub bvid: String,
    #[serde(default)]
    pub aid: u64,
    #[serde(default)]
    pub cid: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub pubdate: i64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub tname: String,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub stat: Stat,
    #[serde(default)]
    pub tags: Vec<TagEntry>,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Owner {
    #[serde(default)]
    pub mid: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Stat {
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub danmaku: u64,
    #[serde(default)]
    pub reply: u64,
    #[serde(default)]
    pub favorite: u64,
    #[serde(default)]
    pub coin: u64,
    #[serde(default)]
    pub share: u64,
    #[serde(default)]
    pub like: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagEntry {
    #[serde(default)]
    pub tag_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageEntry {
    pub cid: u64,
}

impl VideoView {
    /// First available cid: the top-level field, else the first part's
    pub(crate) fn first_cid(&self) -> Option<u64> {
        self.cid.or_else(|| self.pages.first().map(|p| p.cid))
    }
}

/// Combined-search response body; result lists appear under varying keys
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchData {
    #[serde(default)]
    pub result: Option<Vec<SearchNode>>,
    #[serde(default)]
    pub video: Option<Vec<SearchNode>>,
    #[serde(default)]
    pub items: Option<Vec<SearchNode>>,
}

impl SearchData {
    /// First populated result list, in the order the platform prefers
    pub(crate) fn into_nodes(self) -> Vec<SearchNode> {
        self.result
            .or(self.video)
            .or(self.items)
            .unwrap_or_default()
    }
}

/// One entry of a combined-search result list
///
/// The platform mixes bare hit objects with `{result_type, data}` wrappers,
/// where `data` may itself be a single object or a list. Parsing this into a
/// discriminated variant up front keeps the walk uniform.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SearchNode {
    Wrapped(WrappedNode),
    Bare(Value),
}

#[derive(Debug, Deserialize)]
pub(crate) struct WrappedNode {
    #[serde(default)]
    pub result_type: Option<String>,
    pub data: OneOrMany,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

impl OneOrMany {
    pub(crate) fn into_vec(self) -> Vec<Value> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(v) => vec![v],
        }
    }
}

/// `/x/v2/reply/main` and `/x/v2/reply/reply` response bodies
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyData {
    #[serde(default)]
    pub replies: Option<Vec<ReplyItem>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyItem {
    #[serde(default)]
    pub member: Member,
    #[serde(default)]
    pub content: ReplyContent,
    #[serde(default)]
    pub like: u64,
    #[serde(default)]
    pub ctime: i64,
    #[serde(default)]
    pub rcount: u64,
    #[serde(default)]
    pub rpid: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Member {
    #[serde(default)]
    pub uname: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyContent {
    #[serde(default)]
    pub message: String,
}
