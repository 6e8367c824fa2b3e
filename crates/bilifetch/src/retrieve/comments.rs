//! Comment retrieval with bounded pagination
//!
//! Two profiles cover the two execution disciplines: the interactive profile
//! pages until it has enough and fans reply fetches out concurrently, while
//! the constrained profile caps pages and requests for latency-sensitive
//! callers. Reply fetch failures never sink the whole operation.

use crate::api::{ReplyData, ReplyItem};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::{CommentRecord, ReplyRecord};
use futures::future::join_all;
use tracing::{debug, warn};

const FALLBACK_USER: &str = "未知用户";

/// Pagination limits for one comments fetch
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommentProfile {
    /// Cap on main-comment pages; `None` pages until `count` is reached
    max_pages: Option<u32>,
    /// Fixed main page size, or `None` to size pages off the request
    page_size: Option<u32>,
    /// Hard cap on the requested comment count
    max_count: Option<usize>,
    /// Ceiling on replies fetched per comment
    reply_cap: usize,
    /// Fetch reply threads concurrently instead of one at a time
    concurrent_replies: bool,
    /// Fetch a single reply page rather than paging to the cap
    single_reply_page: bool,
}

impl CommentProfile {
    /// Unbounded-ish profile for plain async callers
    pub(crate) fn interactive() -> Self {
        Self {
            max_pages: None,
            page_size: Some(50),
            max_count: None,
            reply_cap: 10,
            concurrent_replies: true,
            single_reply_page: false,
        }
    }

    /// Tight profile for blocking callers that must answer quickly
    pub(crate) fn constrained() -> Self {
        Self {
            max_pages: Some(3),
            page_size: None,
            max_count: Some(100),
            reply_cap: 5,
            concurrent_replies: false,
            single_reply_page: true,
        }
    }
}

pub(crate) async fn fetch(
    transport: &Transport,
    bvid: &str,
    count: usize,
    include_replies: bool,
    reply_count: usize,
    profile: CommentProfile,
) -> Result<Vec<CommentRecord>> {
    if !transport.has_cookie() {
        return Err(Error::Unauthenticated);
    }

    let view = super::video::view(transport, bvid).await?;
    let aid = view.aid;

    let count = match profile.max_count {
        Some(cap) => count.min(cap),
        None => count,
    };

    let items = fetch_main_pages(transport, aid, count, profile).await?;

    if !include_replies {
        return Ok(items.into_iter().map(|item| to_record(item, Vec::new())).collect());
    }

    let per_comment = reply_count.min(profile.reply_cap);
    let replies = fetch_all_replies(transport, aid, &items, per_comment, profile).await;

    Ok(items
        .into_iter()
        .zip(replies)
        .map(|(item, replies)| to_record(item, replies))
        .collect())
}

async fn fetch_main_pages(
    transport: &Transport,
    aid: u64,
    count: usize,
    profile: CommentProfile,
) -> Result<Vec<ReplyItem>> {
    let page_size = profile
        .page_size
        .unwrap_or_else(|| (count as u32).clamp(1, 50));

    let mut items: Vec<ReplyItem> = Vec::new();
    let mut page: u32 = 1;

    while items.len() < count {
        if profile.max_pages.is_some_and(|max| page > max) {
            break;
        }

        let result = transport
            .call_api(
                "/x/v2/reply/main",
                &[
                    ("type", "1".to_string()),
                    ("oid", aid.to_string()),
                    ("mode", "3".to_string()),
                    ("plat", "1".to_string()),
                    ("pn", page.to_string()),
                    ("ps", page_size.to_string()),
                ],
            )
            .await;

        let data = match result {
            Ok(data) => data,
            // Whatever already arrived is still useful
            Err(e) if page > 1 => {
                warn!(page, error = %e, "comment page fetch failed, keeping partial results");
                break;
            }
            Err(e) => return Err(e),
        };

        let data: ReplyData = serde_json::from_value(data)
            .map_err(|e| Error::Network(format!("malformed comments payload: {e}")))?;

        let Some(replies) = data.replies.filter(|r| !r.is_empty()) else {
            debug!(page, "no more comments");
            break;
        };

        items.extend(replies);
        page += 1;
    }

    items.truncate(count);
    Ok(items)
}

async fn fetch_all_replies(
    transport: &Transport,
    aid: u64,
    items: &[ReplyItem],
    per_comment: usize,
    profile: CommentProfile,
) -> Vec<Vec<ReplyRecord>> {
    if per_comment == 0 {
        return vec![Vec::new(); items.len()];
    }

    if profile.concurrent_replies {
        let futures = items.iter().map(|item| async move {
            if item.rcount == 0 || item.rpid == 0 {
                return Vec::new();
            }
            fetch_replies(transport, aid, item.rpid, per_comment, profile)
                .await
                .unwrap_or_else(|e| {
                    warn!(rpid = item.rpid, error = %e, "reply fetch failed");
                    Vec::new()
                })
        });
        join_all(futures).await
    } else {
        let mut all = Vec::with_capacity(items.len());
        for item in items {
            if item.rcount == 0 || item.rpid == 0 {
                all.push(Vec::new());
                continue;
            }
            let replies = fetch_replies(transport, aid, item.rpid, per_comment, profile)
                .await
                .unwrap_or_else(|e| {
                    warn!(rpid = item.rpid, error = %e, "reply fetch failed");
                    Vec::new()
                });
            all.push(replies);
        }
        all
    }
}

async fn fetch_replies(
    transport: &Transport,
    aid: u64,
    rpid: u64,
    cap: usize,
    profile: CommentProfile,
) -> Result<Vec<ReplyRecord>> {
    let page_size: u32 = if profile.single_reply_page {
        (cap as u32).clamp(1, 20)
    } else {
        10
    };

    let mut replies: Vec<ReplyRecord> = Vec::new();
    let mut page: u32 = 1;

    loop {
        let data = transport
            .call_api(
                "/x/v2/reply/reply",
                &[
                    ("type", "1".to_string()),
                    ("oid", aid.to_string()),
                    ("root", rpid.to_string()),
                    ("pn", page.to_string()),
                    ("ps", page_size.to_string()),
                ],
            )
            .await?;

        let data: ReplyData = serde_json::from_value(data)
            .map_err(|e| Error::Network(format!("malformed replies payload: {e}")))?;

        let Some(items) = data.replies.filter(|r| !r.is_empty()) else {
            break;
        };

        replies.extend(items.into_iter().map(to_reply));

        if profile.single_reply_page || replies.len() >= cap {
            break;
        }
        page += 1;
    }

    replies.truncate(cap);
    Ok(replies)
}

fn to_reply(item: ReplyItem) -> ReplyRecord {
    ReplyRecord {
        user: non_empty_user(item.member.uname),
        message: item.content.message,
        like: item.like,
        ctime: item.ctime,
    }
}

fn to_record(item: ReplyItem, replies: Vec<ReplyRecord>) -> CommentRecord {
    CommentRecord {
        user: non_empty_user(item.member.uname),
        message: item.content.message,
        like: item.like,
        ctime: item.ctime,
        replies,
    }
}

fn non_empty_user(uname: String) -> String {
    if uname.is_empty() {
        FALLBACK_USER.to_string()
    } else {
        uname
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Member, ReplyContent};

    fn item(uname: &str, message: &str, rcount: u64, rpid: u64) -> ReplyItem {
        ReplyItem {
            member: Member {
                uname: uname.to_string(),
            },
            content: ReplyContent {
                message: message.to_string(),
            },
            like: 3,
            ctime: 1_700_000_000,
            rcount,
            rpid,
        }
    }

    #[test]
    fn test_to_record_fallback_user() {
        let record = to_record(item("", "hi", 0, 0), Vec::new());
        assert_eq!(record.user, FALLBACK_USER);
        assert_eq!(record.message, "hi");

        let record = to_record(item("alice", "yo", 0, 0), Vec::new());
        assert_eq!(record.user, "alice");
    }

    #[test]
    fn test_profiles() {
        let fast = CommentProfile::constrained();
        assert_eq!(fast.max_pages, Some(3));
        assert_eq!(fast.max_count, Some(100));
        assert_eq!(fast.reply_cap, 5);
        assert!(!fast.concurrent_replies);
        assert!(fast.single_reply_page);

        let full = CommentProfile::interactive();
        assert!(full.max_pages.is_none());
        assert_eq!(full.page_size, Some(50));
        assert_eq!(full.reply_cap, 10);
        assert!(full.concurrent_replies);
    }
}
