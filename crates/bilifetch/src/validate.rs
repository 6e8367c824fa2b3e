//! Identifier validation and removed-content page detection

use regex::Regex;
use std::sync::LazyLock;

static BVID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^BV[A-Za-z0-9]{10}$").unwrap());
static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").unwrap());

/// Page kind for the not-found signature check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Video,
    Article,
}

/// True if `bvid` is a well-formed video id (BV prefix + 10 alphanumerics)
pub fn is_valid_bvid(bvid: &str) -> bool {
    BVID.is_match(bvid)
}

/// True if `cv_id` is a well-formed article id (non-empty ASCII digits)
pub fn is_valid_cv_id(cv_id: &str) -> bool {
    !cv_id.is_empty() && cv_id.bytes().all(|b| b.is_ascii_digit())
}

const VIDEO_GONE_TITLE: &str = "视频去哪了呢？_哔哩哔哩_bilibili";
const VIDEO_GONE_MARKER: &str = "视频去哪了呢？";
const ARTICLE_GONE_MARKERS: &[&str] = &["文章去哪了呢？", "页面不存在"];

/// Detect the platform's "content removed" page by signature
///
/// False negatives only lead to an extraction failure downstream; the
/// signatures are specific enough that real content pages never match.
pub fn is_not_found_page(html: &str, kind: PageKind) -> bool {
    if let Some(caps) = TITLE.captures(html) {
        let title = &caps[1];
        match kind {
            PageKind::Video if title == VIDEO_GONE_TITLE => return true,
            PageKind::Article
                if ARTICLE_GONE_MARKERS.iter().any(|m| title.contains(m)) =>
            {
                return true
            }
            _ => {}
        }
    }

    match kind {
        PageKind::Video => html.contains(VIDEO_GONE_MARKER),
        PageKind::Article => ARTICLE_GONE_MARKERS.iter().any(|m| html.contains(m)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bvid() {
        assert!(is_valid_bvid("BV1xx411c7mD"));
        assert!(is_valid_bvid("BVabcdefghij"));
    }

    #[test]
    fn test_invalid_bvid() {
        assert!(!is_valid_bvid(""));
        assert!(!is_valid_bvid("BV123"));
        assert!(!is_valid_bvid("AV1xx411c7mD"));
        assert!(!is_valid_bvid("BV1xx411c7mDx")); // 11 chars after prefix
        assert!(!is_valid_bvid("bv1xx411c7mD")); // lowercase prefix
        assert!(!is_valid_bvid("BV1xx411c7m!"));
    }

    #[test]
    fn test_valid_cv_id() {
        assert!(is_valid_cv_id("12411259"));
        assert!(is_valid_cv_id("7"));
        assert!(!is_valid_cv_id(""));
        assert!(!is_valid_cv_id("cv12411259"));
        assert!(!is_valid_cv_id("12a3"));
    }

    #[test]
    fn test_not_found_video_by_title() {
        let html = "<html><title>视频去哪了呢？_哔哩哔哩_bilibili</title></html>";
        assert!(is_not_found_page(html, PageKind::Video));
        assert!(!is_not_found_page(html, PageKind::Article));
    }

    #[test]
    fn test_not_found_article_by_body() {
        let html = "<html><title>哔哩哔哩</title><body>页面不存在</body></html>";
        assert!(is_not_found_page(html, PageKind::Article));
    }

    #[test]
    fn test_real_page_not_flagged() {
        let html = "<html><title>一个正常的视频_哔哩哔哩_bilibili</title><body>ok</body></html>";
        assert!(!is_not_found_page(html, PageKind::Video));
        assert!(!is_not_found_page(html, PageKind::Article));
    }
}
