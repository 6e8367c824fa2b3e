//! Article retrieval and page parsing
//!
//! Articles have no public JSON endpoint, so everything comes off the
//! rendered page. The body is parsed into ordered text and image blocks so
//! callers can reconstruct the reading flow.

use crate::error::{Error, Result};
use crate::extract::{capture, plain_text};
use crate::transport::Transport;
use crate::types::{ArticleRecord, ContentBlock};
use crate::validate::{is_not_found_page, PageKind};
use regex::Regex;
use std::sync::LazyLock;

pub(crate) async fn fetch(transport: &Transport, cv_id: &str) -> Result<ArticleRecord> {
    let url = format!("{}/read/cv{}", transport.www_base, cv_id);
    let html = transport.fetch_text(&url).await?;

    if is_not_found_page(&html, PageKind::Article) {
        return Err(Error::NotFound(format!("article cv{cv_id} has been removed")));
    }

    let record = parse_article_page(&html, cv_id, &url);
    if record.title.is_empty() {
        return Err(Error::Extraction(format!(
            "no article metadata found on page for cv{cv_id}"
        )));
    }

    Ok(record)
}

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="opus-module-title__text">([^<]+)</span>"#).unwrap()
});
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="opus-module-author__name"[^>]*>([^<]+)</div>"#).unwrap()
});
static AVATAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]*src="([^"]*)"[^>]*onload="bmgOnLoad\(this\)"[^>]*>"#).unwrap()
});
static PUB_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="opus-module-author__pub__text">([^<]+)</div>"#).unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="opus-module-extend__item__text">([^<]+)</span>"#).unwrap()
});

const CONTENT_START: &str = r#"<div class="opus-module-content">"#;
const CONTENT_END: &str = r#"<div class="opus-module-extend">"#;

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p[^>]*data-v-[^>]*>.*?</p>").unwrap());
static PIC_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="opus-para-pic[^"]*">.*?</div>"#).unwrap());
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*src="([^"]*)"[^>]*>"#).unwrap());
static LAZY_IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*src="([^"]*)"[^>]*loading="lazy"[^>]*>"#).unwrap());

fn toolbar_counter(action: &str) -> Regex {
    Regex::new(&format!(
        r#"(?s)<div class="side-toolbar__action {action}">.*?<div class="side-toolbar__action__text">(\d+)</div>"#
    ))
    .unwrap()
}

static LIKE_COUNT: LazyLock<Regex> = LazyLock::new(|| toolbar_counter("like"));
static COIN_COUNT: LazyLock<Regex> = LazyLock::new(|| toolbar_counter("coin"));
static FAVORITE_COUNT: LazyLock<Regex> = LazyLock::new(|| toolbar_counter("favorite"));
static FORWARD_COUNT: LazyLock<Regex> = LazyLock::new(|| toolbar_counter("forward"));
static COMMENT_COUNT: LazyLock<Regex> = LazyLock::new(|| toolbar_counter("comment"));

fn counter(re: &Regex, html: &str) -> u64 {
    capture(re, html).and_then(|s| s.parse().ok()).unwrap_or(0)
}

pub(crate) fn parse_article_page(html: &str, cv_id: &str, url: &str) -> ArticleRecord {
    let mut record = ArticleRecord {
        cv_id: cv_id.to_string(),
        url: url.to_string(),
        ..Default::default()
    };

    record.title = capture(&TITLE, html).unwrap_or_default().trim().to_string();
    record.author = capture(&AUTHOR, html).unwrap_or_default().trim().to_string();
    record.author_avatar = capture(&AVATAR, html).unwrap_or_default().to_string();
    record.publish_time = capture(&PUB_TIME, html).unwrap_or_default().trim().to_string();

    if let Some(body) = body_slice(html) {
        let (content, images, blocks) = parse_body(body);
        record.content = content;
        record.images = images;
        record.blocks = blocks;
    }

    record.tags = TAG
        .captures_iter(html)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    record.like_count = counter(&LIKE_COUNT, html);
    record.coin_count = counter(&COIN_COUNT, html);
    record.favorite_count = counter(&FAVORITE_COUNT, html);
    record.share_count = counter(&FORWARD_COUNT, html);
    record.reply_count = counter(&COMMENT_COUNT, html);

    record
}

/// The article body sits between the content and extend module divs
fn body_slice(html: &str) -> Option<&str> {
    let start = html.find(CONTENT_START)?;
    let end = html[start..].find(CONTENT_END)? + start;
    Some(&html[start..end])
}

/// Parse the body into joined text, an image list and ordered blocks
fn parse_body(body: &str) -> (String, Vec<String>, Vec<ContentBlock>) {
    let mut blocks = Vec::new();
    let mut images = Vec::new();
    let mut paragraphs = Vec::new();

    for m in PARAGRAPH.find_iter(body) {
        let text = plain_text(m.as_str());
        if !text.is_empty() {
            paragraphs.push(text.clone());
            blocks.push(ContentBlock::Text { content: text });
        }
    }

    for m in PIC_BLOCK.find_iter(body) {
        if let Some(url) = capture(&IMG_SRC, m.as_str()) {
            if is_content_url(url) {
                images.push(url.to_string());
                blocks.push(ContentBlock::Image {
                    url: url.to_string(),
                });
            }
        }
    }

    if images.is_empty() {
        fallback_images(body, &mut images, &mut blocks);
    }

    (paragraphs.join("\n\n"), images, blocks)
}

fn is_content_url(url: &str) -> bool {
    url.starts_with("//") || url.starts_with("http")
}

/// Looser scan used when no dedicated image blocks matched
fn fallback_images(body: &str, images: &mut Vec<String>, blocks: &mut Vec<ContentBlock>) {
    for re in [&*LAZY_IMG_SRC, &*IMG_SRC] {
        for caps in re.captures_iter(body) {
            let url = &caps[1];
            // Skip avatars and chrome; article images carry long CDN paths
            if is_content_url(url)
                && !url.contains("face")
                && !url.contains("avatar")
                && !url.contains("icon")
                && !url.contains("logo")
                && url.len() > 50
            {
                images.push(url.to_string());
                blocks.push(ContentBlock::Image {
                    url: url.to_string(),
                });
            }
        }
        if !images.is_empty() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> String {
        concat!(
            r#"<html><body>"#,
            r#"<span class="opus-module-title__text">一篇测试专栏</span>"#,
            r#"<div class="opus-module-author__name" data-v-3>专栏作者</div>"#,
            r#"<img src="https://i0.hdslb.com/bfs/face/author.jpg" onload="bmgOnLoad(this)" alt="">"#,
            r#"<div class="opus-module-author__pub__text">2024年3月12日</div>"#,
            r#"<div class="opus-module-content">"#,
            r#"<p data-v-abc>第一段内容。</p>"#,
            r#"<div class="opus-para-pic"><img src="https://i0.hdslb.com/bfs/article/0123456789abcdef0123456789abcdef01234567.png"></div>"#,
            r#"<p data-v-abc>第二段<strong>内容</strong>。</p>"#,
            r#"</div><div class="opus-module-extend">"#,
            r#"<span class="opus-module-extend__item__text">标签一</span>"#,
            r#"<span class="opus-module-extend__item__text">标签二</span>"#,
            r#"</div>"#,
            r#"<div class="side-toolbar__action like"><div class="side-toolbar__action__text">42</div></div>"#,
            r#"<div class="side-toolbar__action coin"><div class="side-toolbar__action__text">7</div></div>"#,
            r#"<div class="side-toolbar__action favorite"><div class="side-toolbar__action__text">19</div></div>"#,
            r#"<div class="side-toolbar__action forward"><div class="side-toolbar__action__text">3</div></div>"#,
            r#"<div class="side-toolbar__action comment"><div class="side-toolbar__action__text">11</div></div>"#,
            r#"</body></html>"#,
        )
        .to_string()
    }

    #[test]
    fn test_parse_article_page() {
        let record = parse_article_page(
            &sample_page(),
            "12411259",
            "https://www.bilibili.com/read/cv12411259",
        );
        assert_eq!(record.cv_id, "12411259");
        assert_eq!(record.title, "一篇测试专栏");
        assert_eq!(record.author, "专栏作者");
        assert_eq!(record.author_avatar, "https://i0.hdslb.com/bfs/face/author.jpg");
        assert_eq!(record.publish_time, "2024年3月12日");
        assert_eq!(record.content, "第一段内容。\n\n第二段内容。");
        assert_eq!(record.images.len(), 1);
        assert_eq!(record.tags, vec!["标签一", "标签二"]);
        assert_eq!(record.like_count, 42);
        assert_eq!(record.coin_count, 7);
        assert_eq!(record.favorite_count, 19);
        assert_eq!(record.share_count, 3);
        assert_eq!(record.reply_count, 11);
    }

    #[test]
    fn test_parse_article_blocks_order() {
        let record = parse_article_page(&sample_page(), "1", "u");
        assert_eq!(record.blocks.len(), 3);
        assert!(matches!(record.blocks[0], ContentBlock::Text { .. }));
        assert!(matches!(record.blocks[1], ContentBlock::Text { .. }));
        assert!(matches!(record.blocks[2], ContentBlock::Image { .. }));
    }

    #[test]
    fn test_fallback_image_filtering() {
        let body = concat!(
            r#"<div class="opus-module-content">"#,
            r#"<img src="https://i0.hdslb.com/bfs/face/avatar123.jpg" loading="lazy">"#,
            r#"<img src="https://i0.hdslb.com/bfs/article/aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.png" loading="lazy">"#,
            r#"<div class="opus-module-extend">"#,
        );
        let record = parse_article_page(body, "1", "u");
        assert_eq!(record.images.len(), 1);
        assert!(record.images[0].contains("/bfs/article/"));
    }

    #[test]
    fn test_missing_title_yields_empty() {
        let record = parse_article_page("<html></html>", "1", "u");
        assert!(record.title.is_empty());
    }
}
