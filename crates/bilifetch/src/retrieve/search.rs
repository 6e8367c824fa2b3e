//! Keyword search for videos and articles
//!
//! Video search has an API path and a results-page scraping path. Article
//! search only exists as a rendered page, so it goes through the browser
//! backend and degrades to clearly-labelled placeholder records when no
//! browser is available.

use crate::api::{SearchData, SearchNode};
use crate::error::{Error, Result};
use crate::extract::{capture, date_to_epoch, number_with_unit};
use crate::transport::Transport;
use crate::types::{ArticleHit, VideoHit};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

pub(crate) async fn videos_via_api(
    transport: &Transport,
    keyword: &str,
    limit: usize,
) -> Result<Vec<VideoHit>> {
    let data = transport
        .call_api(
            "/x/web-interface/search/all/v2",
            &[
                ("keyword", keyword.to_string()),
                ("page", "1".to_string()),
                ("page_size", "20".to_string()),
            ],
        )
        .await?;

    let data: SearchData = serde_json::from_value(data)
        .map_err(|e| Error::Network(format!("malformed search payload: {e}")))?;

    Ok(collect_video_hits(data, limit))
}

/// Flatten the mixed search node shapes into video hits, up to `limit`
pub(crate) fn collect_video_hits(data: SearchData, limit: usize) -> Vec<VideoHit> {
    let mut hits = Vec::new();

    for node in data.into_nodes() {
        if hits.len() >= limit {
            break;
        }
        match node {
            SearchNode::Wrapped(node) => {
                // Wrappers carry other result kinds too; keep only video ones
                if node.result_type.as_deref().is_some_and(|t| t != "video") {
                    continue;
                }
                for item in node.data.into_vec() {
                    if hits.len() >= limit {
                        break;
                    }
                    push_video_hit(&mut hits, item);
                }
            }
            SearchNode::Bare(item) => push_video_hit(&mut hits, item),
        }
    }

    hits
}

fn push_video_hit(hits: &mut Vec<VideoHit>, item: serde_json::Value) {
    match serde_json::from_value::<VideoHit>(item) {
        Ok(hit) => hits.push(hit),
        Err(e) => warn!(error = %e, "skipping unparseable search entry"),
    }
}

/// Markers that distinguish a real results page from an interstitial
const SEARCH_PAGE_MARKERS: &[&str] = &[
    "搜索结果",
    "search-result",
    "video-item",
    "bili-video-card",
    "video-card",
    "search-list",
    "result-list",
    "vui_tabs",
];

pub(crate) async fn videos_via_script(
    transport: &Transport,
    keyword: &str,
    limit: usize,
) -> Result<Vec<VideoHit>> {
    let url = format!(
        "{}/all?keyword={}",
        transport.search_base,
        urlencoding::encode(keyword)
    );
    let html = transport.fetch_text(&url).await?;

    if !SEARCH_PAGE_MARKERS.iter().any(|m| html.contains(m)) {
        return Err(Error::Extraction(
            "response does not look like a search results page".to_string(),
        ));
    }

    Ok(parse_video_search(&html, limit))
}

static BV_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="[^"]*/(BV[A-Za-z0-9]+)"#).unwrap());
static CARD_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<h3[^>]*title="([^"]*)""#).unwrap());
static CARD_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="bili-video-card__info--author"[^>]*>([^<]+)</span>"#).unwrap()
});
static CARD_STAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<span class="bili-video-card__stats--item"[^>]*>.*?<span[^>]*>([^<]+)</span>"#)
        .unwrap()
});
static CARD_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="bili-video-card__stats__duration"[^>]*>([^<]+)</span>"#).unwrap()
});
static CARD_PIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*src="([^"]*)"[^>]*alt="[^"]*""#).unwrap());
static CARD_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="bili-video-card__info--date"[^>]*> · ([^<]+)</span>"#).unwrap()
});

/// Scrape the video cards off a search results page
///
/// Each BV link anchors a card; the card block runs from the link to the end
/// of its info block, and every field is best-effort within it.
pub(crate) fn parse_video_search(html: &str, limit: usize) -> Vec<VideoHit> {
    let mut hits: Vec<VideoHit> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for caps in BV_LINK.captures_iter(html) {
        if hits.len() >= limit {
            break;
        }
        let bvid = &caps[1];
        // Cards link to the same video several times
        if !seen.insert(bvid.to_string()) {
            continue;
        }

        let card_re = match Regex::new(&format!(
            r#"(?s)href="[^"]*/({}).*?<div class="bili-video-card__info".*?</div>.*?</div>"#,
            regex::escape(bvid)
        )) {
            Ok(re) => re,
            Err(_) => continue,
        };
        let Some(card) = card_re.find(html).map(|m| m.as_str()) else {
            continue;
        };

        let title = capture(&CARD_TITLE, card).unwrap_or_default().to_string();
        if title.is_empty() {
            continue;
        }

        let stats: Vec<&str> = CARD_STAT
            .captures_iter(card)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();

        hits.push(VideoHit {
            bvid: bvid.to_string(),
            title,
            // The results page renders no description
            description: String::new(),
            pic: capture(&CARD_PIC, card).unwrap_or_default().to_string(),
            play: number_with_unit(stats.first().copied().unwrap_or("0")),
            danmaku: number_with_unit(stats.get(1).copied().unwrap_or("0")),
            duration: capture(&CARD_DURATION, card).unwrap_or_default().to_string(),
            author: capture(&CARD_AUTHOR, card).unwrap_or_default().to_string(),
            pubdate: capture(&CARD_DATE, card).map(date_to_epoch).unwrap_or(0),
        });
    }

    hits
}

static ARTICLE_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div[^>]*class="[^"]*b-article-card[^"]*"[^>]*>.*?</div>"#).unwrap()
});
static ARTICLE_CV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="[^"]*read/cv(\d+)"#).unwrap());
static ARTICLE_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"title="([^"]*)""#).unwrap());
static ARTICLE_DESC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="atc-desc[^"]*"[^>]*>([^<]+)</p>"#).unwrap());
static ARTICLE_PIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]*)"[^>]*alt="专栏""#).unwrap());
static ARTICLE_LIKES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)点赞").unwrap());
static ARTICLE_COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)条评论").unwrap());
static ARTICLE_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="[^"]*read/life#rid=(\d+)"[^>]*>([^<]+)</a>"#).unwrap());

/// Scrape the article cards off a rendered article-search page
pub(crate) fn parse_article_search(html: &str, limit: usize, www_base: &str) -> Vec<ArticleHit> {
    let mut hits = Vec::new();

    for m in ARTICLE_CARD.find_iter(html).take(limit) {
        let card = m.as_str();

        let title = capture(&ARTICLE_TITLE, card).unwrap_or_default().to_string();
        if title.is_empty() {
            continue;
        }

        let id = capture(&ARTICLE_CV, card)
            .map(str::to_string)
            .unwrap_or_else(|| format!("cv_{}", hits.len()));

        hits.push(ArticleHit {
            url: format!("{www_base}/read/cv{id}"),
            id,
            title,
            description: capture(&ARTICLE_DESC, card).unwrap_or_default().to_string(),
            pic: capture(&ARTICLE_PIC, card).unwrap_or_default().to_string(),
            reply: capture(&ARTICLE_COMMENTS, card)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            like: capture(&ARTICLE_LIKES, card)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            // The cards do not show the author
            author: String::new(),
            category: ARTICLE_CATEGORY
                .captures(card)
                .and_then(|c| c.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            synthetic: false,
        });
    }

    hits
}

/// Placeholder hits for the degraded no-browser mode, flagged as synthetic
pub(crate) fn synthetic_article_hits(keyword: &str, limit: usize, www_base: &str) -> Vec<ArticleHit> {
    (0..limit.min(5))
        .map(|i| {
            let cv = 43_049_500 + i as u64;
            ArticleHit {
                id: format!("cv{cv}"),
                title: format!("[模拟数据] 关于{keyword}的专栏文章 {}", i + 1),
                description: format!("这是关于{keyword}的第{}篇专栏文章的描述内容。", i + 1),
                pic: format!("https://i0.hdslb.com/bfs/new_dyn/banner/mock_banner_{}.png", i + 1),
                reply: 10 + i as u64 * 2,
                like: 50 + i as u64 * 10,
                author: format!("[模拟] 作者{}", i + 1),
                category: "日常".to_string(),
                url: format!("{www_base}/read/cv{cv}"),
                synthetic: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::DEFAULT_WWW_BASE;

    fn video_card(bvid: &str, title: &str, play: &str, danmaku: &str) -> String {
        format!(
            concat!(
                r#"<a href="//www.bilibili.com/video/{bvid}">"#,
                r#"<img src="//i0.hdslb.com/cover_{bvid}.jpg" alt="{title}">"#,
                r#"<div class="bili-video-card__info">"#,
                r#"<h3 class="bili-video-card__info--tit" title="{title}">{title}</h3>"#,
                r#"<span class="bili-video-card__info--author">作者甲</span>"#,
                r#"<span class="bili-video-card__info--date"> · 2022年01月12日</span>"#,
                r#"<span class="bili-video-card__stats--item"><i></i><span>{play}</span></span>"#,
                r#"<span class="bili-video-card__stats--item"><i></i><span>{danmaku}</span></span>"#,
                r#"<span class="bili-video-card__stats__duration">12:34</span>"#,
                r#"</div></a></div>"#,
            ),
            bvid = bvid,
            title = title,
            play = play,
            danmaku = danmaku,
        )
    }

    #[test]
    fn test_parse_video_search() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            video_card("BV1xx411c7mD", "第一个视频", "134.5万", "1.2万"),
            video_card("BV1yy411c7mE", "第二个视频", "8888", "99"),
        );
        let hits = parse_video_search(&html, 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].bvid, "BV1xx411c7mD");
        assert_eq!(hits[0].title, "第一个视频");
        assert_eq!(hits[0].play, 1_345_000);
        assert_eq!(hits[0].danmaku, 12_000);
        assert_eq!(hits[0].duration, "12:34");
        assert_eq!(hits[0].author, "作者甲");
        assert!(hits[0].pubdate > 0);
        assert_eq!(hits[1].play, 8888);
    }

    #[test]
    fn test_parse_video_search_truncates() {
        let html = format!(
            "{}{}{}",
            video_card("BV1aa411c7mA", "a", "1", "1"),
            video_card("BV1bb411c7mB", "b", "1", "1"),
            video_card("BV1cc411c7mC", "c", "1", "1"),
        );
        assert_eq!(parse_video_search(&html, 2).len(), 2);
    }

    #[test]
    fn test_parse_video_search_dedupes_repeated_links() {
        // The same card links its cover and its title to the same video
        let html = format!(
            r#"<a href="/video/BV1xx411c7mD"></a>{}"#,
            video_card("BV1xx411c7mD", "标题", "100", "5"),
        );
        let hits = parse_video_search(&html, 10);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_parse_video_search_skips_titleless_cards() {
        let html = r#"<a href="/video/BV1xx411c7mD"><div class="bili-video-card__info"></div></div></a>"#;
        assert!(parse_video_search(html, 10).is_empty());
    }

    fn article_card(cv: u64, title: &str) -> String {
        format!(
            concat!(
                r#"<div class="b-article-card"><a href="//www.bilibili.com/read/cv{cv}" title="{title}">{title}</a>"#,
                r#"<img src="//i0.hdslb.com/article_{cv}.jpg" alt="专栏">"#,
                r#"<p class="atc-desc b_text">一段描述</p>"#,
                r#"<span>12点赞</span><span>34条评论</span>"#,
                r#"<a href="//www.bilibili.com/read/life#rid=21">日常</a>"#,
                r#"</div>"#,
            ),
            cv = cv,
            title = title,
        )
    }

    #[test]
    fn test_parse_article_search() {
        let html = article_card(43049599, "某篇专栏");
        let hits = parse_article_search(&html, 10, DEFAULT_WWW_BASE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "43049599");
        assert_eq!(hits[0].title, "某篇专栏");
        assert_eq!(hits[0].like, 12);
        assert_eq!(hits[0].reply, 34);
        assert_eq!(hits[0].category, "日常");
        assert_eq!(hits[0].url, "https://www.bilibili.com/read/cv43049599");
        assert!(!hits[0].synthetic);
    }

    #[test]
    fn test_synthetic_article_hits_capped_and_flagged() {
        let hits = synthetic_article_hits("rust", 8, DEFAULT_WWW_BASE);
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().all(|h| h.synthetic));
        assert_eq!(hits[0].id, "cv43049500");
        assert!(hits[0].title.contains("rust"));
    }

    #[test]
    fn test_collect_video_hits_wrapped_and_bare() {
        let data: SearchData = serde_json::from_str(
            r#"{"result":[
                {"result_type":"article","data":[{"id":"1","title":"skip me"}]},
                {"result_type":"video","data":[
                    {"bvid":"BV1xx411c7mD","title":"a","play":10,"video_review":2},
                    {"bvid":"BV1yy411c7mE","title":"b"}
                ]},
                {"bvid":"BV1zz411c7mF","title":"c"}
            ]}"#,
        )
        .unwrap();

        let hits = collect_video_hits(data, 10);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].bvid, "BV1xx411c7mD");
        assert_eq!(hits[0].danmaku, 2);
        assert_eq!(hits[2].bvid, "BV1zz411c7mF");
    }

    #[test]
    fn test_collect_video_hits_truncation() {
        let data: SearchData = serde_json::from_str(
            r#"{"result":[{"result_type":"video","data":[
                {"bvid":"BV1aa411c7mA","title":"a"},
                {"bvid":"BV1bb411c7mB","title":"b"},
                {"bvid":"BV1cc411c7mC","title":"c"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(collect_video_hits(data, 2).len(), 2);
    }
}
