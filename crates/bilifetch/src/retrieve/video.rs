//! Video metadata retrieval, via the JSON API or the rendered watch page

use crate::api::VideoView;
use crate::error::{Error, Result};
use crate::extract::{capture, capture_or_empty, number_with_unit};
use crate::transport::Transport;
use crate::types::VideoRecord;
use crate::validate::{is_not_found_page, PageKind};
use regex::Regex;
use std::sync::LazyLock;

/// Fetch the raw view record; shared with aid/cid lookups
pub(crate) async fn view(transport: &Transport, bvid: &str) -> Result<VideoView> {
    let data = transport
        .call_api("/x/web-interface/view", &[("bvid", bvid.to_string())])
        .await?;
    serde_json::from_value(data)
        .map_err(|e| Error::Network(format!("malformed view payload: {e}")))
}

pub(crate) async fn via_api(transport: &Transport, bvid: &str) -> Result<VideoRecord> {
    let view = view(transport, bvid).await?;
    Ok(VideoRecord {
        bvid: view.bvid,
        title: view.title,
        desc: view.desc,
        pic: view.pic,
        pubdate: view.pubdate,
        duration: view.duration,
        view: view.stat.view,
        danmaku: view.stat.danmaku,
        reply: view.stat.reply,
        favorite: view.stat.favorite,
        coin: view.stat.coin,
        share: view.stat.share,
        like: view.stat.like,
        owner_name: view.owner.name,
        owner_mid: view.owner.mid,
        tname: view.tname,
        tags: view
            .tags
            .into_iter()
            .map(|t| t.tag_name)
            .filter(|t| !t.is_empty())
            .collect(),
    })
}

pub(crate) async fn via_script(transport: &Transport, bvid: &str) -> Result<VideoRecord> {
    let url = format!("{}/video/{}", transport.www_base, bvid);
    let html = transport.fetch_text(&url).await?;

    if is_not_found_page(&html, PageKind::Video) {
        return Err(Error::NotFound(format!("video {bvid} has been removed")));
    }

    parse_video_page(&html, bvid)
}

static PAGE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").unwrap());
static JSON_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""title":"([^"]*)""#).unwrap());
static JSON_DESC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""desc":"([^"]*)""#).unwrap());
static JSON_PIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""pic":"([^"]*)""#).unwrap());
static JSON_OWNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""owner":\{"mid":(\d+),"name":"([^"]*)""#).unwrap());
static JSON_REPLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""reply":(\d+)"#).unwrap());
static JSON_PUBDATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""pubdate":(\d+)"#).unwrap());
static JSON_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""duration":(\d+)"#).unwrap());
static JSON_TNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""tname":"([^"]*)""#).unwrap());
static JSON_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""tags":\[([^\]]*)\]"#).unwrap());
static JSON_TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""tag_name":"([^"]*)""#).unwrap());

static VIEW_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<div class="view-text"[^>]*>([^<]+)</div>"#).unwrap());
static DM_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<div class="dm-text"[^>]*>([^<]+)</div>"#).unwrap());
static LIKE_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="video-like-info[^>]*>([^<]+)</span>"#).unwrap());
static COIN_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="video-coin-info[^>]*>([^<]+)</span>"#).unwrap());
static FAV_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="video-fav-info[^>]*>([^<]+)</span>"#).unwrap());
static SHARE_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="[^"]*share[^"]*"[^>]*>([^<]+)</[^>]*>"#).unwrap());

const TITLE_SUFFIX: &str = "_哔哩哔哩_bilibili";

/// Assemble a video record from the watch page markup
///
/// Stats come from the rendered counters, the rest from the embedded state
/// JSON. Fails only when neither a title nor an owner could be found.
pub(crate) fn parse_video_page(html: &str, bvid: &str) -> Result<VideoRecord> {
    let mut record = VideoRecord {
        bvid: bvid.to_string(),
        ..Default::default()
    };

    record.title = capture(&PAGE_TITLE, html)
        .map(|t| t.replace(TITLE_SUFFIX, "").trim().to_string())
        .unwrap_or_default();
    if record.title.is_empty() {
        record.title = capture_or_empty(&JSON_TITLE, html);
    }

    record.desc = capture_or_empty(&JSON_DESC, html);
    // The embedded JSON escapes slashes in URLs
    record.pic = capture_or_empty(&JSON_PIC, html).replace('\\', "");

    if let Some(caps) = JSON_OWNER.captures(html) {
        record.owner_mid = caps[1].parse().unwrap_or(0);
        record.owner_name = caps[2].to_string();
    }

    record.view = number_with_unit(capture(&VIEW_TEXT, html).unwrap_or_default());
    record.danmaku = number_with_unit(capture(&DM_TEXT, html).unwrap_or_default());
    record.like = number_with_unit(capture(&LIKE_INFO, html).unwrap_or_default());
    record.coin = number_with_unit(capture(&COIN_INFO, html).unwrap_or_default());
    record.favorite = number_with_unit(capture(&FAV_INFO, html).unwrap_or_default());
    record.share = number_with_unit(capture(&SHARE_INFO, html).unwrap_or_default());

    record.reply = capture(&JSON_REPLY, html)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    record.pubdate = capture(&JSON_PUBDATE, html)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    record.duration = capture(&JSON_DURATION, html)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    record.tname = capture_or_empty(&JSON_TNAME, html);

    if let Some(tags_blob) = capture(&JSON_TAGS, html) {
        record.tags = JSON_TAG_NAME
            .captures_iter(tags_blob)
            .map(|c| c[1].to_string())
            .collect();
    }

    if record.title.is_empty() && record.owner_name.is_empty() {
        return Err(Error::Extraction(format!(
            "no video metadata found on page for {bvid}"
        )));
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> String {
        concat!(
            "<html><head><title>测试视频标题_哔哩哔哩_bilibili</title></head><body>",
            r#"<script>window.__INITIAL_STATE__={"desc":"一段描述","pic":"https:\/\/i0.hdslb.com\/bfs\/archive\/cover.jpg","owner":{"mid":12345,"name":"某UP主"},"reply":321,"pubdate":1650000000,"duration":754,"tname":"科技","tags":[{"tag_name":"教程"},{"tag_name":"评测"}]}</script>"#,
            r#"<div class="view-text" data-v-1>134.5万</div>"#,
            r#"<div class="dm-text" data-v-1>4.1万</div>"#,
            r#"<span class="video-like-info toolbar-left-item-text">10.2万</span>"#,
            r#"<span class="video-coin-info toolbar-left-item-text">3.3万</span>"#,
            r#"<span class="video-fav-info toolbar-left-item-text">2.8万</span>"#,
            r#"<span class="video-share-info toolbar-left-item-text">8888</span>"#,
            "</body></html>"
        )
        .to_string()
    }

    #[test]
    fn test_parse_video_page() {
        let record = parse_video_page(&sample_page(), "BV1xx411c7mD").unwrap();
        assert_eq!(record.bvid, "BV1xx411c7mD");
        assert_eq!(record.title, "测试视频标题");
        assert_eq!(record.desc, "一段描述");
        assert_eq!(record.pic, "https://i0.hdslb.com/bfs/archive/cover.jpg");
        assert_eq!(record.owner_mid, 12345);
        assert_eq!(record.owner_name, "某UP主");
        assert_eq!(record.view, 1_345_000);
        assert_eq!(record.danmaku, 41_000);
        assert_eq!(record.like, 102_000);
        assert_eq!(record.coin, 33_000);
        assert_eq!(record.favorite, 28_000);
        assert_eq!(record.reply, 321);
        assert_eq!(record.pubdate, 1_650_000_000);
        assert_eq!(record.duration, 754);
        assert_eq!(record.tname, "科技");
        assert_eq!(record.tags, vec!["教程", "评测"]);
    }

    #[test]
    fn test_parse_video_page_title_fallback() {
        let html = r#"<html><body><script>{"title":"备用标题","owner":{"mid":1,"name":"up"}}</script></body></html>"#;
        let record = parse_video_page(html, "BV1xx411c7mD").unwrap();
        assert_eq!(record.title, "备用标题");
    }

    #[test]
    fn test_parse_video_page_empty_fails() {
        let err = parse_video_page("<html><body>nothing here</body></html>", "BV1xx411c7mD")
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
