//! Text and number extraction helpers
//!
//! Everything here is pure and infallible by contract: unparseable input
//! degrades to zero / empty rather than erroring, so a single broken field
//! never sinks a whole page parse.

use chrono::{Datelike, Duration, Local, TimeZone};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// First capture group of `re` in `input`, if any
pub(crate) fn capture<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Like [`capture`] but owned, defaulting to the empty string
pub(crate) fn capture_or_empty(re: &Regex, input: &str) -> String {
    capture(re, input).unwrap_or_default().to_string()
}

static NUMBER_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)([万千百十]?)").unwrap());

/// Parse a localized numeric shorthand such as "134.5万" into an integer
///
/// A missing unit means a multiplier of 1; anything unparseable yields 0.
pub fn number_with_unit(text: &str) -> u64 {
    let Some(caps) = NUMBER_UNIT.captures(text.trim()) else {
        return 0;
    };

    let number: f64 = match caps[1].parse() {
        Ok(n) => n,
        Err(_) => return 0,
    };

    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("万") => 10_000.0,
        Some("千") => 1_000.0,
        Some("百") => 100.0,
        Some("十") => 10.0,
        _ => 1.0,
    };

    (number * multiplier) as u64
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip tags, decode the basic HTML entities and collapse whitespace
pub fn plain_text(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").unwrap());
static PARTIAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})日").unwrap());
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());
static PARTIAL_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})$").unwrap());
static HOURS_AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)小时前").unwrap());
static MINUTES_AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)分钟前").unwrap());
static DAYS_AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)天前").unwrap());

fn local_midnight(year: i32, month: u32, day: u32) -> Option<i64> {
    Local
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp())
}

/// Convert the platform's display dates to epoch seconds
///
/// Accepts Y年M月D日, M月D日 (current year), Y-M-D, M-D (current year) and
/// relative expressions (N小时前 / N分钟前 / N天前). Anything else is logged
/// and mapped to 0.
pub fn date_to_epoch(text: &str) -> i64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    if let Some(caps) = FULL_DATE.captures(text) {
        let (y, m, d) = (parse_num(&caps[1]), parse_num(&caps[2]), parse_num(&caps[3]));
        return local_midnight(y as i32, m as u32, d as u32).unwrap_or(0);
    }

    if let Some(caps) = PARTIAL_DATE.captures(text) {
        let (m, d) = (parse_num(&caps[1]), parse_num(&caps[2]));
        return local_midnight(Local::now().year(), m as u32, d as u32).unwrap_or(0);
    }

    if let Some(caps) = ISO_DATE.captures(text) {
        let (y, m, d) = (parse_num(&caps[1]), parse_num(&caps[2]), parse_num(&caps[3]));
        return local_midnight(y as i32, m as u32, d as u32).unwrap_or(0);
    }

    if let Some(caps) = PARTIAL_ISO.captures(text) {
        let (m, d) = (parse_num(&caps[1]), parse_num(&caps[2]));
        return local_midnight(Local::now().year(), m as u32, d as u32).unwrap_or(0);
    }

    if let Some(caps) = HOURS_AGO.captures(text) {
        return (Local::now() - Duration::hours(parse_num(&caps[1]))).timestamp();
    }
    if let Some(caps) = MINUTES_AGO.captures(text) {
        return (Local::now() - Duration::minutes(parse_num(&caps[1]))).timestamp();
    }
    if let Some(caps) = DAYS_AGO.captures(text) {
        return (Local::now() - Duration::days(parse_num(&caps[1]))).timestamp();
    }

    warn!(date = text, "unrecognized date format");
    0
}

fn parse_num(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}
