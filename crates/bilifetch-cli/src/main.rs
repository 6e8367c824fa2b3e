//! Bilifetch CLI - command-line interface for Bilibili content retrieval

use bilifetch::{Client, FetchStrategy, TOOL_LLMTXT};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Retrieval strategy for operations that support both paths
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Strategy {
    /// Structured JSON API call
    #[default]
    Api,
    /// Rendered-page scraping fallback
    Script,
}

impl From<Strategy> for FetchStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Api => FetchStrategy::Api,
            Strategy::Script => FetchStrategy::Script,
        }
    }
}

/// Bilifetch - Bilibili content retrieval tool
#[derive(Parser, Debug)]
#[command(name = "bilifetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    /// Session cookie string (for comment retrieval)
    #[arg(long, global = true)]
    cookie: Option<String>,

    /// File holding the session cookie (raw string or exported JSON)
    #[arg(long, global = true)]
    cookie_file: Option<PathBuf>,

    /// Delay before each request, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Fixed User-Agent instead of the built-in pool
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search videos by keyword
    SearchVideos {
        keyword: String,

        /// Maximum number of results
        #[arg(long, short = 'n', default_value_t = 10)]
        count: usize,

        /// Retrieval strategy
        #[arg(long, short, default_value = "api")]
        method: Strategy,
    },
    /// Search articles by keyword (rendered page; degrades without a browser)
    SearchArticles {
        keyword: String,

        /// Maximum number of results
        #[arg(long, short = 'n', default_value_t = 10)]
        count: usize,
    },
    /// Fetch full metadata for one video
    VideoInfo {
        /// Video id (BV followed by 10 alphanumerics)
        bvid: String,

        /// Retrieval strategy
        #[arg(long, short, default_value = "api")]
        method: Strategy,
    },
    /// Fetch the raw danmaku track of a video
    Danmaku {
        bvid: String,

        /// Explicit track cid; resolved from the video when omitted
        #[arg(long)]
        cid: Option<u64>,
    },
    /// Fetch top-level comments (requires a cookie)
    Comments {
        bvid: String,

        /// Maximum number of comments
        #[arg(long, short = 'n', default_value_t = 10)]
        count: usize,

        /// Also fetch a bounded reply thread per comment
        #[arg(long)]
        include_replies: bool,

        /// Replies per comment when --include-replies is set
        #[arg(long, default_value_t = 5)]
        reply_count: usize,
    },
    /// Fetch one article by its numeric cv id
    Article {
        /// Article id, digits only (without the cv prefix)
        cv_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    let Some(command) = cli.command else {
        eprintln!("Usage: bilifetch <COMMAND>");
        eprintln!("   or: bilifetch --help");
        std::process::exit(1);
    };

    let cookie = match resolve_cookie(cli.cookie, cli.cookie_file.as_deref()) {
        Ok(cookie) => cookie,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut builder = Client::builder();
    if let Some(cookie) = cookie {
        builder = builder.cookie(cookie);
    }
    if let Some(ua) = cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(delay) = cli.delay_ms {
        builder = builder.request_delay(Duration::from_millis(delay));
    }
    #[cfg(feature = "browser")]
    {
        builder = builder.render_backend(std::sync::Arc::new(bilifetch::ChromiumBackend));
    }

    let client = match builder.build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match command {
        Commands::SearchVideos {
            keyword,
            count,
            method,
        } => print_envelope(client.search_videos(&keyword, count, method.into()).await),
        Commands::SearchArticles { keyword, count } => {
            print_envelope(client.search_articles(&keyword, count).await)
        }
        Commands::VideoInfo { bvid, method } => {
            print_envelope(client.video_info(&bvid, method.into()).await)
        }
        Commands::Danmaku { bvid, cid } => print_envelope(client.danmaku(&bvid, cid).await),
        Commands::Comments {
            bvid,
            count,
            include_replies,
            reply_count,
        } => print_envelope(
            client
                .comments(&bvid, count, include_replies, reply_count)
                .await,
        ),
        Commands::Article { cv_id } => print_envelope(client.article(&cv_id).await),
    }
}

/// Merge the --cookie flag and --cookie-file into one cookie string
fn resolve_cookie(
    flag: Option<String>,
    file: Option<&std::path::Path>,
) -> Result<Option<String>, String> {
    if let Some(cookie) = flag {
        return Ok(Some(cookie));
    }
    let Some(path) = file else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read cookie file {}: {e}", path.display()))?;
    Ok(Some(parse_cookie_content(&content)?))
}

/// Accepts the common cookie export shapes: a raw `k=v; k=v` string, a JSON
/// array of `{name, value}` objects, a JSON string, or an object wrapping one
/// of those under a `cookies` key.
fn parse_cookie_content(content: &str) -> Result<String, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("cookie file is empty".to_string());
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => cookie_from_json(&value),
        // Not JSON: treat the file as a raw cookie string
        Err(_) => Ok(trimmed.to_string()),
    }
}

fn cookie_from_json(value: &serde_json::Value) -> Result<String, String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        serde_json::Value::Array(entries) => {
            let pairs: Vec<String> = entries
                .iter()
                .filter_map(|entry| {
                    let name = entry.get("name")?.as_str()?;
                    let value = entry.get("value")?.as_str()?;
                    Some(format!("{name}={value}"))
                })
                .collect();
            if pairs.is_empty() {
                Err("cookie file holds no name/value entries".to_string())
            } else {
                Ok(pairs.join("; "))
            }
        }
        serde_json::Value::Object(map) => map
            .get("cookies")
            .ok_or_else(|| "cookie file object has no \"cookies\" key".to_string())
            .and_then(cookie_from_json),
        _ => Err("unrecognized cookie file format".to_string()),
    }
}

/// Print the result envelope as pretty JSON; exit 1 on a failure envelope
fn print_envelope<T: Serialize>(envelope: bilifetch::Envelope<T>) {
    let json = serde_json::to_string_pretty(&envelope).unwrap_or_else(|e| {
        eprintln!("Error serializing response: {e}");
        std::process::exit(1);
    });
    writeln_safe(&json);
    if !envelope.success {
        std::process::exit(1);
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_raw_string() {
        let cookie = parse_cookie_content("SESSDATA=abc; bili_jct=def\n").unwrap();
        assert_eq!(cookie, "SESSDATA=abc; bili_jct=def");
    }

    #[test]
    fn test_parse_cookie_json_array() {
        let cookie = parse_cookie_content(
            r#"[{"name":"SESSDATA","value":"abc"},{"name":"bili_jct","value":"def"}]"#,
        )
        .unwrap();
        assert_eq!(cookie, "SESSDATA=abc; bili_jct=def");
    }

    #[test]
    fn test_parse_cookie_json_string() {
        let cookie = parse_cookie_content(r#""SESSDATA=abc""#).unwrap();
        assert_eq!(cookie, "SESSDATA=abc");
    }

    #[test]
    fn test_parse_cookie_wrapped_object() {
        let cookie = parse_cookie_content(
            r#"{"cookies":[{"name":"SESSDATA","value":"abc"}],"note":"exported"}"#,
        )
        .unwrap();
        assert_eq!(cookie, "SESSDATA=abc");

        let cookie = parse_cookie_content(r#"{"cookies":"SESSDATA=abc"}"#).unwrap();
        assert_eq!(cookie, "SESSDATA=abc");
    }

    #[test]
    fn test_parse_cookie_rejects_empty_and_junk() {
        assert!(parse_cookie_content("   ").is_err());
        assert!(parse_cookie_content("[]").is_err());
        assert!(parse_cookie_content(r#"{"other":1}"#).is_err());
        assert!(parse_cookie_content("12345").is_err());
    }
}
