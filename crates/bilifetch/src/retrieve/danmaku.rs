//! Danmaku (subtitle track) retrieval
//!
//! The track endpoint is keyed by cid, not bvid. When the caller has no cid
//! we resolve one from the video's view record; a video whose record carries
//! no cid is an explicit error rather than a guess.

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::DanmakuTrack;
use tracing::debug;

pub(crate) async fn fetch(
    transport: &Transport,
    bvid: &str,
    cid: Option<u64>,
) -> Result<DanmakuTrack> {
    let cid = match cid {
        Some(cid) => cid,
        None => {
            let view = super::video::view(transport, bvid).await?;
            let cid = view.first_cid().ok_or(Error::MissingCid)?;
            debug!(bvid, cid, "resolved cid from view record");
            cid
        }
    };

    let url = format!("{}/x/v1/dm/list.so?oid={}", transport.api_base, cid);
    let xml = transport.fetch_text(&url).await?;

    Ok(DanmakuTrack {
        bvid: bvid.to_string(),
        cid,
        xml,
    })
}
