//! Per-content-type retrieval paths
//!
//! Each submodule pairs the network side (driven through
//! [`crate::transport::Transport`]) with pure parse functions that take raw
//! HTML or JSON, so the parsing can be unit-tested without a server.

pub(crate) mod article;
pub(crate) mod comments;
pub(crate) mod danmaku;
pub(crate) mod search;
pub(crate) mod video;
