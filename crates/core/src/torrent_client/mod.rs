//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait for listing and removing
//! torrents, with a qBittorrent Web API implementation.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
