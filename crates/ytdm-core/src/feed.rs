//! Feed port: the newest entry of the watched channel's upload feed.

use async_trait::async_trait;

use crate::Result;

/// The newest entry of the channel feed, as far as the bot cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    pub video_id: String,
    pub url: String,
    pub title: String,
}

/// Port over the feed endpoint. The adapter owns fetching and parsing;
/// the poller only sees the newest entry (or `None` for an empty feed).
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn latest(&self) -> Result<Option<FeedEntry>>;
}

/// Public Atom endpoint for a channel's uploads.
pub fn feed_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/feeds/videos.xml?channel_id={channel_id}")
}

/// Highest-resolution thumbnail for a video id.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/maxresdefault.jpg")
}
