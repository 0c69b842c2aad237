//! YouTube upload-feed adapter (Atom over HTTP).
//!
//! Implements the core `FeedSource` port against the public
//! `videos.xml` endpoint. Fetching uses reqwest, parsing feed-rs; the
//! poller only ever sees the newest entry.

use async_trait::async_trait;
use feed_rs::parser;

use ytdm_core::{
    errors::Error,
    feed::{FeedEntry, FeedSource},
    Result,
};

#[derive(Clone, Debug)]
pub struct YouTubeFeed {
    url: String,
    http: reqwest::Client,
}

impl YouTubeFeed {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl FeedSource for YouTubeFeed {
    async fn latest(&self) -> Result<Option<FeedEntry>> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Feed(format!("feed request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::Feed(format!(
                "feed fetch failed: {}",
                resp.status()
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Feed(format!("feed body error: {e}")))?;

        newest_entry(&body)
    }
}

/// Extract the newest entry from an Atom document.
fn newest_entry(xml: &[u8]) -> Result<Option<FeedEntry>> {
    let feed = parser::parse(xml).map_err(|e| Error::Feed(format!("feed parse error: {e}")))?;

    let Some(entry) = feed.entries.into_iter().next() else {
        return Ok(None);
    };

    // YouTube Atom entry ids look like `yt:video:<id>`.
    let video_id = entry
        .id
        .strip_prefix("yt:video:")
        .unwrap_or(&entry.id)
        .to_string();

    let url = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .ok_or_else(|| Error::Feed("feed entry has no link".to_string()))?;

    let title = entry.title.map(|t| t.content).unwrap_or_default();

    Ok(Some(FeedEntry {
        video_id,
        url,
        title,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <id>yt:channel:UCtest</id>
  <title>Test Channel</title>
  <entry>
    <id>yt:video:abc12345</id>
    <yt:videoId>abc12345</yt:videoId>
    <title>Newest upload</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc12345"/>
  </entry>
  <entry>
    <id>yt:video:older000</id>
    <yt:videoId>older000</yt:videoId>
    <title>Older upload</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=older000"/>
  </entry>
</feed>"#;

    const EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>yt:channel:UCtest</id>
  <title>Test Channel</title>
</feed>"#;

    #[test]
    fn picks_the_first_entry_and_strips_the_id_prefix() {
        let entry = newest_entry(SAMPLE.as_bytes()).unwrap().unwrap();
        assert_eq!(entry.video_id, "abc12345");
        assert_eq!(entry.url, "https://www.youtube.com/watch?v=abc12345");
        assert_eq!(entry.title, "Newest upload");
    }

    #[test]
    fn empty_feed_yields_none() {
        assert!(newest_entry(EMPTY.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(newest_entry(b"not xml at all").is_err());
    }
}
