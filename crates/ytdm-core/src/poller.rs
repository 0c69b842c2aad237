//! Poll-dedupe-fanout pipeline: fetch the feed, detect a new upload,
//! deliver to subscribers, then advance the watermark.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    fanout::{self, FanoutReport},
    feed::{thumbnail_url, FeedSource},
    messaging::{port::ChatPort, types::VideoEmbed},
    presence::StatusState,
    store, Result,
};

/// Embed accent color for upload alerts.
const EMBED_COLOR: u32 = 0xFF0000;

/// Last-notified video id, persisted across restarts. An absent or empty
/// id means everything counts as new, so the very first run notifies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(rename = "lastVideoId", default)]
    pub last_video_id: String,
}

pub struct Poller {
    cfg: Arc<Config>,
    feed: Arc<dyn FeedSource>,
    chat: Arc<dyn ChatPort>,
    status: Arc<Mutex<StatusState>>,
}

impl Poller {
    pub fn new(
        cfg: Arc<Config>,
        feed: Arc<dyn FeedSource>,
        chat: Arc<dyn ChatPort>,
        status: Arc<Mutex<StatusState>>,
    ) -> Self {
        Self {
            cfg,
            feed,
            chat,
            status,
        }
    }

    /// One poll cycle. Returns the fanout report when a new upload was
    /// detected, `None` on an empty feed or an already-seen id.
    pub async fn poll(&self) -> Result<Option<FanoutReport>> {
        let Some(entry) = self.feed.latest().await? else {
            return Ok(None);
        };

        let last: Watermark = store::read_json(&self.cfg.last_video_file, Watermark::default())?;
        if last.last_video_id == entry.video_id {
            return Ok(None);
        }

        {
            let mut status = self.status.lock().await;
            status.set_latest(&entry.title, &entry.url);
        }

        let embed = VideoEmbed {
            title: entry.title.clone(),
            color: EMBED_COLOR,
            image_url: thumbnail_url(&entry.video_id),
            timestamp: Utc::now(),
        };

        // Deliver before persisting: a crash in between re-detects the
        // same video on the next tick and sends again (at-least-once).
        let report = fanout::notify(
            self.chat.as_ref(),
            self.cfg.alert_role_id,
            &self.cfg.stopped_users_file,
            &entry.url,
            &embed,
        )
        .await?;

        store::write_json(
            &self.cfg.last_video_file,
            &Watermark {
                last_video_id: entry.video_id,
            },
        )?;

        println!(
            "[POLL] New video alert sent ({} delivered, {} failed, {} opted out)",
            report.delivered, report.failed, report.skipped
        );

        Ok(Some(report))
    }

    /// Poll once immediately, then on every interval tick until cancelled.
    /// Tick failures are logged and swallowed; the next tick is the retry.
    pub async fn run(&self, cancel: CancellationToken) {
        if let Err(e) = self.poll().await {
            eprintln!("[POLL] Feed poll failed: {e}");
        }
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.cfg.poll_interval) => {
                    if let Err(e) = self.poll().await {
                        eprintln!("[POLL] Feed poll failed: {e}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{GuildId, RoleId, UserId},
        feed::{self, FeedEntry},
        messaging::testing::MockChat,
        presence::{DisplayState, Rotation, TITLE_MAX_LEN},
    };
    use async_trait::async_trait;
    use std::{fs, path::PathBuf, time::Duration};

    struct MockFeed {
        entry: Option<FeedEntry>,
    }

    #[async_trait]
    impl FeedSource for MockFeed {
        async fn latest(&self) -> Result<Option<FeedEntry>> {
            Ok(self.entry.clone())
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/ytdm-poll-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn test_config(dir: &PathBuf) -> Arc<Config> {
        Arc::new(Config {
            discord_token: "test-token".to_string(),
            alert_role_id: RoleId(7),
            owner_id: UserId(1),
            youtube_channel_id: "UCtest".to_string(),
            channel_url: "https://www.youtube.com/@chan".to_string(),
            feed_url: feed::feed_url("UCtest"),
            last_video_file: dir.join("last_video.json"),
            stopped_users_file: dir.join("stopped_users.json"),
            poll_interval: Duration::from_secs(300),
            rotate_interval: Duration::from_secs(7),
        })
    }

    fn status_for(cfg: &Config) -> Arc<Mutex<StatusState>> {
        let display = DisplayState::new(&cfg.channel_url);
        Arc::new(Mutex::new(StatusState {
            rotation: Rotation::from_display(&display),
            display,
        }))
    }

    fn entry(id: &str, title: &str) -> FeedEntry {
        FeedEntry {
            video_id: id.to_string(),
            url: format!("https://www.youtube.com/watch?v={id}"),
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn seen_watermark_is_a_noop() {
        let dir = scratch_dir("noop");
        let cfg = test_config(&dir);
        store::write_json(
            &cfg.last_video_file,
            &Watermark {
                last_video_id: "abc".to_string(),
            },
        )
        .unwrap();
        let before = fs::read_to_string(&cfg.last_video_file).unwrap();

        let mut chat = MockChat::default();
        chat.guilds = vec![GuildId(1)];
        chat.members.insert((1, 7), vec![UserId(10)]);
        let chat = Arc::new(chat);

        let poller = Poller::new(
            cfg.clone(),
            Arc::new(MockFeed {
                entry: Some(entry("abc", "Already seen")),
            }),
            chat.clone(),
            status_for(&cfg),
        );

        let report = poller.poll().await.unwrap();
        assert!(report.is_none());
        assert!(chat.sent.lock().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&cfg.last_video_file).unwrap(), before);
    }

    #[tokio::test]
    async fn new_upload_fans_out_then_advances_watermark() {
        let dir = scratch_dir("new");
        let cfg = test_config(&dir);
        store::write_json(
            &cfg.last_video_file,
            &Watermark {
                last_video_id: "abc".to_string(),
            },
        )
        .unwrap();
        fs::write(&cfg.stopped_users_file, r#"["11"]"#).unwrap();

        let mut chat = MockChat::default();
        chat.guilds = vec![GuildId(1)];
        chat.members.insert((1, 7), vec![UserId(10), UserId(11)]);
        let chat = Arc::new(chat);

        let status = status_for(&cfg);
        let long_title = format!("Brand new upload {}", "y".repeat(80));
        let poller = Poller::new(
            cfg.clone(),
            Arc::new(MockFeed {
                entry: Some(entry("xyz", &long_title)),
            }),
            chat.clone(),
            status.clone(),
        );

        let report = poller.poll().await.unwrap().unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, UserId(10));
        assert!(sent[0].1.contains("https://www.youtube.com/watch?v=xyz"));
        assert!(sent[0].2, "upload DM carries the embed");
        drop(sent);

        let after: Watermark =
            serde_json::from_str(&fs::read_to_string(&cfg.last_video_file).unwrap()).unwrap();
        assert_eq!(after.last_video_id, "xyz");

        let st = status.lock().await;
        assert_eq!(st.display.latest_title.chars().count(), TITLE_MAX_LEN);
        assert_eq!(st.display.latest_url, "https://www.youtube.com/watch?v=xyz");
    }

    #[tokio::test]
    async fn first_run_with_empty_watermark_notifies() {
        let dir = scratch_dir("first");
        let cfg = test_config(&dir);

        let mut chat = MockChat::default();
        chat.guilds = vec![GuildId(1)];
        chat.members.insert((1, 7), vec![UserId(10)]);
        let chat = Arc::new(chat);

        let poller = Poller::new(
            cfg.clone(),
            Arc::new(MockFeed {
                entry: Some(entry("abc", "First ever")),
            }),
            chat.clone(),
            status_for(&cfg),
        );

        let report = poller.poll().await.unwrap().unwrap();
        assert_eq!(report.delivered, 1);

        let after: Watermark =
            serde_json::from_str(&fs::read_to_string(&cfg.last_video_file).unwrap()).unwrap();
        assert_eq!(after.last_video_id, "abc");
    }

    #[tokio::test]
    async fn member_fetch_failure_leaves_watermark_untouched() {
        let dir = scratch_dir("fetchfail");
        let cfg = test_config(&dir);
        store::write_json(
            &cfg.last_video_file,
            &Watermark {
                last_video_id: "abc".to_string(),
            },
        )
        .unwrap();

        let mut chat = MockChat::default();
        chat.guilds = vec![GuildId(1)];
        chat.fail_member_fetch = true;
        let chat = Arc::new(chat);

        let poller = Poller::new(
            cfg.clone(),
            Arc::new(MockFeed {
                entry: Some(entry("xyz", "New upload")),
            }),
            chat,
            status_for(&cfg),
        );

        assert!(poller.poll().await.is_err());

        let after: Watermark =
            serde_json::from_str(&fs::read_to_string(&cfg.last_video_file).unwrap()).unwrap();
        assert_eq!(after.last_video_id, "abc", "redelivery happens next tick");
    }

    #[tokio::test]
    async fn empty_feed_is_silent() {
        let dir = scratch_dir("empty");
        let cfg = test_config(&dir);

        let poller = Poller::new(
            cfg.clone(),
            Arc::new(MockFeed { entry: None }),
            Arc::new(MockChat::default()),
            status_for(&cfg),
        );

        let report = poller.poll().await.unwrap();
        assert!(report.is_none());
        assert!(!cfg.last_video_file.exists());
    }
}
