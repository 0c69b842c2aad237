//! Presence rotation: a small list of status strings cycled on a timer.

use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    messaging::{port::ChatPort, types::PresenceEntry},
};

/// Display cap for the latest-video title inside the rotation.
pub const TITLE_MAX_LEN: usize = 60;

pub fn truncate_title(title: &str) -> String {
    title.chars().take(TITLE_MAX_LEN).collect()
}

/// In-memory "latest video" view. Rebuilt on every successful poll,
/// lost on restart (re-derived from the next poll or these defaults).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayState {
    pub latest_title: String,
    pub latest_url: String,
}

impl DisplayState {
    pub fn new(channel_url: &str) -> Self {
        Self {
            latest_title: "YouTube Updates".to_string(),
            latest_url: channel_url.to_string(),
        }
    }
}

/// The rotation slots plus a circular cursor.
#[derive(Clone, Debug, Default)]
pub struct Rotation {
    entries: Vec<PresenceEntry>,
    cursor: usize,
}

impl Rotation {
    pub fn from_display(display: &DisplayState) -> Self {
        Self {
            entries: build_entries(display),
            cursor: 0,
        }
    }

    /// Regenerate the slots from the current display state. The cursor is
    /// kept and re-normalized at tick time, so a length change between
    /// ticks wraps instead of indexing out of range.
    pub fn rebuild(&mut self, display: &DisplayState) {
        self.entries = build_entries(display);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current slot, advancing circularly. Empty list is a no-op.
    pub fn tick(&mut self) -> Option<PresenceEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = self.cursor % self.entries.len();
        let entry = self.entries[idx].clone();
        self.cursor = (idx + 1) % self.entries.len();
        Some(entry)
    }
}

fn build_entries(display: &DisplayState) -> Vec<PresenceEntry> {
    vec![
        PresenceEntry::watching(display.latest_title.clone()),
        PresenceEntry::playing("YouTube DM Alerts"),
        PresenceEntry::watching("No API Key Needed"),
        PresenceEntry::playing("DM stop to unsubscribe"),
    ]
}

/// Mutable view state shared between the poller and the rotator.
/// One lock, taken briefly and never held across I/O.
pub struct StatusState {
    pub display: DisplayState,
    pub rotation: Rotation,
}

impl StatusState {
    pub fn new(cfg: &Config) -> Self {
        let display = DisplayState::new(&cfg.channel_url);
        let rotation = Rotation::from_display(&display);
        Self { display, rotation }
    }

    /// Record a newly detected upload and rebuild the rotation slots.
    pub fn set_latest(&mut self, title: &str, url: &str) {
        self.display.latest_title = truncate_title(title);
        self.display.latest_url = url.to_string();
        self.rotation.rebuild(&self.display);
    }
}

/// Applies the next rotation slot as the bot presence on every tick.
pub struct Rotator {
    chat: Arc<dyn ChatPort>,
    status: Arc<Mutex<StatusState>>,
    interval: Duration,
}

impl Rotator {
    pub fn new(chat: Arc<dyn ChatPort>, status: Arc<Mutex<StatusState>>, interval: Duration) -> Self {
        Self {
            chat,
            status,
            interval,
        }
    }

    pub async fn tick(&self) {
        let entry = {
            let mut status = self.status.lock().await;
            status.rotation.tick()
        };
        let Some(entry) = entry else {
            return;
        };

        if let Err(e) = self.chat.set_presence(&entry).await {
            eprintln!("[STATUS] Failed to set presence: {e}");
        }
    }

    /// Rotate once immediately, then on every interval tick until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        self.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => self.tick().await,
            }
        }
    }
}
