use chrono::{DateTime, Utc};

/// Rich payload attached to every new-upload DM.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoEmbed {
    pub title: String,
    pub color: u32,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
}

/// Activity flavor shown next to a presence label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Watching,
    Playing,
}

/// One rotation slot: the label and how the platform renders it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceEntry {
    pub label: String,
    pub kind: ActivityKind,
}

impl PresenceEntry {
    pub fn watching(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ActivityKind::Watching,
        }
    }

    pub fn playing(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ActivityKind::Playing,
        }
    }
}
