use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    domain::{RoleId, UserId},
    errors::Error,
    feed,
    Result,
};

/// The channel the bot watches when `YOUTUBE_CHANNEL_ID` is not set.
pub const DEFAULT_CHANNEL_ID: &str = "UC9exOhASNX9iN1GpLUiwLTQ";
/// Public channel page, used as the fallback "latest video" link.
pub const DEFAULT_CHANNEL_URL: &str = "https://www.youtube.com/@RuDyy_val";

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub alert_role_id: RoleId,
    pub owner_id: UserId,

    // YouTube
    pub youtube_channel_id: String,
    pub channel_url: String,
    pub feed_url: String,

    // Storage
    pub last_video_file: PathBuf,
    pub stopped_users_file: PathBuf,

    // Timers
    pub poll_interval: Duration,
    pub rotate_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let discord_token = env_str("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let alert_role_id = env_u64("ALERT_ROLE_ID")
            .filter(|id| *id != 0)
            .map(RoleId)
            .ok_or_else(|| {
                Error::Config("ALERT_ROLE_ID environment variable is required".to_string())
            })?;

        let owner_id = env_u64("OWNER_ID")
            .filter(|id| *id != 0)
            .map(UserId)
            .ok_or_else(|| {
                Error::Config("OWNER_ID environment variable is required".to_string())
            })?;

        // Watched channel
        let youtube_channel_id = env_str("YOUTUBE_CHANNEL_ID")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string());
        let channel_url = env_str("CHANNEL_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_CHANNEL_URL.to_string());
        let feed_url = feed::feed_url(&youtube_channel_id);

        // Storage paths
        let last_video_file =
            env_path("LAST_VIDEO_FILE").unwrap_or_else(|| PathBuf::from("./last_video.json"));
        let stopped_users_file =
            env_path("STOPPED_USERS_FILE").unwrap_or_else(|| PathBuf::from("./stopped_users.json"));

        // Timers
        let poll_interval = Duration::from_secs(env_u64("POLL_INTERVAL_SECS").unwrap_or(300));
        let rotate_interval = Duration::from_secs(env_u64("ROTATE_INTERVAL_SECS").unwrap_or(7));

        Ok(Self {
            discord_token,
            alert_role_id,
            owner_id,
            youtube_channel_id,
            channel_url,
            feed_url,
            last_video_file,
            stopped_users_file,
            poll_interval,
            rotate_interval,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
