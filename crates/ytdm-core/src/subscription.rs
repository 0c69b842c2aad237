//! DM opt-out commands: `stop`, `/stop`, `/start`.

use std::path::Path;

use crate::{domain::UserId, store, Result};

/// Reply sent back for a recognized command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandReply {
    Unsubscribed,
    Resubscribed,
}

impl CommandReply {
    pub fn text(&self) -> &'static str {
        match self {
            CommandReply::Unsubscribed => "❌ You are unsubscribed.",
            CommandReply::Resubscribed => "✅ You are subscribed again.",
        }
    }
}

/// Handle one inbound private text message. Anything that is not an
/// exact `stop` / `/stop` / `/start` (case-insensitive, trimmed) gets no
/// reply and touches nothing on disk.
pub fn handle_direct_text(
    stopped_file: &Path,
    user: UserId,
    text: &str,
) -> Result<Option<CommandReply>> {
    let text = text.trim().to_lowercase();

    match text.as_str() {
        "stop" | "/stop" => {
            let mut stopped: Vec<String> = store::read_json(stopped_file, Vec::new())?;
            let key = user.as_store_key();
            if !stopped.contains(&key) {
                stopped.push(key);
                store::write_json(stopped_file, &stopped)?;
            }
            Ok(Some(CommandReply::Unsubscribed))
        }
        "/start" => {
            let mut stopped: Vec<String> = store::read_json(stopped_file, Vec::new())?;
            let key = user.as_store_key();
            stopped.retain(|id| *id != key);
            store::write_json(stopped_file, &stopped)?;
            Ok(Some(CommandReply::Resubscribed))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    fn scratch(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/ytdm-sub-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    fn stored(path: &Path) -> Vec<String> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn stop_adds_user_once() {
        let path = scratch("stop-once.json");
        let user = UserId(42);

        let reply = handle_direct_text(&path, user, "stop").unwrap();
        assert_eq!(reply, Some(CommandReply::Unsubscribed));
        assert_eq!(stored(&path), vec!["42".to_string()]);

        // Idempotent: a second stop leaves the set unchanged.
        let reply = handle_direct_text(&path, user, "/stop").unwrap();
        assert_eq!(reply, Some(CommandReply::Unsubscribed));
        assert_eq!(stored(&path), vec!["42".to_string()]);
    }

    #[test]
    fn start_removes_user() {
        let path = scratch("start.json");
        let user = UserId(42);

        handle_direct_text(&path, user, "stop").unwrap();
        let reply = handle_direct_text(&path, user, "/start").unwrap();
        assert_eq!(reply, Some(CommandReply::Resubscribed));
        assert!(stored(&path).is_empty());
    }

    #[test]
    fn commands_are_normalized() {
        let path = scratch("normalized.json");

        let reply = handle_direct_text(&path, UserId(7), "  STOP  ").unwrap();
        assert_eq!(reply, Some(CommandReply::Unsubscribed));
        assert_eq!(stored(&path), vec!["7".to_string()]);
    }

    #[test]
    fn other_text_is_ignored() {
        let path = scratch("ignored.json");

        let reply = handle_direct_text(&path, UserId(7), "help").unwrap();
        assert_eq!(reply, None);
        assert!(!path.exists());
    }
}
