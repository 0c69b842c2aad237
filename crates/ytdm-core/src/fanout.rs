//! Role-membership fanout with per-recipient failure isolation.

use std::path::Path;

use crate::{
    domain::RoleId,
    messaging::{port::ChatPort, types::VideoEmbed},
    store, Result,
};

/// Counted outcome of one fanout cycle. Recipient failures are policy:
/// never retried and never surfaced to users, but counted so callers and
/// tests can observe them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// DM every member of `role` in every joined guild, skipping users who
/// opted out. Guild-level lookup failures propagate so the caller can
/// rerun the whole cycle on its next tick.
pub async fn notify(
    chat: &dyn ChatPort,
    role: RoleId,
    stopped_file: &Path,
    video_url: &str,
    embed: &VideoEmbed,
) -> Result<FanoutReport> {
    // Re-read on every fanout; the DM command handler may have changed it.
    let stopped: Vec<String> = store::read_json(stopped_file, Vec::new())?;

    let mut report = FanoutReport::default();
    for guild in chat.joined_guilds().await? {
        let Some(members) = chat.role_members(guild, role).await? else {
            continue; // guild has no alert role
        };

        for user in members {
            if stopped.iter().any(|id| *id == user.as_store_key()) {
                report.skipped += 1;
                continue;
            }

            report.attempted += 1;
            let content = format!("<@{}>\n{video_url}", user.0);
            match chat.send_direct(user, &content, Some(embed)).await {
                Ok(()) => report.delivered += 1,
                Err(_) => report.failed += 1, // DMs closed
            }
        }
    }

    Ok(report)
}
