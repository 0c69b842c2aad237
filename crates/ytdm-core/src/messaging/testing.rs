//! In-memory `ChatPort` fake for unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{GuildId, RoleId, UserId},
    messaging::{
        port::ChatPort,
        types::{PresenceEntry, VideoEmbed},
    },
    Error, Result,
};

#[derive(Default)]
pub struct MockChat {
    pub guilds: Vec<GuildId>,
    /// `(guild, role)` -> members; a missing key means the guild lacks the role.
    pub members: HashMap<(u64, u64), Vec<UserId>>,
    /// Users whose DMs are closed.
    pub failing: HashSet<u64>,
    /// Simulate a guild-level member fetch failure.
    pub fail_member_fetch: bool,
    /// `(recipient, content, had_embed)` per delivered DM.
    pub sent: Mutex<Vec<(UserId, String, bool)>>,
    pub presences: Mutex<Vec<PresenceEntry>>,
}

#[async_trait]
impl ChatPort for MockChat {
    async fn joined_guilds(&self) -> Result<Vec<GuildId>> {
        Ok(self.guilds.clone())
    }

    async fn role_members(&self, guild: GuildId, role: RoleId) -> Result<Option<Vec<UserId>>> {
        if self.fail_member_fetch {
            return Err(Error::Chat("member fetch failed".to_string()));
        }
        Ok(self.members.get(&(guild.0, role.0)).cloned())
    }

    async fn send_direct(
        &self,
        user: UserId,
        content: &str,
        embed: Option<&VideoEmbed>,
    ) -> Result<()> {
        if self.failing.contains(&user.0) {
            return Err(Error::Chat("cannot send messages to this user".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((user, content.to_string(), embed.is_some()));
        Ok(())
    }

    async fn set_presence(&self, entry: &PresenceEntry) -> Result<()> {
        self.presences.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
