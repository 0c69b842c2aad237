use async_trait::async_trait;

use crate::{
    domain::{GuildId, RoleId, UserId},
    messaging::types::{PresenceEntry, VideoEmbed},
    Result,
};

/// Narrow port over the chat platform.
///
/// Discord is the first implementation; the fanout and the rotator only
/// depend on this surface, so tests drive them with in-memory fakes.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Guilds the bot is currently a member of.
    async fn joined_guilds(&self) -> Result<Vec<GuildId>>;

    /// Members of `guild` holding `role`, or `Ok(None)` when the guild
    /// does not define the role.
    ///
    /// Implementations must fetch the member list fresh on every call;
    /// gateway caches are not reliable for role membership.
    async fn role_members(&self, guild: GuildId, role: RoleId) -> Result<Option<Vec<UserId>>>;

    /// Send a private message, with an optional rich embed attached.
    async fn send_direct(
        &self,
        user: UserId,
        content: &str,
        embed: Option<&VideoEmbed>,
    ) -> Result<()>;

    /// Set the bot account's visible presence.
    async fn set_presence(&self, entry: &PresenceEntry) -> Result<()>;
}
