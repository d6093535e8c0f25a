//! The chat platform as seen by the authorization core. A concrete client
//! (gateway connection, rest calls) lives outside this crate and implements
//! [ChatPlatform].

use async_trait::async_trait;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The guild, channel, role, member or message does not exist (anymore).
    NotFound,
    /// The bot lacks the permission for this action.
    Forbidden,
    Transport(String),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::NotFound => f.write_str("not found"),
            PlatformError::Forbidden => f.write_str("missing permissions"),
            PlatformError::Transport(m) => write!(f, "transport - {}", m),
        }
    }
}

impl From<PlatformError> for OperationError {
    fn from(e: PlatformError) -> Self {
        OperationError::Platform(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_private_message(&self, user: &UserId, text: &str) -> Result<(), PlatformError>;

    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageId, PlatformError>;

    async fn add_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    async fn guild_name(&self, guild: &GuildId) -> Result<String, PlatformError>;

    async fn guild_roles(&self, guild: &GuildId) -> Result<Vec<RoleInfo>, PlatformError>;

    async fn guild_channels(&self, guild: &GuildId) -> Result<Vec<ChannelInfo>, PlatformError>;

    async fn add_member_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError>;

    async fn remove_member_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError>;
}
