use serde::{Deserialize, Serialize};

use crate::v1::{ChannelId, GuildId, RoleId, UserId};

/* ===== errors ===== */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[serde(rename_all = "lowercase")]
pub enum OperationError {
    // Soft errors, the caller did something we can tell them about.
    #[error("user {0} has no authorization in progress")]
    NoPendingSession(UserId),
    #[error("the authorization of user {0} has expired, please start again")]
    SessionExpired(UserId),
    #[error("the verification code is not valid")]
    WrongVerifier,
    #[error("you do not meet the requirements of this server")]
    FilteredOut,
    #[error("no authorization role is set on server {0}")]
    RoleNotSet(GuildId),
    #[error("role {role} was not found on server {guild}")]
    RoleNotFound { role: RoleId, guild: GuildId },
    #[error("channel {channel} was not found on server {guild}")]
    ChannelNotFound { channel: ChannelId, guild: GuildId },
    #[error("channel {0} is already a log channel")]
    LogChannelAlreadyBound(ChannelId),
    #[error("channel {0} is not a log channel")]
    LogChannelNotBound(ChannelId),
    #[error("a filter needs at least one programme or course")]
    FilterEmpty,
    #[error("there is no filter with id {0}")]
    FilterNotFound(usize),
    // Hard errors, something outside of the caller's control failed.
    #[error("unable to call the usos api: {0}")]
    UnableToCall(String),
    #[error("chat platform failure: {0}")]
    Platform(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl OperationError {
    /// Whether this should be reported back to whoever triggered the
    /// operation. Anything else is only logged.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            OperationError::Platform(_) | OperationError::InvalidState(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing() {
        assert!(OperationError::WrongVerifier.is_user_facing());
        assert!(OperationError::UnableToCall("timeout".to_string()).is_user_facing());
        assert!(!OperationError::Platform("gateway closed".to_string()).is_user_facing());
    }

    #[test]
    fn test_display() {
        let e = OperationError::RoleNotFound {
            role: RoleId::from("1"),
            guild: GuildId::from("2"),
        };
        assert_eq!(e.to_string(), "role 1 was not found on server 2");
    }
}
