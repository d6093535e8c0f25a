//! Applies the result of an authorization to a guild member and reports it
//! to the guild's log channels.

use usos_auth_proto::v1::UsosUser;

use crate::filter::FilterOutcome;
use crate::guild::GuildSettings;
use crate::platform::{ChatPlatform, PlatformError};
use crate::prelude::*;

pub struct RoleGranter<'a, P: ChatPlatform + ?Sized> {
    platform: &'a P,
    guild: &'a GuildId,
    settings: &'a GuildSettings,
}

impl<'a, P: ChatPlatform + ?Sized> RoleGranter<'a, P> {
    pub fn new(platform: &'a P, guild: &'a GuildId, settings: &'a GuildSettings) -> Self {
        RoleGranter {
            platform,
            guild,
            settings,
        }
    }

    fn role(&self) -> Result<&'a RoleId, OperationError> {
        self.settings
            .authorize_role
            .as_ref()
            .ok_or_else(|| OperationError::RoleNotSet(self.guild.clone()))
    }

    #[instrument(level = "debug", skip_all, fields(guild = %self.guild, %user))]
    pub async fn grant(
        &self,
        user: &UserId,
        profile: &Profile,
        outcome: FilterOutcome,
    ) -> Result<(), OperationError> {
        let role = self.role()?;

        self.platform
            .add_member_role(self.guild, user, role)
            .await
            .map_err(|e| match e {
                PlatformError::NotFound => OperationError::RoleNotFound {
                    role: role.clone(),
                    guild: self.guild.clone(),
                },
                e => e.into(),
            })?;

        security_access!(
            usos_id = %profile.user.id,
            %role,
            ?outcome,
            "granted authorization role"
        );

        let line = match outcome {
            FilterOutcome::Matched(id) => format!(
                "<@{}> authorized as {} (filter {})",
                user,
                describe(&profile.user),
                id
            ),
            _ => format!("<@{}> authorized as {}", user, describe(&profile.user)),
        };
        self.log(&line).await;
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(guild = %self.guild, %user))]
    pub async fn deny(&self, user: &UserId, profile: &Profile) {
        security_denied!(usos_id = %profile.user.id, "profile matched no admission filter");
        self.log(&format!(
            "<@{}> ({}) was filtered out",
            user,
            describe(&profile.user)
        ))
        .await;
    }

    /// Remove the authorization role. A member who never had it is not an
    /// error.
    #[instrument(level = "debug", skip_all, fields(guild = %self.guild, %user))]
    pub async fn revoke(&self, user: &UserId) -> Result<(), OperationError> {
        let role = self.role()?;

        match self.platform.remove_member_role(self.guild, user, role).await {
            Ok(()) => {
                security_info!(%role, "revoked authorization role");
                self.log(&format!("<@{}> authorization revoked", user)).await;
                Ok(())
            }
            Err(PlatformError::NotFound) => {
                debug!(%role, "member does not hold the role");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn log(&self, line: &str) {
        for channel in self.settings.log_channels.iter() {
            if let Err(e) = self.platform.send_channel_message(channel, line).await {
                admin_warn!(%channel, ?e, "unable to write to log channel");
            }
        }
    }
}

fn describe(user: &UsosUser) -> String {
    format!("{} [usos {}]", user.display_name(), user.id)
}
