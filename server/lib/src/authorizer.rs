//! The authorization workflow, and the guild administration operations that
//! back the bot's chat commands.
//!
//! A user reacts to a prompt message, is sent the USOS authorization url in
//! a private message, and hands back the verifier USOS showed them. The
//! verifier is exchanged for an access token, their enrollment is read and
//! checked against the guild's admission filters, and the guild's
//! authorization role is granted on success.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::filter::{evaluate, FilterOutcome};
use crate::guild::{GuildConfigStore, GuildSnapshot};
use crate::granter::RoleGranter;
use crate::idprovider::interface::{IdentityProvider, IdpError};
use crate::platform::{ChannelInfo, ChatPlatform};
use crate::prelude::*;
use crate::session::SessionTracker;

#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    /// How long a user has to hand back their verifier.
    pub session_ttl: Option<Duration>,
    /// Default text of prompt messages.
    pub auth_prompt: String,
    /// The reaction placed under prompt messages.
    pub auth_reaction: String,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        AuthorizerConfig {
            session_ttl: None,
            auth_prompt: DEFAULT_AUTH_PROMPT.to_string(),
            auth_reaction: DEFAULT_AUTH_REACTION.to_string(),
        }
    }
}

pub struct Authorizer<P: ChatPlatform, I: IdentityProvider> {
    platform: Arc<P>,
    idp: Arc<I>,
    sessions: Mutex<SessionTracker>,
    guilds: RwLock<GuildConfigStore>,
    config: AuthorizerConfig,
}

impl<P: ChatPlatform, I: IdentityProvider> Authorizer<P, I> {
    pub fn new(
        platform: Arc<P>,
        idp: Arc<I>,
        guilds: GuildConfigStore,
        config: AuthorizerConfig,
    ) -> Self {
        Authorizer {
            platform,
            idp,
            sessions: Mutex::new(SessionTracker::new(config.session_ttl)),
            guilds: RwLock::new(guilds),
            config,
        }
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    async fn require_role(&self, guild: &GuildId) -> Result<RoleId, OperationError> {
        self.guilds
            .read()
            .await
            .authorize_role(guild)
            .ok_or_else(|| OperationError::RoleNotSet(guild.clone()))
    }

    async fn role_exists(&self, guild: &GuildId, role: &RoleId) -> Result<bool, OperationError> {
        let roles = self.platform.guild_roles(guild).await?;
        Ok(roles.iter().any(|r| &r.id == role))
    }

    async fn guild_display_name(&self, guild: &GuildId) -> String {
        match self.platform.guild_name(guild).await {
            Ok(name) => name,
            Err(e) => {
                debug!(%guild, ?e, "unable to resolve guild name");
                guild.to_string()
            }
        }
    }

    /* ===== authorization workflow ===== */

    /// Post a prompt message users react to, in `channel` of `guild`.
    #[instrument(level = "debug", skip(self, prompt))]
    pub async fn spawn_auth_message(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        prompt: Option<&str>,
    ) -> Result<MessageId, OperationError> {
        self.require_role(guild).await?;

        let channels = self.platform.guild_channels(guild).await?;
        if !channels.iter().any(|c| &c.id == channel) {
            return Err(OperationError::ChannelNotFound {
                channel: channel.clone(),
                guild: guild.clone(),
            });
        }

        let text = prompt.unwrap_or(self.config.auth_prompt.as_str());
        let message = self.platform.send_channel_message(channel, text).await?;

        // Registered before reacting, a posted prompt must never be ignored.
        self.guilds
            .write()
            .await
            .register_auth_message(guild, channel.clone(), message.clone());
        admin_info!(%guild, %channel, %message, "spawned auth message");

        if let Err(e) = self
            .platform
            .add_reaction(channel, &message, &self.config.auth_reaction)
            .await
        {
            admin_warn!(%message, ?e, "unable to add reaction to auth message");
        }
        Ok(message)
    }

    /// A user reacted to a message. Returns whether this started an
    /// authorization, reactions to anything but a prompt are ignored.
    #[instrument(level = "debug", skip(self, ct))]
    pub async fn handle_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        user: &UserId,
        ct: Duration,
    ) -> Result<bool, OperationError> {
        let guild = self.guilds.read().await.find_auth_message(channel, message);
        match guild {
            Some(guild) => {
                self.begin_authorization(&guild, user, ct).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(level = "debug", skip(self, ct))]
    pub async fn begin_authorization(
        &self,
        guild: &GuildId,
        user: &UserId,
        ct: Duration,
    ) -> Result<(), OperationError> {
        self.require_role(guild).await?;

        let request = self.idp.begin().await?;
        let url = request.authorization_url.clone();
        let token = request.token.clone();

        let replaced = self
            .sessions
            .lock()
            .await
            .begin(user.clone(), guild.clone(), request, ct);
        if replaced.is_some() {
            debug!("user restarted authorization");
        }

        let name = self.guild_display_name(guild).await;
        let text = format!(
            "To get authorized on {}, sign in to USOS at {} and grant access. \
             Then send me the code you were shown with `verify -c <code>`.",
            name, url
        );

        if let Err(e) = self.platform.send_private_message(user, &text).await {
            admin_warn!(?e, "unable to send private message");
            // The user can never see this url, drop its session unless the
            // user already started another one in the meantime.
            if self
                .sessions
                .lock()
                .await
                .abort_if(user, &token)
                .is_none()
            {
                debug!("session was replaced while sending, keeping the newer one");
            }
            return Err(e.into());
        }

        security_info!(%guild, "authorization started");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, verifier, ct))]
    pub async fn finalize_authorization(
        &self,
        user: &UserId,
        verifier: &str,
        ct: Duration,
    ) -> Result<FilterOutcome, OperationError> {
        let session = self.sessions.lock().await.take(user, ct)?;
        let guild = session.guild.clone();

        let exchanged = self.idp.complete(&session.request, verifier).await;
        let access = match exchanged {
            Ok(access) => access,
            Err(e) => {
                if matches!(e, IdpError::WrongVerifier | IdpError::Transport(_)) {
                    // The request token is still good, let the user retry.
                    self.sessions.lock().await.restore(session);
                }
                security_info!(%guild, ?e, "verifier exchange failed");
                return Err(e.into());
            }
        };

        let profile = self.idp.profile(&access).await?;
        let settings = self.guilds.read().await.get(&guild);
        let outcome = evaluate(&settings.filters, &profile);

        let granter = RoleGranter::new(self.platform.as_ref(), &guild, &settings);

        if !outcome.is_admitted() {
            granter.deny(user, &profile).await;
            if let Err(e) = granter.revoke(user).await {
                admin_warn!(?e, "unable to revoke role of filtered out user");
            }
            return Err(OperationError::FilteredOut);
        }

        let role = settings
            .authorize_role
            .clone()
            .ok_or_else(|| OperationError::RoleNotSet(guild.clone()))?;
        if !self.role_exists(&guild, &role).await? {
            admin_error!(%guild, %role, "authorization role no longer exists");
            return Err(OperationError::RoleNotFound { role, guild });
        }

        granter.grant(user, &profile, outcome).await?;

        let name = self.guild_display_name(&guild).await;
        let text = format!(
            "Thank you {}, you are now authorized on {}.",
            profile.user.first_name, name
        );
        if let Err(e) = self.platform.send_private_message(user, &text).await {
            admin_warn!(?e, "unable to send completion message");
        }

        Ok(outcome)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn abort_authorization(&self, user: &UserId) -> Result<(), OperationError> {
        let session = self.sessions.lock().await.abort(user)?;
        security_info!(guild = %session.guild, "authorization aborted");
        Ok(())
    }

    pub async fn revoke_authorization(
        &self,
        guild: &GuildId,
        user: &UserId,
    ) -> Result<(), OperationError> {
        let settings = self.guilds.read().await.get(guild);
        RoleGranter::new(self.platform.as_ref(), guild, &settings)
            .revoke(user)
            .await
    }

    /* ===== guild administration ===== */

    /// Returns the previously set role.
    #[instrument(level = "debug", skip(self))]
    pub async fn set_authorize_role(
        &self,
        guild: &GuildId,
        role: RoleId,
    ) -> Result<Option<RoleId>, OperationError> {
        if !self.role_exists(guild, &role).await? {
            return Err(OperationError::RoleNotFound {
                role,
                guild: guild.clone(),
            });
        }
        admin_info!(%guild, %role, "set authorization role");
        Ok(self.guilds.write().await.set_authorize_role(guild, role))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn add_log_channel(
        &self,
        guild: &GuildId,
        channel: ChannelId,
    ) -> Result<(), OperationError> {
        let channels = self.platform.guild_channels(guild).await?;
        if !channels.iter().any(|c| c.id == channel) {
            return Err(OperationError::ChannelNotFound {
                channel,
                guild: guild.clone(),
            });
        }
        self.guilds.write().await.add_log_channel(guild, channel)
    }

    pub async fn remove_log_channel(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<(), OperationError> {
        self.guilds.write().await.remove_log_channel(guild, channel)
    }

    /// The bound log channels that still exist in the guild.
    pub async fn list_log_channels(
        &self,
        guild: &GuildId,
    ) -> Result<Vec<ChannelInfo>, OperationError> {
        let bound = self.guilds.read().await.log_channels(guild);
        let channels = self.platform.guild_channels(guild).await?;
        Ok(channels
            .into_iter()
            .filter(|c| bound.contains(&c.id))
            .collect())
    }

    /// Returns the id the new filter is listed under.
    #[instrument(level = "debug", skip(self))]
    pub async fn add_filter(
        &self,
        guild: &GuildId,
        programmes: Vec<String>,
        courses: Vec<String>,
    ) -> Result<usize, OperationError> {
        let filter = AdmissionFilter::new(programmes, courses)?;
        let id = self.guilds.write().await.add_filter(guild, filter)?;
        admin_info!(%guild, id, "added admission filter");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn remove_filter(
        &self,
        guild: &GuildId,
        id: usize,
    ) -> Result<AdmissionFilter, OperationError> {
        let removed = self.guilds.write().await.remove_filter(guild, id)?;
        admin_info!(%guild, id, "removed admission filter");
        Ok(removed)
    }

    pub async fn list_filters(&self, guild: &GuildId) -> Vec<AdmissionFilter> {
        self.guilds.read().await.filters(guild)
    }

    /* ===== housekeeping ===== */

    pub async fn purge_expired_sessions(&self, ct: Duration) -> usize {
        self.sessions.lock().await.purge_expired(ct)
    }

    pub async fn pending_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn export_guilds(&self) -> GuildSnapshot {
        self.guilds.read().await.export()
    }

    pub async fn import_guilds(&self, snapshot: GuildSnapshot) {
        self.guilds.write().await.import(snapshot)
    }
}
