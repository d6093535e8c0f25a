//! Per guild settings. These are only held in memory, [GuildConfigStore::export]
//! and [GuildConfigStore::import] give the host something to persist.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::prelude::*;

/// A prompt message users react to in order to begin authorization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthMessage {
    pub channel: ChannelId,
    pub message: MessageId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    #[serde(default)]
    pub authorize_role: Option<RoleId>,
    #[serde(default)]
    pub log_channels: BTreeSet<ChannelId>,
    #[serde(default)]
    pub filters: Vec<AdmissionFilter>,
    #[serde(default)]
    pub auth_messages: BTreeSet<AuthMessage>,
}

pub type GuildSnapshot = BTreeMap<GuildId, GuildSettings>;

#[derive(Debug, Default)]
pub struct GuildConfigStore {
    guilds: BTreeMap<GuildId, GuildSettings>,
}

impl GuildConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The settings of `guild`, or defaults if it was never configured.
    pub fn get(&self, guild: &GuildId) -> GuildSettings {
        self.guilds.get(guild).cloned().unwrap_or_default()
    }

    fn entry(&mut self, guild: &GuildId) -> &mut GuildSettings {
        self.guilds.entry(guild.clone()).or_default()
    }

    /// Returns the previously set role, if any.
    pub fn set_authorize_role(&mut self, guild: &GuildId, role: RoleId) -> Option<RoleId> {
        self.entry(guild).authorize_role.replace(role)
    }

    pub fn authorize_role(&self, guild: &GuildId) -> Option<RoleId> {
        self.guilds
            .get(guild)
            .and_then(|gs| gs.authorize_role.clone())
    }

    pub fn add_log_channel(
        &mut self,
        guild: &GuildId,
        channel: ChannelId,
    ) -> Result<(), OperationError> {
        let settings = self.entry(guild);
        if settings.log_channels.contains(&channel) {
            return Err(OperationError::LogChannelAlreadyBound(channel));
        }
        settings.log_channels.insert(channel);
        Ok(())
    }

    pub fn remove_log_channel(
        &mut self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<(), OperationError> {
        let removed = self
            .guilds
            .get_mut(guild)
            .map(|gs| gs.log_channels.remove(channel));
        match removed {
            Some(true) => Ok(()),
            _ => Err(OperationError::LogChannelNotBound(channel.clone())),
        }
    }

    pub fn log_channels(&self, guild: &GuildId) -> Vec<ChannelId> {
        self.guilds
            .get(guild)
            .map(|gs| gs.log_channels.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the id (1 based) the new filter is listed under.
    pub fn add_filter(
        &mut self,
        guild: &GuildId,
        filter: AdmissionFilter,
    ) -> Result<usize, OperationError> {
        if filter.is_empty() {
            return Err(OperationError::FilterEmpty);
        }
        let settings = self.entry(guild);
        settings.filters.push(filter);
        Ok(settings.filters.len())
    }

    /// `id` is 1 based, as shown to administrators.
    pub fn remove_filter(
        &mut self,
        guild: &GuildId,
        id: usize,
    ) -> Result<AdmissionFilter, OperationError> {
        match self.guilds.get_mut(guild) {
            Some(settings) if id >= 1 && id <= settings.filters.len() => {
                Ok(settings.filters.remove(id - 1))
            }
            _ => Err(OperationError::FilterNotFound(id)),
        }
    }

    pub fn filters(&self, guild: &GuildId) -> Vec<AdmissionFilter> {
        self.guilds
            .get(guild)
            .map(|gs| gs.filters.clone())
            .unwrap_or_default()
    }

    pub fn register_auth_message(&mut self, guild: &GuildId, channel: ChannelId, message: MessageId) {
        self.entry(guild)
            .auth_messages
            .insert(AuthMessage { channel, message });
    }

    /// Which guild a prompt message belongs to, if it is one of ours.
    pub fn find_auth_message(&self, channel: &ChannelId, message: &MessageId) -> Option<GuildId> {
        let needle = AuthMessage {
            channel: channel.clone(),
            message: message.clone(),
        };
        self.guilds
            .iter()
            .find(|(_, gs)| gs.auth_messages.contains(&needle))
            .map(|(guild, _)| guild.clone())
    }

    pub fn export(&self) -> GuildSnapshot {
        self.guilds.clone()
    }

    /// Replace all settings with a previously exported snapshot.
    pub fn import(&mut self, snapshot: GuildSnapshot) {
        admin_info!(guilds = snapshot.len(), "importing guild settings");
        self.guilds = snapshot;
    }
}
