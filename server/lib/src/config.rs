//! The bot configuration as read from `bot.toml`.

use serde::Deserialize;
use sketching::LogLevel;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use usos_auth_client::{UsosClientBuilder, UsosClientConfig};

use crate::authorizer::AuthorizerConfig;
use crate::guild::GuildConfigStore;
use crate::prelude::*;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "unable to read config - {}", e),
            ConfigError::Parse(e) => write!(f, "unable to parse config - {}", e),
            ConfigError::Invalid(e) => write!(f, "invalid config - {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Initial settings of one guild.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GuildConfig {
    pub id: GuildId,
    pub authorize_role: Option<RoleId>,
    #[serde(default)]
    pub log_channels: Vec<ChannelId>,
    #[serde(default, rename = "filter")]
    pub filters: Vec<AdmissionFilter>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// One of info, debug, trace. Defaults to info.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Seconds a user has to hand back their verifier. Unset means forever.
    pub session_ttl: Option<u64>,
    pub auth_prompt: Option<String>,
    pub auth_reaction: Option<String>,
    /// Seconds between sweeps for expired sessions.
    pub reaper_interval: Option<u64>,
    #[serde(default)]
    pub usos: UsosClientConfig,
    #[serde(default, rename = "guild")]
    pub guilds: Vec<GuildConfig>,
}

impl BotConfig {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let mut f = File::open(config_path.as_ref()).map_err(|e| {
            error!(path = ?config_path.as_ref(), ?e, "unable to open config file");
            ConfigError::Io(e)
        })?;

        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(|e| {
            error!(?e, "unable to read config contents");
            ConfigError::Io(e)
        })?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = toml::from_str(contents).map_err(|e| {
            error!(?e, "unable to parse config");
            ConfigError::Parse(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for guild in self.guilds.iter() {
            if !seen.insert(&guild.id) {
                return Err(ConfigError::Invalid(format!(
                    "guild {} is configured more than once",
                    guild.id
                )));
            }
            if let Some(idx) = guild.filters.iter().position(|f| f.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "filter {} of guild {} has no programmes or courses",
                    idx + 1,
                    guild.id
                )));
            }
        }
        if self.session_ttl == Some(0) {
            return Err(ConfigError::Invalid(
                "session_ttl must be at least one second, leave it unset for no expiry"
                    .to_string(),
            ));
        }
        if self.reaper_interval == Some(0) {
            return Err(ConfigError::Invalid(
                "reaper_interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn authorizer_config(&self) -> AuthorizerConfig {
        let defaults = AuthorizerConfig::default();
        AuthorizerConfig {
            session_ttl: self.session_ttl.map(Duration::from_secs),
            auth_prompt: self.auth_prompt.clone().unwrap_or(defaults.auth_prompt),
            auth_reaction: self.auth_reaction.clone().unwrap_or(defaults.auth_reaction),
        }
    }

    pub fn reaper_interval(&self) -> Duration {
        self.reaper_interval
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REAPER_INTERVAL)
    }

    /// The guild settings this config starts the bot with.
    pub fn guild_store(&self) -> Result<GuildConfigStore, OperationError> {
        let mut store = GuildConfigStore::new();
        for guild in self.guilds.iter() {
            if let Some(role) = &guild.authorize_role {
                store.set_authorize_role(&guild.id, role.clone());
            }
            for channel in guild.log_channels.iter() {
                store.add_log_channel(&guild.id, channel.clone())?;
            }
            for filter in guild.filters.iter() {
                store.add_filter(&guild.id, filter.clone())?;
            }
        }
        Ok(store)
    }

    pub fn client_builder(&self) -> UsosClientBuilder {
        UsosClientBuilder::new().apply_config_options(self.usos.clone())
    }
}
