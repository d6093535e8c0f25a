use serde::Serialize;
use std::fmt;

use usos_auth_proto::constants::DEFAULT_USOS_ADDRESS;
use usos_authd_lib::config::BotConfig;

use crate::common::CliError;
use crate::UsosAuthParser;

#[derive(Debug, Serialize)]
pub struct GuildSummary {
    pub id: String,
    pub authorize_role: Option<String>,
    pub log_channels: usize,
    pub filters: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub log_level: String,
    pub usos_uri: String,
    pub consumer_configured: bool,
    pub session_ttl: Option<u64>,
    pub reaper_interval: u64,
    pub auth_reaction: String,
    pub guilds: Vec<GuildSummary>,
}

impl From<&BotConfig> for ConfigSummary {
    fn from(config: &BotConfig) -> Self {
        let ac = config.authorizer_config();
        ConfigSummary {
            log_level: config.log_level.to_string(),
            usos_uri: config
                .usos
                .uri
                .clone()
                .unwrap_or_else(|| DEFAULT_USOS_ADDRESS.to_string()),
            consumer_configured: config.usos.consumer_key.is_some()
                && config.usos.consumer_secret.is_some(),
            session_ttl: ac.session_ttl.map(|d| d.as_secs()),
            reaper_interval: config.reaper_interval().as_secs(),
            auth_reaction: ac.auth_reaction,
            guilds: config
                .guilds
                .iter()
                .map(|g| GuildSummary {
                    id: g.id.to_string(),
                    authorize_role: g.authorize_role.as_ref().map(|r| r.to_string()),
                    log_channels: g.log_channels.len(),
                    filters: g.filters.iter().map(|f| f.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for ConfigSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "log level: {}", self.log_level)?;
        writeln!(f, "usos: {}", self.usos_uri)?;
        if !self.consumer_configured {
            writeln!(f, "    warning: consumer key or secret is not set")?;
        }
        match self.session_ttl {
            Some(ttl) => writeln!(f, "session ttl: {}s", ttl)?,
            None => writeln!(f, "session ttl: never expires")?,
        }
        writeln!(f, "reaper interval: {}s", self.reaper_interval)?;
        writeln!(f, "auth reaction: {}", self.auth_reaction)?;
        for g in self.guilds.iter() {
            writeln!(f, "guild {}", g.id)?;
            match &g.authorize_role {
                Some(role) => writeln!(f, "    role: {}", role)?,
                None => writeln!(f, "    role: unset")?,
            }
            writeln!(f, "    log channels: {}", g.log_channels)?;
            for (idx, filter) in g.filters.iter().enumerate() {
                writeln!(f, "    filter {}: {}", idx + 1, filter)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn exec_config(opt: &UsosAuthParser) -> Result<(), CliError> {
    let config = opt.bot_config()?;
    // Catches what parsing alone does not, such as a channel listed twice.
    config.guild_store().map_err(CliError::Operation)?;
    opt.output_mode.print_message(ConfigSummary::from(&config));
    Ok(())
}
