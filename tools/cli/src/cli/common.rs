use std::fmt;

use usos_auth_client::{ClientError, UsosClient, UsosClientBuilder};
use usos_auth_proto::constants::DEFAULT_CLIENT_CONFIG_PATH_HOME;
use usos_authd_lib::config::{BotConfig, ConfigError};

use crate::UsosAuthParser;

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Client(ClientError),
    Operation(usos_auth_proto::OperationError),
    Input(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Client(e) => write!(f, "{}", e),
            CliError::Operation(e) => write!(f, "{}", e),
            CliError::Input(e) => write!(f, "unable to read input - {}", e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Client(e)
    }
}

impl UsosAuthParser {
    /// The bot configuration, required by commands that look at guilds.
    pub fn bot_config(&self) -> Result<BotConfig, CliError> {
        BotConfig::load(&self.config).map_err(CliError::from)
    }

    /// Build the usos client. Options are layered, later wins: the per user
    /// client config, the `[usos]` table of the bot config when it exists,
    /// then the command line.
    pub fn to_client(&self) -> Result<UsosClient, CliError> {
        let home_config: String = shellexpand::tilde(DEFAULT_CLIENT_CONFIG_PATH_HOME).into_owned();

        let client_builder = UsosClientBuilder::new()
            .read_options_from_optional_config(&home_config)
            .map_err(|e| {
                error!("Failed to parse config ({:?}) -- {:?}", home_config, e);
                e
            })?;

        let client_builder = if self.config.exists() {
            let config = self.bot_config()?;
            client_builder.apply_config_options(config.usos)
        } else {
            debug!("{:?} does not exist, skipping", self.config);
            client_builder
        };

        let client_builder = match &self.addr {
            Some(a) => client_builder.address(a.to_string()),
            None => client_builder,
        };

        let client_builder = match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) => client_builder.consumer(key.clone(), secret.clone()),
            (None, None) => client_builder,
            _ => {
                warn!("--consumer-key and --consumer-secret must be given together, ignoring");
                client_builder
            }
        };

        debug!("client builder state: {}", client_builder);
        client_builder.build().map_err(CliError::from)
    }
}
