use clap::{Args, Subcommand};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// The CLI output mode, either text or json, falls back to text if you ask for something other than text/json
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

impl From<OutputMode> for clap::builder::OsStr {
    fn from(output_mode: OutputMode) -> Self {
        match output_mode {
            OutputMode::Text => "text".into(),
            OutputMode::Json => "json".into(),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;
    fn from_str(s: &str) -> Result<OutputMode, std::string::String> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputMode::Json),
            _ => Ok(OutputMode::Text),
        }
    }
}

impl OutputMode {
    pub fn print_message<T>(self, input: T)
    where
        T: serde::Serialize + fmt::Debug + fmt::Display,
    {
        match self {
            OutputMode::Json => {
                println!(
                    "{}",
                    serde_json::to_string(&input).unwrap_or(format!("{input:?}"))
                );
            }
            OutputMode::Text => {
                println!("{input}");
            }
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CheckOpt {
    /// The guild whose admission filters are evaluated
    #[clap(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub guild: String,
}

#[derive(Debug, Subcommand, Clone)]
#[clap(about = "USOS Auth Bot Tools")]
pub enum UsosAuthOpt {
    /// Sign in to USOS in this terminal and show what the bot would see
    Login,
    /// Sign in to USOS and check the result against a guild's admission filters
    Check(CheckOpt),
    /// Validate a bot configuration file and summarise it
    Config,
    /// Print the program version and exit
    Version,
}

#[derive(Debug, clap::Parser, Clone)]
#[clap(about = "USOS Auth Bot Tools", version)]
pub struct UsosAuthParser {
    #[clap(subcommand)]
    pub commands: UsosAuthOpt,

    /// Enable debugging of the usos-auth tool
    #[clap(short, long, env = "USOS_AUTH_DEBUG", global = true)]
    pub debug: bool,
    /// Path to the bot configuration file
    #[clap(
        short = 'c',
        long = "config",
        env = "USOS_AUTH_CONFIG",
        global = true,
        default_value = usos_auth_proto::constants::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,
    /// The URL of the USOS instance, overrides the configuration
    #[clap(short = 'H', long = "url", env = "USOS_AUTH_URL", global = true,
    value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub addr: Option<String>,
    /// The consumer key registered with USOS
    #[clap(long = "consumer-key", env = "USOS_AUTH_CONSUMER_KEY", global = true)]
    pub consumer_key: Option<String>,
    /// The consumer secret registered with USOS
    #[clap(
        long = "consumer-secret",
        env = "USOS_AUTH_CONSUMER_SECRET",
        global = true,
        hide_env_values = true
    )]
    pub consumer_secret: Option<String>,
    /// Output format, text or json
    #[clap(
        short = 'o',
        long = "output",
        env = "USOS_AUTH_OUTPUT",
        global = true,
        default_value = OutputMode::Text
    )]
    pub output_mode: OutputMode,
}
