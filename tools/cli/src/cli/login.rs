use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use serde::Serialize;
use std::fmt;

use usos_auth_client::UsosClient;
use usos_auth_proto::v1::{GuildId, Profile};
use usos_authd_lib::filter::{evaluate, FilterOutcome};

use crate::common::CliError;
use crate::{CheckOpt, UsosAuthParser};

/// The out of band oauth flow, driven from a terminal.
async fn oob_login(client: &UsosClient) -> Result<Profile, CliError> {
    let request = client.oauth_request_token().await?;

    eprintln!("Sign in to USOS and grant access at:");
    eprintln!("    {}", request.authorization_url);

    let pin: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("PIN shown by USOS")
        .interact_text()
        .map_err(|e| CliError::Input(e.to_string()))?;

    let access = client
        .oauth_access_token(&request.token, &request.secret, pin.trim())
        .await?;
    let profile = client.usos_profile_get(&access).await?;
    Ok(profile)
}

pub(crate) async fn exec_login(opt: &UsosAuthParser) -> Result<(), CliError> {
    let client = opt.to_client()?;
    let profile = oob_login(&client).await?;
    opt.output_mode.print_message(profile);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub guild: GuildId,
    pub usos_id: String,
    pub admitted: bool,
    /// The (1 based) filter that admitted the user, if the guild has filters.
    pub filter: Option<usize>,
}

impl CheckResult {
    pub fn new(guild: GuildId, profile: &Profile, outcome: FilterOutcome) -> Self {
        CheckResult {
            guild,
            usos_id: profile.user.id.clone(),
            admitted: outcome.is_admitted(),
            filter: match outcome {
                FilterOutcome::Matched(id) => Some(id),
                _ => None,
            },
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.admitted, self.filter) {
            (true, Some(id)) => write!(
                f,
                "usos user {} is admitted to guild {} by filter {}",
                self.usos_id, self.guild, id
            ),
            (true, None) => write!(
                f,
                "usos user {} is admitted to guild {}, it has no filters",
                self.usos_id, self.guild
            ),
            (false, _) => write!(
                f,
                "usos user {} does not match any filter of guild {}",
                self.usos_id, self.guild
            ),
        }
    }
}

pub(crate) async fn exec_check(opt: &UsosAuthParser, copt: &CheckOpt) -> Result<(), CliError> {
    let config = opt.bot_config()?;
    let store = config.guild_store().map_err(CliError::Operation)?;
    let guild = GuildId::from(copt.guild.as_str());
    let filters = store.filters(&guild);
    debug!(%guild, filters = filters.len(), "loaded guild filters");

    let client = opt.to_client()?;
    let profile = oob_login(&client).await?;
    let outcome = evaluate(&filters, &profile);

    opt.output_mode
        .print_message(CheckResult::new(guild, &profile, outcome));
    Ok(())
}
