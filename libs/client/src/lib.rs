#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
extern crate tracing;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use usos_auth_proto::constants::{DEFAULT_SCOPES, DEFAULT_USOS_ADDRESS};

mod oauth;
mod user;

pub use crate::oauth::{
    signature_base_string, AccessToken, ConsumerCredentials, RequestSigner, RequestToken,
};

#[derive(Debug)]
pub enum ClientError {
    /// USOS answered, but not with a 200. Carries the response body.
    Http(reqwest::StatusCode, String),
    Transport(reqwest::Error),
    JsonDecode(reqwest::Error),
    /// A form encoded oauth response was missing a parameter.
    InvalidResponse(String),
    Signing(String),
    ConfigParseIssue(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(status, body) => write!(f, "http {} - {}", status, body),
            ClientError::Transport(e) => write!(f, "transport error - {}", e),
            ClientError::JsonDecode(e) => write!(f, "unable to decode json - {}", e),
            ClientError::InvalidResponse(m) => write!(f, "invalid response - {}", m),
            ClientError::Signing(m) => write!(f, "unable to sign request - {}", m),
            ClientError::ConfigParseIssue(m) => write!(f, "configuration issue - {}", m),
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct UsosClientConfig {
    pub uri: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct UsosClientBuilder {
    address: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    scopes: Vec<String>,
    connect_timeout: Option<u64>,
    use_system_proxies: bool,
}

impl Default for UsosClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UsosClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.address {
            Some(value) => writeln!(f, "address: {}", value)?,
            None => writeln!(f, "address: unset")?,
        }
        match &self.consumer_key {
            Some(value) => writeln!(f, "consumer_key: {}", value)?,
            None => writeln!(f, "consumer_key: unset")?,
        }
        // Never print the secret.
        writeln!(f, "consumer_secret: {}", self.consumer_secret.is_some())?;
        writeln!(f, "scopes: {}", self.scopes.join("|"))?;
        match self.connect_timeout {
            Some(value) => writeln!(f, "connect_timeout: {}", value)?,
            None => writeln!(f, "connect_timeout: unset")?,
        }
        writeln!(f, "use_system_proxies: {}", self.use_system_proxies)
    }
}

impl UsosClientBuilder {
    pub fn new() -> Self {
        UsosClientBuilder {
            address: None,
            consumer_key: None,
            consumer_secret: None,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            connect_timeout: None,
            use_system_proxies: true,
        }
    }

    pub fn apply_config_options(self, ucc: UsosClientConfig) -> Self {
        let address = match ucc.uri {
            Some(uri) => Some(uri),
            None => {
                debug!("No URI in config supplied to apply_config_options");
                self.address
            }
        };

        UsosClientBuilder {
            address,
            consumer_key: ucc.consumer_key.or(self.consumer_key),
            consumer_secret: ucc.consumer_secret.or(self.consumer_secret),
            scopes: ucc.scopes.unwrap_or(self.scopes),
            connect_timeout: ucc.connect_timeout.or(self.connect_timeout),
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn read_options_from_optional_config<P: AsRef<Path> + std::fmt::Debug>(
        self,
        config_path: P,
    ) -> Result<Self, ClientError> {
        debug!("Attempting to load configuration from {:#?}", &config_path);

        if !config_path.as_ref().exists() {
            debug!("{:?} does not exist", config_path);
            return Ok(self);
        };

        let mut f = match File::open(&config_path) {
            Ok(f) => {
                debug!("Successfully opened configuration file {:#?}", &config_path);
                f
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::NotFound => {
                        debug!(
                            "Configuration file {:#?} not found, skipping.",
                            &config_path
                        );
                    }
                    ErrorKind::PermissionDenied => {
                        warn!(
                            "Permission denied loading configuration file {:#?}, skipping.",
                            &config_path
                        );
                    }
                    _ => {
                        debug!(
                            "Unable to open config file {:#?} [{:?}], skipping ...",
                            &config_path, e
                        );
                    }
                };
                return Ok(self);
            }
        };

        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        let config: UsosClientConfig = toml::from_str(contents.as_str()).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        Ok(self.apply_config_options(config))
    }

    pub fn address(self, address: String) -> Self {
        UsosClientBuilder {
            address: Some(address),
            ..self
        }
    }

    pub fn consumer(self, key: String, secret: String) -> Self {
        UsosClientBuilder {
            consumer_key: Some(key),
            consumer_secret: Some(secret),
            ..self
        }
    }

    pub fn scopes(self, scopes: Vec<String>) -> Self {
        UsosClientBuilder { scopes, ..self }
    }

    pub fn connect_timeout(self, secs: u64) -> Self {
        UsosClientBuilder {
            connect_timeout: Some(secs),
            ..self
        }
    }

    pub fn no_proxy(self) -> Self {
        UsosClientBuilder {
            use_system_proxies: false,
            ..self
        }
    }

    fn display_warnings(&self, address: &str) {
        if !address.starts_with("https://") {
            warn!("Address does not start with 'https://' - this may allow network interception of oauth tokens!");
        }
    }

    /// Generates a useragent header based on the package name and version
    pub fn user_agent() -> &'static str {
        static APP_USER_AGENT: &str =
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
        APP_USER_AGENT
    }

    /// Build the client ready for usage.
    pub fn build(self) -> Result<UsosClient, ClientError> {
        let mut address = self
            .address
            .clone()
            .unwrap_or_else(|| DEFAULT_USOS_ADDRESS.to_string());
        // Endpoints are joined onto this, so it must look like a directory.
        if !address.ends_with('/') {
            address.push('/');
        }

        let addr = Url::parse(&address).map_err(|e| {
            error!(?e, %address, "Unable to parse usos address");
            ClientError::ConfigParseIssue(format!("invalid uri {} - {:?}", address, e))
        })?;

        let consumer = match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) => ConsumerCredentials {
                key: key.clone(),
                secret: secret.clone(),
            },
            _ => {
                error!("Configuration options 'consumer_key' and 'consumer_secret' are required to talk to usos");
                return Err(ClientError::ConfigParseIssue(
                    "consumer_key and consumer_secret must be set".to_string(),
                ));
            }
        };

        self.display_warnings(address.as_str());

        let client_builder = reqwest::Client::builder().user_agent(UsosClientBuilder::user_agent());

        let client_builder = match self.use_system_proxies {
            true => client_builder,
            false => client_builder.no_proxy(),
        };

        let client_builder = match &self.connect_timeout {
            Some(secs) => client_builder
                .connect_timeout(Duration::from_secs(*secs))
                .timeout(Duration::from_secs(*secs)),
            None => client_builder,
        };

        let client = client_builder.build().map_err(ClientError::Transport)?;

        Ok(UsosClient {
            client,
            addr,
            consumer,
            scopes: self.scopes,
        })
    }
}

#[derive(Debug)]
pub struct UsosClient {
    pub(crate) client: reqwest::Client,
    pub(crate) addr: Url,
    pub(crate) consumer: ConsumerCredentials,
    pub(crate) scopes: Vec<String>,
}

impl UsosClient {
    pub fn get_url(&self) -> &Url {
        &self.addr
    }

    pub fn get_scopes(&self) -> &[String] {
        self.scopes.as_slice()
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.addr
            .join(path)
            .map_err(|e| ClientError::ConfigParseIssue(format!("invalid endpoint {} - {:?}", path, e)))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        match response.status() {
            reqwest::StatusCode::OK => Ok(response),
            unexpect => {
                let body = response.text().await.unwrap_or_default();
                debug!(status = %unexpect, %body, "usos returned an error");
                Err(ClientError::Http(unexpect, body))
            }
        }
    }

    /// The token endpoints answer with a form encoded body rather than json.
    pub(crate) async fn perform_oauth_token_request(
        &self,
        dest: Url,
        signer: &RequestSigner<'_>,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        let auth_header = signer.authorization("POST", &dest)?;

        let response = self
            .client
            .post(dest)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let response = Self::check_status(response).await?;

        let body = response.text().await.map_err(ClientError::Transport)?;

        Ok(url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect())
    }

    pub(crate) async fn perform_signed_get_request<T: DeserializeOwned>(
        &self,
        dest: Url,
        token: &AccessToken,
    ) -> Result<T, ClientError> {
        let auth_header = RequestSigner::new(&self.consumer)
            .token(&token.token, &token.secret)
            .authorization("GET", &dest)?;

        let response = self
            .client
            .get(dest)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let response = Self::check_status(response).await?;

        response.json().await.map_err(ClientError::JsonDecode)
    }
}
