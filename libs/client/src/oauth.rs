//! OAuth 1.0a (RFC 5849) request signing and the three legged token exchange
//! USOS uses for delegated access.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;
use usos_auth_proto::constants::uri::{
    OAUTH_ACCESS_TOKEN, OAUTH_AUTHORIZE, OAUTH_REQUEST_TOKEN,
};
use usos_auth_proto::constants::{OAUTH_CALLBACK_OOB, OAUTH_SIGNATURE_METHOD, OAUTH_VERSION};

use crate::{ClientError, UsosClient};

const NONCE_LEN: usize = 32;

#[derive(Clone, Serialize, Deserialize)]
pub struct ConsumerCredentials {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// An unauthorised token. The user must visit `authorization_url` and come
/// back with the verifier before it can be exchanged.
#[derive(Clone, Serialize, Deserialize)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
    pub authorization_url: Url,
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestToken")
            .field("token", &self.token)
            .field("authorization_url", &self.authorization_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

fn encode(s: &str) -> String {
    // urlencoding leaves exactly the rfc3986 unreserved set alone.
    urlencoding::encode(s).into_owned()
}

fn base_string_uri(url: &Url) -> String {
    let mut base = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    // port() is None when it is the scheme default, which must be omitted.
    if let Some(port) = url.port() {
        base.push_str(&format!(":{}", port));
    }
    base.push_str(url.path());
    base
}

/// Build the signature base string of RFC 5849 3.4.1. Query parameters of
/// `url` take part in the signature alongside `oauth_params`.
pub fn signature_base_string(method: &str, url: &Url, oauth_params: &[(&str, String)]) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    params.sort();

    let normalised = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_string_uri(url)),
        encode(&normalised)
    )
}

fn hmac_sha1(base: &str, consumer_secret: &str, token_secret: Option<&str>) -> Result<String, ClientError> {
    let key = format!(
        "{}&{}",
        encode(consumer_secret),
        encode(token_secret.unwrap_or_default())
    );

    let key = PKey::hmac(key.as_bytes()).map_err(|e| ClientError::Signing(format!("{:?}", e)))?;
    let mut signer = Signer::new(MessageDigest::sha1(), &key)
        .map_err(|e| ClientError::Signing(format!("{:?}", e)))?;
    signer
        .update(base.as_bytes())
        .map_err(|e| ClientError::Signing(format!("{:?}", e)))?;
    let digest = signer
        .sign_to_vec()
        .map_err(|e| ClientError::Signing(format!("{:?}", e)))?;

    Ok(general_purpose::STANDARD.encode(digest))
}

/// Produces the `Authorization` header for a single request.
pub struct RequestSigner<'a> {
    consumer: &'a ConsumerCredentials,
    token: Option<(&'a str, &'a str)>,
    callback: Option<&'a str>,
    verifier: Option<&'a str>,
}

impl<'a> RequestSigner<'a> {
    pub fn new(consumer: &'a ConsumerCredentials) -> Self {
        RequestSigner {
            consumer,
            token: None,
            callback: None,
            verifier: None,
        }
    }

    pub fn token(self, token: &'a str, secret: &'a str) -> Self {
        RequestSigner {
            token: Some((token, secret)),
            ..self
        }
    }

    pub fn callback(self, callback: &'a str) -> Self {
        RequestSigner {
            callback: Some(callback),
            ..self
        }
    }

    pub fn verifier(self, verifier: &'a str) -> Self {
        RequestSigner {
            verifier: Some(verifier),
            ..self
        }
    }

    pub fn authorization(&self, method: &str, url: &Url) -> Result<String, ClientError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        self.authorization_at(method, url, &nonce, timestamp)
    }

    /// As [Self::authorization] with a caller chosen nonce and timestamp.
    pub fn authorization_at(
        &self,
        method: &str,
        url: &Url,
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, ClientError> {
        let mut oauth_params = self.protocol_params(nonce, timestamp);
        let base = signature_base_string(method, url, &oauth_params);
        trace!(%base, "signature base string");

        let signature = hmac_sha1(&base, &self.consumer.secret, self.token.map(|(_, s)| s))?;
        oauth_params.push(("oauth_signature", signature));
        oauth_params.sort();

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", header))
    }

    fn protocol_params(&self, nonce: &str, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("oauth_consumer_key", self.consumer.key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", OAUTH_SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_version", OAUTH_VERSION.to_string()),
        ];
        if let Some((token, _)) = self.token {
            params.push(("oauth_token", token.to_string()));
        }
        if let Some(callback) = self.callback {
            params.push(("oauth_callback", callback.to_string()));
        }
        if let Some(verifier) = self.verifier {
            params.push(("oauth_verifier", verifier.to_string()));
        }
        params
    }
}

fn take_param(params: &mut BTreeMap<String, String>, name: &str) -> Result<String, ClientError> {
    params.remove(name).ok_or_else(|| {
        error!(?name, "oauth response missing parameter");
        ClientError::InvalidResponse(format!("missing {}", name))
    })
}

impl UsosClient {
    pub fn oauth_authorize_url(&self, token: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(OAUTH_AUTHORIZE)?;
        url.query_pairs_mut().append_pair("oauth_token", token);
        Ok(url)
    }

    /// First leg. Obtain a request token for the configured scopes.
    #[instrument(level = "debug", skip_all)]
    pub async fn oauth_request_token(&self) -> Result<RequestToken, ClientError> {
        let mut dest = self.endpoint(OAUTH_REQUEST_TOKEN)?;
        if !self.scopes.is_empty() {
            dest.query_pairs_mut()
                .append_pair("scopes", &self.scopes.join("|"));
        }

        let signer = RequestSigner::new(&self.consumer).callback(OAUTH_CALLBACK_OOB);
        let mut params = self.perform_oauth_token_request(dest, &signer).await?;

        let token = take_param(&mut params, "oauth_token")?;
        let secret = take_param(&mut params, "oauth_token_secret")?;
        let authorization_url = self.oauth_authorize_url(&token)?;

        debug!(%token, "obtained request token");
        Ok(RequestToken {
            token,
            secret,
            authorization_url,
        })
    }

    /// Last leg. Exchange an authorised request token and its verifier
    /// (the pin USOS shows the user) for an access token.
    #[instrument(level = "debug", skip_all)]
    pub async fn oauth_access_token(
        &self,
        token: &str,
        secret: &str,
        verifier: &str,
    ) -> Result<AccessToken, ClientError> {
        let dest = self.endpoint(OAUTH_ACCESS_TOKEN)?;

        let signer = RequestSigner::new(&self.consumer)
            .token(token, secret)
            .verifier(verifier);
        let mut params = self.perform_oauth_token_request(dest, &signer).await?;

        Ok(AccessToken {
            token: take_param(&mut params, "oauth_token")?,
            secret: take_param(&mut params, "oauth_token_secret")?,
        })
    }
}
