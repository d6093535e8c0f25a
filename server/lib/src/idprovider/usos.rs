use async_trait::async_trait;
use usos_auth_client::{ClientError, StatusCode, UsosClient};

use super::interface::{AccessToken, IdentityProvider, IdpError, RequestToken};
use crate::prelude::*;

pub struct UsosProvider {
    client: UsosClient,
}

impl UsosProvider {
    pub fn new(client: UsosClient) -> Self {
        UsosProvider { client }
    }
}

fn map_client_error(e: ClientError) -> IdpError {
    match e {
        ClientError::Transport(err) => IdpError::Transport(err.to_string()),
        other => IdpError::BadResponse(other.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for UsosProvider {
    async fn begin(&self) -> Result<RequestToken, IdpError> {
        self.client.oauth_request_token().await.map_err(|e| {
            admin_error!(?e, "unable to obtain request token from usos");
            map_client_error(e)
        })
    }

    async fn complete(
        &self,
        request: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, IdpError> {
        match self
            .client
            .oauth_access_token(&request.token, &request.secret, verifier.trim())
            .await
        {
            Ok(token) => Ok(token),
            // usos answers a bad pin with 401, a malformed one with 400.
            Err(ClientError::Http(StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST, body)) => {
                debug!(%body, "usos rejected verifier");
                Err(IdpError::WrongVerifier)
            }
            Err(e) => {
                admin_error!(?e, "unable to exchange access token with usos");
                Err(map_client_error(e))
            }
        }
    }

    async fn profile(&self, token: &AccessToken) -> Result<Profile, IdpError> {
        self.client.usos_profile_get(token).await.map_err(|e| {
            admin_error!(?e, "unable to fetch usos profile");
            map_client_error(e)
        })
    }
}
