use async_trait::async_trait;

pub use usos_auth_client::{AccessToken, RequestToken};

use crate::prelude::*;

/// Errors that the IdentityProvider may return. These drive the authorizer
/// and should be carefully selected to match your expected errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdpError {
    /// Communication with the identity service failed or timed out.
    Transport(String),
    /// The identity service refused the verifier the user gave us. The
    /// request token is still valid, so the user may try again.
    WrongVerifier,
    /// The identity service answered with something we could not use.
    BadResponse(String),
}

impl From<IdpError> for OperationError {
    fn from(e: IdpError) -> Self {
        match e {
            IdpError::WrongVerifier => OperationError::WrongVerifier,
            IdpError::Transport(m) | IdpError::BadResponse(m) => OperationError::UnableToCall(m),
        }
    }
}

/// The three legged delegated authorization of a user, and reading their
/// enrollment once they have authorised us.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtain a request token the user must authorise.
    async fn begin(&self) -> Result<RequestToken, IdpError>;

    /// Exchange the authorised request token and the user supplied verifier.
    async fn complete(
        &self,
        request: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, IdpError>;

    async fn profile(&self, token: &AccessToken) -> Result<Profile, IdpError>;
}
