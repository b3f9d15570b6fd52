use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::services::auth::claims::{Claims, ClaimsError};
use crate::services::auth::codec::{TokenCodec, TokenError};
use crate::services::auth::credentials::{CredentialAuthenticator, CredentialError};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("bad credentials")]
    BadCredentials,

    #[error("credential store failure: {0}")]
    CredentialStore(String),

    #[error("could not build claims: {0}")]
    Claims(#[from] ClaimsError),

    #[error(transparent)]
    Encode(#[from] TokenError),
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Turns a username/password pair into a signed access token.
///
/// No session state is created; the token is the only record of the login.
#[derive(Clone)]
pub struct TokenIssuer {
    authenticator: Arc<dyn CredentialAuthenticator>,
    codec: Arc<TokenCodec>,
    ttl_seconds: u64,
}

impl TokenIssuer {
    pub fn new(
        authenticator: Arc<dyn CredentialAuthenticator>,
        codec: Arc<TokenCodec>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            authenticator,
            codec,
            ttl_seconds,
        }
    }

    pub async fn issue(&self, username: &str, password: &str) -> Result<IssuedToken, IssueError> {
        let principal = self
            .authenticator
            .authenticate(username, password)
            .await
            .map_err(|e| match e {
                CredentialError::BadCredentials => {
                    warn!(username = %username, "login rejected");
                    IssueError::BadCredentials
                }
                CredentialError::Unavailable(reason) => {
                    warn!(username = %username, error = %reason, "credential store failure");
                    IssueError::CredentialStore(reason)
                }
            })?;

        let now = self.codec.clock().now();
        let exp = now.saturating_add(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX));

        let claims = Claims::new(principal.subject, now, exp, principal.roles)?;
        let token = self.codec.encode(&claims)?;

        info!(
            sub = %claims.subject(),
            roles = claims.roles().len(),
            exp,
            "issued access token"
        );

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: self.ttl_seconds,
        })
    }
}
