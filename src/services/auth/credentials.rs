//! Username/password verification boundary.
//!
//! `TokenIssuer` only sees the `CredentialAuthenticator` trait; the bundled
//! `InMemoryCredentialStore` is seeded from configuration at startup.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Unknown user or wrong password. The two are never distinguished.
    #[error("bad credentials")]
    BadCredentials,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Principal returned by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub subject: String,
    pub roles: BTreeSet<String>,
}

#[async_trait]
pub trait CredentialAuthenticator: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedPrincipal, CredentialError>;
}

/// A user entry as it appears in configuration.
#[derive(Clone)]
pub struct UserSeed {
    pub username: String,
    pub password: String,
    pub roles: Vec<String>,
}

impl fmt::Debug for UserSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

struct StoredUser {
    password_digest: [u8; 32],
    roles: BTreeSet<String>,
}

/// Users held in memory with SHA-256 password digests.
pub struct InMemoryCredentialStore {
    users: HashMap<String, StoredUser>,
    // Compared against when the username is unknown so both paths do the same work.
    decoy_digest: [u8; 32],
}

impl InMemoryCredentialStore {
    pub fn new(seeds: impl IntoIterator<Item = UserSeed>) -> Self {
        let users = seeds
            .into_iter()
            .map(|seed| {
                let user = StoredUser {
                    password_digest: digest(&seed.password),
                    roles: seed.roles.into_iter().collect(),
                };
                (seed.username, user)
            })
            .collect();

        Self {
            users,
            decoy_digest: digest(""),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl CredentialAuthenticator for InMemoryCredentialStore {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedPrincipal, CredentialError> {
        let supplied = digest(password);

        match self.users.get(username) {
            Some(user) if bool::from(user.password_digest[..].ct_eq(&supplied[..])) => {
                Ok(AuthenticatedPrincipal {
                    subject: username.to_string(),
                    roles: user.roles.clone(),
                })
            }
            Some(_) => Err(CredentialError::BadCredentials),
            None => {
                let _ = self.decoy_digest[..].ct_eq(&supplied[..]);
                Err(CredentialError::BadCredentials)
            }
        }
    }
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}
