use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("empty 'sub' claim")]
    EmptySubject,

    #[error("'exp' ({expires_at}) must be after 'iat' ({issued_at})")]
    ExpiryNotAfterIssue { issued_at: i64, expires_at: i64 },
}

/// Identity facts carried by an access token.
///
/// Only built by `TokenIssuer` at login or by `TokenCodec::decode` after the signature and
/// expiry have been checked. There is intentionally no `Deserialize` impl.
///
/// Wire names follow JWT registered claims: `sub`, `iat`, `exp`, plus `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
    roles: BTreeSet<String>,
}

impl Claims {
    pub fn new<I, R>(
        subject: impl Into<String>,
        issued_at: i64,
        expires_at: i64,
        roles: I,
    ) -> Result<Self, ClaimsError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(ClaimsError::EmptySubject);
        }
        if expires_at <= issued_at {
            return Err(ClaimsError::ExpiryNotAfterIssue {
                issued_at,
                expires_at,
            });
        }

        Ok(Self {
            subject,
            issued_at,
            expires_at,
            roles: roles.into_iter().map(Into::into).collect(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn into_parts(self) -> (String, BTreeSet<String>) {
        (self.subject, self.roles)
    }
}
