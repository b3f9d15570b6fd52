//! Per-endpoint role check.
//!
//! `RequiredRoles` is plain data attached to a route. Any one matching role is enough
//! (`hasAnyRole` semantics); AND-composition is not supported.

use std::collections::BTreeSet;

use crate::api::v1::extractors::AuthContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No valid authentication on a protected endpoint.
    Unauthorized,
    /// Authenticated, but none of the required roles.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

/// Roles an endpoint accepts. Empty means public.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredRoles(BTreeSet<String>);

impl RequiredRoles {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn role(role: impl Into<String>) -> Self {
        Self(BTreeSet::from([role.into()]))
    }

    pub fn any_of<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn is_public(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

pub fn check(context: &AuthContext, required: &RequiredRoles) -> Decision {
    if required.is_public() {
        return Decision::Allow;
    }

    if !context.is_authenticated() {
        Decision::Deny(Denial::Unauthorized)
    } else if context.has_any_role(required.iter()) {
        Decision::Allow
    } else {
        Decision::Deny(Denial::Forbidden)
    }
}
