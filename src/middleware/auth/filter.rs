//! Bearer token → AuthContext.
//!
//! Runs before the gate on every routed request. It never rejects anything: a missing, garbled,
//! forged or expired token simply leaves the request `Unauthenticated`, so public endpoints
//! (login) stay reachable whatever the client sends. Turning that into 401/403 is the gate's job.

use axum::http::{HeaderMap, header};
use tracing::debug;

use crate::api::v1::extractors::AuthContext;
use crate::services::auth::TokenCodec;

pub const BEARER_PREFIX: &str = "Bearer ";

pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> AuthContext {
    let Some(token) = bearer_token(headers) else {
        return AuthContext::Unauthenticated;
    };

    match codec.decode(token) {
        Ok(claims) => {
            let (subject, roles) = claims.into_parts();
            AuthContext::Authenticated { subject, roles }
        }
        Err(err) => {
            // Specific kind goes to logs only; callers just see an anonymous request.
            debug!(reason = err.reason(), "access token rejected");
            AuthContext::Unauthenticated
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}
