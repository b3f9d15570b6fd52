use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: u64,
}
