/*
 * Responsibility
 * - 認証済み principal を返す response DTO (/me, /admin)
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub subject: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub subject: String,
    pub area: &'static str,
}
