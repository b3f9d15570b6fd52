/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::middleware::auth::AuthPipeline;
use crate::services::auth::{TokenCodec, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub pipeline: Arc<AuthPipeline>,
}

impl AppState {
    pub fn new(codec: Arc<TokenCodec>, issuer: Arc<TokenIssuer>) -> Self {
        let pipeline = Arc::new(AuthPipeline::new(codec));
        Self { issuer, pipeline }
    }
}
