use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::AuthContext;

/// Handler で「認証済み」の AuthContext を受け取るための extractor
/// middleware が AuthContext を request.extensions() に insert 済みである前提
/// 見つからない・未認証の場合は 401 を返す
pub struct AuthCtxExtractor(pub AuthContext);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthContext>() {
            Some(ctx) if ctx.is_authenticated() => Ok(AuthCtxExtractor(ctx.clone())),
            _ => Err(AppError::Unauthorized),
        }
    }
}
