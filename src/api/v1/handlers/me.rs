use axum::Json;

use crate::api::v1::dto::principal::PrincipalResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        subject: ctx.subject().unwrap_or_default().to_string(),
        roles: ctx.roles().map(str::to_string).collect(),
    })
}
