use axum::Json;

use crate::api::v1::dto::principal::AdminResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn admin(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<AdminResponse> {
    tracing::info!(sub = ctx.subject().unwrap_or_default(), "admin area accessed");

    Json(AdminResponse {
        subject: ctx.subject().unwrap_or_default().to_string(),
        area: "admin",
    })
}
