/*
 * Responsibility
 * - v1 の URL 構造と、endpoint ごとの required roles を定義
 * - role 要件は route に付くデータ (Endpoint) として宣言し、pipeline が評価する
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{admin::admin, login::login, me::me};
use crate::middleware::auth::{Endpoint, RequiredRoles, pipeline};
use crate::state::AppState;

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::public("/login", post(login)),
        Endpoint::new(
            "/me",
            get(me),
            RequiredRoles::any_of([ROLE_USER, ROLE_ADMIN]),
        ),
        Endpoint::new("/admin", get(admin), RequiredRoles::role(ROLE_ADMIN)),
    ]
}

pub fn routes(state: &AppState) -> Router<AppState> {
    pipeline::mount(state.pipeline.clone(), endpoints())
}
