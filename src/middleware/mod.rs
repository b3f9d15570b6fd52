/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: filter / gate / pipeline, http: request id / trace / limits
 */
pub mod auth;
pub mod http;
