/*
 * Responsibility
 * - Bearer トークンの検証 (ヘッダ抽出 → 検証) と AuthContext の生成: filter
 * - endpoint ごとの role チェック: gate
 * - filter → gate → handler の順序を明示する pipeline
 */
pub mod filter;
pub mod gate;
pub mod pipeline;

pub use gate::{Decision, Denial, RequiredRoles};
pub use pipeline::{AuthPipeline, Endpoint, Stage};
