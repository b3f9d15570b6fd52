/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (request id / trace / limits)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware::http::{self, HttpLimits};
use crate::services::auth::{InMemoryCredentialStore, SigningKey, TokenCodec, TokenIssuer};
use crate::services::clock::{Clock, SystemClock};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,token_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing (stderr can be hidden depending on the launcher).
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting token-gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = http::apply(router(state), HttpLimits::from(&config));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Build process-level services once and inject them into the shared application state.
pub fn build_state(config: &Config) -> Result<AppState> {
    let key = match &config.jwt_secret {
        Some(secret) => SigningKey::from_secret(secret)?,
        None => {
            tracing::warn!("JWT_SECRET not set; using a random signing key for this process");
            SigningKey::generate()?
        }
    };

    let store = InMemoryCredentialStore::new(config.users.iter().cloned());
    if store.is_empty() {
        tracing::warn!("AUTH_USERS is empty; every login will be rejected");
    } else {
        tracing::info!(users = store.len(), "loaded credential store");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = Arc::new(TokenCodec::new(&key, clock));
    let issuer = Arc::new(TokenIssuer::new(
        Arc::new(store),
        codec.clone(),
        config.access_token_ttl_seconds,
    ));

    Ok(AppState::new(codec, issuer))
}

/// Routes without the HTTP-level layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state)
}
