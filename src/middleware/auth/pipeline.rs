//! Ordered request pipeline: authenticate → authorize → handle.
//!
//! The order is a value built once at startup and checked up front, instead of something that
//! falls out of how layers happen to be stacked. Each route is declared as an `Endpoint` whose
//! `RequiredRoles` travel with it; `mount` wires every endpoint through the same pipeline.
//!
//! 例：
//! ```ignore
//! let pipeline = Arc::new(AuthPipeline::new(codec));
//! let v1 = pipeline::mount(pipeline, vec![
//!     Endpoint::public("/login", post(login)),
//!     Endpoint::new("/admin", get(admin), RequiredRoles::role("ADMIN")),
//! ]);
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use thiserror::Error;
use tracing::info;

use crate::api::v1::extractors::AuthContext;
use crate::error::AppError;
use crate::middleware::auth::filter;
use crate::middleware::auth::gate::{self, Decision, RequiredRoles};
use crate::services::auth::TokenCodec;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    Authorize,
    Handle,
}

pub const STANDARD_STAGES: [Stage; 3] = [Stage::Authenticate, Stage::Authorize, Stage::Handle];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pipeline is missing the {0:?} stage")]
    MissingStage(Stage),

    #[error("stage {0:?} appears more than once")]
    Duplicate(Stage),

    #[error("stage {stage:?} must run after {after:?}")]
    OutOfOrder { stage: Stage, after: Stage },

    #[error("the handler must be the last stage")]
    HandlerNotLast,
}

/// Result of running the pre-handler stages for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub context: AuthContext,
    pub decision: Decision,
}

#[derive(Debug)]
pub struct AuthPipeline {
    stages: Vec<Stage>,
    codec: Arc<TokenCodec>,
}

impl AuthPipeline {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            stages: STANDARD_STAGES.to_vec(),
            codec,
        }
    }

    pub fn with_stages(stages: Vec<Stage>, codec: Arc<TokenCodec>) -> Result<Self, PipelineError> {
        validate(&stages)?;
        Ok(Self { stages, codec })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every stage before `Handle`. Stops at the first denial.
    pub fn evaluate(&self, headers: &HeaderMap, required: &RequiredRoles) -> Evaluation {
        let mut context = AuthContext::Unauthenticated;

        for stage in &self.stages {
            match stage {
                Stage::Authenticate => context = filter::authenticate(headers, &self.codec),
                Stage::Authorize => {
                    if let Decision::Deny(denial) = gate::check(&context, required) {
                        return Evaluation {
                            context,
                            decision: Decision::Deny(denial),
                        };
                    }
                }
                Stage::Handle => break,
            }
        }

        Evaluation {
            context,
            decision: Decision::Allow,
        }
    }
}

fn validate(stages: &[Stage]) -> Result<(), PipelineError> {
    for stage in STANDARD_STAGES {
        match stages.iter().filter(|s| **s == stage).count() {
            0 => return Err(PipelineError::MissingStage(stage)),
            1 => {}
            _ => return Err(PipelineError::Duplicate(stage)),
        }
    }

    if stages.last() != Some(&Stage::Handle) {
        return Err(PipelineError::HandlerNotLast);
    }

    let position = |stage: Stage| stages.iter().position(|s| *s == stage);
    if position(Stage::Authorize) < position(Stage::Authenticate) {
        return Err(PipelineError::OutOfOrder {
            stage: Stage::Authorize,
            after: Stage::Authenticate,
        });
    }

    Ok(())
}

/// A route plus the roles it requires.
pub struct Endpoint {
    path: &'static str,
    route: MethodRouter<AppState>,
    required: RequiredRoles,
}

impl Endpoint {
    pub fn new(path: &'static str, route: MethodRouter<AppState>, required: RequiredRoles) -> Self {
        Self {
            path,
            route,
            required,
        }
    }

    pub fn public(path: &'static str, route: MethodRouter<AppState>) -> Self {
        Self::new(path, route, RequiredRoles::public())
    }
}

#[derive(Clone)]
struct EndpointGuard {
    pipeline: Arc<AuthPipeline>,
    required: Arc<RequiredRoles>,
}

pub fn mount(pipeline: Arc<AuthPipeline>, endpoints: Vec<Endpoint>) -> Router<AppState> {
    endpoints
        .into_iter()
        .fold(Router::new(), |router, endpoint| {
            let guard = EndpointGuard {
                pipeline: pipeline.clone(),
                required: Arc::new(endpoint.required),
            };
            let route = endpoint
                .route
                .route_layer(middleware::from_fn_with_state(guard, enforce));
            router.route(endpoint.path, route)
        })
}

async fn enforce(
    State(guard): State<EndpointGuard>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Evaluation { context, decision } = guard.pipeline.evaluate(req.headers(), &guard.required);

    match decision {
        Decision::Allow => {
            // middleware → extractor への受け渡し (request ごとに新しい context)
            req.extensions_mut().insert(context);
            Ok(next.run(req).await)
        }
        Decision::Deny(denial) => {
            info!(
                method = %req.method(),
                path = %original_uri.path(),
                sub = context.subject().unwrap_or("-"),
                ?denial,
                "request denied"
            );
            Err(denial.into())
        }
    }
}
