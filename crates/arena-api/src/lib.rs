//! arena-api — REST API for Agent Arena.
//!
//! Thin request/response adapters over the validator core and the
//! container runtime. No tournament logic lives here.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v0/agents` | List available agent images |
//! | POST | `/api/v0/pull` | Pull an agent image from the registry |
//! | GET | `/api/v0/running` | List running containers |
//! | POST | `/api/v0/validate` | Validate an agent image |
//! | GET | `/api/v0/image?image=...` | Inspect image metadata |
//! | POST | `/api/v0/images` | Register an image from a named source |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use bollard::Docker;

use arena_validator::Validator;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub docker: Docker,
    pub validator: Arc<Validator>,
}

/// Build the complete API router.
pub fn build_router(docker: Docker, validator: Arc<Validator>) -> Router {
    let state = ApiState { docker, validator };

    let api_routes = Router::new()
        .route("/agents", get(handlers::list_agents))
        .route("/pull", post(handlers::pull_image))
        .route("/running", get(handlers::list_running))
        .route("/validate", post(handlers::validate_agent))
        .route("/image", get(handlers::show_image_info))
        .route("/images", post(handlers::register_image))
        .with_state(state);

    Router::new().nest("/api/v0", api_routes)
}
