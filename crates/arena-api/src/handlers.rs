//! REST API handlers.
//!
//! Each handler is a thin adapter: unwrap the request, call the docker
//! client or the validator, wrap the result as JSON.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bollard::container::ListContainersOptions;
use bollard::image::{CreateImageOptions, ListImagesOptions};
use futures::StreamExt;
use tracing::{error, info};

use arena_validator::{ValidationReport, Verdict};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Images ─────────────────────────────────────────────────────

#[derive(serde::Serialize)]
pub struct AgentImage {
    pub id: String,
    pub repo_tags: Vec<String>,
}

/// GET /api/v0/agents
pub async fn list_agents(State(state): State<ApiState>) -> impl IntoResponse {
    let options = ListImagesOptions::<String> {
        all: false,
        ..Default::default()
    };
    match state.docker.list_images(Some(options)).await {
        Ok(images) => {
            let agents: Vec<AgentImage> = images
                .into_iter()
                .map(|img| AgentImage {
                    id: img.id,
                    repo_tags: img.repo_tags,
                })
                .collect();
            ApiResponse::ok(agents).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct PullRequest {
    pub image: Option<String>,
}

/// POST /api/v0/pull
pub async fn pull_image(
    State(state): State<ApiState>,
    Json(req): Json<PullRequest>,
) -> impl IntoResponse {
    let Some(image) = req.image.filter(|s| !s.is_empty()) else {
        return error_response("`image` field is required", StatusCode::BAD_REQUEST)
            .into_response();
    };

    let options = CreateImageOptions {
        from_image: image.as_str(),
        tag: "latest",
        ..Default::default()
    };
    let mut stream = state.docker.create_image(Some(options), None, None);
    while let Some(progress) = stream.next().await {
        if let Err(e) = progress {
            error!(%image, error = %e, "image pull failed");
            return error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response();
        }
    }

    info!(%image, "image pulled");
    ApiResponse::ok(serde_json::json!({ "image": image, "status": "pulled" })).into_response()
}

#[derive(serde::Serialize)]
pub struct RunningContainer {
    pub id: Option<String>,
    pub image: Option<String>,
    pub state: Option<String>,
}

/// GET /api/v0/running
pub async fn list_running(State(state): State<ApiState>) -> impl IntoResponse {
    let options = ListContainersOptions::<String>::default();
    match state.docker.list_containers(Some(options)).await {
        Ok(containers) => {
            let running: Vec<RunningContainer> = containers
                .into_iter()
                .map(|c| RunningContainer {
                    id: c.id,
                    image: c.image,
                    state: c.state,
                })
                .collect();
            ApiResponse::ok(running).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct ImageQuery {
    pub image: Option<String>,
}

#[derive(serde::Serialize)]
pub struct ImageInfo {
    pub id: Option<String>,
    pub repo_tags: Vec<String>,
    pub exposed_ports: Vec<String>,
}

/// GET /api/v0/image?image=...
pub async fn show_image_info(
    State(state): State<ApiState>,
    Query(query): Query<ImageQuery>,
) -> impl IntoResponse {
    let Some(image) = query.image.filter(|s| !s.is_empty()) else {
        return error_response("`image` parameter is required", StatusCode::BAD_REQUEST)
            .into_response();
    };

    match state.docker.inspect_image(&image).await {
        Ok(inspect) => {
            let mut exposed_ports: Vec<String> = inspect
                .config
                .and_then(|c| c.exposed_ports)
                .map(|ports| ports.into_keys().collect())
                .unwrap_or_default();
            exposed_ports.sort();
            ApiResponse::ok(ImageInfo {
                id: inspect.id,
                repo_tags: inspect.repo_tags.unwrap_or_default(),
                exposed_ports,
            })
            .into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response(),
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(serde::Deserialize)]
pub struct ValidateRequest {
    pub image: Option<String>,
}

#[derive(serde::Serialize)]
pub struct ValidationResponse {
    pub image: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taunts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
}

fn validation_response(image: &str, report: ValidationReport) -> ValidationResponse {
    let teardown_error = report.teardown.map(|e| e.to_string());
    match report.verdict {
        Verdict::Validated { identity } => ValidationResponse {
            image: image.to_string(),
            valid: true,
            owner: Some(identity.owner),
            taunts: Some(identity.taunts),
            reason: None,
            teardown_error,
        },
        Verdict::Rejected { reason } => ValidationResponse {
            image: image.to_string(),
            valid: false,
            owner: None,
            taunts: None,
            reason: Some(reason.to_string()),
            teardown_error,
        },
    }
}

/// POST /api/v0/validate
pub async fn validate_agent(
    State(state): State<ApiState>,
    Json(req): Json<ValidateRequest>,
) -> impl IntoResponse {
    let Some(image) = req.image.filter(|s| !s.is_empty()) else {
        return error_response("`image` field is required", StatusCode::BAD_REQUEST)
            .into_response();
    };

    match state.validator.validate_image(&image).await {
        Ok(report) => ApiResponse::ok(validation_response(&image, report)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response(),
    }
}

// ── Registration ───────────────────────────────────────────────

#[derive(serde::Deserialize)]
pub struct RegisterRequest {
    pub image: Option<String>,
    pub source: Option<String>,
}

/// POST /api/v0/images
///
/// Registers an agent image from a named source. Only `dockerhub` is
/// supported; registration validates the image before accepting it.
pub async fn register_image(
    State(state): State<ApiState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let Some(image) = req.image.filter(|s| !s.is_empty()) else {
        return error_response("`image` field is required", StatusCode::BAD_REQUEST)
            .into_response();
    };

    match req.source.as_deref() {
        Some("dockerhub") => match state.validator.validate_image(&image).await {
            Ok(report) => {
                let response = validation_response(&image, report);
                if response.valid {
                    ApiResponse::ok(response).into_response()
                } else {
                    (StatusCode::BAD_REQUEST, ApiResponse::ok(response)).into_response()
                }
            }
            Err(e) => error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response(),
        },
        Some("github") => error_response(
            "GitHub repo support has not been implemented yet",
            StatusCode::NOT_IMPLEMENTED,
        )
        .into_response(),
        other => error_response(
            &format!("unrecognized image source: {}", other.unwrap_or("<missing>")),
            StatusCode::BAD_REQUEST,
        )
        .into_response(),
    }
}
