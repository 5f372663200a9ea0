use crate::reply;
use crate::state::ServiceState;
use appforge_artifact::CodeArtifact;
use appforge_core::{hydrate, AppStatus, AppSummary, NewApp, StoreError, WorkbenchError};
use appforge_generation::GenerationRequest;
use appforge_sandbox::SANDBOX_CSP_HEADER;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::{info, warn};
use uuid::Uuid;
use warp::http::header::{HeaderValue, CONTENT_SECURITY_POLICY};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

/// `POST /api/generate-app` body; missing fields fail input validation
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateBody {
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Serialize)]
struct GenerateReply<'a> {
    code: &'a str,
    success: bool,
    attempts: usize,
}

/// `POST /api/apps` body
#[derive(Debug, Deserialize)]
pub(crate) struct CreateBody {
    #[serde(flatten)]
    app: NewApp,
    code: String,
}

/// `PATCH /api/apps/:id` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusBody {
    status: AppStatus,
    #[serde(default)]
    deployment_tx_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RuntimeQuery {
    #[serde(default = "first_generation")]
    generation: u64,
}

fn first_generation() -> u64 {
    1
}

pub(crate) async fn generate_app(
    body: GenerateBody,
    state: ServiceState,
) -> Result<Response, Infallible> {
    let request = GenerationRequest::new(
        body.description,
        body.category,
        body.price.unwrap_or(f64::NAN),
    );

    match state.orchestrator().generate(&request).await {
        Ok(outcome) => Ok(reply::json(
            StatusCode::OK,
            &GenerateReply {
                code: outcome.code(),
                success: true,
                attempts: outcome.attempt_count(),
            },
        )),
        Err(err) => {
            warn!(error = %err, status = err.status_code(), "Generation failed");
            Ok(reply::generation_error(&err))
        }
    }
}

pub(crate) async fn create_app(body: CreateBody, state: ServiceState) -> Result<Response, Infallible> {
    if body.app.name.trim().is_empty() {
        return Ok(reply::message_with_reason(
            StatusCode::BAD_REQUEST,
            "Invalid app data",
            "name is required",
        ));
    }

    let artifact = match CodeArtifact::candidate(body.code, 1)
        .and_then(|candidate| state.validator().check(candidate))
    {
        Ok(artifact) => artifact,
        Err(err) => {
            warn!(error = %err, "Could not record verdict");
            return Ok(reply::message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create app"));
        }
    };
    if let Some(reason) = artifact.state().reason() {
        return Ok(reply::message_with_reason(
            StatusCode::BAD_REQUEST,
            "Invalid app data",
            reason,
        ));
    }

    match state.store().create(body.app, &artifact).await {
        Ok(record) => {
            info!(id = %record.id, hash = %artifact.hash().short(), "Saved app");
            Ok(reply::json(StatusCode::CREATED, &record))
        }
        Err(err) => Ok(store_error(&err, "Failed to create app")),
    }
}

pub(crate) async fn list_apps(state: ServiceState) -> Result<Response, Infallible> {
    match state.store().list().await {
        Ok(apps) => {
            let summaries: Vec<AppSummary> = apps.iter().map(AppSummary::from).collect();
            Ok(reply::json(StatusCode::OK, &summaries))
        }
        Err(err) => Ok(store_error(&err, "Failed to fetch apps")),
    }
}

pub(crate) async fn get_app(id: Uuid, state: ServiceState) -> Result<Response, Infallible> {
    match state.store().get(id).await {
        Ok(app) => Ok(reply::json(StatusCode::OK, &app)),
        Err(err) => Ok(store_error(&err, "Failed to fetch app")),
    }
}

pub(crate) async fn update_status(
    id: Uuid,
    body: StatusBody,
    state: ServiceState,
) -> Result<Response, Infallible> {
    match state
        .store()
        .set_status(id, body.status, body.deployment_tx_id)
        .await
    {
        Ok(app) => Ok(reply::json(StatusCode::OK, &app)),
        Err(err) => Ok(store_error(&err, "Failed to update app")),
    }
}

pub(crate) async fn delete_app(id: Uuid, state: ServiceState) -> Result<Response, Infallible> {
    match state.store().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Ok(store_error(&err, "Failed to delete app")),
    }
}

pub(crate) async fn runtime_document(
    id: Uuid,
    query: RuntimeQuery,
    state: ServiceState,
) -> Result<Response, Infallible> {
    if query.generation == 0 {
        return Ok(reply::message(
            StatusCode::BAD_REQUEST,
            "generation must be at least 1",
        ));
    }

    let (app, artifact) = match hydrate(state.store(), state.validator(), id).await {
        Ok(hydrated) => hydrated,
        Err(WorkbenchError::Store(err)) => return Ok(store_error(&err, "Failed to fetch app")),
        Err(WorkbenchError::InvalidStoredCode { reason, .. }) => {
            return Ok(reply::message_with_reason(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Saved app code is invalid",
                &reason,
            ));
        }
        Err(err) => {
            warn!(%id, error = %err, "Hydration failed");
            return Ok(reply::message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch app"));
        }
    };

    match state.documents().build(&artifact, &app.name, query.generation) {
        Ok(document) => {
            let mut response = warp::reply::html(document).into_response();
            response.headers_mut().insert(
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(SANDBOX_CSP_HEADER),
            );
            Ok(response)
        }
        Err(err) => {
            warn!(%id, error = %err, "Document build failed");
            Ok(reply::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to build runtime document",
            ))
        }
    }
}

fn store_error(err: &StoreError, fallback: &str) -> Response {
    match err {
        StoreError::NotFound(_) => reply::message(StatusCode::NOT_FOUND, "App not found"),
        StoreError::NotValid(reason) => {
            reply::message_with_reason(StatusCode::BAD_REQUEST, "Invalid app data", reason)
        }
        StoreError::Backend(detail) => {
            warn!(%detail, "Store backend error");
            reply::message(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}
