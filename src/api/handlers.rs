use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::db::read_ops;
use crate::models::{
    DocumentUpload, HealthRecord, PedigreeVerification, ScoreResponse, Session, TrustReport,
};
use crate::reconcile::{self, CommitOutcome};

/// The acting user, taken from the `X-User-Id` header the marketplace
/// gateway sets after authentication. No tokens are handled here.
fn session_from_headers(headers: &HeaderMap) -> ApiResult<Session> {
    let raw = headers
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-User-Id header".to_string()))?;

    let user_id = Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("invalid X-User-Id header: {}", raw)))?;

    Ok(Session { user_id })
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[tracing::instrument(skip(state, headers, body), fields(dog_id = %dog_id, test_type = %test_type))]
pub async fn upload_health_document(
    State(state): State<AppState>,
    Path((dog_id, test_type)): Path<(Uuid, String)>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<HealthRecord>> {
    let session = session_from_headers(&headers)?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let upload = DocumentUpload {
        filename: params.filename.unwrap_or_else(|| "document".to_string()),
        content_type,
        bytes: body.to_vec(),
    };

    let record = reconcile::record_health_upload(
        &state.pool,
        state.storage.as_ref(),
        &state.registry,
        &session,
        dog_id,
        &test_type,
        upload,
    )
    .await?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct VerificationParams {
    pub external_id: Option<String>,
}

#[tracing::instrument(skip(state), fields(dog_id = %dog_id))]
pub async fn preview_pedigree_verification(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
    Query(params): Query<VerificationParams>,
) -> ApiResult<Json<PedigreeVerification>> {
    let external_id = params.external_id.unwrap_or_default();
    let verification =
        reconcile::verify_pedigree(state.verifier.as_ref(), dog_id, &external_id).await?;

    Ok(Json(verification))
}

#[tracing::instrument(skip(state, headers, verification), fields(dog_id = %dog_id))]
pub async fn commit_pedigree_verification(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
    headers: HeaderMap,
    Json(verification): Json<PedigreeVerification>,
) -> ApiResult<Json<CommitOutcome>> {
    let session = session_from_headers(&headers)?;

    let outcome = reconcile::commit_pedigree_verification(
        &state.pool,
        &state.registry,
        state.verifier.name(),
        &session,
        dog_id,
        verification,
    )
    .await?;

    Ok(Json(outcome))
}

#[tracing::instrument(skip(state), fields(dog_id = %dog_id))]
pub async fn recompute_score(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
) -> ApiResult<Json<ScoreResponse>> {
    let trust_score =
        reconcile::recompute_and_publish(&state.pool, &state.registry, dog_id).await?;

    info!(trust_score, "Score recomputed on request");
    Ok(Json(ScoreResponse {
        dog_id,
        trust_score,
    }))
}

#[tracing::instrument(skip(state), fields(dog_id = %dog_id))]
pub async fn trust_report(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
) -> ApiResult<Json<TrustReport>> {
    let dog = read_ops::load_dog(&state.pool, dog_id).await?;
    let health_records = read_ops::load_health_records(&state.pool, dog_id).await?;
    let pedigree_entries = read_ops::load_pedigree_entries(&state.pool, dog_id).await?;

    let report = TrustReport::build(dog, &health_records, &pedigree_entries, &state.registry);
    Ok(Json(report))
}

pub async fn health_check() -> &'static str {
    "OK"
}
