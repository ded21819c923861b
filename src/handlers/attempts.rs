// src/handlers/attempts.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    engine::{filter, filter::FilterSpec, normalize::normalize},
    error::AppError,
    models::attempt::AttemptInput,
    store::DynStore,
};

/// Lists attempts, optionally narrowed by the query-string filter
/// (provider, subject, dateFrom, dateTo, searchText).
pub async fn list_attempts(
    State(store): State<DynStore>,
    Query(spec): Query<FilterSpec>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.load_all().await?;
    Ok(Json(filter::apply(&attempts, &spec)))
}

/// Records a new attempt. The payload runs through the normalizer; any
/// invariant violation comes back as a 400 with the exact field and
/// reason, and nothing is stored.
pub async fn create_attempt(
    State(store): State<DynStore>,
    Json(input): Json<AttemptInput>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = normalize(input)?;
    store.insert(&attempt).await?;

    tracing::info!(id = %attempt.id, subject = %attempt.subject, "Attempt recorded");
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Replaces an attempt wholesale; there are no partial patches. The id
/// in the path wins over any id in the payload.
pub async fn update_attempt(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    Json(mut input): Json<AttemptInput>,
) -> Result<impl IntoResponse, AppError> {
    input.id = Some(id.clone());
    let attempt = normalize(input)?;
    store.update(&id, &attempt).await?;

    Ok(Json(attempt))
}

/// Hard-deletes an attempt by id.
pub async fn delete_attempt(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
