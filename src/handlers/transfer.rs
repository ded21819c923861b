// src/handlers/transfer.rs

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{engine::codec, error::AppError, models::views::ImportReport, store::DynStore};

/// Exports every attempt in the lossless interchange format.
pub async fn export_json(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let attempts = store.load_all().await?;
    let text = codec::to_interchange(&attempts)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"attempts.json\"",
            ),
        ],
        text,
    ))
}

/// Exports the flat tabular format for spreadsheets. One-way; re-import
/// goes through the interchange format.
pub async fn export_csv(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let attempts = store.load_all().await?;
    let text = codec::to_tabular(&attempts);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"attempts.csv\"",
            ),
        ],
        text,
    ))
}

/// Imports an interchange payload.
///
/// A payload that is not a JSON array is rejected outright and zero
/// records are written. Within a valid array, malformed records are
/// skipped (and counted in the report) while the rest are normalized
/// and stored in a single transaction, so a store failure mid-batch
/// (an id collision, say) also writes zero records.
pub async fn import_attempts(
    State(store): State<DynStore>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let outcome = codec::from_interchange(&body)?;
    store.insert_many(&outcome.attempts).await?;

    let imported = outcome.attempts.len();
    tracing::info!(imported, skipped = outcome.skipped, "Import finished");
    Ok((
        StatusCode::CREATED,
        Json(ImportReport {
            imported,
            skipped: outcome.skipped,
        }),
    ))
}
