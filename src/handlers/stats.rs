// src/handlers/stats.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    engine::{aggregate, filter, filter::FilterSpec},
    error::AppError,
    store::DynStore,
};

/// Dashboard statistics: summary, subject/provider groupings, weakest
/// subjects and the three trend series, computed over the filtered
/// snapshot. Pure recomputation on every call; nothing is cached.
pub async fn get_stats(
    State(store): State<DynStore>,
    Query(spec): Query<FilterSpec>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.load_all().await?;
    let selected = filter::apply(&attempts, &spec);
    Ok(Json(aggregate::stats(&selected)))
}
