// src/models/views.rs

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::attempt::Category;

/// Overall statistics for a (filtered) attempt collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_count: usize,
    pub avg_percentage: f64,
    /// Null when no attempt carries rank data.
    pub avg_rank_percentile: Option<f64>,
    pub ranked_count: usize,
}

/// Per-subject mean percentage. Recomputed on every query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub avg: f64,
    pub count: usize,
}

/// Per-provider mean percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAverage {
    pub provider: String,
    pub avg: f64,
    pub count: usize,
}

/// One point of a time-ordered chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub category: Category,
    pub subject: String,
    pub provider: String,
}

/// Everything the dashboard needs in one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub summary: Summary,
    pub subject_averages: Vec<SubjectAverage>,
    pub weakest_subjects: Vec<SubjectAverage>,
    pub provider_breakdown: Vec<ProviderAverage>,
    pub overall_trend: Vec<TrendPoint>,
    pub full_test_trend: Vec<TrendPoint>,
    pub rank_trend: Vec<TrendPoint>,
}

/// Result of a bulk import: how many records were written and how many
/// malformed records were skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}
