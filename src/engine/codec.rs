// src/engine/codec.rs

use serde_json::Value;

use crate::{
    engine::normalize::normalize,
    error::ImportError,
    models::attempt::{AttemptInput, TestAttempt},
};

/// Result of a lenient import: the normalized records plus how many
/// malformed ones were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub attempts: Vec<TestAttempt>,
    pub skipped: usize,
}

/// Serializes the collection to the interchange format: a JSON array
/// with every field present, numbers as numbers and absent optionals as
/// explicit nulls ("not recorded" stays distinct from "zero").
pub fn to_interchange(attempts: &[TestAttempt]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(attempts)
}

/// Parses an interchange payload back into normalized attempts.
///
/// The payload must be a JSON array; anything else is an [`ImportError`]
/// and nothing is imported. Individual records are handled leniently:
/// each one runs through the full normalize/derive pipeline and records
/// that fail are skipped and counted instead of failing the batch.
pub fn from_interchange(text: &str) -> Result<ImportOutcome, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::new(format!("invalid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(ImportError::new("payload is not an array of records"));
    };

    let mut attempts = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for (index, item) in items.into_iter().enumerate() {
        let parsed = serde_json::from_value::<AttemptInput>(item)
            .map_err(|e| e.to_string())
            .and_then(|input| normalize(input).map_err(|e| e.to_string()));
        match parsed {
            Ok(attempt) => attempts.push(attempt),
            Err(reason) => {
                tracing::warn!(index, %reason, "skipping malformed record during import");
                skipped += 1;
            }
        }
    }

    Ok(ImportOutcome { attempts, skipped })
}

/// Column order of the tabular export. Fixed; spreadsheets depend on it.
const TABULAR_HEADER: &str = "subject,category,provider,maxMarks,obtainedMarks,correctCount,\
incorrectCount,notAttemptedCount,percentage,testRank,totalTestTakers,rankPercentile,date,notes";

/// Flat CSV export for spreadsheets. One-way: there is no tabular
/// import, the interchange format is the round-trip channel.
pub fn to_tabular(attempts: &[TestAttempt]) -> String {
    let mut out = String::from(TABULAR_HEADER);
    out.push('\n');
    for a in attempts {
        let fields = [
            escape_field(&a.subject),
            escape_field(a.category.as_str()),
            escape_field(&a.provider),
            format_f64(a.max_marks),
            format_f64(a.obtained_marks),
            format_opt_i64(a.correct_count),
            format_opt_i64(a.incorrect_count),
            format_opt_i64(a.not_attempted_count),
            format_f64(a.percentage),
            format_opt_i64(a.test_rank),
            format_opt_i64(a.total_test_takers),
            a.rank_percentile.map(format_f64).unwrap_or_default(),
            a.date.to_string(),
            escape_field(a.notes.as_deref().unwrap_or("")),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a field when it contains the delimiter, a quote or a newline;
/// embedded quotes are doubled.
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_f64(value: f64) -> String {
    // Shortest representation: 75.00 prints as 75, 83.33 as 83.33.
    format!("{value}")
}

fn format_opt_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
