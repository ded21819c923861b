// src/models/attempt.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Subject value stored when a test spans every subject (full-length,
/// mock and multi-subject papers).
pub const MULTI_SUBJECT: &str = "Multi-Subject";

/// Sentinel filter value meaning "no filter" for provider/subject.
pub const ALL: &str = "All";

/// Test category. Stored as kebab-case text in both the database and the
/// interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum Category {
    TopicWise,
    SubjectWise,
    MultiSubject,
    FullLength,
    Mock,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TopicWise => "topic-wise",
            Category::SubjectWise => "subject-wise",
            Category::MultiSubject => "multi-subject",
            Category::FullLength => "full-length",
            Category::Mock => "mock",
        }
    }

    /// Categories that must carry a real subject; everything else is
    /// forced to the [`MULTI_SUBJECT`] sentinel.
    pub fn requires_subject(&self) -> bool {
        matches!(self, Category::TopicWise | Category::SubjectWise)
    }

    /// Full-test categories, isolated into their own trend series.
    pub fn is_full_test(&self) -> bool {
        matches!(
            self,
            Category::MultiSubject | Category::FullLength | Category::Mock
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'attempts' table: one recorded test result.
///
/// `percentage` and `rank_percentile` are always recomputed from the raw
/// marks/rank fields (see `engine::derive`), never settable on their own.
/// `rank_percentile` is the fraction of test takers beaten, so rank 1 of
/// 500 gives 99.8 and last place gives 0.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
    pub id: String,
    pub subject: String,
    pub category: Category,
    pub provider: String,
    pub max_marks: f64,
    pub obtained_marks: f64,
    pub percentage: f64,

    /// Question-count breakdown. Stored as a unit: either all three are
    /// present or all three are null ("not recorded" is distinct from
    /// "recorded as zero").
    pub correct_count: Option<i64>,
    pub incorrect_count: Option<i64>,
    pub not_attempted_count: Option<i64>,

    /// Rank pair: both null or both present with 1 <= rank <= takers.
    pub test_rank: Option<i64>,
    pub total_test_takers: Option<i64>,
    pub rank_percentile: Option<f64>,

    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// DTO for creating or replacing an attempt.
///
/// Form payloads and imported records arrive with numbers sometimes
/// encoded as strings and optional fields sometimes sent as empty
/// strings; the flexible deserializers below coerce those into proper
/// `Option<number>` values so `engine::normalize` is the only place that
/// decides null-vs-zero-vs-absent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AttemptInput {
    pub id: Option<String>,

    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub subject: Option<String>,

    pub category: Option<Category>,

    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub provider: Option<String>,

    #[serde(deserialize_with = "de_flexible_f64")]
    pub max_marks: Option<f64>,
    #[serde(deserialize_with = "de_flexible_f64")]
    pub obtained_marks: Option<f64>,

    #[serde(deserialize_with = "de_flexible_i64")]
    pub total_questions: Option<i64>,
    #[serde(deserialize_with = "de_flexible_i64")]
    pub correct_count: Option<i64>,
    #[serde(deserialize_with = "de_flexible_i64")]
    pub incorrect_count: Option<i64>,
    #[serde(deserialize_with = "de_flexible_i64")]
    pub not_attempted_count: Option<i64>,

    #[serde(deserialize_with = "de_flexible_i64")]
    pub test_rank: Option<i64>,
    #[serde(deserialize_with = "de_flexible_i64")]
    pub total_test_takers: Option<i64>,

    #[serde(deserialize_with = "de_flexible_date")]
    pub date: Option<NaiveDate>,

    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Accepts a number, a numeric string, an empty string (treated as
/// absent) or null.
fn de_flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>()
                    .map(Some)
                    .map_err(|_| D::Error::custom(format!("invalid number: {s:?}")))
            }
        }
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn de_flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<i64>()
                    .map(Some)
                    .map_err(|_| D::Error::custom(format!("invalid integer: {s:?}")))
            }
        }
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {other}"))),
    }
}

/// Accepts an ISO date string, an empty string (absent) or null.
fn de_flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid date: {s:?}"))),
    }
}
