// src/engine/filter.rs

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::attempt::{ALL, TestAttempt};

/// Composable filter over an attempt collection. All predicates are
/// conjunctive; absent fields (and the `"All"` sentinel for
/// provider/subject) mean "no filter". Date bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub provider: Option<String>,
    pub subject: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search_text: Option<String>,
}

impl FilterSpec {
    fn matches(&self, attempt: &TestAttempt) -> bool {
        if let Some(provider) = active(&self.provider) {
            if attempt.provider != provider {
                return false;
            }
        }
        if let Some(subject) = active(&self.subject) {
            if attempt.subject != subject {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if attempt.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if attempt.date > to {
                return false;
            }
        }
        if let Some(needle) = self.search_text.as_deref().map(str::trim) {
            if !needle.is_empty() && !matches_search(attempt, needle) {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive substring match over subject, notes, category and
/// provider.
fn matches_search(attempt: &TestAttempt, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let haystacks = [
        attempt.subject.to_lowercase(),
        attempt.notes.clone().unwrap_or_default().to_lowercase(),
        attempt.category.as_str().to_string(),
        attempt.provider.to_lowercase(),
    ];
    haystacks.iter().any(|h| h.contains(&needle))
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ALL)
}

/// Selects the attempts matching `spec`, preserving input order. Pure:
/// identical inputs always yield identical output and the input
/// collection is never touched.
pub fn apply(attempts: &[TestAttempt], spec: &FilterSpec) -> Vec<TestAttempt> {
    attempts
        .iter()
        .filter(|a| spec.matches(a))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::Category;

    fn attempt(subject: &str, provider: &str, day: u32, notes: Option<&str>) -> TestAttempt {
        TestAttempt {
            id: format!("{subject}-{day}"),
            subject: subject.to_string(),
            category: Category::SubjectWise,
            provider: provider.to_string(),
            max_marks: 100.0,
            obtained_marks: 70.0,
            percentage: 70.0,
            correct_count: None,
            incorrect_count: None,
            not_attempted_count: None,
            test_rank: None,
            total_test_takers: None,
            rank_percentile: None,
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            notes: notes.map(str::to_string),
        }
    }

    fn collection() -> Vec<TestAttempt> {
        vec![
            attempt("Networks", "MadeEasy", 5, Some("revise TCP")),
            attempt("Signals", "Ace", 10, None),
            attempt("Networks", "Ace", 15, Some("sampling mistakes")),
        ]
    }

    #[test]
    fn empty_spec_selects_everything_in_order() {
        let all = apply(&collection(), &FilterSpec::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].subject, "Networks");
        assert_eq!(all[1].subject, "Signals");
    }

    #[test]
    fn all_sentinel_means_no_filter() {
        let spec = FilterSpec {
            provider: Some("All".into()),
            subject: Some("All".into()),
            ..Default::default()
        };
        assert_eq!(apply(&collection(), &spec).len(), 3);
    }

    #[test]
    fn provider_and_subject_are_exact_and_conjunctive() {
        let spec = FilterSpec {
            provider: Some("Ace".into()),
            subject: Some("Networks".into()),
            ..Default::default()
        };
        let selected = apply(&collection(), &spec);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let spec = FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2026, 1, 5),
            date_to: NaiveDate::from_ymd_opt(2026, 1, 10),
            ..Default::default()
        };
        let selected = apply(&collection(), &spec);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive_over_notes_and_fields() {
        let spec = FilterSpec {
            search_text: Some("tcp".into()),
            ..Default::default()
        };
        let selected = apply(&collection(), &spec);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].notes.as_deref(), Some("revise TCP"));

        let spec = FilterSpec {
            search_text: Some("ACE".into()),
            ..Default::default()
        };
        assert_eq!(apply(&collection(), &spec).len(), 2);
    }

    #[test]
    fn filters_compose() {
        let spec_a = FilterSpec {
            provider: Some("Ace".into()),
            ..Default::default()
        };
        let spec_b = FilterSpec {
            subject: Some("Networks".into()),
            ..Default::default()
        };
        let combined = FilterSpec {
            provider: Some("Ace".into()),
            subject: Some("Networks".into()),
            ..Default::default()
        };

        let chained = apply(&apply(&collection(), &spec_a), &spec_b);
        let at_once = apply(&collection(), &combined);
        assert_eq!(chained, at_once);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let spec = FilterSpec {
            search_text: Some("networks".into()),
            ..Default::default()
        };
        assert_eq!(apply(&collection(), &spec), apply(&collection(), &spec));
    }
}
