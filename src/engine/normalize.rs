// src/engine/normalize.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::derive,
    error::ValidationError,
    models::attempt::{AttemptInput, MULTI_SUBJECT, TestAttempt},
    utils::html::clean_notes,
};

/// Validates and coerces a raw submission into a canonical [`TestAttempt`].
///
/// This is the only gate between untrusted external shapes and stored
/// entities: every invariant on the entity holds for anything this
/// function returns. Pure apart from fresh-id assignment when the input
/// carries none (create vs. update is the caller's concern).
pub fn normalize(input: AttemptInput) -> Result<TestAttempt, ValidationError> {
    if let Err(errors) = input.validate() {
        let field_errors = errors.field_errors();
        if let Some((field, errs)) = field_errors.iter().next() {
            let reason = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "is invalid".to_string());
            return Err(ValidationError::new(field.to_string(), reason));
        }
    }

    let category = input
        .category
        .ok_or_else(|| ValidationError::new("category", "is required"))?;

    // Subject is mandatory for topic/subject-wise tests; every other
    // category spans all subjects and gets the sentinel.
    let subject = if category.requires_subject() {
        match input.subject.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                return Err(ValidationError::new(
                    "subject",
                    "is required for topic-wise and subject-wise tests",
                ));
            }
        }
    } else {
        MULTI_SUBJECT.to_string()
    };

    let provider = input
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Other")
        .to_string();

    let max_marks = input
        .max_marks
        .ok_or_else(|| ValidationError::new("maxMarks", "is required"))?;
    if !max_marks.is_finite() || max_marks <= 0.0 {
        return Err(ValidationError::new("maxMarks", "must be a positive number"));
    }

    let obtained_marks = input
        .obtained_marks
        .ok_or_else(|| ValidationError::new("obtainedMarks", "is required"))?;
    if !obtained_marks.is_finite() {
        return Err(ValidationError::new("obtainedMarks", "must be a number"));
    }
    if obtained_marks < 0.0 {
        return Err(ValidationError::new("obtainedMarks", "must not be negative"));
    }
    if obtained_marks > max_marks {
        return Err(ValidationError::new("obtainedMarks", "exceeds maxMarks"));
    }

    let (correct_count, incorrect_count, not_attempted_count) = normalize_counts(&input)?;
    let (test_rank, total_test_takers) = normalize_rank(&input)?;

    let date = input
        .date
        .ok_or_else(|| ValidationError::new("date", "is required"))?;

    let notes = input
        .notes
        .as_deref()
        .map(clean_notes)
        .filter(|s| !s.is_empty());

    let id = input
        .id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(derive::derive(TestAttempt {
        id,
        subject,
        category,
        provider,
        max_marks,
        obtained_marks,
        percentage: 0.0,
        correct_count,
        incorrect_count,
        not_attempted_count,
        test_rank,
        total_test_takers,
        rank_percentile: None,
        date,
        notes,
    }))
}

type CountTriple = (Option<i64>, Option<i64>, Option<i64>);

/// The question-count breakdown is stored as a unit: all three null when
/// nothing was recorded, all three present otherwise. A null triple means
/// "not recorded", which is distinct from "recorded as zero".
fn normalize_counts(input: &AttemptInput) -> Result<CountTriple, ValidationError> {
    let group_present = input.correct_count.is_some()
        || input.incorrect_count.is_some()
        || input.not_attempted_count.is_some()
        || input.total_questions.is_some();
    if !group_present {
        return Ok((None, None, None));
    }

    let correct = input.correct_count.ok_or_else(|| {
        ValidationError::new("correctCount", "must be provided with the other question counts")
    })?;
    let incorrect = input.incorrect_count.ok_or_else(|| {
        ValidationError::new(
            "incorrectCount",
            "must be provided with the other question counts",
        )
    })?;
    if correct < 0 {
        return Err(ValidationError::new("correctCount", "must not be negative"));
    }
    if incorrect < 0 {
        return Err(ValidationError::new("incorrectCount", "must not be negative"));
    }

    let not_attempted = match input.not_attempted_count {
        Some(n) if n < 0 => {
            return Err(ValidationError::new(
                "notAttemptedCount",
                "must not be negative",
            ));
        }
        Some(n) => n,
        None => match input.total_questions {
            Some(total) if total < 0 => {
                return Err(ValidationError::new("totalQuestions", "must not be negative"));
            }
            Some(total) => derive::unattempted(total, correct, incorrect),
            None => 0,
        },
    };

    Ok((Some(correct), Some(incorrect), Some(not_attempted)))
}

/// Rank fields are both-null or both-valid-and-ordered.
fn normalize_rank(input: &AttemptInput) -> Result<(Option<i64>, Option<i64>), ValidationError> {
    match (input.test_rank, input.total_test_takers) {
        (None, None) => Ok((None, None)),
        (Some(_), None) => Err(ValidationError::new(
            "totalTestTakers",
            "is required when testRank is provided",
        )),
        (None, Some(_)) => Err(ValidationError::new(
            "testRank",
            "is required when totalTestTakers is provided",
        )),
        (Some(rank), Some(total)) => {
            if rank < 1 {
                return Err(ValidationError::new("testRank", "must be positive"));
            }
            if total < 1 {
                return Err(ValidationError::new("totalTestTakers", "must be positive"));
            }
            if rank > total {
                return Err(ValidationError::new("testRank", "exceeds totalTestTakers"));
            }
            Ok((Some(rank), Some(total)))
        }
    }
}
