// src/engine/derive.rs

use crate::models::attempt::TestAttempt;

/// Rounds to 2 decimals, half-up: scale by 100, round to the nearest
/// integer, divide back. Avoids the drift of naive float formatting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds to 1 decimal with the same scale-round-divide scheme.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Marks scored as a percentage of the maximum, 2-decimal rounded.
pub fn percentage(obtained_marks: f64, max_marks: f64) -> f64 {
    round2(obtained_marks / max_marks * 100.0)
}

/// Fraction of test takers beaten, as a percentage.
///
/// Rank 1 is the best: rank 15 of 500 gives 97.00, last place gives
/// 0.00. This is deliberately not the textbook percentile-rank
/// definition; chart consumers depend on this direction.
pub fn rank_percentile(test_rank: i64, total_test_takers: i64) -> f64 {
    round2((1.0 - test_rank as f64 / total_test_takers as f64) * 100.0)
}

/// Correct answers as a share of attempted questions, 1-decimal rounded.
/// Zero when nothing was attempted. Distinct from [`percentage`], which
/// is marks-based.
pub fn accuracy(correct: i64, incorrect: i64) -> f64 {
    let attempted = correct + incorrect;
    if attempted <= 0 {
        return 0.0;
    }
    round1(correct as f64 / attempted as f64 * 100.0)
}

/// Questions left unanswered, floored at zero. A negative intermediate
/// means the entered counts are inconsistent with the question total;
/// it is logged rather than silently stored.
pub fn unattempted(total_questions: i64, correct: i64, incorrect: i64) -> i64 {
    let remaining = total_questions - (correct + incorrect);
    if remaining < 0 {
        tracing::warn!(
            total_questions,
            correct,
            incorrect,
            "attempted count exceeds total questions; flooring unattempted at 0"
        );
        return 0;
    }
    remaining
}

/// Attempted questions per minute. The denominator is floored at one
/// minute so sub-minute entries do not explode the rate.
pub fn questions_per_minute(correct: i64, incorrect: i64, time_taken_minutes: f64) -> f64 {
    round2((correct + incorrect) as f64 / time_taken_minutes.max(1.0))
}

/// Recomputes every derived field from the raw fields. Idempotent:
/// running it twice yields the identical attempt, so stored and
/// re-derived values can never disagree.
pub fn derive(mut attempt: TestAttempt) -> TestAttempt {
    attempt.percentage = percentage(attempt.obtained_marks, attempt.max_marks);
    attempt.rank_percentile = match (attempt.test_rank, attempt.total_test_takers) {
        (Some(rank), Some(total)) => Some(rank_percentile(rank, total)),
        _ => None,
    };
    attempt
}
