// src/engine/aggregate.rs

use std::collections::BTreeMap;

use crate::{
    engine::derive::round2,
    models::{
        attempt::{MULTI_SUBJECT, TestAttempt},
        views::{ProviderAverage, StatsResponse, SubjectAverage, Summary, TrendPoint},
    },
};

/// Subject averages below this are flagged as weak.
const WEAK_SUBJECT_THRESHOLD: f64 = 65.0;

/// How many weak subjects to surface at most.
const WEAK_SUBJECT_LIMIT: usize = 5;

/// Overall statistics for a collection.
///
/// `avg_rank_percentile` is computed over the ranked subset only and is
/// null when no attempt carries rank data.
pub fn summarize(attempts: &[TestAttempt]) -> Summary {
    let total_count = attempts.len();
    let avg_percentage = if total_count == 0 {
        0.0
    } else {
        round2(attempts.iter().map(|a| a.percentage).sum::<f64>() / total_count as f64)
    };

    let percentiles: Vec<f64> = attempts.iter().filter_map(|a| a.rank_percentile).collect();
    let ranked_count = percentiles.len();
    let avg_rank_percentile = if ranked_count == 0 {
        None
    } else {
        Some(round2(percentiles.iter().sum::<f64>() / ranked_count as f64))
    };

    Summary {
        total_count,
        avg_percentage,
        avg_rank_percentile,
        ranked_count,
    }
}

/// Mean percentage per subject, best first. Multi-subject attempts are
/// excluded: their sentinel subject says nothing about a real subject.
pub fn subject_averages(attempts: &[TestAttempt]) -> Vec<SubjectAverage> {
    let mut averages: Vec<SubjectAverage> = group_means(
        attempts
            .iter()
            .filter(|a| a.subject != MULTI_SUBJECT)
            .map(|a| (a.subject.as_str(), a.percentage)),
    )
    .into_iter()
    .map(|(subject, (avg, count))| SubjectAverage {
        subject,
        avg,
        count,
    })
    .collect();

    averages.sort_by(|a, b| b.avg.total_cmp(&a.avg).then_with(|| a.subject.cmp(&b.subject)));
    averages
}

/// Subjects averaging under the weak threshold, worst first, capped.
pub fn weakest_subjects(attempts: &[TestAttempt]) -> Vec<SubjectAverage> {
    let mut weak: Vec<SubjectAverage> = subject_averages(attempts)
        .into_iter()
        .filter(|s| s.avg < WEAK_SUBJECT_THRESHOLD)
        .collect();
    weak.sort_by(|a, b| a.avg.total_cmp(&b.avg).then_with(|| a.subject.cmp(&b.subject)));
    weak.truncate(WEAK_SUBJECT_LIMIT);
    weak
}

/// Mean percentage per test-series provider, best first.
pub fn provider_breakdown(attempts: &[TestAttempt]) -> Vec<ProviderAverage> {
    let mut averages: Vec<ProviderAverage> =
        group_means(attempts.iter().map(|a| (a.provider.as_str(), a.percentage)))
            .into_iter()
            .map(|(provider, (avg, count))| ProviderAverage {
                provider,
                avg,
                count,
            })
            .collect();

    averages.sort_by(|a, b| {
        b.avg
            .total_cmp(&a.avg)
            .then_with(|| a.provider.cmp(&b.provider))
    });
    averages
}

/// Percentage over time for every attempt.
pub fn overall_trend(attempts: &[TestAttempt]) -> Vec<TrendPoint> {
    trend(attempts.iter().map(|a| (a, a.percentage)))
}

/// Percentage over time for full-length/mock/multi-subject papers only.
pub fn full_test_trend(attempts: &[TestAttempt]) -> Vec<TrendPoint> {
    trend(
        attempts
            .iter()
            .filter(|a| a.category.is_full_test())
            .map(|a| (a, a.percentage)),
    )
}

/// Rank percentile over time for the ranked subset.
pub fn rank_trend(attempts: &[TestAttempt]) -> Vec<TrendPoint> {
    trend(
        attempts
            .iter()
            .filter_map(|a| a.rank_percentile.map(|p| (a, p))),
    )
}

/// Assembles the full dashboard payload from one snapshot.
pub fn stats(attempts: &[TestAttempt]) -> StatsResponse {
    StatsResponse {
        summary: summarize(attempts),
        subject_averages: subject_averages(attempts),
        weakest_subjects: weakest_subjects(attempts),
        provider_breakdown: provider_breakdown(attempts),
        overall_trend: overall_trend(attempts),
        full_test_trend: full_test_trend(attempts),
        rank_trend: rank_trend(attempts),
    }
}

/// Sums per key in a BTreeMap so iteration order (and therefore output
/// order among equal averages) is deterministic.
fn group_means<'a>(
    pairs: impl Iterator<Item = (&'a str, f64)>,
) -> BTreeMap<String, (f64, usize)> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (key, value) in pairs {
        let entry = sums.entry(key.to_string()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, (round2(sum / count as f64), count)))
        .collect()
}

/// Ascending stable sort by date; same-date points keep their input
/// order.
fn trend<'a>(points: impl Iterator<Item = (&'a TestAttempt, f64)>) -> Vec<TrendPoint> {
    let mut series: Vec<TrendPoint> = points
        .map(|(a, value)| TrendPoint {
            date: a.date,
            value,
            category: a.category,
            subject: a.subject.clone(),
            provider: a.provider.clone(),
        })
        .collect();
    series.sort_by_key(|p| p.date);
    series
}
