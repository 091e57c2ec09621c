use challenge_tracker::services::heatmap::build_grid;
use challenge_tracker::services::streak::{compute_streaks, Streaks};
use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
use criterion::{criterion_group, criterion_main, Criterion};
use std::collections::HashSet;
use std::hint::black_box;

/// A year of history with a gap every ten days.
fn year_of_completions() -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..365)
        .filter(|i| i % 10 != 9)
        .map(|i| start + Duration::days(i))
        .collect()
}

fn benchmark_streaks(c: &mut Criterion) {
    let dates = year_of_completions();

    let mut group = c.benchmark_group("streaks");

    group.bench_function("full_recompute_one_year", |b| {
        b.iter(|| compute_streaks(black_box(&dates)))
    });

    group.bench_function("incremental_one_year", |b| {
        b.iter(|| {
            let mut streaks = Streaks::default();
            let mut last = None;
            for &date in black_box(&dates) {
                if let Some(next) = streaks.extend(last, date) {
                    streaks = next;
                    last = Some(date);
                }
            }
            streaks
        })
    });

    group.finish();
}

fn benchmark_heatmap(c: &mut Criterion) {
    let completions: HashSet<NaiveDate> = year_of_completions().into_iter().collect();
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();

    c.bench_function("heatmap_full_window", |b| {
        b.iter(|| {
            build_grid(
                black_box(&completions),
                created_at,
                today,
                Weekday::Tue,
            )
        })
    });
}

criterion_group!(benches, benchmark_streaks, benchmark_heatmap);
criterion_main!(benches);
