//! Benchmarks for the reshaping kernels
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dwchart::frame::{resample, Aggregation, Frame, Frequency, Interpolation, TimeSeries};
use dwchart::seasonal::{fold_onto, stats_folded, stats_unfolded};
use dwchart::table::{build_table, Hierarchy, HierarchyNode};

fn daily_series(years: i64) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let points = (0..years * 365).map(|i| {
        let value = if i % 17 == 0 { None } else { Some((i as f64 / 58.0).sin() * 100.0) };
        (start + Duration::days(i), value)
    });
    TimeSeries::from_points(points).unwrap()
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let series = daily_series(20);
    group.throughput(Throughput::Elements(series.len() as u64));

    for freq in [Frequency::Week, Frequency::Month] {
        group.bench_function(format!("daily_to_{}", freq.code()), |b| {
            b.iter(|| resample(black_box(&series), freq, Aggregation::Mean).unwrap())
        });
    }

    group.finish();
}

fn bench_seasonal(c: &mut Criterion) {
    let mut group = c.benchmark_group("seasonal");

    for years in [5, 20] {
        let series = daily_series(years);
        let frame = Frame::from_series("price", &series);
        let last_year = 2000 + years as i32 - 1;
        group.throughput(Throughput::Elements(series.len() as u64));

        group.bench_function(format!("fold_{}y", years), |b| {
            b.iter(|| {
                fold_onto(black_box(&series), Frequency::Day, Aggregation::Mean, 2024).unwrap()
            })
        });

        group.bench_function(format!("stats_folded_{}y", years), |b| {
            b.iter(|| {
                stats_folded(
                    black_box(&frame),
                    Frequency::Day,
                    Aggregation::Mean,
                    Some(Interpolation::Linear),
                    last_year,
                    2024,
                )
                .unwrap()
            })
        });

        group.bench_function(format!("stats_unfolded_{}y", years), |b| {
            b.iter(|| {
                let frame = black_box(&frame);
                stats_unfolded(frame, Frequency::Week, Aggregation::Mean, None, last_year).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");

    let series = daily_series(3);
    let names = ["total", "wind", "onshore", "offshore", "solar"];
    let columns = names.iter().map(|n| (n.to_string(), series.clone())).collect();
    let frame = Frame::align(columns).unwrap();
    let hierarchy = Hierarchy::new(vec![HierarchyNode::new("total", Aggregation::Sum)
        .with_child(
            HierarchyNode::new("wind", Aggregation::Sum)
                .with_child(HierarchyNode::new("onshore", Aggregation::Sum))
                .with_child(HierarchyNode::new("offshore", Aggregation::Sum)),
        )
        .with_child(HierarchyNode::new("solar", Aggregation::Mean))])
    .unwrap();

    group.bench_function("monthly_table", |b| {
        b.iter(|| build_table(black_box(&frame), &hierarchy, Frequency::Month, "TWh").unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_resample, bench_seasonal, bench_table);
criterion_main!(benches);
