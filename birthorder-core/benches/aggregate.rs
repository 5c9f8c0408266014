use birthorder_core::{
    compute_statistics, export_csv, AgeRange, FieldLayout, Gender, Region, Submission,
};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn synthetic(n: usize) -> Vec<Submission> {
    (0..n)
        .map(|i| Submission {
            id: i.to_string(),
            region: Region::ALL[i % Region::ALL.len()],
            family_size: (i % 20 + 1) as u8,
            firstborn_gender: Gender::ALL[i % 2],
            attitude_score: 0.1 + (i % 7) as f64 * 0.1,
            firstborn_education: (i % 20 + 1) as f64,
            laterborn_education: ((i + 3) % 20 + 1) as f64,
            age_range: AgeRange::ALL[i % AgeRange::ALL.len()],
            notes: if i % 10 == 0 { "quiet, then loud".into() } else { String::new() },
            contact_email: String::new(),
            ip_address: Some("127.0.0.1".into()),
            user_agent: None,
            timestamp: Utc::now(),
        })
        .collect()
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_statistics");
    for size in [100, 10_000] {
        let records = synthetic(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| black_box(compute_statistics(records)));
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let records = synthetic(10_000);
    c.bench_function("export_csv::relational_10k", |b| {
        b.iter(|| black_box(export_csv(&records, FieldLayout::Relational).unwrap()));
    });
}

criterion_group!(benches, bench_statistics, bench_export);
criterion_main!(benches);
