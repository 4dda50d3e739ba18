use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use domain::{
    CompleteInspection, CreateInspection, InspectionOrder, InspectionService, InspectionType,
    MeasuredValue, QualityService, QualityStandard, RecordResult,
};
use aggregate_store::{InMemoryAggregateStore, InMemoryEventPublisher};

fn standard() -> QualityStandard {
    QualityStandard::new("DIM-01", 9.0, 11.0, "mm").unwrap()
}

/// Alternates around the mean so the whole series has to be scanned.
fn alternating_series(len: usize) -> Vec<MeasuredValue> {
    (0..len)
        .map(|i| {
            let value = if i % 2 == 0 { 10.2 } else { 9.8 };
            MeasuredValue::new(value, "mm", "bench")
        })
        .collect()
}

fn bench_spc_scan(c: &mut Criterion) {
    let standard = standard();
    let mut group = c.benchmark_group("quality/spc_scan");

    for len in [100usize, 1_000, 10_000] {
        let series = alternating_series(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &series, |b, series| {
            b.iter(|| QualityService::is_within_spc(black_box(series), &standard));
        });
    }

    group.finish();
}

fn bench_defect_rate(c: &mut Criterion) {
    let mut order = InspectionOrder::with_default_threshold("WO-BENCH", "BOLT-M8", InspectionType::Final);
    order.start_inspection().unwrap();
    for i in 0..1_000 {
        let value = if i % 10 == 0 { 12.0 } else { 10.0 };
        order
            .record_result(standard(), MeasuredValue::new(value, "mm", "bench"))
            .unwrap();
    }

    c.bench_function("quality/defect_rate_1000", |b| {
        b.iter(|| QualityService::calculate_defect_rate(black_box(order.results())));
    });
}

fn bench_full_inspection_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/create_record_complete", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service =
                    InspectionService::new(InMemoryAggregateStore::new(), InMemoryEventPublisher::new());
                let order_id = service
                    .create_inspection(CreateInspection::new(
                        "WO-BENCH",
                        "BOLT-M8",
                        InspectionType::Final,
                    ))
                    .await
                    .unwrap()
                    .aggregate
                    .id();

                for value in [10.0, 10.1, 9.9, 11.5] {
                    service
                        .record_result(RecordResult::new(
                            order_id, "DIM-01", 9.0, 11.0, "mm", value, "bench",
                        ))
                        .await
                        .unwrap();
                }

                service
                    .complete_inspection(CompleteInspection::new(order_id))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_spc_scan,
    bench_defect_rate,
    bench_full_inspection_cycle,
);
criterion_main!(benches);
