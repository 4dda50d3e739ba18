//! Integration tests: InspectionService commands → ProjectionProcessor → ProductQualityView.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aggregate_store::{EventEnvelope, EventPublisher, InMemoryAggregateStore};
use async_trait::async_trait;
use common::AggregateId;
use domain::{
    AggregateRoot, CompleteInspection, CreateInspection, DomainError, InspectionService, InspectionType,
    PutOnHold, RecordResult,
};
use projections::{
    Projection, ProductQualityView, ProjectionError, ProjectionPosition, ProjectionProcessor,
};

type Service = InspectionService<InMemoryAggregateStore, Arc<ProjectionProcessor>>;

/// Helper to wire a service to a processor with the product quality view.
fn setup() -> (Service, Arc<ProjectionProcessor>, ProductQualityView) {
    let view = ProductQualityView::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(view.clone()));
    let processor = Arc::new(processor);

    let service = InspectionService::new(InMemoryAggregateStore::new(), Arc::clone(&processor));
    (service, processor, view)
}

async fn run_order(service: &Service, product_code: &str, values: &[f64]) -> AggregateId {
    let order_id = service
        .create_inspection(
            CreateInspection::new("WO-7", product_code, InspectionType::InProcess)
                .with_threshold(0.10),
        )
        .await
        .unwrap()
        .aggregate
        .id();

    for &value in values {
        service
            .record_result(RecordResult::new(
                order_id, "LEN-50", 49.9, 50.1, "mm", value, "inspector-3",
            ))
            .await
            .unwrap();
    }

    service
        .complete_inspection(CompleteInspection::new(order_id))
        .await
        .unwrap();
    order_id
}

#[tokio::test]
async fn test_orders_roll_up_per_product() {
    let (service, processor, view) = setup();

    run_order(&service, "ROD-50", &[50.0, 50.05, 49.95]).await;
    run_order(&service, "ROD-50", &[50.0, 50.3]).await;
    run_order(&service, "PIN-12", &[50.0]).await;

    let rod = view.get_product("ROD-50").await.unwrap();
    assert_eq!(rod.inspections_started, 2);
    assert_eq!(rod.inspections_completed, 2);
    assert_eq!(rod.passed, 1);
    assert_eq!(rod.failed, 1);
    assert_eq!(rod.defects_detected, 1);
    assert_eq!(rod.quality_alerts, 1);
    assert_eq!(rod.last_defect_rate, Some(0.5));
    assert_eq!(rod.mean_defect_rate(), Some(0.25));

    let pin = view.get_product("PIN-12").await.unwrap();
    assert_eq!(pin.passed, 1);
    assert_eq!(pin.quality_alerts, 0);

    let alerting: Vec<_> = view
        .alerting_products()
        .await
        .into_iter()
        .map(|p| p.product_code)
        .collect();
    assert_eq!(alerting, vec!["ROD-50"]);

    // 3 creates, 1 defect, 1 alert, 3 completions
    assert_eq!(processor.journal_len().await, 8);
    assert_eq!(view.position().await.events_processed, 8);
}

#[tokio::test]
async fn test_held_order_stays_open() {
    let (service, _processor, view) = setup();

    let order_id = service
        .create_inspection(CreateInspection::new("WO-8", "ROD-50", InspectionType::Incoming))
        .await
        .unwrap()
        .aggregate
        .id();
    service
        .put_on_hold(PutOnHold::new(order_id, "material quarantine"))
        .await
        .unwrap();

    let rod = view.get_product("ROD-50").await.unwrap();
    assert_eq!(rod.open_inspections(), 1);
    assert_eq!(rod.inspections_completed, 0);
}

#[tokio::test]
async fn test_rebuild_reproduces_view() {
    let (service, processor, view) = setup();

    run_order(&service, "ROD-50", &[50.0, 50.3]).await;
    let before = view.get_product("ROD-50").await.unwrap();

    processor.rebuild_all().await.unwrap();

    let after = view.get_product("ROD-50").await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_failed_command_reaches_no_projection() {
    let (service, processor, view) = setup();

    let order_id = service
        .create_inspection(CreateInspection::new("WO-9", "ROD-50", InspectionType::Final))
        .await
        .unwrap()
        .aggregate
        .id();
    let result = service
        .complete_inspection(CompleteInspection::new(order_id))
        .await;
    assert!(result.is_err());

    let rod = view.get_product("ROD-50").await.unwrap();
    assert_eq!(rod.inspections_completed, 0);
    assert_eq!(processor.journal_len().await, 1);
}

/// Rejects the first `InspectionCompleted` it is offered.
struct CompletionGate {
    rejected: AtomicBool,
    position: tokio::sync::RwLock<ProjectionPosition>,
}

#[async_trait]
impl Projection for CompletionGate {
    fn name(&self) -> &'static str {
        "CompletionGate"
    }

    async fn handle(&self, event: &EventEnvelope) -> projections::Result<()> {
        if event.event_type == "InspectionCompleted" && !self.rejected.swap(true, Ordering::SeqCst)
        {
            return Err(ProjectionError::Projection("gate closed".into()));
        }
        let mut position = self.position.write().await;
        *position = position.advance(event);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> projections::Result<()> {
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

#[tokio::test]
async fn test_redelivered_completion_counts_once() {
    let view = ProductQualityView::new();
    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(view.clone()));
    processor.register(Box::new(CompletionGate {
        rejected: AtomicBool::new(false),
        position: tokio::sync::RwLock::new(ProjectionPosition::zero()),
    }));
    let processor = Arc::new(processor);
    let service = InspectionService::new(InMemoryAggregateStore::new(), Arc::clone(&processor));

    let order_id = service
        .create_inspection(CreateInspection::new("WO-8", "CAM-2", InspectionType::Final))
        .await
        .unwrap()
        .aggregate
        .id();
    service
        .record_result(RecordResult::new(
            order_id, "LEN-50", 49.9, 50.1, "mm", 50.0, "inspector-3",
        ))
        .await
        .unwrap();

    let err = service
        .complete_inspection(CompleteInspection::new(order_id))
        .await
        .unwrap_err();
    let pending = match err {
        DomainError::PublishFailed { pending, .. } => pending,
        other => panic!("expected publish failure, got {other:?}"),
    };
    assert_eq!(pending.len(), 1);

    for envelope in pending {
        processor.publish(envelope).await.unwrap();
    }

    let product = view.get_product("CAM-2").await.unwrap();
    assert_eq!(product.inspections_completed, 1);
    assert_eq!(product.passed, 1);
    assert_eq!(processor.journal_len().await, 2);
}
