//! Product quality read model: inspection statistics per product code.

use std::collections::HashMap;
use std::sync::Arc;

use aggregate_store::EventEnvelope;
use async_trait::async_trait;
use common::AggregateId;
use domain::{AggregateRoot, InspectionEvent, InspectionOrder, InspectionStatus};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Quality statistics for one product code across all of its orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQualitySummary {
    pub product_code: String,
    pub inspections_started: u64,
    pub inspections_completed: u64,
    pub passed: u64,
    pub failed: u64,
    pub defects_detected: u64,
    pub quality_alerts: u64,
    /// Defect rate of the most recently completed order.
    pub last_defect_rate: Option<f64>,
    pub order_ids: Vec<AggregateId>,
    #[serde(skip)]
    defect_rate_sum: f64,
}

impl ProductQualitySummary {
    fn new(product_code: String) -> Self {
        Self {
            product_code,
            inspections_started: 0,
            inspections_completed: 0,
            passed: 0,
            failed: 0,
            defects_detected: 0,
            quality_alerts: 0,
            last_defect_rate: None,
            order_ids: Vec::new(),
            defect_rate_sum: 0.0,
        }
    }

    /// Mean defect rate over completed orders; None until one completes.
    pub fn mean_defect_rate(&self) -> Option<f64> {
        (self.inspections_completed > 0)
            .then(|| self.defect_rate_sum / self.inspections_completed as f64)
    }

    /// Orders started but not yet completed. Orders on hold count as open.
    pub fn open_inspections(&self) -> u64 {
        self.inspections_started
            .saturating_sub(self.inspections_completed)
    }
}

struct ProductQualityState {
    products: HashMap<String, ProductQualitySummary>,
    /// Maps order_id -> product_code, learned from InspectionOrderCreated.
    order_to_product: HashMap<AggregateId, String>,
    position: ProjectionPosition,
}

/// Read model view for per-product quality statistics.
#[derive(Clone)]
pub struct ProductQualityView {
    state: Arc<RwLock<ProductQualityState>>,
}

impl ProductQualityView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ProductQualityState {
                products: HashMap::new(),
                order_to_product: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Gets statistics for a specific product.
    pub async fn get_product(&self, product_code: &str) -> Option<ProductQualitySummary> {
        self.state.read().await.products.get(product_code).cloned()
    }

    /// Gets statistics for every product, ordered by product code.
    pub async fn all_products(&self) -> Vec<ProductQualitySummary> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.product_code.cmp(&b.product_code));
        products
    }

    /// Gets the products that raised at least one quality alert, most
    /// alerts first.
    pub async fn alerting_products(&self) -> Vec<ProductQualitySummary> {
        let mut products: Vec<_> = self
            .all_products()
            .await
            .into_iter()
            .filter(|p| p.quality_alerts > 0)
            .collect();
        products.sort_by(|a, b| b.quality_alerts.cmp(&a.quality_alerts));
        products
    }
}

impl Default for ProductQualityView {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductQualityState {
    fn product_for(&mut self, order_id: AggregateId) -> Option<&mut ProductQualitySummary> {
        let Some(product_code) = self.order_to_product.get(&order_id) else {
            tracing::debug!(%order_id, "event for an order this view never saw created");
            return None;
        };
        self.products.get_mut(product_code)
    }

    fn apply(&mut self, order_id: AggregateId, event: InspectionEvent) {
        match event {
            InspectionEvent::InspectionOrderCreated(data) => {
                self.order_to_product
                    .insert(order_id, data.product_code.clone());
                let product = self
                    .products
                    .entry(data.product_code.clone())
                    .or_insert_with(|| ProductQualitySummary::new(data.product_code));
                product.inspections_started += 1;
                product.order_ids.push(order_id);
            }
            InspectionEvent::DefectDetected(_) => {
                if let Some(product) = self.product_for(order_id) {
                    product.defects_detected += 1;
                }
            }
            InspectionEvent::QualityAlert(data) => {
                if let Some(product) = self.products.get_mut(&data.product_code) {
                    product.quality_alerts += 1;
                }
            }
            InspectionEvent::InspectionCompleted(data) => {
                if let Some(product) = self.product_for(order_id) {
                    product.inspections_completed += 1;
                    match data.status {
                        InspectionStatus::Passed => product.passed += 1,
                        InspectionStatus::Failed => product.failed += 1,
                        other => tracing::warn!(%order_id, status = %other, "unexpected completion status"),
                    }
                    product.last_defect_rate = Some(data.defect_rate);
                    product.defect_rate_sum += data.defect_rate;
                }
            }
        }
    }
}

#[async_trait]
impl Projection for ProductQualityView {
    fn name(&self) -> &'static str {
        "ProductQualityView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        if event.aggregate_type == InspectionOrder::aggregate_type() {
            let inspection_event: InspectionEvent = event.decode()?;
            state.apply(event.aggregate_id, inspection_event);
        }

        state.position = state.position.advance(event);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.clear();
        state.order_to_product.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for ProductQualityView {
    fn name(&self) -> &'static str {
        "ProductQualityView"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|s| s.products.len())
            .unwrap_or(0)
    }
}
