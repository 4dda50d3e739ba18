//! Inspection service providing the command-level API for inspection orders.

use aggregate_store::{AggregateStore, EventPublisher};
use common::AggregateId;

use crate::aggregate::AggregateRoot;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    CompleteInspection, CreateInspection, DEFAULT_DEFECT_RATE_THRESHOLD, DefectInput,
    InspectionError, InspectionEvent, InspectionOrder, InspectionResult, PutOnHold, RecordResult,
};

/// Service for managing inspection orders.
///
/// Wraps the command handler so that every operation loads the order, runs
/// exactly one aggregate operation, saves the new state and publishes the
/// events it raised.
pub struct InspectionService<S: AggregateStore, P: EventPublisher> {
    handler: CommandHandler<S, P, InspectionOrder>,
    default_threshold: f64,
}

impl<S: AggregateStore, P: EventPublisher> InspectionService<S, P> {
    /// Creates a new service using [`DEFAULT_DEFECT_RATE_THRESHOLD`] for
    /// orders created without an explicit threshold.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            handler: CommandHandler::new(store, publisher),
            default_threshold: DEFAULT_DEFECT_RATE_THRESHOLD,
        }
    }

    /// Replaces the threshold applied when a create command omits one.
    pub fn with_default_threshold(mut self, threshold: f64) -> Result<Self, InspectionError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InspectionError::InvalidThreshold { threshold });
        }
        self.default_threshold = threshold;
        Ok(self)
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, P, InspectionOrder> {
        &self.handler
    }

    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    /// Creates an inspection order and moves it into progress.
    #[tracing::instrument(skip(self))]
    pub async fn create_inspection(
        &self,
        cmd: CreateInspection,
    ) -> Result<CommandResult<InspectionOrder>, DomainError> {
        let threshold = cmd.defect_rate_threshold.unwrap_or(self.default_threshold);
        let order = InspectionOrder::new(
            cmd.work_order_id,
            cmd.product_code,
            cmd.inspection_type,
            threshold,
        )?;

        let result = self
            .handler
            .create(order, |order| order.start_inspection())
            .await?;

        metrics::counter!("inspection_orders_started_total").increment(1);
        tracing::info!(
            order_id = %result.aggregate.id(),
            product_code = result.aggregate.product_code(),
            inspection_type = %result.aggregate.inspection_type(),
            threshold,
            "inspection started"
        );

        Ok(result)
    }

    /// Records one measurement against an order in progress.
    #[tracing::instrument(skip(self))]
    pub async fn record_result(
        &self,
        cmd: RecordResult,
    ) -> Result<CommandResult<InspectionOrder>, DomainError> {
        let standard = cmd.to_standard()?;
        let measured_value = cmd.to_measured_value();
        let defect_detail = cmd
            .defect
            .as_ref()
            .map(DefectInput::to_defect_detail)
            .transpose()?;

        let result = self
            .handler
            .handle(&cmd, move |order| {
                match defect_detail {
                    Some(detail) => {
                        order.record_result_with_defect(standard, measured_value, detail)
                    }
                    None => order.record_result(standard, measured_value),
                }
                .map(|_| ())
            })
            .await?;

        let passed = result
            .aggregate
            .results()
            .last()
            .is_some_and(InspectionResult::passed);
        let passed_label = if passed { "true" } else { "false" };
        metrics::counter!("inspection_results_recorded_total", "passed" => passed_label).increment(1);
        tracing::debug!(
            order_id = %cmd.order_id,
            standard_code = %cmd.standard_code,
            value = cmd.measured_value,
            passed,
            "result recorded"
        );

        Ok(result)
    }

    /// Decides the verdict of an order.
    #[tracing::instrument(skip(self))]
    pub async fn complete_inspection(
        &self,
        cmd: CompleteInspection,
    ) -> Result<CommandResult<InspectionOrder>, DomainError> {
        let result = self
            .handler
            .handle(&cmd, |order| order.complete().map(|_| ()))
            .await?;

        let order = &result.aggregate;
        let status = order.status();
        let defect_rate = order.defect_rate();

        metrics::counter!("inspection_orders_completed_total", "status" => status.as_str())
            .increment(1);
        metrics::histogram!("inspection_defect_rate").record(defect_rate);

        if result
            .events
            .iter()
            .any(|e| matches!(e, InspectionEvent::QualityAlert(_)))
        {
            metrics::counter!("quality_alerts_total").increment(1);
            tracing::warn!(
                order_id = %cmd.order_id,
                product_code = order.product_code(),
                defect_rate,
                threshold = order.defect_rate_threshold(),
                "quality alert raised"
            );
        }

        tracing::info!(
            order_id = %cmd.order_id,
            %status,
            defect_rate,
            results = order.result_count(),
            "inspection completed"
        );

        Ok(result)
    }

    /// Suspends an order in progress.
    #[tracing::instrument(skip(self))]
    pub async fn put_on_hold(
        &self,
        cmd: PutOnHold,
    ) -> Result<CommandResult<InspectionOrder>, DomainError> {
        let reason = cmd.reason.clone();
        let result = self
            .handler
            .handle(&cmd, move |order| order.put_on_hold(reason))
            .await?;

        tracing::info!(order_id = %cmd.order_id, reason = %cmd.reason, "inspection put on hold");
        Ok(result)
    }

    /// Gets an order by ID.
    pub async fn get_order(
        &self,
        order_id: AggregateId,
    ) -> Result<Option<InspectionOrder>, DomainError> {
        self.handler.load_existing(order_id).await
    }

    /// Applies the SPC run rule to the order's measurements for one standard.
    ///
    /// Returns true when the series is in control, including when the order
    /// has fewer than seven matching results or none at all.
    #[tracing::instrument(skip(self))]
    pub async fn spc_check(
        &self,
        order_id: AggregateId,
        standard_code: &str,
    ) -> Result<bool, DomainError> {
        let order = self.handler.load(order_id).await?;

        match order.trend_for(standard_code) {
            Some(run) => {
                tracing::warn!(
                    %order_id,
                    standard_code,
                    side = ?run.side,
                    start = run.start,
                    length = run.length,
                    "measurements drifting to one side of the mean"
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }
}
