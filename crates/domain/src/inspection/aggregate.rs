//! Inspection order aggregate implementation.

use aggregate_store::Version;
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateRoot;
use crate::quality::{QualityService, TrendRun};

use super::{
    DefectDetail, InspectionError, InspectionEvent, InspectionResult, InspectionStatus,
    InspectionType, MeasuredValue, QualityStandard,
};

/// Alert threshold used when the creator does not supply one.
pub const DEFAULT_DEFECT_RATE_THRESHOLD: f64 = 0.10;

/// Inspection order aggregate root.
///
/// Owns the ordered results of one inspection of a product batch. Any failing
/// result fails the whole order on completion; the defect rate threshold only
/// decides whether a `QualityAlert` is raised alongside the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionOrder {
    id: AggregateId,

    /// Stored version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    work_order_id: String,
    product_code: String,
    inspection_type: InspectionType,
    status: InspectionStatus,

    /// Append-only, in measurement order.
    results: Vec<InspectionResult>,

    defect_rate_threshold: f64,

    #[serde(default)]
    hold_reason: Option<String>,

    #[serde(skip)]
    events: Vec<InspectionEvent>,
}

impl AggregateRoot for InspectionOrder {
    type Event = InspectionEvent;
    type Error = InspectionError;

    fn aggregate_type() -> &'static str {
        "InspectionOrder"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn pending_events(&self) -> &[InspectionEvent] {
        &self.events
    }

    fn take_events(&mut self) -> Vec<InspectionEvent> {
        std::mem::take(&mut self.events)
    }
}

// Construction
impl InspectionOrder {
    /// Creates a pending order with a fresh identity.
    ///
    /// The threshold must be a finite fraction in `[0, 1]`.
    pub fn new(
        work_order_id: impl Into<String>,
        product_code: impl Into<String>,
        inspection_type: InspectionType,
        defect_rate_threshold: f64,
    ) -> Result<Self, InspectionError> {
        if !(0.0..=1.0).contains(&defect_rate_threshold) {
            return Err(InspectionError::InvalidThreshold {
                threshold: defect_rate_threshold,
            });
        }

        Ok(Self::pending(
            work_order_id.into(),
            product_code.into(),
            inspection_type,
            defect_rate_threshold,
        ))
    }

    /// Creates a pending order using [`DEFAULT_DEFECT_RATE_THRESHOLD`].
    pub fn with_default_threshold(
        work_order_id: impl Into<String>,
        product_code: impl Into<String>,
        inspection_type: InspectionType,
    ) -> Self {
        Self::pending(
            work_order_id.into(),
            product_code.into(),
            inspection_type,
            DEFAULT_DEFECT_RATE_THRESHOLD,
        )
    }

    fn pending(
        work_order_id: String,
        product_code: String,
        inspection_type: InspectionType,
        defect_rate_threshold: f64,
    ) -> Self {
        Self {
            id: AggregateId::new(),
            version: Version::initial(),
            work_order_id,
            product_code,
            inspection_type,
            status: InspectionStatus::Pending,
            results: Vec::new(),
            defect_rate_threshold,
            hold_reason: None,
            events: Vec::new(),
        }
    }
}

// Query methods
impl InspectionOrder {
    pub fn work_order_id(&self) -> &str {
        &self.work_order_id
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn inspection_type(&self) -> InspectionType {
        self.inspection_type
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn defect_rate_threshold(&self) -> f64 {
        self.defect_rate_threshold
    }

    /// Returns the reason given when the order was put on hold.
    pub fn hold_reason(&self) -> Option<&str> {
        self.hold_reason.as_deref()
    }

    /// Returns the recorded results in measurement order.
    pub fn results(&self) -> &[InspectionResult] {
        &self.results
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    /// Fraction of recorded results that failed; 0.0 when nothing was recorded.
    pub fn defect_rate(&self) -> f64 {
        QualityService::calculate_defect_rate(&self.results)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the measured values recorded against `standard_code`, in order.
    pub fn measurements_for(&self, standard_code: &str) -> Vec<MeasuredValue> {
        self.results
            .iter()
            .filter(|r| r.standard().standard_code() == standard_code)
            .map(|r| r.measured_value().clone())
            .collect()
    }

    /// Runs the SPC run rule over the measurements for `standard_code`.
    ///
    /// The center line is taken from the first result recorded against that
    /// standard. Returns None when no drift is found or nothing was recorded.
    pub fn trend_for(&self, standard_code: &str) -> Option<TrendRun> {
        let standard = self
            .results
            .iter()
            .map(InspectionResult::standard)
            .find(|s| s.standard_code() == standard_code)?;
        QualityService::find_trend(&self.measurements_for(standard_code), standard)
    }
}

// Command methods
impl InspectionOrder {
    /// Moves a pending order into progress.
    pub fn start_inspection(&mut self) -> Result<(), InspectionError> {
        if !self.status.can_start() {
            return Err(self.invalid_transition("start inspection", InspectionStatus::Pending));
        }

        self.status = InspectionStatus::InProgress;
        self.events.push(InspectionEvent::order_created(
            self.id,
            self.work_order_id.clone(),
            self.product_code.clone(),
            self.inspection_type,
        ));
        Ok(())
    }

    /// Records a measurement. A failing measurement raises `DefectDetected`
    /// without a defect code.
    pub fn record_result(
        &mut self,
        standard: QualityStandard,
        measured_value: MeasuredValue,
    ) -> Result<&InspectionResult, InspectionError> {
        self.push_result(standard, measured_value, None)
    }

    /// Records a measurement annotated with a defect detail.
    ///
    /// The detail is kept even when the measurement passes; only a failing
    /// measurement raises `DefectDetected`, carrying the detail's code.
    pub fn record_result_with_defect(
        &mut self,
        standard: QualityStandard,
        measured_value: MeasuredValue,
        defect_detail: DefectDetail,
    ) -> Result<&InspectionResult, InspectionError> {
        self.push_result(standard, measured_value, Some(defect_detail))
    }

    /// Decides the verdict for the order.
    ///
    /// Any failing result fails the order. Independently, a defect rate above
    /// the threshold raises `QualityAlert`. `InspectionCompleted` is always
    /// the last event raised.
    pub fn complete(&mut self) -> Result<InspectionStatus, InspectionError> {
        if !self.status.can_complete() {
            return Err(self.invalid_transition("complete", InspectionStatus::InProgress));
        }

        if self.results.is_empty() {
            return Err(InspectionError::NoResults);
        }

        let defect_rate = self.defect_rate();
        self.status = if defect_rate > 0.0 {
            InspectionStatus::Failed
        } else {
            InspectionStatus::Passed
        };

        if defect_rate > self.defect_rate_threshold {
            self.events.push(InspectionEvent::quality_alert(
                self.id,
                defect_rate,
                self.product_code.clone(),
            ));
        }

        self.events.push(InspectionEvent::inspection_completed(
            self.id,
            self.status,
            defect_rate,
        ));
        Ok(self.status)
    }

    /// Suspends an order in progress. Raises no event.
    pub fn put_on_hold(&mut self, reason: impl Into<String>) -> Result<(), InspectionError> {
        if !self.status.can_hold() {
            return Err(self.invalid_transition("put on hold", InspectionStatus::InProgress));
        }

        self.status = InspectionStatus::OnHold;
        self.hold_reason = Some(reason.into());
        Ok(())
    }
}

// Helpers
impl InspectionOrder {
    fn push_result(
        &mut self,
        standard: QualityStandard,
        measured_value: MeasuredValue,
        defect_detail: Option<DefectDetail>,
    ) -> Result<&InspectionResult, InspectionError> {
        if !self.status.can_record() {
            return Err(self.invalid_transition("record result", InspectionStatus::InProgress));
        }

        if !measured_value.is_finite() {
            return Err(InspectionError::InvalidMeasurement {
                standard_code: standard.standard_code().to_string(),
                value: measured_value.value(),
            });
        }

        let result = InspectionResult::new(standard, measured_value, defect_detail);
        if !result.passed() {
            self.events.push(InspectionEvent::defect_detected(
                self.id,
                result.defect_detail().map(|d| d.defect_code().to_string()),
                result.standard().standard_code(),
            ));
        }

        self.results.push(result);
        Ok(&self.results[self.results.len() - 1])
    }

    fn invalid_transition(
        &self,
        action: &'static str,
        expected: InspectionStatus,
    ) -> InspectionError {
        InspectionError::InvalidStateTransition {
            action,
            current: self.status,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use crate::inspection::Severity;

    fn started_order(threshold: f64) -> InspectionOrder {
        let mut order =
            InspectionOrder::new("WO-100", "SHAFT-10", InspectionType::Final, threshold).unwrap();
        order.start_inspection().unwrap();
        order.clear_events();
        order
    }

    fn diameter() -> QualityStandard {
        QualityStandard::new("DIA-10", 9.95, 10.05, "mm").unwrap()
    }

    fn measure(value: f64) -> MeasuredValue {
        MeasuredValue::new(value, "mm", "inspector-1")
    }

    fn event_types(order: &InspectionOrder) -> Vec<&'static str> {
        order.pending_events().iter().map(|e| e.event_type()).collect()
    }

    #[test]
    fn new_order_is_pending_with_no_results() {
        let order = InspectionOrder::with_default_threshold("WO-1", "P-1", InspectionType::Incoming);
        assert_eq!(order.status(), InspectionStatus::Pending);
        assert_eq!(order.defect_rate_threshold(), DEFAULT_DEFECT_RATE_THRESHOLD);
        assert_eq!(order.result_count(), 0);
        assert_eq!(order.defect_rate(), 0.0);
        assert!(!order.has_pending_events());
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        for threshold in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let result = InspectionOrder::new("WO-1", "P-1", InspectionType::Final, threshold);
            assert!(matches!(
                result,
                Err(InspectionError::InvalidThreshold { .. })
            ));
        }
        assert!(InspectionOrder::new("WO-1", "P-1", InspectionType::Final, 0.0).is_ok());
        assert!(InspectionOrder::new("WO-1", "P-1", InspectionType::Final, 1.0).is_ok());
    }

    #[test]
    fn non_finite_measurement_is_rejected_without_recording() {
        let mut order = started_order(0.1);
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = order.record_result(diameter(), measure(value));
            assert!(matches!(
                result,
                Err(InspectionError::InvalidMeasurement { ref standard_code, .. }) if standard_code == "DIA-10"
            ));
        }
        assert_eq!(order.result_count(), 0);
        assert!(!order.has_pending_events());
        assert_eq!(order.status(), InspectionStatus::InProgress);
    }

    #[test]
    fn start_inspection_emits_created_event() {
        let mut order =
            InspectionOrder::new("WO-100", "SHAFT-10", InspectionType::Sampling, 0.1).unwrap();
        order.start_inspection().unwrap();

        assert_eq!(order.status(), InspectionStatus::InProgress);
        let events = order.pending_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            InspectionEvent::InspectionOrderCreated(data) => {
                assert_eq!(data.order_id, order.id());
                assert_eq!(data.work_order_id, "WO-100");
                assert_eq!(data.product_code, "SHAFT-10");
                assert_eq!(data.inspection_type, InspectionType::Sampling);
            }
            other => panic!("expected InspectionOrderCreated, got {other:?}"),
        }
    }

    #[test]
    fn start_twice_is_a_state_conflict() {
        let mut order = started_order(0.1);
        let result = order.start_inspection();
        assert!(matches!(
            result,
            Err(InspectionError::InvalidStateTransition {
                current: InspectionStatus::InProgress,
                expected: InspectionStatus::Pending,
                ..
            })
        ));
        assert!(!order.has_pending_events());
    }

    #[test]
    fn recording_requires_in_progress() {
        let mut order = InspectionOrder::with_default_threshold("WO-1", "P-1", InspectionType::Final);
        let result = order.record_result(diameter(), measure(10.0));
        assert!(matches!(
            result,
            Err(InspectionError::InvalidStateTransition {
                current: InspectionStatus::Pending,
                ..
            })
        ));
        assert_eq!(order.result_count(), 0);
    }

    #[test]
    fn passing_result_raises_no_event() {
        let mut order = started_order(0.1);
        let passed = order.record_result(diameter(), measure(10.0)).unwrap().passed();
        assert!(passed);
        assert_eq!(order.result_count(), 1);
        assert!(!order.has_pending_events());
    }

    #[test]
    fn failing_result_raises_defect_without_code() {
        let mut order = started_order(0.1);
        let passed = order.record_result(diameter(), measure(10.2)).unwrap().passed();
        assert!(!passed);

        match &order.pending_events()[0] {
            InspectionEvent::DefectDetected(data) => {
                assert_eq!(data.order_id, order.id());
                assert_eq!(data.defect_code, None);
                assert_eq!(data.standard_code, "DIA-10");
            }
            other => panic!("expected DefectDetected, got {other:?}"),
        }
    }

    #[test]
    fn failing_result_with_defect_carries_code() {
        let mut order = started_order(0.1);
        let detail = DefectDetail::new("OVS-2", "OVERSIZE", Severity::Major, None);
        order
            .record_result_with_defect(diameter(), measure(10.3), detail)
            .unwrap();

        match &order.pending_events()[0] {
            InspectionEvent::DefectDetected(data) => {
                assert_eq!(data.defect_code.as_deref(), Some("OVS-2"));
            }
            other => panic!("expected DefectDetected, got {other:?}"),
        }
    }

    #[test]
    fn passing_result_with_defect_keeps_detail_silently() {
        let mut order = started_order(0.1);
        let detail = DefectDetail::new(
            "COS-1",
            "COSMETIC",
            Severity::Minor,
            Some("light burr".to_string()),
        );
        let result = order
            .record_result_with_defect(diameter(), measure(10.0), detail)
            .unwrap();

        assert!(result.passed());
        assert_eq!(result.defect_detail().unwrap().defect_code(), "COS-1");
        assert!(!order.has_pending_events());
    }

    #[test]
    fn boundary_measurements_pass() {
        let mut order = started_order(0.1);
        order.record_result(diameter(), measure(9.95)).unwrap();
        order.record_result(diameter(), measure(10.05)).unwrap();
        assert_eq!(order.failed_count(), 0);
    }

    #[test]
    fn results_keep_insertion_order() {
        let mut order = started_order(0.1);
        for value in [10.01, 9.99, 10.2] {
            order.record_result(diameter(), measure(value)).unwrap();
        }
        let values: Vec<f64> = order
            .results()
            .iter()
            .map(|r| r.measured_value().value())
            .collect();
        assert_eq!(values, vec![10.01, 9.99, 10.2]);
    }

    #[test]
    fn single_passing_result_passes_order() {
        let mut order = started_order(0.1);
        order.record_result(diameter(), measure(10.00)).unwrap();

        let status = order.complete().unwrap();

        assert_eq!(status, InspectionStatus::Passed);
        assert_eq!(order.defect_rate(), 0.0);
        assert_eq!(event_types(&order), vec!["InspectionCompleted"]);
        assert!(order.is_terminal());
    }

    #[test]
    fn defect_rate_above_threshold_fails_and_alerts() {
        let mut order = started_order(0.10);
        for _ in 0..8 {
            order.record_result(diameter(), measure(10.0)).unwrap();
        }
        for _ in 0..2 {
            order.record_result(diameter(), measure(10.5)).unwrap();
        }
        order.clear_events();

        let status = order.complete().unwrap();

        assert_eq!(status, InspectionStatus::Failed);
        assert_eq!(order.defect_rate(), 0.2);
        assert_eq!(event_types(&order), vec!["QualityAlert", "InspectionCompleted"]);
        match &order.pending_events()[0] {
            InspectionEvent::QualityAlert(data) => {
                assert_eq!(data.defect_rate, 0.2);
                assert_eq!(data.product_code, "SHAFT-10");
            }
            other => panic!("expected QualityAlert, got {other:?}"),
        }
        match &order.pending_events()[1] {
            InspectionEvent::InspectionCompleted(data) => {
                assert_eq!(data.status, InspectionStatus::Failed);
                assert_eq!(data.defect_rate, 0.2);
            }
            other => panic!("expected InspectionCompleted, got {other:?}"),
        }
    }

    #[test]
    fn defect_rate_below_threshold_fails_without_alert() {
        let mut order = started_order(0.10);
        for _ in 0..19 {
            order.record_result(diameter(), measure(10.0)).unwrap();
        }
        order.record_result(diameter(), measure(11.0)).unwrap();
        order.clear_events();

        let status = order.complete().unwrap();

        assert_eq!(status, InspectionStatus::Failed);
        assert_eq!(order.defect_rate(), 0.05);
        assert_eq!(event_types(&order), vec!["InspectionCompleted"]);
    }

    #[test]
    fn defect_rate_equal_to_threshold_does_not_alert() {
        let mut order = started_order(0.5);
        order.record_result(diameter(), measure(10.0)).unwrap();
        order.record_result(diameter(), measure(11.0)).unwrap();
        order.clear_events();

        order.complete().unwrap();
        assert_eq!(event_types(&order), vec!["InspectionCompleted"]);
    }

    #[test]
    fn zero_threshold_alerts_on_any_defect() {
        let mut order = started_order(0.0);
        order.record_result(diameter(), measure(11.0)).unwrap();
        order.clear_events();

        order.complete().unwrap();
        assert_eq!(event_types(&order), vec!["QualityAlert", "InspectionCompleted"]);
    }

    #[test]
    fn complete_without_results_is_business_rule_violation() {
        let mut order = started_order(0.1);
        let result = order.complete();

        assert!(matches!(result, Err(InspectionError::NoResults)));
        assert_eq!(order.status(), InspectionStatus::InProgress);
        assert!(!order.has_pending_events());
    }

    #[test]
    fn complete_requires_in_progress() {
        let mut order = InspectionOrder::with_default_threshold("WO-1", "P-1", InspectionType::Final);
        assert!(matches!(
            order.complete(),
            Err(InspectionError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn completed_order_is_closed() {
        let mut order = started_order(0.1);
        order.record_result(diameter(), measure(10.0)).unwrap();
        order.complete().unwrap();

        assert!(order.record_result(diameter(), measure(10.0)).is_err());
        assert!(order.complete().is_err());
        assert!(order.put_on_hold("late").is_err());
        assert!(order.start_inspection().is_err());
        assert_eq!(order.result_count(), 1);
    }

    #[test]
    fn put_on_hold_keeps_reason_and_emits_nothing() {
        let mut order = started_order(0.1);
        order.put_on_hold("gauge out of calibration").unwrap();

        assert_eq!(order.status(), InspectionStatus::OnHold);
        assert_eq!(order.hold_reason(), Some("gauge out of calibration"));
        assert!(!order.has_pending_events());
    }

    #[test]
    fn held_order_accepts_no_work() {
        let mut order = started_order(0.1);
        order.put_on_hold("material missing").unwrap();

        assert!(matches!(
            order.record_result(diameter(), measure(10.0)),
            Err(InspectionError::InvalidStateTransition {
                current: InspectionStatus::OnHold,
                ..
            })
        ));
        assert!(order.complete().is_err());
        assert!(order.put_on_hold("again").is_err());
        assert!(order.start_inspection().is_err());
    }

    #[test]
    fn hold_requires_in_progress() {
        let mut order = InspectionOrder::with_default_threshold("WO-1", "P-1", InspectionType::Final);
        assert!(order.put_on_hold("why").is_err());
        assert_eq!(order.status(), InspectionStatus::Pending);
    }

    #[test]
    fn defect_rate_stays_in_unit_interval() {
        let mut order = started_order(0.1);
        for value in [11.0, 12.0, 13.0] {
            order.record_result(diameter(), measure(value)).unwrap();
            let rate = order.defect_rate();
            assert!((0.0..=1.0).contains(&rate));
        }
        assert_eq!(order.defect_rate(), 1.0);
    }

    #[test]
    fn trend_for_uses_only_matching_standard() {
        let mut order = started_order(0.1);
        let length = QualityStandard::new("LEN-50", 49.0, 51.0, "mm").unwrap();
        for _ in 0..7 {
            order.record_result(diameter(), measure(10.01)).unwrap();
            order
                .record_result(length.clone(), MeasuredValue::new(50.0, "mm", "inspector-1"))
                .unwrap();
        }

        assert!(order.trend_for("DIA-10").is_some());
        assert!(order.trend_for("LEN-50").is_none());
        assert!(order.trend_for("UNKNOWN").is_none());
        assert_eq!(order.measurements_for("LEN-50").len(), 7);
    }

    #[test]
    fn serialization_skips_event_buffer() {
        let mut order = started_order(0.1);
        order.record_result(diameter(), measure(10.2)).unwrap();
        assert!(order.has_pending_events());

        let json = serde_json::to_string(&order).unwrap();
        let restored: InspectionOrder = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id(), order.id());
        assert_eq!(restored.status(), InspectionStatus::InProgress);
        assert_eq!(restored.result_count(), 1);
        assert!(!restored.results()[0].passed());
        assert!(!restored.has_pending_events());
    }
}
