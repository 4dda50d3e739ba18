//! Inspection commands.

use common::AggregateId;

use crate::command::Command;

use super::{
    DefectDetail, InspectionError, InspectionOrder, InspectionType, MeasuredValue,
    QualityStandard, Severity,
};

/// Command to create an inspection order and start it.
#[derive(Debug, Clone)]
pub struct CreateInspection {
    pub work_order_id: String,
    pub product_code: String,
    pub inspection_type: InspectionType,

    /// Alert threshold; the service default applies when None.
    pub defect_rate_threshold: Option<f64>,
}

impl CreateInspection {
    pub fn new(
        work_order_id: impl Into<String>,
        product_code: impl Into<String>,
        inspection_type: InspectionType,
    ) -> Self {
        Self {
            work_order_id: work_order_id.into(),
            product_code: product_code.into(),
            inspection_type,
            defect_rate_threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.defect_rate_threshold = Some(threshold);
        self
    }
}

/// Defect fields optionally supplied with a measurement.
#[derive(Debug, Clone)]
pub struct DefectInput {
    pub defect_code: String,
    pub defect_type: String,
    pub severity: String,
    pub description: Option<String>,
}

impl DefectInput {
    pub fn new(
        defect_code: impl Into<String>,
        defect_type: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            defect_code: defect_code.into(),
            defect_type: defect_type.into(),
            severity: severity.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds the defect detail, parsing the severity.
    pub fn to_defect_detail(&self) -> Result<DefectDetail, InspectionError> {
        let severity: Severity = self.severity.parse()?;
        Ok(DefectDetail::new(
            self.defect_code.clone(),
            self.defect_type.clone(),
            severity,
            self.description.clone(),
        ))
    }
}

/// Command to record one measurement against a standard.
#[derive(Debug, Clone)]
pub struct RecordResult {
    pub order_id: AggregateId,
    pub standard_code: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub unit: String,
    pub measured_value: f64,
    pub measured_unit: String,
    pub inspector: String,
    pub defect: Option<DefectInput>,
}

impl RecordResult {
    /// Creates a command whose measurement uses the standard's unit.
    pub fn new(
        order_id: AggregateId,
        standard_code: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
        unit: impl Into<String>,
        measured_value: f64,
        inspector: impl Into<String>,
    ) -> Self {
        let unit = unit.into();
        Self {
            order_id,
            standard_code: standard_code.into(),
            lower_bound,
            upper_bound,
            measured_unit: unit.clone(),
            unit,
            measured_value,
            inspector: inspector.into(),
            defect: None,
        }
    }

    pub fn measured_in(mut self, unit: impl Into<String>) -> Self {
        self.measured_unit = unit.into();
        self
    }

    pub fn with_defect(mut self, defect: DefectInput) -> Self {
        self.defect = Some(defect);
        self
    }

    pub fn to_standard(&self) -> Result<QualityStandard, InspectionError> {
        QualityStandard::new(
            self.standard_code.clone(),
            self.lower_bound,
            self.upper_bound,
            self.unit.clone(),
        )
    }

    pub fn to_measured_value(&self) -> MeasuredValue {
        MeasuredValue::new(
            self.measured_value,
            self.measured_unit.clone(),
            self.inspector.clone(),
        )
    }
}

impl Command for RecordResult {
    type Aggregate = InspectionOrder;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to decide the verdict of an order.
#[derive(Debug, Clone)]
pub struct CompleteInspection {
    pub order_id: AggregateId,
}

impl CompleteInspection {
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

impl Command for CompleteInspection {
    type Aggregate = InspectionOrder;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to suspend an order in progress.
#[derive(Debug, Clone)]
pub struct PutOnHold {
    pub order_id: AggregateId,
    pub reason: String,
}

impl PutOnHold {
    pub fn new(order_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

impl Command for PutOnHold {
    type Aggregate = InspectionOrder;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}
