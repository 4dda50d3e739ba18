//! Inspection domain events.

use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{InspectionStatus, InspectionType};

/// Events raised by an inspection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InspectionEvent {
    /// The order was started.
    InspectionOrderCreated(InspectionOrderCreatedData),

    /// A recorded result fell outside its standard.
    DefectDetected(DefectDetectedData),

    /// The order reached a final verdict.
    InspectionCompleted(InspectionCompletedData),

    /// The defect rate exceeded the order's alert threshold.
    QualityAlert(QualityAlertData),
}

impl DomainEvent for InspectionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InspectionEvent::InspectionOrderCreated(_) => "InspectionOrderCreated",
            InspectionEvent::DefectDetected(_) => "DefectDetected",
            InspectionEvent::InspectionCompleted(_) => "InspectionCompleted",
            InspectionEvent::QualityAlert(_) => "QualityAlert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionOrderCreatedData {
    pub order_id: AggregateId,
    pub work_order_id: String,
    pub product_code: String,
    pub inspection_type: InspectionType,
}

/// Data for DefectDetected.
///
/// `defect_code` is null when the result was recorded without defect details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectDetectedData {
    pub order_id: AggregateId,
    pub defect_code: Option<String>,
    pub standard_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionCompletedData {
    pub order_id: AggregateId,
    pub status: InspectionStatus,
    pub defect_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAlertData {
    pub order_id: AggregateId,
    pub defect_rate: f64,
    pub product_code: String,
}

impl InspectionEvent {
    pub fn order_created(
        order_id: AggregateId,
        work_order_id: impl Into<String>,
        product_code: impl Into<String>,
        inspection_type: InspectionType,
    ) -> Self {
        InspectionEvent::InspectionOrderCreated(InspectionOrderCreatedData {
            order_id,
            work_order_id: work_order_id.into(),
            product_code: product_code.into(),
            inspection_type,
        })
    }

    pub fn defect_detected(
        order_id: AggregateId,
        defect_code: Option<String>,
        standard_code: impl Into<String>,
    ) -> Self {
        InspectionEvent::DefectDetected(DefectDetectedData {
            order_id,
            defect_code,
            standard_code: standard_code.into(),
        })
    }

    pub fn inspection_completed(
        order_id: AggregateId,
        status: InspectionStatus,
        defect_rate: f64,
    ) -> Self {
        InspectionEvent::InspectionCompleted(InspectionCompletedData {
            order_id,
            status,
            defect_rate,
        })
    }

    pub fn quality_alert(
        order_id: AggregateId,
        defect_rate: f64,
        product_code: impl Into<String>,
    ) -> Self {
        InspectionEvent::QualityAlert(QualityAlertData {
            order_id,
            defect_rate,
            product_code: product_code.into(),
        })
    }

    /// Returns the order this event belongs to.
    pub fn order_id(&self) -> AggregateId {
        match self {
            InspectionEvent::InspectionOrderCreated(data) => data.order_id,
            InspectionEvent::DefectDetected(data) => data.order_id,
            InspectionEvent::InspectionCompleted(data) => data.order_id,
            InspectionEvent::QualityAlert(data) => data.order_id,
        }
    }
}
