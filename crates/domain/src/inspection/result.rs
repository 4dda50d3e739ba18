//! Inspection result entity.

use common::ResultId;
use serde::{Deserialize, Serialize};

use super::{DefectDetail, MeasuredValue, QualityStandard};

/// One recorded measurement with its standard and verdict.
///
/// `passed` is decided once, when the result is created, and never
/// re-evaluated. Only [`InspectionOrder`](super::InspectionOrder) creates
/// results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionResult {
    id: ResultId,
    standard: QualityStandard,
    measured_value: MeasuredValue,
    passed: bool,
    defect_detail: Option<DefectDetail>,
}

impl InspectionResult {
    pub(super) fn new(
        standard: QualityStandard,
        measured_value: MeasuredValue,
        defect_detail: Option<DefectDetail>,
    ) -> Self {
        let passed = measured_value.is_within_standard(&standard);
        Self {
            id: ResultId::new(),
            standard,
            measured_value,
            passed,
            defect_detail,
        }
    }

    pub fn id(&self) -> ResultId {
        self.id
    }

    pub fn standard(&self) -> &QualityStandard {
        &self.standard
    }

    pub fn measured_value(&self) -> &MeasuredValue {
        &self.measured_value
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn defect_detail(&self) -> Option<&DefectDetail> {
        self.defect_detail.as_ref()
    }
}

#[cfg(test)]
pub(crate) fn result_for_test(value: f64, lower: f64, upper: f64) -> InspectionResult {
    let standard = QualityStandard::new("T", lower, upper, "mm").unwrap();
    InspectionResult::new(standard, MeasuredValue::new(value, "mm", "test"), None)
}
