//! Inspection order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod result;
mod service;
mod state;
mod value_objects;

pub use aggregate::{DEFAULT_DEFECT_RATE_THRESHOLD, InspectionOrder};
pub use commands::*;
pub use events::{
    DefectDetectedData, InspectionCompletedData, InspectionEvent, InspectionOrderCreatedData,
    QualityAlertData,
};
pub use result::InspectionResult;
#[cfg(test)]
pub(crate) use result::result_for_test;
pub use service::InspectionService;
pub use state::{InspectionStatus, InspectionType};
pub use value_objects::{DefectDetail, MeasuredValue, QualityStandard, Severity};

use thiserror::Error;

/// Broad classes of inspection errors, for adapters that map errors to
/// responses without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The order is not in a status that permits the operation.
    StateConflict,
    /// The order is in the right status but lacks required data.
    BusinessRule,
    /// An input value is malformed.
    Validation,
}

/// Errors that can occur during inspection operations.
#[derive(Debug, Error)]
pub enum InspectionError {
    /// The order is not in the status the operation requires.
    #[error("Cannot {action}: current status is {current}, expected {expected}")]
    InvalidStateTransition {
        action: &'static str,
        current: InspectionStatus,
        expected: InspectionStatus,
    },

    /// Completion was requested before any result was recorded.
    #[error("Cannot complete without any results")]
    NoResults,

    /// Lower bound above upper bound, or a bound that is not finite.
    #[error(
        "Invalid quality standard {standard_code}: bounds [{lower_bound}, {upper_bound}] must be finite and ordered"
    )]
    InvalidStandard {
        standard_code: String,
        lower_bound: f64,
        upper_bound: f64,
    },

    /// Measured value that is NaN or infinite.
    #[error("Invalid measurement for {standard_code}: {value} is not a finite number")]
    InvalidMeasurement { standard_code: String, value: f64 },

    /// Alert threshold outside [0, 1].
    #[error("Invalid defect rate threshold: {threshold} (must be between 0 and 1)")]
    InvalidThreshold { threshold: f64 },

    #[error("Unknown defect severity: {value}")]
    UnknownSeverity { value: String },

    #[error("Unknown inspection type: {value}")]
    UnknownInspectionType { value: String },
}

impl InspectionError {
    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            InspectionError::InvalidStateTransition { .. } => ErrorCategory::StateConflict,
            InspectionError::NoResults => ErrorCategory::BusinessRule,
            InspectionError::InvalidStandard { .. }
            | InspectionError::InvalidMeasurement { .. }
            | InspectionError::InvalidThreshold { .. }
            | InspectionError::UnknownSeverity { .. }
            | InspectionError::UnknownInspectionType { .. } => ErrorCategory::Validation,
        }
    }
}
