//! Domain layer for quality inspection.
//!
//! This crate provides:
//! - AggregateRoot trait for state-stored aggregates that buffer events
//! - CommandHandler for load, mutate, save and publish
//! - The InspectionOrder aggregate and its InspectionService facade
//! - QualityService for defect rates and the SPC run rule

pub mod aggregate;
pub mod command;
pub mod error;
pub mod inspection;
pub mod quality;

pub use aggregate::{AggregateRoot, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use inspection::{
    CompleteInspection, CreateInspection, DEFAULT_DEFECT_RATE_THRESHOLD, DefectDetail,
    DefectInput, ErrorCategory, InspectionError, InspectionEvent, InspectionOrder,
    InspectionResult, InspectionService, InspectionStatus, InspectionType, MeasuredValue,
    PutOnHold, QualityStandard, RecordResult, Severity,
};
pub use quality::{QualityService, SPC_RUN_LENGTH, Side, TrendRun};
