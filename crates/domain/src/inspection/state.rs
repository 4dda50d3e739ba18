//! Inspection status machine and inspection kinds.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::InspectionError;

/// The status of an inspection order.
///
/// ```text
/// Pending ──► InProgress ──┬──► Passed
///                          ├──► Failed
///                          └──► OnHold
/// ```
///
/// Passed and Failed are terminal. No transition leaves OnHold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    /// Created, not yet started.
    #[default]
    Pending,

    /// Results may be recorded.
    InProgress,

    /// Completed with no failing result.
    Passed,

    /// Completed with at least one failing result.
    Failed,

    /// Suspended by an operator.
    OnHold,
}

impl InspectionStatus {
    pub fn can_start(&self) -> bool {
        matches!(self, InspectionStatus::Pending)
    }

    /// Returns true if results can be recorded in this status.
    pub fn can_record(&self) -> bool {
        matches!(self, InspectionStatus::InProgress)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, InspectionStatus::InProgress)
    }

    pub fn can_hold(&self) -> bool {
        matches!(self, InspectionStatus::InProgress)
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InspectionStatus::Passed | InspectionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Pending => "PENDING",
            InspectionStatus::InProgress => "IN_PROGRESS",
            InspectionStatus::Passed => "PASSED",
            InspectionStatus::Failed => "FAILED",
            InspectionStatus::OnHold => "ON_HOLD",
        }
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of inspection being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionType {
    /// Inspection of received material.
    Incoming,
    /// Inspection between production steps.
    InProcess,
    /// Inspection of finished goods.
    Final,
    /// Inspection of a sample drawn from a batch.
    Sampling,
}

impl InspectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionType::Incoming => "INCOMING",
            InspectionType::InProcess => "IN_PROCESS",
            InspectionType::Final => "FINAL",
            InspectionType::Sampling => "SAMPLING",
        }
    }
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectionType {
    type Err = InspectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "INCOMING" => Ok(InspectionType::Incoming),
            "IN_PROCESS" => Ok(InspectionType::InProcess),
            "FINAL" => Ok(InspectionType::Final),
            "SAMPLING" => Ok(InspectionType::Sampling),
            _ => Err(InspectionError::UnknownInspectionType {
                value: s.to_string(),
            }),
        }
    }
}
