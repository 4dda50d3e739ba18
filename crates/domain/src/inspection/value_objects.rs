//! Value objects for the inspection domain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InspectionError;

/// Accept band for one measured characteristic.
///
/// Both bounds are inclusive. Construction rejects non-finite bounds and
/// `lower_bound > upper_bound`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStandard {
    standard_code: String,
    lower_bound: f64,
    upper_bound: f64,
    unit: String,
}

impl QualityStandard {
    /// Creates a standard, validating that the band is finite and not inverted.
    pub fn new(
        standard_code: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
        unit: impl Into<String>,
    ) -> Result<Self, InspectionError> {
        let standard_code = standard_code.into();
        if !lower_bound.is_finite() || !upper_bound.is_finite() || lower_bound > upper_bound {
            return Err(InspectionError::InvalidStandard {
                standard_code,
                lower_bound,
                upper_bound,
            });
        }

        Ok(Self {
            standard_code,
            lower_bound,
            upper_bound,
            unit: unit.into(),
        })
    }

    pub fn standard_code(&self) -> &str {
        &self.standard_code
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Center line of the band, used by the SPC run rule.
    pub fn mean(&self) -> f64 {
        self.lower_bound / 2.0 + self.upper_bound / 2.0
    }

    /// Returns true if `value` lies inside the band, bounds included.
    pub fn accepts(&self, value: f64) -> bool {
        self.lower_bound <= value && value <= self.upper_bound
    }
}

/// One observation against a standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredValue {
    value: f64,
    unit: String,
    measured_at: DateTime<Utc>,
    inspector: String,
}

impl MeasuredValue {
    /// Creates a measurement taken now.
    pub fn new(value: f64, unit: impl Into<String>, inspector: impl Into<String>) -> Self {
        Self::at(value, unit, Utc::now(), inspector)
    }

    /// Creates a measurement taken at a specific time.
    pub fn at(
        value: f64,
        unit: impl Into<String>,
        measured_at: DateTime<Utc>,
        inspector: impl Into<String>,
    ) -> Self {
        Self {
            value,
            unit: unit.into(),
            measured_at,
            inspector: inspector.into(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn measured_at(&self) -> DateTime<Utc> {
        self.measured_at
    }

    pub fn inspector(&self) -> &str {
        &self.inspector
    }

    /// Returns false for NaN and infinite values, which cannot be recorded.
    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// Returns true if the value lies inside the standard's band, bounds included.
    pub fn is_within_standard(&self, standard: &QualityStandard) -> bool {
        standard.accepts(self.value)
    }
}

/// Severity of a recorded defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = InspectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MINOR" => Ok(Severity::Minor),
            "MAJOR" => Ok(Severity::Major),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(InspectionError::UnknownSeverity {
                value: s.to_string(),
            }),
        }
    }
}

/// Descriptive tag attached to an observation.
///
/// Usually accompanies a failing result, but may also annotate a passing one
/// (e.g. a cosmetic note within tolerance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectDetail {
    defect_code: String,
    defect_type: String,
    severity: Severity,
    description: Option<String>,
}

impl DefectDetail {
    pub fn new(
        defect_code: impl Into<String>,
        defect_type: impl Into<String>,
        severity: Severity,
        description: Option<String>,
    ) -> Self {
        Self {
            defect_code: defect_code.into(),
            defect_type: defect_type.into(),
            severity,
            description,
        }
    }

    pub fn defect_code(&self) -> &str {
        &self.defect_code
    }

    pub fn defect_type(&self) -> &str {
        &self.defect_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
