//! JSON-lines command requests.
//!
//! Each input line is one object tagged by `"command"`:
//!
//! ```json
//! {"command":"create","workOrderId":"WO-1","productCode":"BOLT-M8","inspectionType":"FINAL"}
//! {"command":"record","orderRef":0,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.0,"inspector":"kim"}
//! {"command":"record","orderRef":0,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.3,"inspector":"kim","defectCode":"OVS-1","defectType":"OVERSIZE","severity":"MAJOR"}
//! {"command":"complete","orderRef":0}
//! ```

use common::AggregateId;
use domain::{
    CreateInspection, DefectInput, InspectionError, InspectionType, PutOnHold, RecordResult,
};
use serde::Deserialize;

use crate::error::RunnerError;

/// One input line.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum CommandRequest {
    Create(CreateRequest),
    Record(RecordRequest),
    Complete(CompleteRequest),
    Hold(HoldRequest),
    Spc(SpcRequest),
}

/// Names the order a command targets.
///
/// `order_ref` is the zero-based position of a create command among the
/// create commands of the same batch. `order_id` wins when both are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTarget {
    pub order_id: Option<AggregateId>,
    pub order_ref: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRequest {
    pub work_order_id: String,
    pub product_code: String,
    pub inspection_type: String,
    pub defect_rate_threshold: Option<f64>,
}

impl CreateRequest {
    pub fn to_command(&self) -> Result<CreateInspection, InspectionError> {
        let inspection_type: InspectionType = self.inspection_type.parse()?;
        let mut cmd = CreateInspection::new(
            self.work_order_id.clone(),
            self.product_code.clone(),
            inspection_type,
        );
        if let Some(threshold) = self.defect_rate_threshold {
            cmd = cmd.with_threshold(threshold);
        }
        Ok(cmd)
    }
}

/// A measurement line. The defect fields sit next to the measurement and
/// are all optional; `defectCode` is required once any of them is given.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordRequest {
    pub order_id: Option<AggregateId>,
    pub order_ref: Option<usize>,
    pub standard_code: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub unit: String,
    pub measured_value: f64,
    /// Defaults to the standard's unit.
    pub measured_unit: Option<String>,
    pub inspector: String,
    pub defect_code: Option<String>,
    pub defect_type: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
}

impl RecordRequest {
    pub fn target(&self) -> OrderTarget {
        OrderTarget {
            order_id: self.order_id,
            order_ref: self.order_ref,
        }
    }

    pub fn to_command(&self, order_id: AggregateId) -> Result<RecordResult, RunnerError> {
        let mut cmd = RecordResult::new(
            order_id,
            self.standard_code.clone(),
            self.lower_bound,
            self.upper_bound,
            self.unit.clone(),
            self.measured_value,
            self.inspector.clone(),
        );
        if let Some(unit) = &self.measured_unit {
            cmd = cmd.measured_in(unit.clone());
        }
        if let Some(defect) = self.defect_input()? {
            cmd = cmd.with_defect(defect);
        }
        Ok(cmd)
    }

    fn defect_input(&self) -> Result<Option<DefectInput>, RunnerError> {
        let Some(defect_code) = &self.defect_code else {
            if self.defect_type.is_some() || self.severity.is_some() || self.description.is_some()
            {
                return Err(RunnerError::IncompleteDefect("defectCode"));
            }
            return Ok(None);
        };
        let defect_type = self
            .defect_type
            .clone()
            .ok_or(RunnerError::IncompleteDefect("defectType"))?;
        let severity = self
            .severity
            .clone()
            .ok_or(RunnerError::IncompleteDefect("severity"))?;

        let mut input = DefectInput::new(defect_code.clone(), defect_type, severity);
        if let Some(description) = &self.description {
            input = input.with_description(description.clone());
        }
        Ok(Some(input))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompleteRequest {
    pub order_id: Option<AggregateId>,
    pub order_ref: Option<usize>,
}

impl CompleteRequest {
    pub fn target(&self) -> OrderTarget {
        OrderTarget {
            order_id: self.order_id,
            order_ref: self.order_ref,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HoldRequest {
    pub order_id: Option<AggregateId>,
    pub order_ref: Option<usize>,
    pub reason: String,
}

impl HoldRequest {
    pub fn target(&self) -> OrderTarget {
        OrderTarget {
            order_id: self.order_id,
            order_ref: self.order_ref,
        }
    }

    pub fn to_command(&self, order_id: AggregateId) -> PutOnHold {
        PutOnHold::new(order_id, self.reason.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpcRequest {
    pub order_id: Option<AggregateId>,
    pub order_ref: Option<usize>,
    pub standard_code: String,
}

impl SpcRequest {
    pub fn target(&self) -> OrderTarget {
        OrderTarget {
            order_id: self.order_id,
            order_ref: self.order_ref,
        }
    }
}

impl CommandRequest {
    /// Returns the order this request targets; None for create.
    pub fn target(&self) -> Option<OrderTarget> {
        match self {
            CommandRequest::Create(_) => None,
            CommandRequest::Record(r) => Some(r.target()),
            CommandRequest::Complete(r) => Some(r.target()),
            CommandRequest::Hold(r) => Some(r.target()),
            CommandRequest::Spc(r) => Some(r.target()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandRequest::Create(_) => "create",
            CommandRequest::Record(_) => "record",
            CommandRequest::Complete(_) => "complete",
            CommandRequest::Hold(_) => "hold",
            CommandRequest::Spc(_) => "spc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create() {
        let line = r#"{"command":"create","workOrderId":"WO-1","productCode":"BOLT-M8","inspectionType":"in-process","defectRateThreshold":0.2}"#;
        let request: CommandRequest = serde_json::from_str(line).unwrap();

        let CommandRequest::Create(create) = request else {
            panic!("expected create");
        };
        let cmd = create.to_command().unwrap();
        assert_eq!(cmd.inspection_type, InspectionType::InProcess);
        assert_eq!(cmd.defect_rate_threshold, Some(0.2));
    }

    #[test]
    fn unknown_inspection_type_is_rejected() {
        let create = CreateRequest {
            work_order_id: "WO-1".to_string(),
            product_code: "P".to_string(),
            inspection_type: "random".to_string(),
            defect_rate_threshold: None,
        };
        assert!(matches!(
            create.to_command(),
            Err(InspectionError::UnknownInspectionType { .. })
        ));
    }

    #[test]
    fn parses_record_with_defect_and_ref() {
        let line = r#"{"command":"record","orderRef":2,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.4,"inspector":"kim","defectCode":"D-1","defectType":"DIMENSION","severity":"MAJOR"}"#;
        let request: CommandRequest = serde_json::from_str(line).unwrap();

        let target = request.target().unwrap();
        assert_eq!(target.order_ref, Some(2));
        assert!(target.order_id.is_none());

        let CommandRequest::Record(record) = request else {
            panic!("expected record");
        };
        let cmd = record.to_command(AggregateId::new()).unwrap();
        assert_eq!(cmd.measured_unit, "mm");
        let defect = cmd.defect.unwrap();
        assert_eq!(defect.defect_code, "D-1");
        assert_eq!(defect.defect_type, "DIMENSION");
        assert_eq!(defect.severity, "MAJOR");
        assert!(defect.description.is_none());
    }

    #[test]
    fn record_without_defect_fields_has_no_defect() {
        let line = r#"{"command":"record","orderRef":0,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.0,"inspector":"kim"}"#;
        let CommandRequest::Record(record) = serde_json::from_str(line).unwrap() else {
            panic!("expected record");
        };
        assert!(record.to_command(AggregateId::new()).unwrap().defect.is_none());
    }

    #[test]
    fn partial_defect_fields_are_rejected() {
        let line = r#"{"command":"record","orderRef":0,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.4,"inspector":"kim","defectCode":"D-1","severity":"MAJOR"}"#;
        let CommandRequest::Record(record) = serde_json::from_str(line).unwrap() else {
            panic!("expected record");
        };
        assert!(matches!(
            record.to_command(AggregateId::new()),
            Err(RunnerError::IncompleteDefect("defectType"))
        ));

        let line = r#"{"command":"record","orderRef":0,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.4,"inspector":"kim","severity":"MAJOR"}"#;
        let CommandRequest::Record(record) = serde_json::from_str(line).unwrap() else {
            panic!("expected record");
        };
        assert!(matches!(
            record.to_command(AggregateId::new()),
            Err(RunnerError::IncompleteDefect("defectCode"))
        ));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let line = r#"{"command":"record","orderRef":0,"standardCode":"DIA","lowerBound":7.9,"upperBound":8.1,"unit":"mm","measuredValue":8.0,"inspector":"kim","defectCod":"D-1"}"#;
        assert!(serde_json::from_str::<CommandRequest>(line).is_err());

        let line = r#"{"command":"complete","orderRef":0,"reason":"x"}"#;
        assert!(serde_json::from_str::<CommandRequest>(line).is_err());
    }

    #[test]
    fn parses_order_id_target() {
        let id = AggregateId::new();
        let line = format!(r#"{{"command":"complete","orderId":"{id}"}}"#);
        let request: CommandRequest = serde_json::from_str(&line).unwrap();

        assert_eq!(request.name(), "complete");
        assert_eq!(request.target().unwrap().order_id, Some(id));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result = serde_json::from_str::<CommandRequest>(r#"{"command":"resume","orderRef":0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        let result =
            serde_json::from_str::<CommandRequest>(r#"{"command":"hold","orderRef":0}"#);
        assert!(result.is_err());
    }
}
