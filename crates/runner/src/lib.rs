//! Batch runner for the inspection service.
//!
//! Reads JSON-lines commands, dispatches them through `InspectionService`,
//! and writes each published event as a JSON line.

pub mod batch;
pub mod config;
pub mod error;
pub mod publisher;
pub mod request;
pub mod telemetry;

pub use batch::{BatchReport, BatchRunner, Outcome, SpcResult};
pub use config::{Config, LogFormat};
pub use error::RunnerError;
pub use publisher::EventLinePublisher;
pub use request::CommandRequest;
