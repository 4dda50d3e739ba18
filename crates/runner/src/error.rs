//! Runner error types.

use common::AggregateId;
use domain::{DomainError, InspectionError};
use thiserror::Error;

/// Errors raised while executing one input line.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The line is not a valid command object.
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] serde_json::Error),

    /// The line refers to a create command that is missing or failed.
    #[error("No order was created at orderRef {0}")]
    UnknownOrderRef(usize),

    /// The line names neither an orderId nor an orderRef.
    #[error("Command needs an orderId or an orderRef")]
    MissingOrderTarget,

    /// Defect fields were given without one they depend on.
    #[error("Defect detail needs {0}")]
    IncompleteDefect(&'static str),

    /// The order id does not belong to any stored order.
    #[error("Order not found: {0}")]
    OrderNotFound(AggregateId),

    /// An input value was rejected before reaching the order.
    #[error(transparent)]
    Inspection(#[from] InspectionError),

    /// The service rejected or failed the command.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}
