//! Batch execution of JSON-lines commands.

use std::io::Write;
use std::sync::Arc;

use aggregate_store::InMemoryAggregateStore;
use common::AggregateId;
use domain::{AggregateRoot, CompleteInspection, InspectionService, InspectionStatus};
use projections::{ProductQualitySummary, ProductQualityView, ProjectionProcessor};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::RunnerError;
use crate::publisher::EventLinePublisher;
use crate::request::{CommandRequest, OrderTarget};

type RunnerService<W> =
    InspectionService<InMemoryAggregateStore, EventLinePublisher<W, Arc<ProjectionProcessor>>>;

/// What a successful line produced, besides the events it published.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created { order_id: AggregateId },
    Recorded { passed: bool },
    Completed { status: InspectionStatus, defect_rate: f64 },
    Held,
    SpcChecked(SpcResult),
}

/// Result line written for an `spc` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpcResult {
    pub order_id: AggregateId,
    pub standard_code: String,
    pub in_control: bool,
}

/// Counts of processed lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Serialize)]
struct ErrorLine<'a> {
    error: String,
    line: usize,
    command: Option<&'a str>,
}

#[derive(Serialize)]
struct SpcLine<'a> {
    spc: &'a SpcResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductLine<'a> {
    #[serde(flatten)]
    product: &'a ProductQualitySummary,
    mean_defect_rate: Option<f64>,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: Vec<ProductLine<'a>>,
}

/// Runs command lines against an in-memory inspection service.
///
/// Every published event is written to the output as one JSON line and fed
/// to a [`ProductQualityView`].
pub struct BatchRunner<W: Write + Send> {
    service: RunnerService<W>,
    processor: Arc<ProjectionProcessor>,
    view: ProductQualityView,
    output: Arc<Mutex<W>>,
    /// One slot per create command; None when that create failed.
    created: Vec<Option<AggregateId>>,
}

impl<W: Write + Send> BatchRunner<W> {
    /// Wires the service, publisher and projections around `output`.
    pub fn new(config: &Config, output: W) -> Result<Self, RunnerError> {
        let output = Arc::new(Mutex::new(output));

        let view = ProductQualityView::new();
        let mut processor = ProjectionProcessor::new();
        processor.register(Box::new(view.clone()));
        let processor = Arc::new(processor);

        let publisher = EventLinePublisher::new(Arc::clone(&output), Arc::clone(&processor));
        let service = InspectionService::new(InMemoryAggregateStore::new(), publisher)
            .with_default_threshold(config.default_defect_rate_threshold)?;

        Ok(Self {
            service,
            processor,
            view,
            output,
            created: Vec::new(),
        })
    }

    pub fn view(&self) -> &ProductQualityView {
        &self.view
    }

    pub fn processor(&self) -> &ProjectionProcessor {
        &self.processor
    }

    /// Returns one slot per create command seen so far, indexed by
    /// `orderRef`. A failed create leaves its slot empty.
    pub fn created_orders(&self) -> &[Option<AggregateId>] {
        &self.created
    }

    /// Reads lines until EOF, executing each one.
    ///
    /// A failing line is logged and reported on the output as
    /// `{"error": ..., "line": n}`; processing continues with the next line.
    /// Only read and write failures abort the batch.
    pub async fn run<R>(&mut self, input: R) -> Result<BatchReport, RunnerError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut report = BatchReport::default();
        let mut line_no = 0;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            match self.execute_line(&line).await {
                Ok(_) => report.succeeded += 1,
                Err(RunnerError::Output(e)) => return Err(RunnerError::Output(e)),
                Err(e) => {
                    report.failed += 1;
                    let command = serde_json::from_str::<serde_json::Value>(&line)
                        .ok()
                        .and_then(|v| v.get("command").and_then(|c| c.as_str()).map(str::to_owned));
                    tracing::warn!(line = line_no, command = ?command, error = %e, "command failed");
                    self.write_json(&ErrorLine {
                        error: e.to_string(),
                        line: line_no,
                        command: command.as_deref(),
                    })
                    .await?;
                }
            }
        }

        tracing::info!(
            lines = report.total(),
            succeeded = report.succeeded,
            failed = report.failed,
            "batch finished"
        );
        Ok(report)
    }

    /// Parses and executes one command line.
    pub async fn execute_line(&mut self, line: &str) -> Result<Outcome, RunnerError> {
        let request: CommandRequest = serde_json::from_str(line)?;
        self.execute(request).await
    }

    /// Executes one parsed command.
    pub async fn execute(&mut self, request: CommandRequest) -> Result<Outcome, RunnerError> {
        match request {
            CommandRequest::Create(create) => {
                self.created.push(None);
                let result = self.service.create_inspection(create.to_command()?).await?;
                let order_id = result.aggregate.id();
                if let Some(slot) = self.created.last_mut() {
                    *slot = Some(order_id);
                }
                Ok(Outcome::Created { order_id })
            }
            CommandRequest::Record(record) => {
                let order_id = self.resolve(record.target())?;
                let result = self.service.record_result(record.to_command(order_id)?).await?;
                let passed = result
                    .aggregate
                    .results()
                    .last()
                    .is_some_and(|r| r.passed());
                Ok(Outcome::Recorded { passed })
            }
            CommandRequest::Complete(complete) => {
                let order_id = self.resolve(complete.target())?;
                let result = self
                    .service
                    .complete_inspection(CompleteInspection::new(order_id))
                    .await?;
                Ok(Outcome::Completed {
                    status: result.aggregate.status(),
                    defect_rate: result.aggregate.defect_rate(),
                })
            }
            CommandRequest::Hold(hold) => {
                let order_id = self.resolve(hold.target())?;
                self.service.put_on_hold(hold.to_command(order_id)).await?;
                Ok(Outcome::Held)
            }
            CommandRequest::Spc(spc) => {
                let order_id = self.resolve(spc.target())?;
                if self.service.get_order(order_id).await?.is_none() {
                    return Err(RunnerError::OrderNotFound(order_id));
                }
                let in_control = self.service.spc_check(order_id, &spc.standard_code).await?;
                let result = SpcResult {
                    order_id,
                    standard_code: spc.standard_code,
                    in_control,
                };
                self.write_json(&SpcLine { spc: &result }).await?;
                Ok(Outcome::SpcChecked(result))
            }
        }
    }

    /// Writes the per-product quality summary as one JSON line.
    pub async fn write_summary(&self) -> Result<(), RunnerError> {
        let products = self.view.all_products().await;
        let summary = products
            .iter()
            .map(|product| ProductLine {
                product,
                mean_defect_rate: product.mean_defect_rate(),
            })
            .collect();
        self.write_json(&SummaryLine { summary }).await
    }

    fn resolve(&self, target: OrderTarget) -> Result<AggregateId, RunnerError> {
        match target {
            OrderTarget {
                order_id: Some(id), ..
            } => Ok(id),
            OrderTarget {
                order_ref: Some(index),
                ..
            } => self
                .created
                .get(index)
                .copied()
                .flatten()
                .ok_or(RunnerError::UnknownOrderRef(index)),
            _ => Err(RunnerError::MissingOrderTarget),
        }
    }

    async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), RunnerError> {
        let line = serde_json::to_string(value)?;
        let mut output = self.output.lock().await;
        writeln!(output, "{line}")?;
        output.flush()?;
        Ok(())
    }
}
