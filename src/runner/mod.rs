use crate::adapter::{InvocationSet, Payload};
use crate::error::ExecutionError;
use crate::plan::{GroupPlan, OrchestrationPlan, PlanStep};
use ahash::AHashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, warn};

mod wiring;

use wiring::assemble_input;

/// Cooperative cancellation shared between the caller and an in-flight
/// run. Cancellation is batch-granular: in-flight members of the current
/// batch are interrupted, later batches never dispatch.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.inner.notify.notified().await;
        }
    }
}

/// Terminal state of one plan step after a run.
#[derive(Debug, Clone)]
pub enum StepStatus {
    /// Finished with this output (for group steps: the aggregate record
    /// of the child group's outputs).
    Completed(Payload),
    Failed(ExecutionError),
    /// Interrupted by cancellation while in flight.
    Cancelled,
    /// Never dispatched: an earlier batch failed or was cancelled.
    Skipped,
}

impl StepStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepStatus::Completed(_))
    }
}

/// Per-step outcome, in batch order.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
}

/// The result of running one group plan. Partially completed batches
/// keep their per-step outcomes; nothing collapses into a single
/// failure.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub group: String,
    pub outcomes: Vec<StepOutcome>,
    /// Reports of nested group steps, in dispatch order.
    pub nested: Vec<RunReport>,
    /// True when every batch dispatched and every step completed.
    pub completed: bool,
}

impl RunReport {
    /// Finds a step outcome anywhere in this report or its nested group
    /// reports.
    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.step == step)
            .or_else(|| self.nested.iter().find_map(|report| report.outcome(step)))
    }
}

/// Reference executor for an [`OrchestrationPlan`]: dispatches each
/// batch concurrently, awaits the whole batch before the next one, and
/// recurses into nested groups as opaque units.
///
/// External workflow engines are expected to consume the plan and the
/// invocation handles directly; this runner exists so a plan is
/// executable in-process with the exact batch semantics the plan
/// promises.
#[derive(Clone)]
pub struct PlanRunner {
    plan: Arc<OrchestrationPlan>,
    handles: Arc<InvocationSet>,
}

impl PlanRunner {
    pub fn new(plan: OrchestrationPlan, handles: InvocationSet) -> Self {
        Self {
            plan: Arc::new(plan),
            handles: Arc::new(handles),
        }
    }

    /// Runs the root group. `inputs` is an object supplying external
    /// parameters by name; pass `Payload::Null` when there are none.
    pub async fn run(
        &self,
        inputs: Payload,
        cancel: &CancellationToken,
    ) -> Result<RunReport, ExecutionError> {
        self.run_group("", inputs, cancel).await.map(|(report, _)| report)
    }

    /// Runs one group's plan and returns its report together with the
    /// group's aggregate output record.
    pub fn run_group<'a>(
        &'a self,
        path: &'a str,
        inputs: Payload,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(RunReport, Payload), ExecutionError>> + Send + 'a>>
    {
        Box::pin(async move {
        let group = self
            .plan
            .group(path)
            .ok_or_else(|| ExecutionError::MissingGroupPlan(path.to_string()))?
            .clone();

        let mut report = RunReport {
            group: path.to_string(),
            outcomes: Vec::new(),
            nested: Vec::new(),
            completed: true,
        };
        let mut completed_outputs: AHashMap<String, Payload> = AHashMap::new();
        let mut halted = false;

        for (batch_index, batch) in group.batches.iter().enumerate() {
            if halted || cancel.is_cancelled() {
                for step in &batch.steps {
                    report.outcomes.push(StepOutcome {
                        step: step.id().to_string(),
                        status: StepStatus::Skipped,
                    });
                }
                report.completed = false;
                continue;
            }

            debug!(group = path, batch = batch_index, steps = batch.steps.len(), "dispatching batch");
            let batch_report = self
                .run_batch(&group, batch.steps.clone(), &inputs, &completed_outputs, cancel)
                .await;

            for (outcome, nested) in batch_report {
                if let StepStatus::Completed(value) = &outcome.status {
                    completed_outputs.insert(outcome.step.clone(), value.clone());
                } else {
                    halted = true;
                    report.completed = false;
                }
                if let Some(nested_report) = nested {
                    report.nested.push(nested_report);
                }
                report.outcomes.push(outcome);
            }
        }

        let aggregate = self.aggregate_of(&group, &completed_outputs);
        Ok((report, aggregate))
        })
    }

    /// Dispatches one batch concurrently and awaits every member.
    /// Outcomes are returned in the batch's declared step order.
    async fn run_batch(
        &self,
        group: &GroupPlan,
        steps: Vec<PlanStep>,
        inputs: &Payload,
        completed_outputs: &AHashMap<String, Payload>,
        cancel: &CancellationToken,
    ) -> Vec<(StepOutcome, Option<RunReport>)> {
        let mut tasks: JoinSet<(usize, StepOutcome, Option<RunReport>)> = JoinSet::new();

        for (position, step) in steps.iter().enumerate() {
            let runner = self.clone();
            let step = step.clone();
            let cancel = cancel.clone();
            let inputs = inputs.clone();
            let edges = group.edges.clone();
            let completed = completed_outputs.clone();

            tasks.spawn(async move {
                let (outcome, nested) = runner
                    .run_step(&step, &edges, &inputs, &completed, &cancel)
                    .await;
                (position, outcome, nested)
            });
        }

        let mut results: Vec<Option<(StepOutcome, Option<RunReport>)>> =
            (0..steps.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome, nested)) => results[position] = Some((outcome, nested)),
                Err(join_error) => {
                    warn!(error = %join_error, "batch member task did not complete");
                }
            }
        }

        results
            .into_iter()
            .enumerate()
            .map(|(position, result)| {
                result.unwrap_or_else(|| {
                    (
                        StepOutcome {
                            step: steps[position].id().to_string(),
                            status: StepStatus::Failed(ExecutionError::JoinFailed {
                                operation: steps[position].id().to_string(),
                            }),
                        },
                        None,
                    )
                })
            })
            .collect()
    }

    async fn run_step(
        &self,
        step: &PlanStep,
        edges: &[crate::compiler::DependencyEdge],
        inputs: &Payload,
        completed_outputs: &AHashMap<String, Payload>,
        cancel: &CancellationToken,
    ) -> (StepOutcome, Option<RunReport>) {
        match step {
            PlanStep::Operation { name } => {
                let status = self
                    .invoke_operation(name, edges, inputs, completed_outputs, cancel)
                    .await;
                (
                    StepOutcome {
                        step: name.clone(),
                        status,
                    },
                    None,
                )
            }
            PlanStep::Group { path } => {
                let result = self.run_group(path, inputs.clone(), cancel).await;
                match result {
                    Ok((nested_report, aggregate)) => {
                        let status = if nested_report.completed {
                            StepStatus::Completed(aggregate)
                        } else if cancel.is_cancelled() {
                            StepStatus::Cancelled
                        } else {
                            StepStatus::Failed(ExecutionError::OperationFailed {
                                operation: path.clone(),
                                message: "nested group did not run to completion".to_string(),
                            })
                        };
                        (
                            StepOutcome {
                                step: path.clone(),
                                status,
                            },
                            Some(nested_report),
                        )
                    }
                    Err(err) => (
                        StepOutcome {
                            step: path.clone(),
                            status: StepStatus::Failed(err),
                        },
                        None,
                    ),
                }
            }
        }
    }

    async fn invoke_operation(
        &self,
        name: &str,
        edges: &[crate::compiler::DependencyEdge],
        inputs: &Payload,
        completed_outputs: &AHashMap<String, Payload>,
        cancel: &CancellationToken,
    ) -> StepStatus {
        let handle = match self.handles.get(name) {
            Ok(handle) => handle.clone(),
            Err(err) => {
                return StepStatus::Failed(ExecutionError::OperationFailed {
                    operation: name.to_string(),
                    message: err.to_string(),
                });
            }
        };

        let input = match assemble_input(name, edges, inputs, completed_outputs) {
            Ok(input) => input,
            Err(err) => return StepStatus::Failed(err),
        };

        tokio::select! {
            _ = cancel.cancelled() => StepStatus::Cancelled,
            result = handle.invoke(input) => match result {
                Ok(output) => StepStatus::Completed(output),
                Err(err) => StepStatus::Failed(err),
            },
        }
    }

    /// The group's output record, keyed by step name, mirroring the
    /// aggregate type the compiler derived for it.
    fn aggregate_of(
        &self,
        group: &GroupPlan,
        completed_outputs: &AHashMap<String, Payload>,
    ) -> Payload {
        let mut fields = serde_json::Map::new();
        for batch in &group.batches {
            for step in &batch.steps {
                if let Some(value) = completed_outputs.get(step.id()) {
                    let key = step
                        .id()
                        .rsplit('.')
                        .next()
                        .unwrap_or_else(|| step.id())
                        .to_string();
                    if !value.is_null() {
                        fields.insert(key, value.clone());
                    }
                }
            }
        }
        Payload::Object(fields)
    }
}
