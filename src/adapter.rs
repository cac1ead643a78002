use crate::catalog::OperationDescriptor;
use crate::error::{AdapterError, ExecutionError};
use ahash::AHashMap;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::trace;

/// Runtime payload flowing between operations. Producers' outputs are
/// wired into consumers' inputs as JSON values keyed by parameter name.
pub type Payload = serde_json::Value;

/// A non-blocking operation body: runs inline on the ambient runtime.
#[async_trait]
pub trait AsyncOperation: Send + Sync {
    async fn invoke(&self, input: Payload) -> Result<Payload, ExecutionError>;
}

/// A blocking operation body: offloaded to the bounded worker pool so it
/// never stalls the coordinating control flow.
pub trait BlockingOperation: Send + Sync {
    fn call(&self, input: Payload) -> Result<Payload, ExecutionError>;
}

/// An operation implementation handed to the adapter. The variant must
/// agree with the descriptor's `blocking` flag.
#[derive(Clone)]
pub enum OperationBody {
    Async(Arc<dyn AsyncOperation>),
    Blocking(Arc<dyn BlockingOperation>),
}

/// Wraps an async closure as an operation body.
pub fn async_op<F, Fut>(f: F) -> OperationBody
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Payload, ExecutionError>> + Send + 'static,
{
    OperationBody::Async(Arc::new(FnAsync(f)))
}

/// Wraps a plain (blocking) closure as an operation body.
pub fn blocking_op<F>(f: F) -> OperationBody
where
    F: Fn(Payload) -> Result<Payload, ExecutionError> + Send + Sync + 'static,
{
    OperationBody::Blocking(Arc::new(FnBlocking(f)))
}

struct FnAsync<F>(F);

#[async_trait]
impl<F, Fut> AsyncOperation for FnAsync<F>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, ExecutionError>> + Send,
{
    async fn invoke(&self, input: Payload) -> Result<Payload, ExecutionError> {
        (self.0)(input).await
    }
}

struct FnBlocking<F>(F);

impl<F> BlockingOperation for FnBlocking<F>
where
    F: Fn(Payload) -> Result<Payload, ExecutionError> + Send + Sync,
{
    fn call(&self, input: Payload) -> Result<Payload, ExecutionError> {
        (self.0)(input)
    }
}

/// Bounded pool for blocking work. A semaphore caps how many calls sit
/// on `spawn_blocking` threads at once; a slow blocking operation only
/// ever occupies pool capacity, never the coordinating task.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self, AdapterError> {
        if size == 0 {
            return Err(AdapterError::EmptyWorkerPool);
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(size)),
        })
    }

    async fn run(
        &self,
        operation: &str,
        body: Arc<dyn BlockingOperation>,
        input: Payload,
    ) -> Result<Payload, ExecutionError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExecutionError::Cancelled {
                operation: operation.to_string(),
            })?;
        trace!(operation, "offloading blocking call to worker pool");
        let name = operation.to_string();
        tokio::task::spawn_blocking(move || body.call(input))
            .await
            .map_err(|_| ExecutionError::JoinFailed { operation: name })?
    }
}

/// The uniform invocation surface for one operation. Constructed once by
/// the adapter; callers `invoke` without ever branching on blocking-ness.
#[derive(Clone)]
pub struct InvocationHandle {
    operation: String,
    kind: HandleKind,
}

#[derive(Clone)]
enum HandleKind {
    Direct(Arc<dyn AsyncOperation>),
    Offloaded {
        body: Arc<dyn BlockingOperation>,
        pool: WorkerPool,
    },
}

impl InvocationHandle {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub async fn invoke(&self, input: Payload) -> Result<Payload, ExecutionError> {
        match &self.kind {
            HandleKind::Direct(body) => body.invoke(input).await,
            HandleKind::Offloaded { body, pool } => {
                pool.run(&self.operation, Arc::clone(body), input).await
            }
        }
    }
}

/// Normalizes blocking and non-blocking operations into the uniform
/// [`InvocationHandle`] contract. Pure with respect to the graph: it
/// annotates operations with handles and never alters topology, edges or
/// batch membership.
pub struct ExecutionAdapter {
    pool: WorkerPool,
}

impl ExecutionAdapter {
    /// Creates an adapter with a bounded worker pool of `pool_size`
    /// threads' worth of concurrent blocking calls.
    pub fn new(pool_size: usize) -> Result<Self, AdapterError> {
        Ok(Self {
            pool: WorkerPool::new(pool_size)?,
        })
    }

    /// Builds the invocation handle for one operation. The dispatch
    /// variant is selected here, once; mismatched metadata and body kind
    /// is a hard error rather than a silent re-wrap.
    pub fn adapt(
        &self,
        descriptor: &OperationDescriptor,
        body: OperationBody,
    ) -> Result<InvocationHandle, AdapterError> {
        let kind = match (descriptor.blocking, body) {
            (false, OperationBody::Async(body)) => HandleKind::Direct(body),
            (true, OperationBody::Blocking(body)) => HandleKind::Offloaded {
                body,
                pool: self.pool.clone(),
            },
            (true, OperationBody::Async(_)) => {
                return Err(AdapterError::DispatchMismatch {
                    operation: descriptor.name.clone(),
                    declared: "blocking",
                    given: "async",
                });
            }
            (false, OperationBody::Blocking(_)) => {
                return Err(AdapterError::DispatchMismatch {
                    operation: descriptor.name.clone(),
                    declared: "non-blocking",
                    given: "blocking",
                });
            }
        };
        Ok(InvocationHandle {
            operation: descriptor.name.clone(),
            kind,
        })
    }
}

/// Handles keyed by operation name, consumed by the plan runner (or an
/// external workflow-engine adapter).
#[derive(Clone, Default)]
pub struct InvocationSet {
    handles: AHashMap<String, InvocationHandle>,
}

impl InvocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, handle: InvocationHandle) {
        self.handles.insert(handle.operation().to_string(), handle);
    }

    pub fn get(&self, operation: &str) -> Result<&InvocationHandle, AdapterError> {
        self.handles
            .get(operation)
            .ok_or_else(|| AdapterError::UnboundOperation(operation.to_string()))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
