//! # Hensei - Operation Hierarchy Compiler
//!
//! **Hensei** compiles a flat catalog of named, typed units of work
//! ("operations") whose dotted names encode a hierarchy, e.g.
//! `scraping.stepstone.fetch`, into a validated containment and
//! dependency graph, and from it a deterministic parallel orchestration
//! plan ready to hand to a workflow engine.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic: it operates on a canonical [`catalog::Catalog`]
//! of operation descriptors. The primary workflow is:
//!
//! 1.  **Register**: During startup, build a catalog with
//!     [`catalog::CatalogBuilder`] (or convert your own metadata format via the
//!     [`catalog::IntoCatalog`] trait). Each descriptor declares the operation's
//!     input/output type signatures, its blocking-ness, and any entity
//!     references.
//! 2.  **Compile**: Hand the frozen catalog to [`compiler::Compiler`]. The
//!     compiler groups operations by name prefix, infers type-directed
//!     dependency edges between siblings, partitions each group into
//!     concurrency-safe batches, and validates the result across the
//!     hierarchy, entity and data-flow views. Every finding is collected
//!     into a [`diagnostics::DiagnosticReport`]; nothing is thrown.
//! 3.  **Adapt**: Bind operation bodies through the
//!     [`adapter::ExecutionAdapter`], which normalizes blocking and
//!     non-blocking work into one uniform [`adapter::InvocationHandle`]
//!     contract (blocking calls offload to a bounded worker pool).
//! 4.  **Execute**: Feed the emitted [`plan::OrchestrationPlan`] to your
//!     workflow engine, or run it in-process with [`runner::PlanRunner`],
//!     which dispatches each batch concurrently and awaits it fully
//!     before the next.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hensei::prelude::*;
//! use hensei::adapter::{async_op, ExecutionAdapter, InvocationSet};
//! use hensei::runner::{CancellationToken, PlanRunner};
//! use serde_json::json;
//!
//! # async fn run_example() -> Result<()> {
//! // 1. Register operations. `merge` consumes the pages produced by its
//! //    sibling groups' fetchers, so it is scheduled after them.
//! let catalog = Catalog::builder()
//!     .register(OperationDescriptor::source(
//!         "jobs.stepstone.fetch",
//!         TypeSignature::named("JobPage"),
//!     ))
//!     .register(OperationDescriptor::source(
//!         "jobs.indeed.fetch",
//!         TypeSignature::named("JobPage"),
//!     ))
//!     .register(
//!         OperationDescriptor::new(
//!             "jobs.merge",
//!             InputSignature::of(vec![Parameter::required(
//!                 "pages",
//!                 TypeSignature::list_of(TypeSignature::named("JobPage")),
//!             )]),
//!             TypeSignature::named("JobIndex"),
//!         )
//!         .terminal(),
//!     )
//!     .build();
//!
//! // 2. Compile. Diagnostics are collected, never thrown.
//! let compilation = Compiler::builder(catalog).build().compile();
//! for diagnostic in compilation.diagnostics.all() {
//!     eprintln!("{diagnostic}");
//! }
//!
//! // 3. Bind bodies and run the plan in-process.
//! let adapter = ExecutionAdapter::new(4)?;
//! let mut handles = InvocationSet::new();
//! let fetch = compilation.hierarchy.leaf_by_name("jobs.stepstone.fetch").unwrap();
//! handles.bind(adapter.adapt(
//!     &fetch.descriptor,
//!     async_op(|_input| async move { Ok(json!({"url": "..."})) }),
//! )?);
//! // ... bind the remaining operations the same way ...
//!
//! let runner = PlanRunner::new(compilation.plan, handles);
//! let report = runner.run(json!({}), &CancellationToken::new()).await?;
//! println!("completed: {}", report.completed);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod catalog;
pub mod compiler;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod name;
pub mod plan;
pub mod prelude;
pub mod runner;
