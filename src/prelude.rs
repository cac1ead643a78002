//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the hensei crate so a
//! single `use hensei::prelude::*;` covers the registration-compile-run
//! loop.

// Registration and catalog
pub use crate::catalog::{
    Catalog, CatalogBuilder, InputSignature, IntoCatalog, OperationDescriptor, Parameter,
    TypeSignature,
};

// Compilation
pub use crate::compiler::{Compilation, Compiler, CompilerBuilder, DependencyEdge, HierarchyGraph};

// Diagnostics
pub use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticReport, GraphView, Severity};

// Entity resolution boundary
pub use crate::entity::{EntityRegistry, StaticEntityRegistry};

// Plan artifact
pub use crate::plan::{GroupPlan, OrchestrationPlan, ParallelBatch, PlanStep};

// Error types
pub use crate::error::{AdapterError, ArtifactError, ExecutionError, NameError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
