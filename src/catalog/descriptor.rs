use super::types::TypeSignature;
use serde::{Deserialize, Serialize};

/// One named input of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeSignature,
    /// Required parameters must be satisfied by a sibling producer or be
    /// marked `external`; optional ones may stay unwired.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Documents that the value arrives from outside the group (caller
    /// input, cross-group plumbing at a higher level). Exempts the
    /// parameter from sibling satisfaction checks.
    #[serde(default)]
    pub external: bool,
}

fn default_true() -> bool {
    true
}

impl Parameter {
    pub fn required(name: impl Into<String>, ty: TypeSignature) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            external: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeSignature) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            external: false,
        }
    }

    pub fn external(name: impl Into<String>, ty: TypeSignature) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            external: true,
        }
    }
}

/// The full input contract of an operation: an ordered parameter list,
/// possibly empty for source operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSignature {
    pub params: Vec<Parameter>,
}

impl InputSignature {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// One registered unit of work. Created once during the registration
/// phase and immutable afterwards; the compiler only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Dotted, globally unique name, e.g. `scraping.stepstone.fetch`.
    pub name: String,
    pub input: InputSignature,
    pub output: TypeSignature,
    /// Blocking operations are offloaded to the bounded worker pool by
    /// the execution adapter; non-blocking ones run inline.
    #[serde(default)]
    pub blocking: bool,
    /// Entity-schema names this operation reads or writes. Resolved
    /// against the external entity registry during validation.
    #[serde(default)]
    pub entity_refs: Vec<String>,
    /// Marks a sink: an unconsumed output is intentional, not a wiring
    /// mistake.
    #[serde(default)]
    pub terminal: bool,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, input: InputSignature, output: TypeSignature) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            blocking: false,
            entity_refs: Vec::new(),
            terminal: false,
        }
    }

    /// Source operation: no inputs.
    pub fn source(name: impl Into<String>, output: TypeSignature) -> Self {
        Self::new(name, InputSignature::none(), output)
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn with_entity_refs(mut self, refs: Vec<String>) -> Self {
        self.entity_refs = refs;
        self
    }
}
