use super::descriptor::OperationDescriptor;
use super::types::TypeRelations;

/// Builder for the operation catalog, used during an application's
/// startup phase. Registration is append-only; `build` freezes the
/// catalog for compilation.
///
/// Duplicate names are accepted here on purpose: the compiler reports
/// them as diagnostics instead of letting one registration silently win.
pub struct CatalogBuilder {
    operations: Vec<OperationDescriptor>,
    relations: TypeRelations,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            relations: TypeRelations::new(),
        }
    }

    /// Registers one operation descriptor. Order of registration is the
    /// declaration order used for deterministic scheduling tie-breaks.
    pub fn register(mut self, descriptor: OperationDescriptor) -> Self {
        self.operations.push(descriptor);
        self
    }

    /// Declares a named subtype relation consulted during dependency
    /// inference and validation.
    pub fn declare_subtype(mut self, sub: impl Into<String>, sup: impl Into<String>) -> Self {
        self.relations.declare_subtype(sub, sup);
        self
    }

    pub fn build(self) -> Catalog {
        Catalog {
            operations: self.operations,
            relations: self.relations,
        }
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen, insertion-ordered collection of operation descriptors plus the
/// declared type relations. Owned by the caller; the compiler takes a
/// read-only snapshot for the duration of one `compile` call.
#[derive(Debug, Clone)]
pub struct Catalog {
    operations: Vec<OperationDescriptor>,
    relations: TypeRelations,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// First descriptor registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Position of the first registration of `name`; the stable tie-break
    /// key for batch ordering.
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.operations.iter().position(|op| op.name == name)
    }

    pub fn relations(&self) -> &TypeRelations {
        &self.relations
    }
}
