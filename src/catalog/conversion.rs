use super::registry::Catalog;
use crate::error::ConversionError;

/// A trait for custom metadata models that can be converted into a
/// hensei [`Catalog`].
///
/// This is the extension point for making hensei format-agnostic: parse
/// your own registration format (JSON manifests, macro output, code-gen
/// metadata) into your own structs, then implement `IntoCatalog` to
/// translate them into descriptors the compiler understands.
pub trait IntoCatalog {
    /// Consumes the object and produces a frozen catalog.
    fn into_catalog(self) -> Result<Catalog, ConversionError>;
}

impl IntoCatalog for Catalog {
    fn into_catalog(self) -> Result<Catalog, ConversionError> {
        Ok(self)
    }
}
