use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural type descriptor attached to operation inputs and outputs at
/// registration time. Compatibility is decided by an explicit check
/// (`TypeRelations::assignable`), never by runtime introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSignature {
    /// No payload. An operation with `Unit` output produces nothing
    /// consumable and is exempt from dead-output analysis.
    Unit,
    /// A named scalar or opaque type, e.g. `JobPage`.
    Named(String),
    /// Homogeneous collection. List parameters aggregate the outputs of
    /// several producers without ambiguity.
    List(Box<TypeSignature>),
    /// Ordered named fields. Group nodes derive a `Record` aggregate from
    /// their children's outputs.
    Record(Vec<(String, TypeSignature)>),
}

impl TypeSignature {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSignature::Named(name.into())
    }

    pub fn list_of(element: TypeSignature) -> Self {
        TypeSignature::List(Box::new(element))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeSignature::Unit)
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Unit => write!(f, "()"),
            TypeSignature::Named(name) => write!(f, "{name}"),
            TypeSignature::List(element) => write!(f, "[{element}]"),
            TypeSignature::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// How a producer's output satisfies a consumer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Output is directly assignable to the parameter type.
    Direct,
    /// Parameter is a `List(T)` and the output is assignable to `T`;
    /// several producers may feed the same list parameter.
    Element,
    /// Output is a record (a subgroup's aggregate) and one of its fields
    /// satisfies the parameter.
    Aggregate,
}

/// A successful parameter match, including the field path to read when
/// the value sits inside a producer's aggregate record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMatch {
    pub kind: MatchKind,
    /// Field chain into the producer's record output; empty for direct
    /// and element matches.
    pub access: Vec<String>,
    /// True when the producer supplies one element of a list parameter,
    /// so the executor collects rather than assigns.
    pub element: bool,
}

/// Declared subtype relations between named types, plus the structural
/// assignability rules built on top of them.
#[derive(Debug, Clone, Default)]
pub struct TypeRelations {
    supertypes: AHashMap<String, AHashSet<String>>,
}

impl TypeRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `sub` to be a subtype of `sup`. Transitive chains are
    /// honored by `assignable`.
    pub fn declare_subtype(&mut self, sub: impl Into<String>, sup: impl Into<String>) {
        self.supertypes
            .entry(sub.into())
            .or_default()
            .insert(sup.into());
    }

    fn is_declared_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        // Breadth-first walk over the declared relation.
        let mut frontier = vec![sub];
        let mut seen: AHashSet<&str> = AHashSet::new();
        while let Some(current) = frontier.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(supers) = self.supertypes.get(current) {
                for parent in supers {
                    if parent == sup {
                        return true;
                    }
                    frontier.push(parent.as_str());
                }
            }
        }
        false
    }

    /// Structural assignability of `from` into `to`: exact equality,
    /// declared subtype paths for named types, element-wise lists, and
    /// width subtyping for records (`from` may carry extra fields).
    pub fn assignable(&self, from: &TypeSignature, to: &TypeSignature) -> bool {
        match (from, to) {
            (TypeSignature::Unit, TypeSignature::Unit) => true,
            (TypeSignature::Named(sub), TypeSignature::Named(sup)) => {
                self.is_declared_subtype(sub, sup)
            }
            (TypeSignature::List(from_elem), TypeSignature::List(to_elem)) => {
                self.assignable(from_elem, to_elem)
            }
            (TypeSignature::Record(from_fields), TypeSignature::Record(to_fields)) => {
                to_fields.iter().all(|(name, to_ty)| {
                    from_fields
                        .iter()
                        .any(|(from_name, from_ty)| from_name == name && self.assignable(from_ty, to_ty))
                })
            }
            _ => false,
        }
    }

    /// Decides whether (and how) a producer output satisfies a consumer
    /// parameter. Aggregate lookup descends nested records, so a parent
    /// operation can consume values produced anywhere inside a child
    /// group's aggregate; the returned access path names the field chain
    /// to read at runtime. The first matching field wins, in record
    /// order, which is itself declaration-ordered.
    pub fn satisfies(&self, output: &TypeSignature, param: &TypeSignature) -> Option<ParamMatch> {
        if self.assignable(output, param) {
            return Some(ParamMatch {
                kind: MatchKind::Direct,
                access: Vec::new(),
                element: false,
            });
        }
        if let TypeSignature::List(element) = param {
            if self.assignable(output, element) {
                return Some(ParamMatch {
                    kind: MatchKind::Element,
                    access: Vec::new(),
                    element: true,
                });
            }
        }
        if let TypeSignature::Record(fields) = output {
            for (field_name, field_ty) in fields {
                if let Some(inner) = self.satisfies(field_ty, param) {
                    let mut access = vec![field_name.clone()];
                    access.extend(inner.access);
                    return Some(ParamMatch {
                        kind: MatchKind::Aggregate,
                        access,
                        element: inner.element,
                    });
                }
            }
        }
        None
    }
}
