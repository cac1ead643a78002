use crate::error::NameError;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;

/// A parsed dotted operation name such as `scraping.stepstone.fetch`.
///
/// The segments encode the operation's position in the hierarchy: all but
/// the last segment form the parent group path, the last segment is the
/// step name within that group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedName {
    full: String,
    segments: Vec<String>,
}

impl ParsedName {
    /// Parses a dotted name, validating every segment.
    ///
    /// Fails when the name is empty, contains an empty segment (leading,
    /// trailing or double dot), or a segment is not a valid identifier
    /// (alphanumeric/underscore, not starting with a digit).
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }

        let mut segments = Vec::new();
        for segment in name.split('.') {
            if segment.is_empty() {
                return Err(NameError::EmptySegment {
                    name: name.to_string(),
                });
            }
            if !is_identifier(segment) {
                return Err(NameError::InvalidSegment {
                    name: name.to_string(),
                    segment: segment.to_string(),
                });
            }
            segments.push(segment.to_string());
        }

        Ok(Self {
            full: name.to_string(),
            segments,
        })
    }

    /// The original dotted name. `parse(n).full() == n` for all valid `n`.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Ordered path components. Joining with `.` reproduces `full()`.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments. Always at least 1.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The last segment: the operation's name within its group.
    pub fn step_name(&self) -> &str {
        self.segments
            .last()
            .expect("a parsed name has at least one segment")
    }

    /// Join of all but the last segment; empty for depth-1 names, which
    /// attach to the synthetic root group.
    pub fn parent_path(&self) -> String {
        self.segments[..self.segments.len() - 1].join(".")
    }

    /// Every proper prefix path, shortest first, including the empty root.
    /// `a.b.c` yields `["", "a", "a.b"]`.
    pub fn prefix_paths(&self) -> Vec<String> {
        (0..self.segments.len())
            .map(|len| self.segments[..len].join("."))
            .collect()
    }
}

impl fmt::Display for ParsedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Groups a list of parsed names by their parent path.
///
/// Pure and deterministic: the returned map iterates parents in
/// lexicographic order and each value preserves the input order, so two
/// calls with the same input produce structurally equal output.
pub fn group_by_parent<'a, I>(names: I) -> BTreeMap<String, Vec<&'a ParsedName>>
where
    I: IntoIterator<Item = &'a ParsedName>,
{
    names
        .into_iter()
        .map(|name| (name.parent_path(), name))
        .into_group_map()
        .into_iter()
        .collect()
}
