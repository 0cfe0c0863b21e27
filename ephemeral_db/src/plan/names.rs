//! Schema name normalization
//!
//! Names are trimmed, blank entries are dropped and duplicates collapse onto
//! their first occurrence.

use indexmap::IndexSet;
use serde::Serialize;

/// Name used when nothing else asks for a schema
pub const DEFAULT_SCHEMA_NAME: &str = "app";

/// Trim, drop blanks and dedupe, keeping first-seen order
pub fn normalize<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut names = NameSet::default();
    names.extend(values);
    names.into_vec()
}

/// Insertion-ordered set of normalized names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    names: IndexSet<String>,
}

impl NameSet {
    /// Add a name unless it is blank or already present
    pub fn insert(&mut self, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.names.insert(trimmed.to_string())
    }

    pub fn extend<S: AsRef<str>>(&mut self, values: &[S]) {
        for value in values {
            self.insert(value.as_ref());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names.into_iter().collect()
    }
}

/// Every schema/database name one build invocation needs, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSchemaSet {
    names: Vec<String>,
}

impl ResolvedSchemaSet {
    /// Falls back to the default name when `names` is empty
    pub fn from_names(names: NameSet) -> Self {
        let mut names = names.into_vec();
        if names.is_empty() {
            names.push(DEFAULT_SCHEMA_NAME.to_string());
        }
        Self { names }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&[], &[])]
    #[case(&["app"], &["app"])]
    #[case(&[" app ", "app", "", "   "], &["app"])]
    #[case(&["b", "a", "b", " a"], &["b", "a"])]
    fn test_normalize(#[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = ["  x", "y ", "x", "", "z", "y"];
        let once = normalize(&inputs);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_resolved_set_falls_back_to_default() {
        let resolved = ResolvedSchemaSet::from_names(NameSet::default());
        assert_eq!(resolved.as_slice(), &["app".to_string()]);
    }
}
