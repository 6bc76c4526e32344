//! # Exclusion Set
//!
//! Named types deliberately left unmodelled. A reference to an excluded type
//! compiles to an accept-anything validator, which also cuts recursion
//! through excluded self-referential types.
//!
//! The set is filled by [`SchemaStoreBuilder`](crate::store::SchemaStoreBuilder)
//! and is read-only once the store is built, so it is shared across threads
//! without locking.

use std::collections::BTreeSet;

use gate_core::TypeName;

/// Type names opted out of validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<TypeName>,
}

impl ExclusionSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name`. Returns false if it was already registered.
    pub fn register(&mut self, name: TypeName) -> bool {
        self.names.insert(name)
    }

    /// Whether `name` is excluded from validation.
    pub fn is_excluded(&self, name: &TypeName) -> bool {
        self.names.contains(name)
    }

    /// Number of excluded names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Excluded names, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.names.iter()
    }
}

impl FromIterator<TypeName> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = TypeName>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl Extend<TypeName> for ExclusionSet {
    fn extend<I: IntoIterator<Item = TypeName>>(&mut self, iter: I) {
        self.names.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    #[test]
    fn register_is_idempotent() {
        let mut set = ExclusionSet::new();
        assert!(set.register(name("LegacyBlob")));
        assert!(!set.register(name("LegacyBlob")));
        assert_eq!(set.len(), 1);
        assert!(set.is_excluded(&name("LegacyBlob")));
        assert!(!set.is_excluded(&name("Query1")));
    }

    #[test]
    fn collects_sorted() {
        let set: ExclusionSet = [name("B"), name("A")].into_iter().collect();
        let names: Vec<&str> = set.iter().map(TypeName::as_str).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
