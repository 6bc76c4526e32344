//! # Field Paths
//!
//! Location of a value inside a validated payload. Serializes as an array
//! of keys and indices (`["query1", "arr", 2]`) and displays in dotted form
//! (`query1.arr[2]`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array position.
    Index(usize),
    /// Object key.
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path from the root of a payload to one of its values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, pointing at the payload itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this path points at the payload itself.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Remove the last segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// Segments from root to leaf.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_display() {
        assert_eq!(FieldPath::root().to_string(), "(root)");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn dotted_display_with_indices() {
        let path = FieldPath::root()
            .child("arr")
            .child(1usize)
            .child("query1")
            .child("nbr1");
        assert_eq!(path.to_string(), "arr[1].query1.nbr1");
    }

    #[test]
    fn serializes_as_mixed_array() {
        let path = FieldPath::root().child("arr2d").child(1usize).child(0usize);
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!(["arr2d", 1, 0]));
    }

    #[test]
    fn push_and_pop_are_symmetric() {
        let mut path = FieldPath::root();
        path.push("a");
        path.push(3usize);
        assert_eq!(path.len(), 2);
        assert_eq!(path.pop(), Some(PathSegment::Index(3)));
        assert_eq!(path.pop(), Some(PathSegment::Key("a".to_string())));
        assert!(path.is_empty());
    }

    proptest! {
        #[test]
        fn json_round_trip(keys in prop::collection::vec("[a-z]{1,8}", 0..6), idx in 0usize..100) {
            let mut path: FieldPath = keys.iter().map(|k| PathSegment::Key(k.clone())).collect();
            path.push(idx);
            let json = serde_json::to_string(&path).unwrap();
            let back: FieldPath = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, path);
        }
    }
}
