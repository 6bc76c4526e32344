//! # Node Compiler
//!
//! Turns [`SchemaNode`]s into [`Validator`]s.
//!
//! ## Resolution of named types
//!
//! A reference compiles to a by-name delegation ([`Rule::Named`]); the
//! referenced type is compiled once, into the shared [`ValidatorCache`].
//! While a type is being compiled it sits in the compiler's pending table,
//! so a reference back to it (directly or through other types) finds it
//! there and stops. Self- and mutually-recursive types therefore compile
//! in finite time, and a cycle through an excluded type never even starts.
//!
//! A reference accepts null when the referenced type is nullable, since
//! keywords next to a `$ref` carry no meaning. Only a `nullable` set by
//! field metadata overrides this.
//!
//! Pending validators are committed to the cache only after the whole
//! compilation succeeded. A failed compilation leaves the cache untouched.
//!
//! ## Concurrency
//!
//! The cache is the only shared state. Two threads may compile the same
//! type at the same time; the first commit wins and the second is dropped,
//! so the cache always holds one validator per name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gate_core::TypeName;
use parking_lot::RwLock;

use crate::coerce;
use crate::error::CompileError;
use crate::merge;
use crate::node::{NodeKind, Primitive, PrimitiveKind, SchemaNode};
use crate::store::SchemaStore;
use crate::validator::{NumberRule, Rule, StringRule, Validator};

/// Compiled validators of named types, shared by every session on a store.
#[derive(Debug, Default)]
pub struct ValidatorCache {
    entries: RwLock<HashMap<TypeName, Arc<Validator>>>,
}

impl ValidatorCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached validator of `name`.
    pub fn get(&self, name: &TypeName) -> Option<Arc<Validator>> {
        self.entries.read().get(name).cloned()
    }

    /// Whether `name` has been compiled.
    pub fn contains(&self, name: &TypeName) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Number of compiled types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Insert unless present; returns the validator now cached.
    fn insert(&self, name: TypeName, validator: Validator) -> Arc<Validator> {
        self.entries
            .write()
            .entry(name)
            .or_insert_with(|| Arc::new(validator))
            .clone()
    }
}

/// A named type of the current pass. `validator` is `None` while the type
/// is still being compiled.
struct Pending {
    nullable: bool,
    validator: Option<Validator>,
}

/// One compilation pass over a store.
pub struct Compiler<'a> {
    store: &'a SchemaStore,
    cache: &'a ValidatorCache,
    pending: BTreeMap<TypeName, Pending>,
}

impl<'a> Compiler<'a> {
    /// Compiler reading `store` and committing into `cache`.
    pub fn new(store: &'a SchemaStore, cache: &'a ValidatorCache) -> Self {
        Self {
            store,
            cache,
            pending: BTreeMap::new(),
        }
    }

    /// Compile the named type `name` and commit everything it pulled in.
    ///
    /// An excluded name compiles to an accept-anything validator.
    ///
    /// # Errors
    ///
    /// Any [`CompileError`] raised for `name` or a type it references.
    pub fn compile_named(mut self, name: &TypeName) -> Result<Arc<Validator>, CompileError> {
        if let Some(cached) = self.cache.get(name) {
            tracing::trace!(type_name = %name, "validator cache hit");
            return Ok(cached);
        }

        if self.store.is_excluded(name) {
            tracing::debug!(type_name = %name, "type excluded from validation");
            let accept = Validator {
                required: true,
                nullable: true,
                rule: Rule::Accept(Some(name.clone())),
            };
            return Ok(self.cache.insert(name.clone(), accept));
        }

        self.require_named(name, name.as_str())?;
        let committed = self.commit();
        match committed.into_iter().find(|(n, _)| n == name) {
            Some((_, validator)) => Ok(validator),
            None => self.cache.get(name).ok_or_else(|| CompileError::UnknownType {
                name: name.to_string(),
                location: name.to_string(),
            }),
        }
    }

    /// Compile an anonymous node, e.g. an inline response schema, and
    /// commit the named types it references.
    ///
    /// # Errors
    ///
    /// Any [`CompileError`] raised for the node or a referenced type.
    pub fn compile_inline(mut self, node: &SchemaNode, location: &str) -> Result<Validator, CompileError> {
        let validator = self.compile(node, true, location)?;
        self.commit();
        Ok(validator)
    }

    /// Compile `node` with the given presence requirement.
    pub(crate) fn compile(
        &mut self,
        node: &SchemaNode,
        required: bool,
        location: &str,
    ) -> Result<Validator, CompileError> {
        let mut nullable = node.nullable;
        let rule = match &node.kind {
            NodeKind::Union(branches) => {
                let compiled = branches
                    .iter()
                    .enumerate()
                    .map(|(i, branch)| self.compile(branch, true, &format!("{location}.oneOf[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                Rule::Union(compiled)
            }
            NodeKind::Reference(name) => {
                if self.store.is_excluded(name) {
                    tracing::debug!(type_name = %name, location, "reference to excluded type accepts any value");
                    Rule::Accept(Some(name.clone()))
                } else {
                    self.require_named(name, location)?;
                    if !node.nullable_pinned {
                        nullable |= self.named_nullable(name);
                    }
                    Rule::Named(name.clone())
                }
            }
            NodeKind::Array {
                element,
                min_items,
                max_items,
            } => Rule::Array {
                element: Box::new(self.compile(element, true, &format!("{location}[]"))?),
                min_items: *min_items,
                max_items: *max_items,
            },
            NodeKind::Object(fields) => {
                let mut compiled = BTreeMap::new();
                for (name, field) in fields {
                    let validator = self.compile(&field.node, field.required, &format!("{location}.{name}"))?;
                    compiled.insert(name.clone(), validator);
                }
                Rule::Object(compiled)
            }
            NodeKind::Primitive(primitive) => primitive_rule(primitive, location)?,
            NodeKind::Enum(values) => Rule::Enum(values.clone()),
        };

        Ok(Validator {
            required,
            nullable,
            rule,
        })
    }

    /// Make sure `name` is compiled, cached, or in progress.
    fn require_named(&mut self, name: &TypeName, location: &str) -> Result<(), CompileError> {
        if self.pending.contains_key(name) || self.cache.contains(name) {
            return Ok(());
        }

        let node = merge::lower_named(self.store, name, location)?;
        self.pending.insert(
            name.clone(),
            Pending {
                nullable: node.nullable,
                validator: None,
            },
        );
        let validator = self.compile(&node, true, name.as_str())?;
        tracing::debug!(type_name = %name, "compiled named type");
        if let Some(pending) = self.pending.get_mut(name) {
            pending.validator = Some(validator);
        }
        Ok(())
    }

    /// Own nullability of the named type `name`, compiled or in progress.
    fn named_nullable(&self, name: &TypeName) -> bool {
        match self.pending.get(name) {
            Some(pending) => pending.nullable,
            None => self.cache.get(name).is_some_and(|v| v.nullable),
        }
    }

    fn commit(&mut self) -> Vec<(TypeName, Arc<Validator>)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter_map(|(name, pending)| pending.validator.map(|v| (name, v)))
            .map(|(name, validator)| {
                let cached = self.cache.insert(name.clone(), validator);
                (name, cached)
            })
            .collect()
    }
}

fn primitive_rule(primitive: &Primitive, location: &str) -> Result<Rule, CompileError> {
    let constraints = primitive.constraints();
    Ok(match primitive.kind() {
        PrimitiveKind::String => {
            let pattern = match &constraints.pattern {
                Some(source) => {
                    let regex = coerce::full_match(source).map_err(|e| CompileError::InvalidPattern {
                        pattern: source.clone(),
                        location: location.to_string(),
                        reason: e.to_string(),
                    })?;
                    Some((regex, source.clone()))
                }
                None => None,
            };
            Rule::String(StringRule {
                format: primitive.format(),
                min_length: constraints.min_length,
                max_length: constraints.max_length,
                pattern,
            })
        }
        kind @ (PrimitiveKind::Number | PrimitiveKind::Integer) => Rule::Number(NumberRule {
            integer: kind == PrimitiveKind::Integer,
            minimum: constraints.minimum,
            maximum: constraints.maximum,
        }),
        PrimitiveKind::Boolean => Rule::Boolean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SchemaDocument;
    use serde_json::json;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    fn store(document: serde_json::Value) -> SchemaStore {
        SchemaStore::builder()
            .document(SchemaDocument::from_value(&document).unwrap())
            .exclude(name("Opaque"))
            .build()
    }

    #[test]
    fn self_recursive_type_compiles() {
        let store = store(json!({
            "TreeNode": {
                "type": "object",
                "properties": {
                    "label": { "type": "string" },
                    "children": { "type": "array", "items": { "$ref": "#/components/schemas/TreeNode" } }
                },
                "required": ["label"]
            }
        }));
        let cache = ValidatorCache::new();
        let validator = Compiler::new(&store, &cache).compile_named(&name("TreeNode")).unwrap();
        assert_eq!(validator.expected(), "object");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn mutually_recursive_types_compile_together() {
        let store = store(json!({
            "Employee": {
                "type": "object",
                "properties": { "department": { "$ref": "#/components/schemas/Department" } }
            },
            "Department": {
                "type": "object",
                "properties": {
                    "staff": { "type": "array", "items": { "$ref": "#/components/schemas/Employee" } }
                }
            }
        }));
        let cache = ValidatorCache::new();
        Compiler::new(&store, &cache).compile_named(&name("Employee")).unwrap();
        assert!(cache.contains(&name("Employee")));
        assert!(cache.contains(&name("Department")));
    }

    #[test]
    fn failed_compilation_leaves_cache_empty() {
        let store = store(json!({
            "Good": { "type": "object", "properties": { "n": { "type": "number" } } },
            "Outer": {
                "type": "object",
                "properties": {
                    "good": { "$ref": "#/components/schemas/Good" },
                    "bad": { "$ref": "#/components/schemas/Missing" }
                }
            }
        }));
        let cache = ValidatorCache::new();
        let err = Compiler::new(&store, &cache).compile_named(&name("Outer")).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownType {
                name: "Missing".to_string(),
                location: "Outer.bad".to_string(),
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn excluded_reference_accepts_anything() {
        let store = store(json!({
            "Holder": {
                "type": "object",
                "properties": { "blob": { "$ref": "#/components/schemas/Opaque" } },
                "required": ["blob"]
            },
            "Opaque": { "type": "object", "properties": { "self": { "$ref": "#/components/schemas/Opaque" } } }
        }));
        let cache = ValidatorCache::new();
        Compiler::new(&store, &cache).compile_named(&name("Holder")).unwrap();
        assert!(!cache.contains(&name("Opaque")));

        let opaque = Compiler::new(&store, &cache).compile_named(&name("Opaque")).unwrap();
        assert!(opaque.accepts_anything());
    }

    #[test]
    fn invalid_pattern_is_a_compile_error() {
        let store = store(json!({
            "Bad": { "type": "object", "properties": { "s": { "type": "string", "pattern": "(" } } }
        }));
        let cache = ValidatorCache::new();
        let err = Compiler::new(&store, &cache).compile_named(&name("Bad")).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPattern { ref location, .. } if location == "Bad.s"));
    }

    #[test]
    fn second_compilation_hits_cache() {
        let store = store(json!({ "A": { "type": "object", "properties": {} } }));
        let cache = ValidatorCache::new();
        let first = Compiler::new(&store, &cache).compile_named(&name("A")).unwrap();
        let second = Compiler::new(&store, &cache).compile_named(&name("A")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn reference_inherits_nullability_of_referenced_type() {
        let store = store(json!({
            "Maybe": { "type": "object", "nullable": true, "properties": {} },
            "Holder": {
                "type": "object",
                "properties": { "m": { "$ref": "#/components/schemas/Maybe" } },
                "required": ["m"]
            }
        }));
        let cache = ValidatorCache::new();
        let holder = Compiler::new(&store, &cache).compile_named(&name("Holder")).unwrap();
        let Rule::Object(fields) = &holder.rule else { panic!("object") };
        assert!(fields["m"].is_required());
        assert!(fields["m"].is_nullable());
        assert!(cache.get(&name("Maybe")).unwrap().is_nullable());
    }

    #[test]
    fn already_compiled_reference_inherits_nullability() {
        let store = store(json!({
            "Maybe": { "type": "string", "nullable": true },
            "Holder": {
                "type": "object",
                "properties": { "m": { "$ref": "#/components/schemas/Maybe" } }
            }
        }));
        let cache = ValidatorCache::new();
        Compiler::new(&store, &cache).compile_named(&name("Maybe")).unwrap();
        let holder = Compiler::new(&store, &cache).compile_named(&name("Holder")).unwrap();
        let Rule::Object(fields) = &holder.rule else { panic!("object") };
        assert!(fields["m"].is_nullable());
    }

    #[test]
    fn metadata_nullable_overrides_referenced_type() {
        let document = SchemaDocument::from_value(&json!({
            "Maybe": { "type": "object", "nullable": true, "properties": {} },
            "Holder": {
                "type": "object",
                "properties": { "m": { "$ref": "#/components/schemas/Maybe" } }
            }
        }))
        .unwrap();
        let mut fields = crate::metadata::TypeFields::new();
        let mut m = crate::metadata::FieldMetadata::new(true, crate::metadata::FieldShape::Named(name("Maybe")));
        m.nullable = Some(false);
        fields.insert("m".to_string(), m);
        let store = SchemaStore::builder().document(document).declare(name("Holder"), fields).build();
        let cache = ValidatorCache::new();
        let holder = Compiler::new(&store, &cache).compile_named(&name("Holder")).unwrap();
        let Rule::Object(fields) = &holder.rule else { panic!("object") };
        assert!(!fields["m"].is_nullable());
    }

    #[test]
    fn union_branches_are_required() {
        let store = store(json!({
            "U": {
                "type": "object",
                "properties": {
                    "v": { "oneOf": [{ "type": "number" }, { "type": "boolean" }] }
                }
            }
        }));
        let cache = ValidatorCache::new();
        let root = Compiler::new(&store, &cache).compile_named(&name("U")).unwrap();
        let Rule::Object(fields) = &root.rule else { panic!("object") };
        assert!(!fields["v"].is_required());
        let Rule::Union(branches) = &fields["v"].rule else { panic!("union") };
        assert!(branches.iter().all(Validator::is_required));
    }
}
