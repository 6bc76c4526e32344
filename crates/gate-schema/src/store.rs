//! # Schema Store
//!
//! The immutable compiler input: the schema document, the field-metadata
//! table and the exclusion set, assembled once by [`SchemaStoreBuilder`]
//! before any validation runs.
//!
//! Building the store is the explicit registration step. Nothing registers
//! types as a side effect of being loaded, so the contents do not depend on
//! load order.

use std::collections::BTreeSet;

use gate_core::TypeName;

use crate::document::{PropertySchema, SchemaDocument};
use crate::exclusion::ExclusionSet;
use crate::metadata::{MetadataTable, TypeFields};
use crate::operations::OperationIndex;

/// A named type as the compiler sees it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedType<'a> {
    /// The type name.
    pub name: &'a TypeName,
    /// Schema document definition.
    pub definition: &'a PropertySchema,
    /// Field metadata, when the table has an entry for the type.
    pub fields: Option<&'a TypeFields>,
}

/// Named type definitions, field metadata and exclusions.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    document: SchemaDocument,
    metadata: MetadataTable,
    exclusions: ExclusionSet,
}

impl SchemaStore {
    /// Start assembling a store.
    pub fn builder() -> SchemaStoreBuilder {
        SchemaStoreBuilder::default()
    }

    /// Schema document definition of `name`.
    pub fn definition(&self, name: &TypeName) -> Option<&PropertySchema> {
        self.document.definition(name)
    }

    /// Field metadata of `name`.
    pub fn field_metadata(&self, name: &TypeName) -> Option<&TypeFields> {
        self.metadata.fields(name)
    }

    /// Definition and metadata of `name`, or `None` if the document does
    /// not define it.
    pub fn resolve<'a>(&'a self, name: &'a TypeName) -> Option<ResolvedType<'a>> {
        let definition = self.document.definition(name)?;
        Some(ResolvedType {
            name,
            definition,
            fields: self.metadata.fields(name),
        })
    }

    /// Whether `name` is in the exclusion set.
    pub fn is_excluded(&self, name: &TypeName) -> bool {
        self.exclusions.is_excluded(name)
    }

    /// The exclusion set.
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Every name known to the document or the metadata table, sorted.
    pub fn type_names(&self) -> BTreeSet<TypeName> {
        self.document
            .type_names()
            .chain(self.metadata.type_names())
            .cloned()
            .collect()
    }

    /// Operation index of the document.
    pub fn operations(&self) -> &OperationIndex {
        self.document.operations()
    }

    /// The schema document.
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }
}

/// Assembles a [`SchemaStore`].
#[derive(Debug, Default)]
pub struct SchemaStoreBuilder {
    document: SchemaDocument,
    metadata: MetadataTable,
    exclusions: ExclusionSet,
}

impl SchemaStoreBuilder {
    /// Use `document` as the schema document.
    pub fn document(mut self, document: SchemaDocument) -> Self {
        self.document = document;
        self
    }

    /// Use `metadata` as the field-metadata table.
    pub fn metadata(mut self, metadata: MetadataTable) -> Self {
        self.metadata = metadata;
        self
    }

    /// Declare the field metadata of one type, replacing any table entry.
    pub fn declare(mut self, name: TypeName, fields: TypeFields) -> Self {
        self.metadata.declare(name, fields);
        self
    }

    /// Exclude `name` from validation.
    pub fn exclude(mut self, name: TypeName) -> Self {
        self.exclusions.register(name);
        self
    }

    /// Exclude every name in `names`.
    pub fn exclude_all(mut self, names: impl IntoIterator<Item = TypeName>) -> Self {
        self.exclusions.extend(names);
        self
    }

    /// Freeze the inputs.
    pub fn build(self) -> SchemaStore {
        for name in self.exclusions.iter() {
            if self.document.definition(name).is_none() {
                tracing::warn!(type_name = %name, "excluded type is not defined in the schema document");
            }
        }
        tracing::debug!(
            types = self.document.len(),
            metadata = self.metadata.len(),
            excluded = self.exclusions.len(),
            operations = self.document.operations().len(),
            "schema store built"
        );
        SchemaStore {
            document: self.document,
            metadata: self.metadata,
            exclusions: self.exclusions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldMetadata, FieldShape, ScalarType};
    use serde_json::json;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    fn store() -> SchemaStore {
        let document = SchemaDocument::from_value(&json!({
            "Query1": { "type": "object", "properties": { "str1": { "type": "string" } } },
            "LegacyBlob": { "type": "object" }
        }))
        .unwrap();
        let mut fields = TypeFields::new();
        fields.insert(
            "str1".to_string(),
            FieldMetadata::new(true, FieldShape::Scalar(ScalarType::String)),
        );
        SchemaStore::builder()
            .document(document)
            .declare(name("Query1"), fields)
            .exclude(name("LegacyBlob"))
            .build()
    }

    #[test]
    fn resolves_definition_with_metadata() {
        let store = store();
        let q1 = name("Query1");
        let resolved = store.resolve(&q1).unwrap();
        assert!(resolved.definition.is_object_like());
        assert!(resolved.fields.unwrap()["str1"].required);
    }

    #[test]
    fn resolves_definition_without_metadata() {
        let store = store();
        let blob = name("LegacyBlob");
        assert!(store.resolve(&blob).unwrap().fields.is_none());
        assert!(store.is_excluded(&blob));
    }

    #[test]
    fn unknown_name_does_not_resolve() {
        let store = store();
        assert!(store.resolve(&name("Ghost")).is_none());
    }

    #[test]
    fn type_names_merge_document_and_metadata() {
        let store = SchemaStore::builder()
            .document(store().document().clone())
            .declare(name("OnlyInMetadata"), TypeFields::new())
            .build();
        let names: Vec<String> = store.type_names().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["LegacyBlob", "OnlyInMetadata", "Query1"]);
    }
}
