//! # Document / Metadata Merge
//!
//! Lowers schema document definitions plus field metadata into
//! [`SchemaNode`]s.
//!
//! ## Precedence
//!
//! - Field metadata decides which fields a named type validates, whether
//!   each is required, the nullable override, and the target of a nested
//!   named reference.
//! - The schema document decides kinds, formats, enum values and
//!   constraints.
//!
//! ## Normalisation
//!
//! - `oneOf`/`anyOf` branches of `{"type": "null"}` become `nullable`; a
//!   single remaining branch is unwrapped.
//! - `type: ["string", "null"]` becomes `string` + `nullable`.
//! - A single-member `allOf` (the wrapper generators emit around optional
//!   references) is unwrapped.
//!
//! Lowering never follows references. A [`NodeKind::Reference`] is resolved
//! by name when the compiler reaches it, which is what keeps recursive types
//! finite.

use std::collections::BTreeMap;

use gate_core::TypeName;

use crate::document::PropertySchema;
use crate::error::CompileError;
use crate::metadata::{FieldMetadata, FieldShape, ScalarType, TypeFields};
use crate::node::{Constraints, Field, Format, NodeKind, Primitive, PrimitiveKind, SchemaNode};
use crate::store::SchemaStore;

/// Lower the named type `name` into an object (or alias) node.
///
/// # Errors
///
/// [`CompileError::UnknownType`] if the document does not define `name`;
/// [`CompileError::UnknownField`] if the metadata lists a field the
/// definition lacks; any lowering error of the type's properties.
pub fn lower_named(
    store: &SchemaStore,
    name: &TypeName,
    referenced_from: &str,
) -> Result<SchemaNode, CompileError> {
    let resolved = store.resolve(name).ok_or_else(|| CompileError::UnknownType {
        name: name.to_string(),
        location: referenced_from.to_string(),
    })?;
    let definition = resolved.definition;

    let is_object = definition.is_object_like() || (resolved.fields.is_some() && is_bare(definition));
    if !is_object {
        return lower_schema(definition, &FieldShape::Unspecified, name.as_str());
    }

    reject_foreign(definition, &[], "object", name.as_str())?;
    let fields = object_fields(definition, resolved.fields, name.as_str())?;
    Ok(SchemaNode::new(NodeKind::Object(fields)).nullable(nullable_of(definition)))
}

/// Lower one schema object given the metadata shape declared for it.
///
/// `location` is a dotted description (`Query8.nested.long`) used in
/// compile errors.
pub fn lower_schema(
    schema: &PropertySchema,
    shape: &FieldShape,
    location: &str,
) -> Result<SchemaNode, CompileError> {
    let mut nullable = schema.nullable.unwrap_or(false);

    if let Some(branches) = schema.one_of.as_ref().or(schema.any_of.as_ref()) {
        let mut kept = Vec::with_capacity(branches.len());
        for branch in branches {
            if branch.is_null_only() {
                nullable = true;
            } else {
                kept.push(branch);
            }
        }
        return match kept.as_slice() {
            [] => Err(CompileError::Unsupported {
                location: location.to_string(),
                feature: "union without a non-null branch".to_string(),
            }),
            [single] => {
                let node = lower_schema(single, shape, location)?;
                let inner = node.nullable;
                Ok(node.nullable(nullable || inner))
            }
            many => {
                let nodes = many
                    .iter()
                    .enumerate()
                    .map(|(i, branch)| {
                        lower_schema(branch, &FieldShape::Unspecified, &format!("{location}.oneOf[{i}]"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SchemaNode::new(NodeKind::Union(nodes)).nullable(nullable))
            }
        };
    }

    if let Some(members) = &schema.all_of {
        return match members.as_slice() {
            [single] => {
                let node = lower_schema(single, shape, location)?;
                let inner = node.nullable;
                Ok(node.nullable(nullable || inner))
            }
            _ => Err(CompileError::Unsupported {
                location: location.to_string(),
                feature: format!("allOf with {} members", members.len()),
            }),
        };
    }

    let (kinds, has_null) = match &schema.kind {
        Some(spec) => spec.split_null(),
        None => (Vec::new(), false),
    };
    nullable |= has_null;

    if let FieldShape::Named(target) = shape {
        let structural = kinds.is_empty() || kinds == ["object"];
        if structural && schema.enum_values.is_none() {
            return Ok(SchemaNode::reference(target.clone()).nullable(nullable));
        }
    }

    if let Some(reference) = &schema.reference {
        let name = TypeName::from_reference(reference).map_err(|source| CompileError::InvalidReference {
            location: location.to_string(),
            source,
        })?;
        return Ok(SchemaNode::reference(name).nullable(nullable));
    }

    if let Some(values) = &schema.enum_values {
        reject_foreign(schema, &[], "enum", location)?;
        return Ok(SchemaNode::new(NodeKind::Enum(enum_strings(values, location)?)).nullable(nullable));
    }

    match kinds.as_slice() {
        [] if has_null => Err(CompileError::Unsupported {
            location: location.to_string(),
            feature: "schema admitting only null".to_string(),
        }),
        [] => lower_untyped(schema, shape, nullable, location),
        ["array"] => lower_array(schema, shape, nullable, location),
        ["object"] => lower_object(schema, shape, nullable, location),
        [keyword] => {
            let kind = PrimitiveKind::from_keyword(keyword).ok_or_else(|| CompileError::UnknownKind {
                kind: keyword.to_string(),
                location: location.to_string(),
            })?;
            lower_primitive(schema, kind, Format::None, nullable, location)
        }
        many => Err(CompileError::Unsupported {
            location: location.to_string(),
            feature: format!("multiple types {}", many.join(", ")),
        }),
    }
}

/// No `type` keyword: fall back on structure, then on the metadata shape.
fn lower_untyped(
    schema: &PropertySchema,
    shape: &FieldShape,
    nullable: bool,
    location: &str,
) -> Result<SchemaNode, CompileError> {
    if schema.items.is_some() {
        return lower_array(schema, shape, nullable, location);
    }
    if schema.properties.is_some() {
        return lower_object(schema, shape, nullable, location);
    }
    match shape {
        FieldShape::Scalar(ScalarType::String) => {
            lower_primitive(schema, PrimitiveKind::String, Format::None, nullable, location)
        }
        FieldShape::Scalar(ScalarType::Number) => {
            lower_primitive(schema, PrimitiveKind::Number, Format::None, nullable, location)
        }
        FieldShape::Scalar(ScalarType::Boolean) => {
            lower_primitive(schema, PrimitiveKind::Boolean, Format::None, nullable, location)
        }
        FieldShape::Scalar(ScalarType::Date) => {
            lower_primitive(schema, PrimitiveKind::String, Format::DateTime, nullable, location)
        }
        FieldShape::Named(target) => Ok(SchemaNode::reference(target.clone()).nullable(nullable)),
        FieldShape::Array(_) => lower_array(schema, shape, nullable, location),
        FieldShape::Inline(_) => lower_object(schema, shape, nullable, location),
        FieldShape::Unspecified => Err(CompileError::MissingType {
            location: location.to_string(),
        }),
    }
}

fn lower_primitive(
    schema: &PropertySchema,
    kind: PrimitiveKind,
    fallback_format: Format,
    nullable: bool,
    location: &str,
) -> Result<SchemaNode, CompileError> {
    if schema.min_items.is_some() {
        return Err(not_applicable("minItems", kind.as_str(), location));
    }
    if schema.max_items.is_some() {
        return Err(not_applicable("maxItems", kind.as_str(), location));
    }

    let format = match schema.format.as_deref() {
        Some(keyword) => Format::from_keyword(keyword),
        None => fallback_format,
    };
    let constraints = Constraints {
        minimum: schema.minimum,
        maximum: schema.maximum,
        min_length: schema.min_length,
        max_length: schema.max_length,
        pattern: schema.pattern.clone(),
    };
    let primitive = Primitive::new(kind, format, constraints, location)?;
    Ok(SchemaNode::new(NodeKind::Primitive(primitive)).nullable(nullable))
}

fn lower_array(
    schema: &PropertySchema,
    shape: &FieldShape,
    nullable: bool,
    location: &str,
) -> Result<SchemaNode, CompileError> {
    reject_foreign(schema, &["minItems", "maxItems"], "array", location)?;

    let element_shape = shape.element().unwrap_or(&FieldShape::Unspecified);
    let element_location = format!("{location}[]");
    let element = match &schema.items {
        Some(items) => lower_schema(items, element_shape, &element_location)?,
        None => lower_schema(&PropertySchema::default(), element_shape, &element_location)?,
    };

    Ok(SchemaNode::new(NodeKind::Array {
        element: Box::new(element),
        min_items: schema.min_items,
        max_items: schema.max_items,
    })
    .nullable(nullable))
}

fn lower_object(
    schema: &PropertySchema,
    shape: &FieldShape,
    nullable: bool,
    location: &str,
) -> Result<SchemaNode, CompileError> {
    reject_foreign(schema, &[], "object", location)?;
    let fields = object_fields(schema, shape.inline_fields(), location)?;
    Ok(SchemaNode::new(NodeKind::Object(fields)).nullable(nullable))
}

/// Fields of an object schema. With metadata, exactly the listed fields;
/// without, every declared property.
fn object_fields(
    schema: &PropertySchema,
    metadata: Option<&TypeFields>,
    owner: &str,
) -> Result<BTreeMap<String, Field>, CompileError> {
    let mut fields = BTreeMap::new();

    match metadata {
        Some(declared) => {
            for (name, meta) in declared {
                let property = schema.property(name).ok_or_else(|| CompileError::UnknownField {
                    owner: owner.to_string(),
                    field: name.clone(),
                })?;
                fields.insert(name.clone(), declared_field(property, meta, &format!("{owner}.{name}"))?);
            }
        }
        None => {
            for (name, property) in schema.properties.iter().flatten() {
                let node = lower_schema(property, &FieldShape::Unspecified, &format!("{owner}.{name}"))?;
                fields.insert(
                    name.clone(),
                    Field {
                        node,
                        required: schema.requires(name),
                    },
                );
            }
        }
    }

    Ok(fields)
}

fn declared_field(
    property: &PropertySchema,
    meta: &FieldMetadata,
    location: &str,
) -> Result<Field, CompileError> {
    let mut node = lower_schema(property, &meta.shape, location)?;
    if let Some(nullable) = meta.nullable {
        node.nullable = nullable;
        node.nullable_pinned = true;
    }
    Ok(Field {
        node,
        required: meta.required,
    })
}

fn enum_strings(values: &[serde_json::Value], location: &str) -> Result<Vec<String>, CompileError> {
    if values.is_empty() {
        return Err(CompileError::InvalidEnum {
            location: location.to_string(),
            reason: "enum has no values".to_string(),
        });
    }
    let mut strings: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let s = value.as_str().ok_or_else(|| CompileError::InvalidEnum {
            location: location.to_string(),
            reason: format!("enum value {value} is not a string"),
        })?;
        if !strings.iter().any(|existing| existing == s) {
            strings.push(s.to_string());
        }
    }
    Ok(strings)
}

/// No type keyword and no structural keyword.
fn is_bare(schema: &PropertySchema) -> bool {
    schema.kind.is_none()
        && schema.reference.is_none()
        && schema.enum_values.is_none()
        && schema.one_of.is_none()
        && schema.any_of.is_none()
        && schema.all_of.is_none()
        && schema.items.is_none()
}

fn nullable_of(schema: &PropertySchema) -> bool {
    let listed = schema.kind.as_ref().is_some_and(|spec| spec.split_null().1);
    schema.nullable.unwrap_or(false) || listed
}

/// Reject every constraint keyword outside `allowed` for a non-primitive kind.
fn reject_foreign(
    schema: &PropertySchema,
    allowed: &[&'static str],
    kind: &str,
    location: &str,
) -> Result<(), CompileError> {
    let present = [
        ("minimum", schema.minimum.is_some()),
        ("maximum", schema.maximum.is_some()),
        ("minLength", schema.min_length.is_some()),
        ("maxLength", schema.max_length.is_some()),
        ("pattern", schema.pattern.is_some()),
        ("minItems", schema.min_items.is_some()),
        ("maxItems", schema.max_items.is_some()),
    ];
    match present
        .into_iter()
        .find(|(keyword, set)| *set && !allowed.contains(keyword))
    {
        Some((keyword, _)) => Err(not_applicable(keyword, kind, location)),
        None => Ok(()),
    }
}

fn not_applicable(constraint: &'static str, kind: &str, location: &str) -> CompileError {
    CompileError::ConstraintNotApplicable {
        constraint,
        kind: kind.to_string(),
        location: location.to_string(),
    }
}
