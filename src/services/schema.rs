//! Tool-schema translation into the foreign SDK's format
//!
//! The unified [`ParameterSchema`] tree maps onto the SDK's schema builder:
//! objects become structured types with one field per declared property,
//! primitives map 1:1, arrays carry unconstrained elements, and everything
//! outside the known kinds degrades to "any". Translation is deterministic
//! (identical input always yields an equivalent output) and never fails
//! outright, so one malformed property cannot take down its siblings or the
//! other tools in a request.

use indexmap::IndexMap;

use super::sdk::{SdkProperty, SdkSchema};
use crate::content::ParameterSchema;

/// Translate a tool declaration's parameter schema.
///
/// The SDK expects an object schema at the root; any other root degrades to
/// an empty object schema.
#[must_use]
pub fn translate_parameters(schema: &ParameterSchema) -> SdkSchema {
    match schema {
        ParameterSchema::Object { .. } => translate_node(schema),
        _ => SdkSchema::empty_object(),
    }
}

fn translate_node(schema: &ParameterSchema) -> SdkSchema {
    match schema {
        ParameterSchema::Object {
            properties,
            required,
            ..
        } => {
            let properties: IndexMap<String, SdkProperty> = properties
                .iter()
                .map(|(name, property)| {
                    let optional = !required.iter().any(|r| r == name);
                    (
                        name.clone(),
                        SdkProperty {
                            schema: translate_node(property),
                            optional,
                            description: property.description().map(String::from),
                        },
                    )
                })
                .collect();
            SdkSchema::Object { properties }
        }
        ParameterSchema::String { .. } => SdkSchema::String,
        ParameterSchema::Number { .. } => SdkSchema::Number,
        ParameterSchema::Boolean { .. } => SdkSchema::Boolean,
        // Element typing is not forwarded: the SDK sees an array of
        // unconstrained values regardless of the declared element kind.
        ParameterSchema::Array { .. } => SdkSchema::Array {
            items: Box::new(SdkSchema::Any),
        },
        ParameterSchema::Unconstrained => SdkSchema::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object_fields(schema: &SdkSchema) -> &IndexMap<String, SdkProperty> {
        match schema {
            SdkSchema::Object { properties } => properties,
            other => panic!("expected object schema, got {other:?}"),
        }
    }

    #[test]
    fn test_required_partition_matches_declaration() {
        let raw = json!({
            "type": "object",
            "properties": {
                "command": { "type": "string" },
                "timeout": { "type": "number" },
                "background": { "type": "boolean" }
            },
            "required": ["command", "background"]
        });

        let translated = translate_parameters(&ParameterSchema::from_json(&raw));
        let fields = object_fields(&translated);
        assert!(!fields["command"].optional);
        assert!(fields["timeout"].optional);
        assert!(!fields["background"].optional);
    }

    #[test]
    fn test_descriptions_copied_verbatim() {
        let raw = json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Glob pattern, e.g. **/*.rs" }
            }
        });

        let translated = translate_parameters(&ParameterSchema::from_json(&raw));
        assert_eq!(
            object_fields(&translated)["pattern"].description.as_deref(),
            Some("Glob pattern, e.g. **/*.rs")
        );
    }

    #[test]
    fn test_array_elements_are_unconstrained() {
        let raw = json!({
            "type": "object",
            "properties": {
                "paths": { "type": "array", "items": { "type": "string" } }
            }
        });

        let translated = translate_parameters(&ParameterSchema::from_json(&raw));
        assert_eq!(
            object_fields(&translated)["paths"].schema,
            SdkSchema::Array {
                items: Box::new(SdkSchema::Any)
            }
        );
    }

    #[test]
    fn test_nested_objects_recurse() {
        let raw = json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                }
            }
        });

        let translated = translate_parameters(&ParameterSchema::from_json(&raw));
        let nested = &object_fields(&translated)["filter"];
        assert!(!object_fields(&nested.schema)["name"].optional);
    }

    #[test]
    fn test_malformed_property_does_not_abort_siblings() {
        let raw = json!({
            "type": "object",
            "properties": {
                "broken": ["not", "a", "schema"],
                "fine": { "type": "string" }
            }
        });

        let translated = translate_parameters(&ParameterSchema::from_json(&raw));
        let fields = object_fields(&translated);
        assert_eq!(fields["broken"].schema, SdkSchema::Any);
        assert_eq!(fields["fine"].schema, SdkSchema::String);
    }

    #[test]
    fn test_non_object_root_degrades_to_empty_object() {
        let translated = translate_parameters(&ParameterSchema::Unconstrained);
        assert!(object_fields(&translated).is_empty());
    }

    #[test]
    fn test_translation_is_deterministic() {
        let raw = json!({
            "type": "object",
            "properties": {
                "b": { "type": "string" },
                "a": { "type": "number" }
            }
        });
        let schema = ParameterSchema::from_json(&raw);

        let first = translate_parameters(&schema);
        let second = translate_parameters(&schema);
        assert_eq!(first, second);
        // Declaration order survives translation.
        let names: Vec<&String> = object_fields(&first).keys().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
