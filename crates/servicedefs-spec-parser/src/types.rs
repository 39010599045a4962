//! Fully-qualified type resolution against a document's model definitions.
//!
//! Model references resolve to the `x-WM-FULLY_QUALIFIED_NAME` of the target
//! definition, primitives map to their boxed Java types, and containers wrap
//! the resolved element type.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ParseError;
use crate::model::{Model, Operation, Parameter};

const FULLY_QUALIFIED_TYPE_EXTENSION: &str = "x-WM-FULLY_QUALIFIED_TYPE";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Return type of an operation with no success schema.
pub const VOID_TYPE: &str = "void";

/// (type, format) -> fully-qualified name. `None` format is the fallback for the type.
const PRIMITIVE_TYPES: &[(&str, Option<&str>, &str)] = &[
    ("integer", Some("int64"), "java.lang.Long"),
    ("integer", None, "java.lang.Integer"),
    ("number", Some("float"), "java.lang.Float"),
    ("number", None, "java.lang.Double"),
    ("string", Some("byte"), "java.lang.Byte"),
    ("string", Some("date"), "java.util.Date"),
    ("string", Some("date-time"), "java.util.Date"),
    ("string", None, "java.lang.String"),
    ("boolean", None, "java.lang.Boolean"),
    ("file", None, "java.io.File"),
    ("object", None, "java.lang.Object"),
];

/// Resolve the fully-qualified return type of an operation.
///
/// Looks at the `200` response first, then any other 2xx response, then
/// `default`. Operations without a response schema return [`VOID_TYPE`].
pub fn return_type(
    operation: &Operation,
    definitions: &BTreeMap<String, Model>,
) -> Result<String, ParseError> {
    let success = operation
        .responses
        .get("200")
        .or_else(|| {
            operation
                .responses
                .iter()
                .find(|(code, _)| code.starts_with('2'))
                .map(|(_, r)| r)
        })
        .or_else(|| operation.responses.get("default"));

    match success.and_then(|r| r.schema.as_ref()) {
        Some(schema) => schema_type(schema, definitions),
        None => Ok(VOID_TYPE.to_string()),
    }
}

/// Resolve the fully-qualified type of a declared parameter.
///
/// Returns `None` when the parameter carries no type information at all.
pub fn parameter_type(
    parameter: &Parameter,
    definitions: &BTreeMap<String, Model>,
) -> Result<Option<String>, ParseError> {
    if let Some(fqn) = &parameter.fully_qualified_type {
        return Ok(Some(fqn.clone()));
    }
    if let Some(schema) = &parameter.schema {
        return schema_type(schema, definitions).map(Some);
    }
    match parameter.param_type.as_deref() {
        Some("array") => {
            let element = match &parameter.items {
                Some(items) => schema_type(items, definitions)?,
                None => primitive("object", None).to_string(),
            };
            Ok(Some(list_of(&element)))
        }
        Some(ty) => Ok(Some(primitive(ty, parameter.format.as_deref()).to_string())),
        None => Ok(None),
    }
}

/// Resolve the fully-qualified type named by a JSON schema.
fn schema_type(schema: &Value, definitions: &BTreeMap<String, Model>) -> Result<String, ParseError> {
    if let Some(fqn) = schema
        .get(FULLY_QUALIFIED_TYPE_EXTENSION)
        .and_then(|v| v.as_str())
    {
        return Ok(fqn.to_string());
    }

    if let Some(reference) = schema.get("$ref").and_then(|v| v.as_str()) {
        return model_type(reference, definitions);
    }

    let ty = schema.get("type").and_then(|v| v.as_str());
    let format = schema.get("format").and_then(|v| v.as_str());
    match ty {
        Some("array") => {
            let element = match schema.get("items") {
                Some(items) => schema_type(items, definitions)?,
                None => primitive("object", None).to_string(),
            };
            Ok(list_of(&element))
        }
        Some("object") => match schema.get("additionalProperties") {
            Some(values) if values.is_object() => Ok(format!(
                "java.util.Map<java.lang.String,{}>",
                schema_type(values, definitions)?
            )),
            _ => Ok(primitive("object", None).to_string()),
        },
        Some(ty) => Ok(primitive(ty, format).to_string()),
        None => Ok(primitive("object", None).to_string()),
    }
}

fn model_type(reference: &str, definitions: &BTreeMap<String, Model>) -> Result<String, ParseError> {
    let name = reference.strip_prefix(DEFINITIONS_PREFIX).unwrap_or(reference);
    let model = definitions
        .get(name)
        .ok_or_else(|| ParseError::UnresolvedRef(reference.to_string()))?;
    Ok(model
        .fully_qualified_name
        .clone()
        .unwrap_or_else(|| name.to_string()))
}

fn primitive<'a>(ty: &'a str, format: Option<&str>) -> &'a str {
    PRIMITIVE_TYPES
        .iter()
        .find(|(t, f, _)| *t == ty && f.is_some() && *f == format)
        .or_else(|| PRIMITIVE_TYPES.iter().find(|(t, f, _)| *t == ty && f.is_none()))
        .map(|(_, _, fqn)| *fqn)
        .unwrap_or(ty)
}

fn list_of(element: &str) -> String {
    format!("java.util.List<{}>", element)
}
