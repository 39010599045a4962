use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::model::{
    HttpMethod, Model, Operation, Parameter, PathItem, Response, SecurityRequirement,
    SecurityScheme, ServiceDescriptor,
};

const SERVICE_ID_EXTENSION: &str = "x-WM-SERVICE_ID";
const BASE_PATH_EXTENSION: &str = "x-WM-BASE_PATH";
const RELATIVE_PATH_EXTENSION: &str = "x-WM-RELATIVE_PATH";
const METHOD_NAME_EXTENSION: &str = "x-WM-METHOD_NAME";
const FULLY_QUALIFIED_TYPE_EXTENSION: &str = "x-WM-FULLY_QUALIFIED_TYPE";
const FULLY_QUALIFIED_NAME_EXTENSION: &str = "x-WM-FULLY_QUALIFIED_NAME";

/// Resolve a local JSON Reference like `#/parameters/pageSize` from the document root.
fn resolve_ref<'a>(root: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix("#/")?;
    let mut current = root;
    for segment in pointer.split('/') {
        let unescaped = segment.replace("~1", "/").replace("~0", "~");
        current = current.get(&unescaped)?;
    }
    Some(current)
}

/// Parse a service description from a YAML/JSON string.
pub fn parse_descriptor(input: &str) -> Result<ServiceDescriptor, ParseError> {
    // JSON is valid YAML, so one parser covers both encodings
    let root: Value =
        serde_yaml::from_str(input).map_err(|e| ParseError::ParseError(e.to_string()))?;

    let root_obj = root
        .as_object()
        .ok_or_else(|| ParseError::ParseError("document root must be an object".into()))?;

    detect_version(root_obj)?;

    let info = root_obj.get("info").and_then(|v| v.as_object());
    let service_id = info
        .and_then(|i| i.get(SERVICE_ID_EXTENSION))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let title = info
        .and_then(|i| i.get("title"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok(ServiceDescriptor {
        service_id,
        title,
        paths: parse_paths(root_obj, &root)?,
        definitions: parse_definitions(root_obj),
        security_definitions: parse_security_definitions(root_obj)?,
    })
}

/// Parse a service description from a file path.
pub fn parse_descriptor_file(path: &std::path::Path) -> Result<ServiceDescriptor, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_descriptor(&content)
}

/// Check the root `swagger` field.
fn detect_version(root: &Map<String, Value>) -> Result<(), ParseError> {
    match root.get("swagger").and_then(|v| v.as_str()) {
        Some(version) if version.starts_with("2.") => Ok(()),
        Some(version) => Err(ParseError::SchemaError(format!(
            "unsupported Swagger version: {} (only 2.x supported)",
            version
        ))),
        None => Err(ParseError::UnknownFormat),
    }
}

fn parse_paths(root: &Map<String, Value>, doc: &Value) -> Result<Vec<PathItem>, ParseError> {
    let paths = match root.get("paths").and_then(|v| v.as_object()) {
        Some(p) => p,
        None => return Ok(Vec::new()), // a document without paths describes no operations
    };

    let mut items = Vec::with_capacity(paths.len());
    for (key, path_value) in paths {
        let path_obj = path_value.as_object().ok_or_else(|| {
            ParseError::SchemaError(format!("path item for '{}' must be an object", key))
        })?;

        let path_params = parse_parameters(path_obj, doc)?;

        let mut operations = BTreeMap::new();
        for method in HttpMethod::ALL {
            let Some(op_value) = path_obj.get(method.slot()) else {
                continue;
            };
            // null method slots are tolerated
            if op_value.is_null() {
                continue;
            }
            let op_obj = op_value.as_object().ok_or_else(|| {
                ParseError::SchemaError(format!("operation {} {} must be an object", method, key))
            })?;
            operations.insert(method, parse_operation(op_obj, &path_params, doc)?);
        }

        items.push(PathItem {
            key: key.clone(),
            base_path: string_field(path_obj, BASE_PATH_EXTENSION).unwrap_or_default(),
            template: string_field(path_obj, RELATIVE_PATH_EXTENSION)
                .unwrap_or_else(|| key.clone()),
            operations,
        });
    }

    Ok(items)
}

fn parse_operation(
    obj: &Map<String, Value>,
    path_params: &[Parameter],
    doc: &Value,
) -> Result<Operation, ParseError> {
    let own_params = parse_parameters(obj, doc)?;

    // Operation-level parameters override path-level ones with the same name and location
    let mut parameters: Vec<Parameter> = path_params
        .iter()
        .filter(|p| {
            !own_params
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    parameters.extend(own_params);

    Ok(Operation {
        operation_id: string_field(obj, "operationId"),
        method_name: string_field(obj, METHOD_NAME_EXTENSION),
        tags: string_list(obj, "tags"),
        parameters,
        consumes: string_list(obj, "consumes"),
        produces: string_list(obj, "produces"),
        security: parse_security(obj)?,
        responses: parse_responses(obj),
    })
}

/// Parse the `parameters` array of a path item or operation.
fn parse_parameters(obj: &Map<String, Value>, doc: &Value) -> Result<Vec<Parameter>, ParseError> {
    let Some(params) = obj.get("parameters").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    params
        .iter()
        .map(|item| {
            let item = match item.get("$ref").and_then(|v| v.as_str()) {
                Some(reference) => resolve_ref(doc, reference)
                    .ok_or_else(|| ParseError::UnresolvedRef(reference.to_string()))?,
                None => item,
            };
            let param_obj = item
                .as_object()
                .ok_or_else(|| ParseError::SchemaError("parameter must be an object".into()))?;
            let location = string_field(param_obj, "in").ok_or_else(|| {
                ParseError::SchemaError(format!(
                    "parameter '{}' has no 'in' attribute",
                    string_field(param_obj, "name").unwrap_or_default()
                ))
            })?;
            Ok(Parameter {
                name: string_field(param_obj, "name"),
                location,
                required: param_obj
                    .get("required")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
                param_type: string_field(param_obj, "type"),
                format: string_field(param_obj, "format"),
                items: param_obj.get("items").cloned(),
                schema: param_obj.get("schema").cloned(),
                fully_qualified_type: string_field(param_obj, FULLY_QUALIFIED_TYPE_EXTENSION),
            })
        })
        .collect()
}

fn parse_security(obj: &Map<String, Value>) -> Result<Vec<SecurityRequirement>, ParseError> {
    match obj.get("security") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ParseError::SchemaError(format!("invalid security requirement: {}", e))),
    }
}

fn parse_responses(obj: &Map<String, Value>) -> BTreeMap<String, Response> {
    obj.get("responses")
        .and_then(|v| v.as_object())
        .map(|responses| {
            responses
                .iter()
                .filter_map(|(code, value)| {
                    let response = value.as_object()?;
                    Some((
                        code.clone(),
                        Response {
                            description: string_field(response, "description"),
                            schema: response.get("schema").cloned(),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_definitions(root: &Map<String, Value>) -> BTreeMap<String, Model> {
    root.get("definitions")
        .and_then(|v| v.as_object())
        .map(|defs| {
            defs.iter()
                .map(|(name, schema)| {
                    let fully_qualified_name = schema
                        .get(FULLY_QUALIFIED_NAME_EXTENSION)
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    (
                        name.clone(),
                        Model {
                            fully_qualified_name,
                            schema: schema.clone(),
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_security_definitions(
    root: &Map<String, Value>,
) -> Result<BTreeMap<String, SecurityScheme>, ParseError> {
    let Some(defs) = root.get("securityDefinitions").and_then(|v| v.as_object()) else {
        return Ok(BTreeMap::new());
    };

    let mut schemes = BTreeMap::new();
    for (name, value) in defs {
        let obj = value.as_object().ok_or_else(|| {
            ParseError::SchemaError(format!("security scheme '{}' must be an object", name))
        })?;
        let scheme_type = string_field(obj, "type").ok_or_else(|| {
            ParseError::SchemaError(format!("security scheme '{}' has no type", name))
        })?;
        schemes.insert(
            name.clone(),
            SecurityScheme {
                scheme_type,
                name: string_field(obj, "name"),
                location: string_field(obj, "in"),
            },
        );
    }
    Ok(schemes)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}
