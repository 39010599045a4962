use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parsed service description document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// The `info.x-WM-SERVICE_ID` field. Empty when the document omits it.
    pub service_id: String,
    /// The `info.title` field, if present.
    pub title: Option<String>,
    /// Path items in key order.
    pub paths: Vec<PathItem>,
    /// Model definitions keyed by definition name.
    pub definitions: BTreeMap<String, Model>,
    /// Security schemes keyed by scheme name.
    pub security_definitions: BTreeMap<String, SecurityScheme>,
}

impl ServiceDescriptor {
    /// Iterate every operation in the document together with its path item.
    pub fn operations(&self) -> impl Iterator<Item = (&PathItem, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|path| {
            path.operations
                .iter()
                .map(move |(method, op)| (path, *method, op))
        })
    }
}

/// One entry of the `paths` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// The key under `paths` (e.g. "/orders/{id}").
    pub key: String,
    /// The controller base path from `x-WM-BASE_PATH`.
    pub base_path: String,
    /// The URL template relative to the base path, from `x-WM-RELATIVE_PATH`
    /// or the path key when the extension is absent.
    pub template: String,
    /// Operations keyed by the method slot they occupy.
    pub operations: BTreeMap<HttpMethod, Operation>,
}

impl PathItem {
    /// The method slot holding the operation with the given id.
    pub fn method_of(&self, operation_id: &str) -> Option<HttpMethod> {
        self.operations
            .iter()
            .find(|(_, op)| op.operation_id.as_deref() == Some(operation_id))
            .map(|(method, _)| *method)
    }

    /// Base path concatenated with the template. No normalization.
    pub fn relative_path(&self) -> String {
        format!("{}{}", self.base_path, self.template)
    }
}

/// HTTP method slots recognized on a Swagger path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
    ];

    /// The lowercase key used in the document.
    pub fn slot(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }

    /// The uppercase verb emitted in service definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A security requirement object: scheme name -> scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// A single operation on a path item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// The `operationId`, if present.
    pub operation_id: Option<String>,
    /// The Java method name from `x-WM-METHOD_NAME`.
    pub method_name: Option<String>,
    /// Tags; the first one names the owning controller.
    pub tags: Vec<String>,
    /// Declared parameters, path-level ones first.
    pub parameters: Vec<Parameter>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    /// Security requirements in declaration order.
    pub security: Vec<SecurityRequirement>,
    /// Responses keyed by status code (or "default").
    pub responses: BTreeMap<String, Response>,
}

/// A declared operation parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,
    /// The `in` attribute (path, query, body, header, formData).
    pub location: String,
    pub required: bool,
    /// The primitive `type` for non-body parameters.
    pub param_type: Option<String>,
    pub format: Option<String>,
    /// Item schema for array parameters.
    pub items: Option<serde_json::Value>,
    /// Body schema.
    pub schema: Option<serde_json::Value>,
    /// The `x-WM-FULLY_QUALIFIED_TYPE` extension.
    pub fully_qualified_type: Option<String>,
}

/// A response entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    pub schema: Option<serde_json::Value>,
}

/// A model definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    /// The `x-WM-FULLY_QUALIFIED_NAME` extension.
    pub fully_qualified_name: Option<String>,
    /// The raw schema object.
    pub schema: serde_json::Value,
}

/// A security scheme definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// The scheme `type` (basic, apiKey, oauth2).
    pub scheme_type: String,
    pub name: Option<String>,
    pub location: Option<String>,
}
