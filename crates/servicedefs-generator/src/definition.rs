//! Service definition records emitted for runtime consumption.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// operationId -> definition, for one service.
///
/// Definitions are shared between the full build and the filtered result,
/// never copied.
pub type DefinitionMap = BTreeMap<String, Arc<ServiceDefinition>>;

/// Generated metadata for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub id: String,
    /// First tag of the operation.
    pub controller: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Same value as `type_name`.
    pub operation_type: String,
    /// Owning service id.
    pub service: String,
    #[serde(rename = "wmServiceOperationInfo")]
    pub operation_info: OperationInfo,
}

/// How to invoke the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    /// Declared method name (not the HTTP verb).
    pub name: String,
    pub http_method: String,
    /// Base path + template.
    pub relative_path: String,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    /// Mirrors `http_method`.
    pub method_type: String,
    pub parameters: Vec<OperationParameter>,
}

/// A parameter as the runtime sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationParameter {
    pub name: String,
    /// Location kind (path, query, body, header, formData) or `auth`.
    pub parameter_type: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}
