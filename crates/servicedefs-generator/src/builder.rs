//! Turns a parsed service description into service definitions.

use std::collections::btree_map::Entry;
use std::sync::Arc;

use servicedefs_spec_parser::{return_type, HttpMethod, Operation, PathItem, ServiceDescriptor};

use crate::definition::{DefinitionMap, OperationInfo, ServiceDefinition};
use crate::error::GenerateError;
use crate::params;

/// Generate definitions for every operation in the description.
///
/// A description without paths yields an empty map.
pub fn build(descriptor: &ServiceDescriptor) -> Result<DefinitionMap, GenerateError> {
    let mut definitions = DefinitionMap::new();

    for (path, method, operation) in descriptor.operations() {
        let definition = build_definition(descriptor, path, method, operation)?;
        match definitions.entry(definition.id.clone()) {
            Entry::Occupied(_) => {
                return Err(GenerateError::DuplicateOperationId {
                    service: descriptor.service_id.clone(),
                    operation_id: definition.id,
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(definition));
            }
        }
    }

    tracing::debug!(
        service = %descriptor.service_id,
        operations = definitions.len(),
        "Built service definitions"
    );

    Ok(definitions)
}

/// Generate the definition for a single operation.
///
/// Fails with [`GenerateError::OperationNotFound`] when no path declares
/// `operation_id`.
pub fn build_operation(
    descriptor: &ServiceDescriptor,
    operation_id: &str,
) -> Result<ServiceDefinition, GenerateError> {
    descriptor
        .operations()
        .find(|(_, _, op)| op.operation_id.as_deref() == Some(operation_id))
        .map(|(path, method, op)| build_definition(descriptor, path, method, op))
        .unwrap_or_else(|| {
            Err(GenerateError::OperationNotFound {
                service: descriptor.service_id.clone(),
                operation_id: operation_id.to_string(),
            })
        })
}

fn build_definition(
    descriptor: &ServiceDescriptor,
    path: &PathItem,
    method: HttpMethod,
    operation: &Operation,
) -> Result<ServiceDefinition, GenerateError> {
    let operation_id =
        operation
            .operation_id
            .clone()
            .ok_or_else(|| GenerateError::MissingOperationId {
                service: descriptor.service_id.clone(),
                method: method.to_string(),
                path: path.key.clone(),
            })?;

    let controller = operation
        .tags
        .first()
        .cloned()
        .ok_or_else(|| GenerateError::MissingTag {
            service: descriptor.service_id.clone(),
            operation_id: operation_id.clone(),
        })?;

    let operation_type = return_type(operation, &descriptor.definitions)?;

    let operation_info = OperationInfo {
        name: operation
            .method_name
            .clone()
            .unwrap_or_else(|| operation_id.clone()),
        http_method: method.to_string(),
        relative_path: path.relative_path(),
        consumes: operation.consumes.clone(),
        produces: operation.produces.clone(),
        method_type: method.to_string(),
        parameters: params::assemble(descriptor, operation)?,
    };

    Ok(ServiceDefinition {
        id: operation_id,
        controller,
        type_name: operation_type.clone(),
        operation_type,
        service: descriptor.service_id.clone(),
        operation_info,
    })
}
