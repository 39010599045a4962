//! Parameter assembly, including synthesized credential parameters.

use servicedefs_spec_parser::{parameter_type, Operation, ServiceDescriptor};

use crate::definition::OperationParameter;
use crate::error::GenerateError;

/// Security scheme that marks an operation as protected by basic auth.
pub const AUTH_SCHEME: &str = "WM_Rest_Service_Authorization";
/// Scheme type required for credential injection.
pub const BASIC_SCHEME_TYPE: &str = "basic";
/// Parameter kind of the synthesized credentials.
pub const AUTH_PARAMETER_KIND: &str = "auth";
pub const USERNAME_PARAMETER: &str = "wm_auth_username";
pub const PASSWORD_PARAMETER: &str = "wm_auth_password";

/// Build the ordered parameter list for one operation.
///
/// Declared parameters come first, in declaration order. When the operation
/// is protected by the basic [`AUTH_SCHEME`], the username and password
/// parameters are appended, once.
pub fn assemble(
    descriptor: &ServiceDescriptor,
    operation: &Operation,
) -> Result<Vec<OperationParameter>, GenerateError> {
    let mut parameters = operation
        .parameters
        .iter()
        .map(|param| {
            Ok(OperationParameter {
                name: param
                    .name
                    .clone()
                    .unwrap_or_else(|| param.location.to_lowercase()),
                parameter_type: param.location.clone(),
                type_name: parameter_type(param, &descriptor.definitions)?,
            })
        })
        .collect::<Result<Vec<_>, GenerateError>>()?;

    if requires_basic_auth(descriptor, operation) {
        for name in [USERNAME_PARAMETER, PASSWORD_PARAMETER] {
            let present = parameters
                .iter()
                .any(|p| p.name == name && p.parameter_type == AUTH_PARAMETER_KIND);
            if !present {
                parameters.push(OperationParameter {
                    name: name.to_string(),
                    parameter_type: AUTH_PARAMETER_KIND.to_string(),
                    type_name: None,
                });
            }
        }
    }

    Ok(parameters)
}

/// Whether credential parameters should be injected for the operation.
///
/// True when the document defines [`AUTH_SCHEME`] with type `basic` and one
/// of the operation's security requirements references it. Scopes are not
/// consulted; basic schemes carry none.
pub fn requires_basic_auth(descriptor: &ServiceDescriptor, operation: &Operation) -> bool {
    let basic_scheme = descriptor
        .security_definitions
        .get(AUTH_SCHEME)
        .is_some_and(|scheme| scheme.scheme_type == BASIC_SCHEME_TYPE);

    basic_scheme
        && operation
            .security
            .iter()
            .any(|requirement| requirement.contains_key(AUTH_SCHEME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicedefs_spec_parser::{Parameter, SecurityRequirement, SecurityScheme};

    fn descriptor_with_scheme(scheme_type: &str) -> ServiceDescriptor {
        let mut descriptor = ServiceDescriptor {
            service_id: "orders".into(),
            ..Default::default()
        };
        descriptor.security_definitions.insert(
            AUTH_SCHEME.to_string(),
            SecurityScheme {
                scheme_type: scheme_type.to_string(),
                ..Default::default()
            },
        );
        descriptor
    }

    fn secured_operation(scheme: &str) -> Operation {
        let mut requirement = SecurityRequirement::new();
        requirement.insert(scheme.to_string(), Vec::new());
        Operation {
            operation_id: Some("getOrder".into()),
            parameters: vec![
                Parameter {
                    name: Some("id".into()),
                    location: "path".into(),
                    param_type: Some("integer".into()),
                    format: Some("int64".into()),
                    ..Default::default()
                },
                Parameter {
                    name: None,
                    location: "Body".into(),
                    schema: Some(serde_json::json!({"type": "string"})),
                    ..Default::default()
                },
            ],
            security: vec![requirement],
            ..Default::default()
        }
    }

    fn names(params: &[OperationParameter]) -> Vec<&str> {
        params.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn declared_parameters_keep_order_and_defaults() {
        let descriptor = ServiceDescriptor::default();
        let op = secured_operation(AUTH_SCHEME);

        let params = assemble(&descriptor, &op).unwrap();
        assert_eq!(names(&params), vec!["id", "body"]);
        assert_eq!(params[0].parameter_type, "path");
        assert_eq!(params[0].type_name.as_deref(), Some("java.lang.Long"));
        // kind is the location verbatim, name is its lowercase form
        assert_eq!(params[1].parameter_type, "Body");
        assert_eq!(params[1].type_name.as_deref(), Some("java.lang.String"));
    }

    #[test]
    fn basic_scheme_appends_credentials() {
        let descriptor = descriptor_with_scheme("basic");
        let op = secured_operation(AUTH_SCHEME);

        let params = assemble(&descriptor, &op).unwrap();
        assert_eq!(
            names(&params),
            vec!["id", "body", USERNAME_PARAMETER, PASSWORD_PARAMETER]
        );
        assert!(params[2..]
            .iter()
            .all(|p| p.parameter_type == AUTH_PARAMETER_KIND && p.type_name.is_none()));
    }

    #[test]
    fn non_basic_scheme_does_not_augment() {
        let descriptor = descriptor_with_scheme("apiKey");
        let op = secured_operation(AUTH_SCHEME);
        assert!(!requires_basic_auth(&descriptor, &op));
        assert_eq!(assemble(&descriptor, &op).unwrap().len(), 2);
    }

    #[test]
    fn unreferenced_scheme_does_not_augment() {
        let descriptor = descriptor_with_scheme("basic");

        let other = secured_operation("oauth");
        assert!(!requires_basic_auth(&descriptor, &other));

        let mut unsecured = secured_operation(AUTH_SCHEME);
        unsecured.security.clear();
        assert!(!requires_basic_auth(&descriptor, &unsecured));

        let mut empty_requirement = secured_operation(AUTH_SCHEME);
        empty_requirement.security = vec![SecurityRequirement::new()];
        assert!(!requires_basic_auth(&descriptor, &empty_requirement));
    }

    #[test]
    fn scope_list_is_not_consulted() {
        let descriptor = descriptor_with_scheme("basic");

        let mut scoped = secured_operation(AUTH_SCHEME);
        scoped.security[0].insert(AUTH_SCHEME.to_string(), vec!["read".into()]);
        assert!(requires_basic_auth(&descriptor, &scoped));

        let mut alternatives = secured_operation("oauth");
        let mut basic = SecurityRequirement::new();
        basic.insert(AUTH_SCHEME.to_string(), Vec::new());
        alternatives.security.push(basic);
        assert!(requires_basic_auth(&descriptor, &alternatives));
    }

    #[test]
    fn missing_scheme_does_not_augment() {
        let descriptor = ServiceDescriptor::default();
        let op = secured_operation(AUTH_SCHEME);
        assert!(!requires_basic_auth(&descriptor, &op));
    }

    #[test]
    fn assembly_is_idempotent() {
        let descriptor = descriptor_with_scheme("basic");
        let op = secured_operation(AUTH_SCHEME);

        let first = assemble(&descriptor, &op).unwrap();
        let second = assemble(&descriptor, &op).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.iter().filter(|p| p.parameter_type == AUTH_PARAMETER_KIND).count(),
            2
        );
    }

    #[test]
    fn declared_credentials_are_not_duplicated() {
        let descriptor = descriptor_with_scheme("basic");
        let mut op = secured_operation(AUTH_SCHEME);
        op.parameters.push(Parameter {
            name: Some(USERNAME_PARAMETER.into()),
            location: AUTH_PARAMETER_KIND.into(),
            ..Default::default()
        });

        let params = assemble(&descriptor, &op).unwrap();
        assert_eq!(
            names(&params),
            vec!["id", "body", USERNAME_PARAMETER, PASSWORD_PARAMETER]
        );
    }
}
