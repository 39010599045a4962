//! Swagger 2.0 service description parser.
//!
//! Reads the design-time API documents generated for backend services
//! (YAML or JSON), extracts `paths`, `definitions`, `securityDefinitions`
//! and the `x-WM-*` vendor extensions, and resolves fully-qualified
//! return and parameter types against the model-definition table.

pub mod error;
pub mod model;
pub mod parser;
pub mod types;

pub use error::ParseError;
pub use model::{
    HttpMethod, Model, Operation, Parameter, PathItem, Response, SecurityRequirement,
    SecurityScheme, ServiceDescriptor,
};
pub use parser::{parse_descriptor, parse_descriptor_file};
pub use types::{parameter_type, return_type};
