use thiserror::Error;

/// Errors produced while parsing a service description (E2001–E2004).
#[derive(Debug, Error)]
pub enum ParseError {
    /// E2001: File is not a Swagger 2.x document.
    #[error("E2001: not a valid Swagger 2.x service description")]
    UnknownFormat,

    /// E2002: YAML/JSON parse error.
    #[error("E2002: parse error: {0}")]
    ParseError(String),

    /// E2003: Unresolved $ref.
    #[error("E2003: unresolved $ref: {0}")]
    UnresolvedRef(String),

    /// E2004: Structural error in the document.
    #[error("E2004: schema validation error: {0}")]
    SchemaError(String),

    /// I/O error reading the description file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
