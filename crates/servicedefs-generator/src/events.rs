//! Structured log event names.
//!
//! Every log line emitted by the pipeline carries one of these in its
//! `event` field so JSON logs can be filtered without matching messages.

pub const RUN_STARTED: &str = "run_started";
pub const RUN_COMPLETED: &str = "run_completed";
pub const DOCUMENT_MISSING: &str = "document_missing";
pub const SERVICE_BUILT: &str = "service_built";
pub const FILE_SCANNED: &str = "file_scanned";
pub const VARIABLE_SKIPPED: &str = "variable_skipped";
pub const DEFINITIONS_WRITTEN: &str = "definitions_written";
