//! Generates service definitions from service descriptions and keeps only
//! the operations that application variables bind.
//!
//! Every service under `services/` is built on a bounded worker pool. Each
//! `*.variables.json` file is scanned by its own task, which waits only on
//! the builds of the services it references. The surviving definitions are
//! written as one JSON resource per service.

pub mod builder;
pub mod definition;
pub mod error;
pub mod events;
pub mod filter;
pub mod options;
pub mod params;
pub mod pipeline;
pub mod pool;
pub mod scheduler;
pub mod writer;

pub use builder::{build, build_operation};
pub use definition::{DefinitionMap, OperationInfo, OperationParameter, ServiceDefinition};
pub use error::{GenerateError, PipelineError, ScanWarning, TaskFailure};
pub use filter::{FilteredDefinitions, ServiceReference};
pub use options::{GeneratorOptions, DEFAULT_OPTIONS_FILE};
pub use pipeline::{Pipeline, RunReport};
pub use pool::{WorkerPermit, WorkerPool};
pub use scheduler::{BuildHandle, BuildHandles, ServiceBuild};
pub use writer::{persist_all, persist_service, resource_path};
// Re-export the description model for callers that parse documents themselves
pub use servicedefs_spec_parser::{parse_descriptor, parse_descriptor_file, ServiceDescriptor};
