//! Build scheduling: one build task per service folder.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use servicedefs_spec_parser::parse_descriptor_file;

use crate::builder;
use crate::definition::DefinitionMap;
use crate::error::{GenerateError, PipelineError, TaskFailure};
use crate::events;
use crate::pool::WorkerPool;

pub const DESIGN_TIME_FOLDER: &str = "designtime";
pub const API_SUFFIX: &str = "_API.json";
pub const REST_SERVICE_API_SUFFIX: &str = "_API_REST_SERVICE.json";

/// The full build result of one service.
#[derive(Debug, Clone, Default)]
pub struct ServiceBuild {
    pub service: String,
    /// Description that was read, `None` when the service has none.
    pub document: Option<PathBuf>,
    pub definitions: DefinitionMap,
}

pub type BuildResult = Result<Arc<ServiceBuild>, TaskFailure>;

/// Single-assignment handle on a service's build task.
///
/// Cloning is cheap; every clone observes the same result. The task runs
/// whether or not anyone waits on it.
#[derive(Clone)]
pub struct BuildHandle {
    service: String,
    result: Shared<BoxFuture<'static, BuildResult>>,
}

impl BuildHandle {
    /// Wrap a future producing the build result.
    pub fn new<F>(service: impl Into<String>, result: F) -> Self
    where
        F: Future<Output = BuildResult> + Send + 'static,
    {
        Self {
            service: service.into(),
            result: result.boxed().shared(),
        }
    }

    /// Wrap an already-computed result.
    pub fn ready(service: impl Into<String>, result: BuildResult) -> Self {
        Self::new(service, futures_util::future::ready(result))
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Wait for the build to finish.
    pub async fn wait(&self) -> BuildResult {
        self.result.clone().await
    }

    /// The result if the build already finished and has been observed.
    pub fn peek(&self) -> Option<&BuildResult> {
        self.result.peek()
    }
}

impl std::fmt::Debug for BuildHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildHandle")
            .field("service", &self.service)
            .field("finished", &self.peek().is_some())
            .finish()
    }
}

/// service name -> build handle.
pub type BuildHandles = BTreeMap<String, BuildHandle>;

/// List service folders under `services_root`, sorted by name.
///
/// A missing services folder has no services.
pub fn discover_services(services_root: &Path) -> Result<Vec<(String, PathBuf)>, PipelineError> {
    if !services_root.is_dir() {
        tracing::debug!(path = %services_root.display(), "No services folder");
        return Ok(Vec::new());
    }

    let mut services = Vec::new();
    for entry in std::fs::read_dir(services_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        services.push((name, entry.path()));
    }
    services.sort();
    Ok(services)
}

/// Find the design-time description of a service.
///
/// `<service>_API.json` is preferred over `<service>_API_REST_SERVICE.json`.
pub fn locate_document(service: &str, service_dir: &Path) -> Option<PathBuf> {
    let design_dir = service_dir.join(DESIGN_TIME_FOLDER);
    [API_SUFFIX, REST_SERVICE_API_SUFFIX]
        .iter()
        .map(|suffix| design_dir.join(format!("{}{}", service, suffix)))
        .find(|path| path.is_file())
}

/// Read, parse and build one service. Runs inside a build task.
///
/// A service without a description builds to an empty map.
pub fn build_service(service: &str, service_dir: &Path) -> Result<ServiceBuild, GenerateError> {
    let Some(document) = locate_document(service, service_dir) else {
        tracing::error!(
            event = events::DOCUMENT_MISSING,
            service = %service,
            "API documentation does not exist for service"
        );
        return Ok(ServiceBuild {
            service: service.to_string(),
            document: None,
            definitions: DefinitionMap::new(),
        });
    };

    let mut descriptor = parse_descriptor_file(&document)?;
    if descriptor.service_id.is_empty() {
        descriptor.service_id = service.to_string();
    }
    let definitions = builder::build(&descriptor)?;

    tracing::info!(
        event = events::SERVICE_BUILT,
        service = %service,
        operations = definitions.len(),
        document = %document.display(),
        "Service definitions built"
    );

    Ok(ServiceBuild {
        service: service.to_string(),
        document: Some(document),
        definitions,
    })
}

/// Submit one build task per service folder.
pub fn schedule_builds(
    pool: &WorkerPool,
    services_root: &Path,
) -> Result<BuildHandles, PipelineError> {
    let mut handles = BuildHandles::new();

    for (service, service_dir) in discover_services(services_root)? {
        let name = service.clone();
        // document reads and parsing block, so they leave the runtime workers
        // while the task keeps its pool slot
        let join = pool.spawn(async move {
            tokio::task::spawn_blocking(move || build_service(&name, &service_dir)).await
        })?;

        let task = format!("build {}", service);
        let name = service.clone();
        let handle = BuildHandle::new(service.clone(), async move {
            let built = join
                .await
                .and_then(|inner| inner)
                .map_err(|err| TaskFailure::from_join(task, err))?;
            built.map(Arc::new).map_err(|source| TaskFailure::Build {
                service: name,
                source: Arc::new(source),
            })
        });

        handles.insert(service, handle);
    }

    tracing::debug!(services = handles.len(), "Build tasks submitted");
    Ok(handles)
}
