//! Usage filtering: keep only the operations that variables actually bind.
//!
//! One scan task runs per variable descriptor file. A scan parses its file
//! while holding a pool slot, gives the slot back, then waits on the build
//! handle of each service it references. Scans of services that are already
//! built proceed immediately; the rest wait only for the build they need.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

use crate::definition::{DefinitionMap, ServiceDefinition};
use crate::error::{PipelineError, ScanWarning, TaskFailure};
use crate::events;
use crate::options::GeneratorOptions;
use crate::pool::{WorkerPermit, WorkerPool};
use crate::scheduler::BuildHandles;

/// Category marking a variable as bound to a service operation.
pub const SERVICE_VARIABLE_CATEGORY: &str = "wm.ServiceVariable";

/// service id -> (operationId -> definition), filled concurrently by scans.
pub type FilteredDefinitions = DashMap<String, DashMap<String, Arc<ServiceDefinition>>>;

/// A service operation bound by a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReference {
    pub variable: String,
    pub service: String,
    pub operation_id: String,
}

/// What one scan task contributed.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub file: PathBuf,
    /// References that matched a built operation.
    pub matched: usize,
    pub warnings: Vec<ScanWarning>,
}

/// Find every variable descriptor under `root`, sorted by path.
pub fn discover_variable_files(
    root: &Path,
    options: &GeneratorOptions,
) -> Result<Vec<PathBuf>, PipelineError> {
    let excludes = build_globset(&options.exclude).map_err(|e| PipelineError::Discovery {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| PipelineError::Discovery {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_descriptor = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(&options.variables_suffix))
            .unwrap_or(false);
        if !is_descriptor {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if excludes.is_match(relative) {
            tracing::trace!(path = %relative.display(), "Excluded variable file");
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // patterns are written root-relative, with or without a leading slash
        builder.add(Glob::new(pattern.trim_start_matches('/'))?);
    }
    builder.build()
}

/// Pull the service references out of one descriptor's content.
///
/// Never fails: anything wrong with the content becomes a warning and the
/// offending file or entry contributes nothing.
pub fn extract_references(file: &str, content: &str) -> (Vec<ServiceReference>, Vec<ScanWarning>) {
    let mut references = Vec::new();
    let mut warnings = Vec::new();

    if content.trim().is_empty() {
        return (references, warnings);
    }

    let root = match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(root)) => root,
        Ok(_) => {
            warnings.push(ScanWarning::MalformedDescriptor {
                file: file.to_string(),
                message: "root is not an object".to_string(),
            });
            return (references, warnings);
        }
        Err(e) => {
            warnings.push(ScanWarning::MalformedDescriptor {
                file: file.to_string(),
                message: e.to_string(),
            });
            return (references, warnings);
        }
    };

    for (variable, value) in root {
        let Some(entry) = value.as_object() else {
            warnings.push(ScanWarning::NotAnObject {
                file: file.to_string(),
                variable,
            });
            continue;
        };

        let category = entry.get("category").and_then(|v| v.as_str());
        if category != Some(SERVICE_VARIABLE_CATEGORY) {
            continue;
        }

        let Some(operation_id) = entry.get("operationId").and_then(|v| v.as_str()) else {
            warnings.push(ScanWarning::MissingOperationId {
                file: file.to_string(),
                variable,
            });
            continue;
        };
        let Some(service) = entry.get("service").and_then(|v| v.as_str()) else {
            warnings.push(ScanWarning::MissingService {
                file: file.to_string(),
                variable,
            });
            continue;
        };

        references.push(ServiceReference {
            operation_id: operation_id.to_string(),
            service: service.to_string(),
            variable,
        });
    }

    (references, warnings)
}

/// Resolve references against the build results and record the matches.
///
/// Waits on each referenced service's build. A failed build is fatal.
pub async fn apply_references(
    file: &str,
    references: Vec<ServiceReference>,
    handles: &BuildHandles,
    filtered: &FilteredDefinitions,
) -> Result<(usize, Vec<ScanWarning>), TaskFailure> {
    let mut matched = 0;
    let mut warnings = Vec::new();

    for reference in references {
        let Some(handle) = handles.get(&reference.service) else {
            warnings.push(ScanWarning::UnknownService {
                file: file.to_string(),
                variable: reference.variable,
                service: reference.service,
            });
            continue;
        };

        let build = handle.wait().await?;
        let Some(definition) = build.definitions.get(&reference.operation_id) else {
            warnings.push(ScanWarning::UnknownOperation {
                file: file.to_string(),
                variable: reference.variable,
                service: reference.service,
                operation_id: reference.operation_id,
            });
            continue;
        };

        filtered
            .entry(reference.service)
            .or_default()
            .insert(reference.operation_id, Arc::clone(definition));
        matched += 1;
    }

    Ok((matched, warnings))
}

/// Scan one variable descriptor file.
///
/// The pool slot is held only while reading and parsing. Build handles are
/// awaited without it, so scans can never starve the builds they depend on.
pub async fn scan_file(
    path: PathBuf,
    permit: WorkerPermit,
    handles: Arc<BuildHandles>,
    filtered: Arc<FilteredDefinitions>,
) -> Result<ScanOutcome, PipelineError> {
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| PipelineError::Scan {
            path: path.clone(),
            source,
        })?;
    let label = path.display().to_string();
    let (references, mut warnings) = extract_references(&label, &content);
    permit.release();

    let (matched, apply_warnings) =
        apply_references(&label, references, &handles, &filtered).await?;
    warnings.extend(apply_warnings);

    for warning in &warnings {
        tracing::warn!(event = events::VARIABLE_SKIPPED, file = %label, "{}", warning);
    }
    tracing::debug!(
        event = events::FILE_SCANNED,
        file = %label,
        matched,
        "Variable file scanned"
    );

    Ok(ScanOutcome {
        file: path,
        matched,
        warnings,
    })
}

pub type ScanHandle = JoinHandle<Result<ScanOutcome, PipelineError>>;

/// Submit one scan task per variable file.
pub fn submit_scans(
    pool: &WorkerPool,
    files: Vec<PathBuf>,
    handles: &Arc<BuildHandles>,
    filtered: &Arc<FilteredDefinitions>,
) -> Result<Vec<(PathBuf, ScanHandle)>, PipelineError> {
    files
        .into_iter()
        .map(|path| {
            let handles = Arc::clone(handles);
            let filtered = Arc::clone(filtered);
            let task_path = path.clone();
            let join =
                pool.submit(move |permit| scan_file(task_path, permit, handles, filtered))?;
            Ok((path, join))
        })
        .collect()
}

/// Snapshot the filtered result, dropping services with no surviving entry.
pub fn collect_filtered(filtered: &FilteredDefinitions) -> Vec<(String, DefinitionMap)> {
    let mut services: Vec<(String, DefinitionMap)> = filtered
        .iter()
        .filter(|entry| !entry.value().is_empty())
        .map(|entry| {
            let definitions = entry
                .value()
                .iter()
                .map(|op| (op.key().clone(), Arc::clone(op.value())))
                .collect();
            (entry.key().clone(), definitions)
        })
        .collect();
    services.sort_by(|a, b| a.0.cmp(&b.0));
    services
}
