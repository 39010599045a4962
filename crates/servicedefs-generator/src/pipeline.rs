//! End-to-end run: build every service, filter by usage, persist.
//!
//! There is no barrier between the two phases. Builds are submitted first,
//! then one scan per variable file; a scan blocks only on the builds of the
//! services it references.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{PipelineError, ScanWarning, TaskFailure};
use crate::events;
use crate::filter::{self, FilteredDefinitions};
use crate::options::GeneratorOptions;
use crate::pool::WorkerPool;
use crate::scheduler::{self, BuildHandles};
use crate::writer;

/// Summary of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Every service folder that was built, in name order.
    pub services: Vec<String>,
    /// Services that had no description document.
    pub missing_documents: Vec<String>,
    /// Number of variable files scanned.
    pub variable_files: usize,
    /// References that resolved to a built operation.
    pub matched: usize,
    pub warnings: Vec<ScanWarning>,
    /// Resources written, in service order.
    pub written: Vec<PathBuf>,
}

pub struct Pipeline {
    root: PathBuf,
    options: GeneratorOptions,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, options: GeneratorOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.options.validate()?;
        let started = Instant::now();
        tracing::info!(
            event = events::RUN_STARTED,
            root = %self.root.display(),
            pool_size = self.options.pool_size,
            "Generating service definitions"
        );

        let pool = WorkerPool::new(self.options.pool_size);
        let services_root = self.root.join(&self.options.services_dir);
        let handles = Arc::new(scheduler::schedule_builds(&pool, &services_root)?);

        let files = filter::discover_variable_files(&self.root, &self.options)?;
        let filtered = Arc::new(FilteredDefinitions::new());
        let scans = filter::submit_scans(&pool, files, &handles, &filtered)?;
        pool.close();

        let mut report = RunReport {
            services: handles.keys().cloned().collect(),
            variable_files: scans.len(),
            ..Default::default()
        };

        for (path, scan) in scans {
            let outcome = scan
                .await
                .map_err(|e| TaskFailure::from_join(format!("scan {}", path.display()), e))??;
            report.matched += outcome.matched;
            report.warnings.extend(outcome.warnings);
        }

        report.missing_documents = drain_builds(&handles).await?;

        let output_root = self.root.join(&self.options.output_dir);
        report.written = writer::persist_all(&output_root, &filtered)?;

        tracing::info!(
            event = events::RUN_COMPLETED,
            services = report.services.len(),
            variable_files = report.variable_files,
            matched = report.matched,
            warnings = report.warnings.len(),
            written = report.written.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Service definitions generated"
        );
        Ok(report)
    }
}

/// Wait for every build, referenced or not. Any failure stops the run.
///
/// Returns the services that had no description document.
async fn drain_builds(handles: &BuildHandles) -> Result<Vec<String>, PipelineError> {
    let mut missing = Vec::new();
    for (service, handle) in handles {
        let build = handle.wait().await?;
        if build.document.is_none() {
            missing.push(service.clone());
        }
    }
    Ok(missing)
}
