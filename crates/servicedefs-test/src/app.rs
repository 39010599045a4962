//! TestApp: application tree harness.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use walkdir::WalkDir;

use servicedefs_generator::{resource_path, GeneratorOptions, Pipeline, PipelineError, RunReport};

/// Errors from TestApp operations.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fixture not found at {0}")]
    FixtureNotFound(String),

    #[error("failed to copy fixture: {0}")]
    Copy(String),
}

/// Absolute path to the shared test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/servicedefs-test
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("tests/fixtures")
}

/// A writable application tree in a temp directory.
///
/// Either copied from a fixture under `tests/fixtures` or built up file by
/// file. The directory is removed when the harness is dropped.
pub struct TestApp {
    dir: TempDir,
}

impl TestApp {
    /// An empty application.
    pub fn empty() -> Result<Self, TestError> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// A copy of the fixture application `name`.
    pub fn from_fixture(name: &str) -> Result<Self, TestError> {
        let source = fixtures_dir().join(name);
        if !source.is_dir() {
            return Err(TestError::FixtureNotFound(source.display().to_string()));
        }

        let app = Self::empty()?;
        for entry in WalkDir::new(&source) {
            let entry = entry.map_err(|e| TestError::Copy(e.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(&source)
                .map_err(|e| TestError::Copy(e.to_string()))?;
            let target = app.root().join(relative);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target)?;
            } else {
                std::fs::copy(entry.path(), &target)?;
            }
        }
        Ok(app)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the root, creating parent folders.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf, TestError> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Run the pipeline with the options the app declares.
    pub async fn generate(&self) -> Result<RunReport, TestError> {
        let options = GeneratorOptions::discover(self.root())?;
        self.generate_with(options).await
    }

    pub async fn generate_with(&self, options: GeneratorOptions) -> Result<RunReport, TestError> {
        Ok(Pipeline::new(self.root(), options).run().await?)
    }

    /// Where the resource for `service` lands with default options.
    pub fn output_path(&self, service: &str) -> PathBuf {
        let options = GeneratorOptions::default();
        resource_path(&self.root().join(options.output_dir), service)
    }

    /// Parse the written resource for `service`.
    pub fn read_output(&self, service: &str) -> Result<serde_json::Value, TestError> {
        let content = std::fs::read_to_string(self.output_path(service))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Operation ids in the written resource for `service`, sorted.
    pub fn output_operations(&self, service: &str) -> Result<Vec<String>, TestError> {
        let value = self.read_output(service)?;
        Ok(value
            .as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default())
    }
}
