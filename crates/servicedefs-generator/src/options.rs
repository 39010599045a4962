//! Generator options (`servicedefs.yaml`).
//!
//! Every field has a default, so a project without an options file runs
//! with the stock layout: services under `services/`, output under
//! `target/classes/`, prefabs excluded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Options file looked up at the application root.
pub const DEFAULT_OPTIONS_FILE: &str = "servicedefs.yaml";

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Number of tasks that may run at once (default: 5).
    pub pool_size: usize,
    /// Services folder, relative to the root.
    pub services_dir: String,
    /// Output folder, relative to the root.
    pub output_dir: String,
    /// File name suffix of variable descriptors.
    pub variables_suffix: String,
    /// Glob patterns, relative to the root, never scanned for variables.
    pub exclude: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            pool_size: 5,
            services_dir: "services".to_string(),
            output_dir: "target/classes".to_string(),
            variables_suffix: ".variables.json".to_string(),
            exclude: vec!["app/prefabs/**".to_string()],
        }
    }
}

impl GeneratorOptions {
    /// Load options from a YAML file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path)
    }

    /// Parse options from a YAML string.
    pub fn parse(content: &str, path: &Path) -> Result<Self, PipelineError> {
        let options: Self = serde_yaml::from_str(content).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Load `servicedefs.yaml` from the root if present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self, PipelineError> {
        let path = root.join(DEFAULT_OPTIONS_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.pool_size == 0 {
            return Err(PipelineError::Config(
                "pool-size must be at least 1".to_string(),
            ));
        }
        if self.variables_suffix.is_empty() {
            return Err(PipelineError::Config(
                "variables-suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
