//! Persists filtered definitions, one JSON resource per service.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::definition::DefinitionMap;
use crate::error::PipelineError;
use crate::events;
use crate::filter::{collect_filtered, FilteredDefinitions};

/// Folder under the output root holding the resources.
pub const SERVICE_DEFS_FOLDER: &str = "servicedefs";
/// Resource file name suffix; the service id is the prefix.
pub const SERVICE_DEF_RESOURCE_SUFFIX: &str = "-service-definitions.json";

/// `<output_root>/servicedefs/<service>-service-definitions.json`
pub fn resource_path(output_root: &Path, service: &str) -> PathBuf {
    output_root
        .join(SERVICE_DEFS_FOLDER)
        .join(format!("{}{}", service, SERVICE_DEF_RESOURCE_SUFFIX))
}

/// Write one service's definitions, replacing any previous resource.
pub fn persist_service(
    output_root: &Path,
    service: &str,
    definitions: &DefinitionMap,
) -> Result<PathBuf, PipelineError> {
    let path = resource_path(output_root, service);
    let persist_err = |source: std::io::Error| PipelineError::Persist {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let file = File::create(&path).map_err(persist_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, definitions)
        .map_err(|e| persist_err(std::io::Error::other(e)))?;
    writer.flush().map_err(persist_err)?;

    tracing::info!(
        event = events::DEFINITIONS_WRITTEN,
        service = %service,
        operations = definitions.len(),
        path = %path.display(),
        "Service definitions written"
    );
    Ok(path)
}

/// Write a resource for every service with at least one kept definition.
///
/// Services are written in name order. Returns the written paths.
pub fn persist_all(
    output_root: &Path,
    filtered: &FilteredDefinitions,
) -> Result<Vec<PathBuf>, PipelineError> {
    collect_filtered(filtered)
        .iter()
        .map(|(service, definitions)| persist_service(output_root, service, definitions))
        .collect()
}
