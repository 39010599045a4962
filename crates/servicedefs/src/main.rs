//! Service definition generator CLI.
//!
//! `generate` runs the full build-and-filter pipeline over an application
//! tree. `definition` and `build` print generated definitions for a single
//! description document without touching the filesystem.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use servicedefs_generator::{
    build, build_operation, GenerateError, GeneratorOptions, Pipeline, PipelineError,
    RunReport, ServiceDescriptor, TaskFailure,
};
use servicedefs_spec_parser::{parse_descriptor_file, ParseError};

mod logging;

use logging::{init_logging, LogFormat};

#[derive(Parser, Debug)]
#[command(
    name = "servicedefs",
    about = "Generate service definitions from service descriptions",
    version
)]
struct Cli {
    /// Log output format (json or pretty).
    #[arg(long, global = true, default_value = "pretty", value_parser = parse_log_format)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every service and write the definitions bound by variables.
    Generate {
        /// Application root.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Options file (defaults to servicedefs.yaml at the root, if present).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of tasks that may run at once.
        #[arg(long, env = "SERVICEDEFS_POOL_SIZE")]
        pool_size: Option<usize>,

        /// Output folder, relative to the root.
        #[arg(long)]
        output_dir: Option<String>,

        /// Show detailed output.
        #[arg(long)]
        verbose: bool,
    },

    /// Print the definition of one operation.
    Definition {
        /// Service description document.
        #[arg(long)]
        spec: PathBuf,

        /// Operation id to generate.
        #[arg(long)]
        operation: String,

        /// Service id (defaults to the document's own).
        #[arg(long)]
        service: Option<String>,
    },

    /// Print the definitions of every operation.
    Build {
        /// Service description document.
        #[arg(long)]
        spec: PathBuf,

        /// Service id (defaults to the document's own).
        #[arg(long)]
        service: Option<String>,
    },
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (json, pretty)", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            root,
            config,
            pool_size,
            output_dir,
            verbose,
        } => {
            let level = if verbose { "debug" } else { "info" };
            if let Err(e) = init_logging(cli.log_format, level) {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
            run_generate(&root, config.as_deref(), pool_size, output_dir, verbose)
        }

        Command::Definition {
            spec,
            operation,
            service,
        } => {
            if let Err(e) = init_logging(cli.log_format, "warn") {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
            let descriptor = match load_descriptor(&spec, service) {
                Ok(descriptor) => descriptor,
                Err(code) => return code,
            };
            match build_operation(&descriptor, &operation) {
                Ok(definition) => print_json(&definition),
                Err(e) => {
                    eprintln!("error: {}", e);
                    generate_exit_code(&e)
                }
            }
        }

        Command::Build { spec, service } => {
            if let Err(e) = init_logging(cli.log_format, "warn") {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
            let descriptor = match load_descriptor(&spec, service) {
                Ok(descriptor) => descriptor,
                Err(code) => return code,
            };
            match build(&descriptor) {
                Ok(definitions) => print_json(&definitions),
                Err(e) => {
                    eprintln!("error: {}", e);
                    generate_exit_code(&e)
                }
            }
        }
    }
}

fn run_generate(
    root: &Path,
    config: Option<&Path>,
    pool_size: Option<usize>,
    output_dir: Option<String>,
    verbose: bool,
) -> ExitCode {
    if !root.is_dir() {
        eprintln!("error: application root not found: {}", root.display());
        return ExitCode::from(3);
    }

    let options = match resolve_options(root, config, pool_size, output_dir) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            return pipeline_exit_code(&e);
        }
    };

    if verbose {
        eprintln!(
            "servicedefs {} (pool size {})",
            env!("CARGO_PKG_VERSION"),
            options.pool_size
        );
    }

    match run_pipeline(root, options) {
        Ok(report) => {
            // per-variable warnings are already logged by the scans
            if verbose {
                eprintln!(
                    "Built {} service(s), scanned {} variable file(s), {} reference(s) matched",
                    report.services.len(),
                    report.variable_files,
                    report.matched
                );
                for service in &report.missing_documents {
                    eprintln!("  - {} has no API documentation", service);
                }
                for path in &report.written {
                    eprintln!("  - {}", path.display());
                }
            }
            println!(
                "Wrote {} service definition resource(s)",
                report.written.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            match e.downcast_ref::<PipelineError>() {
                Some(e) => pipeline_exit_code(e),
                None => ExitCode::from(3),
            }
        }
    }
}

/// Run the pipeline on a runtime with one worker thread per pool slot.
fn run_pipeline(root: &Path, options: GeneratorOptions) -> anyhow::Result<RunReport> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.pool_size)
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    let pipeline = Pipeline::new(root, options);
    Ok(rt.block_on(pipeline.run())?)
}

/// Options file, then CLI overrides.
fn resolve_options(
    root: &Path,
    config: Option<&Path>,
    pool_size: Option<usize>,
    output_dir: Option<String>,
) -> Result<GeneratorOptions, PipelineError> {
    let mut options = match config {
        Some(path) => GeneratorOptions::load(path)?,
        None => GeneratorOptions::discover(root)?,
    };
    if let Some(pool_size) = pool_size {
        options.pool_size = pool_size;
    }
    if let Some(output_dir) = output_dir {
        options.output_dir = output_dir;
    }
    options.validate()?;
    Ok(options)
}

fn load_descriptor(spec: &Path, service: Option<String>) -> Result<ServiceDescriptor, ExitCode> {
    let mut descriptor = parse_descriptor_file(spec).map_err(|e| {
        eprintln!("error: {}: {}", spec.display(), e);
        parse_exit_code(&e)
    })?;

    if let Some(service) = service {
        descriptor.service_id = service;
    } else if descriptor.service_id.is_empty() {
        descriptor.service_id = spec
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(descriptor)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

// Exit codes:
// 1 = document or validation error
// 3 = I/O error

fn parse_exit_code(e: &ParseError) -> ExitCode {
    match e {
        ParseError::Io(_) => ExitCode::from(3),
        ParseError::UnknownFormat
        | ParseError::ParseError(_)
        | ParseError::UnresolvedRef(_)
        | ParseError::SchemaError(_) => ExitCode::from(1),
    }
}

fn generate_exit_code(e: &GenerateError) -> ExitCode {
    match e {
        GenerateError::Parse(parse) => parse_exit_code(parse),
        GenerateError::OperationNotFound { .. }
        | GenerateError::MissingTag { .. }
        | GenerateError::MissingOperationId { .. }
        | GenerateError::DuplicateOperationId { .. } => ExitCode::from(1),
    }
}

fn pipeline_exit_code(e: &PipelineError) -> ExitCode {
    match e {
        PipelineError::Task(TaskFailure::Build { source, .. }) => generate_exit_code(source),
        PipelineError::Task(TaskFailure::Panicked { .. })
        | PipelineError::Task(TaskFailure::Cancelled { .. })
        | PipelineError::PoolClosed
        | PipelineError::Config(_) => ExitCode::from(1),
        PipelineError::Scan { .. }
        | PipelineError::Persist { .. }
        | PipelineError::Discovery { .. }
        | PipelineError::Io(_) => ExitCode::from(3),
    }
}
