//! Test harnesses for the service definition generator.
//!
//! Provides `TestApp`, a throwaway copy of an application tree the
//! pipeline can run against, plus subprocess tests for the CLI.

pub mod app;
#[cfg(test)]
mod cli;
#[cfg(test)]
mod integration;

pub use app::{fixtures_dir, TestApp, TestError};
