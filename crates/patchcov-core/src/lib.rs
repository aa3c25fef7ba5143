//! Core types, configuration, and error handling for patchcov.
//!
//! This crate provides the shared foundation used by all other patchcov crates:
//! - [`PatchcovError`]: unified error type using `thiserror` and `miette`
//! - [`PatchcovConfig`]: configuration loaded from `.patchcov.toml`
//! - Shared types: [`AddedLine`], [`ChangeSet`], [`CoverageBlock`],
//!   [`CoverMode`], [`ParseMode`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{DiffConfig, PathsConfig, PatchcovConfig, ReportConfig, DEFAULT_HEADER};
pub use error::PatchcovError;
pub use types::{
    AddedLine, ChangeSet, CoverMode, CoverageBlock, OutputFormat, ParseMode,
};

/// A convenience `Result` type for patchcov operations.
pub type Result<T> = std::result::Result<T, PatchcovError>;
