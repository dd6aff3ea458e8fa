//! Fatal error types surfaced to the process boundary.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors that abort a migration run.
///
/// Per-repository problems never show up here: an invalid repository yields an
/// empty mapping and a failed update is reported on its own status line.
#[derive(Debug, Error)]
pub enum Error {
    /// `git` is not installed or not on `PATH`.
    #[error("`git` not found in PATH ({0})")]
    GitNotFound(#[source] which::Error),

    /// The target directory could not be listed.
    #[error("cannot scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The search pattern is not a valid regular expression.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Reading the confirmation failed.
    #[error("prompt error: {0}")]
    Prompt(String),

    /// Writing to the console failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
