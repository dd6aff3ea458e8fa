//! # git-remote-migrate
//!
//! A CLI tool to rewrite the remote URL of many local git repositories at once.
//!
//! This crate provides functionality to:
//! - Find the git repositories directly below a directory
//! - Compute new remote URLs with a case-insensitive regex substitution
//! - Preview every old → new URL in a table
//! - Apply the changes after the user types `yes`
//!
//! ## Usage
//!
//! ```bash
//! # Move every clone under ~/src from GitLab to GitHub
//! git-remote-migrate ~/src -p 'gitlab\.com' -r 'github.com'
//!
//! # Rename an organization, keeping the repository name
//! git-remote-migrate -p ':old-org/(.+)$' -r ':new-org/$1'
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`scan`] - Repository discovery
//! - [`git`] - Git command wrappers behind the [`git::RemoteStore`] trait
//! - [`transform`] - Remote URL substitution
//! - [`preview`] - Preview table rendering
//! - [`apply`] - Applying the new URLs
//! - [`prompt`] - User input abstractions
//! - [`banner`] - Decorative CLI banner
//! - [`error`] - Fatal error type

pub mod apply;
pub mod banner;
pub mod cli;
pub mod error;
pub mod git;
pub mod preview;
pub mod prompt;
pub mod scan;
pub mod transform;
