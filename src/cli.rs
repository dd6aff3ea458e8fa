use crate::{apply, banner::write_banner, error::Error, git, preview, prompt, scan, transform};

use clap::Parser;
use console::style;
use std::{env, io::Write, path::Path, path::PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Bulk migrate git remotes.
///
/// Rewrites the remote URL of every git repository directly below DIRECTORY
/// using a case-insensitive regular expression, after showing a preview and
/// asking for confirmation.
#[derive(Parser, Debug)]
#[command(name = "git-remote-migrate", version, about, long_about)]
pub struct Args {
    /// Directory to scan for repositories, defaults to the current directory.
    directory: Option<PathBuf>,

    /// Replacement pattern, supports regular expressions (case-insensitive).
    #[arg(short, long, value_name = "REGEXP", help_heading = "Mandatory arguments")]
    pattern: String,

    /// Value to replace the matched pattern with. Capture groups can be
    /// referenced as `$1`, `${name}` or `\1`. `$` is special: write `$$` for a
    /// literal dollar sign.
    #[arg(
        short,
        long = "replace",
        value_name = "VALUE",
        help_heading = "Mandatory arguments"
    )]
    replacement: String,

    /// Migrate this remote instead of the primary one (origin, or the only remote).
    #[arg(long, value_name = "NAME")]
    remote: Option<String>,

    /// Log git invocations and skipped repositories to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Everything a migration run needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    directory: PathBuf,
    substitution: transform::Substitution,
    remote: Option<String>,
}

impl MigrateOptions {
    /// Builds options from already resolved parts.
    ///
    /// # Parameters
    ///
    /// * `directory` – The directory whose children are scanned.
    /// * `substitution` – The compiled pattern and replacement.
    /// * `remote` – A remote to migrate instead of the primary one.
    pub fn new(
        directory: PathBuf,
        substitution: transform::Substitution,
        remote: Option<String>,
    ) -> Self {
        Self {
            directory,
            substitution,
            remote,
        }
    }

    /// Resolves the directory (defaulting to the current one) and compiles
    /// the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] for an invalid regex, or [`Error::Io`] if the
    /// current directory cannot be determined.
    pub fn from_args(args: &Args) -> Result<Self, Error> {
        let directory = match &args.directory {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };
        let substitution = transform::Substitution::new(&args.pattern, &args.replacement)?;
        Ok(Self::new(directory, substitution, args.remote.clone()))
    }

    /// The directory whose immediate children are scanned.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The compiled substitution shared by every repository.
    pub fn substitution(&self) -> &transform::Substitution {
        &self.substitution
    }

    /// The remote named with `--remote`, if any.
    ///
    /// # Returns
    ///
    /// * `Some(name)` when every repository should use that remote.
    /// * `None` to use `origin`, or the only remote of each repository.
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }
}

/// How a migration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user did not confirm; nothing was written.
    Aborted,
    /// The apply loop ran (or there was nothing to migrate).
    Completed(apply::ApplyReport),
}

impl Outcome {
    /// Process exit status for this outcome. Per-repository failures still
    /// count as a completed run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Aborted => 1,
            Outcome::Completed(_) => 0,
        }
    }
}

/// Initializes tracing on stderr, filtered by `RUST_LOG`.
///
/// Falls back to `warn`, or `debug` when `verbose` is set, so regular runs
/// only show the preview and status lines.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

/// Runs scan, preview, confirmation and apply against `out`.
///
/// The directory is scanned before anything is written, so an unreadable
/// directory fails without partial output.
///
/// # Errors
///
/// Returns [`Error::Scan`] if the directory cannot be listed,
/// [`Error::Prompt`] if the confirmation cannot be read, and [`Error::Io`]
/// if writing to `out` fails.
pub fn run<S, P, W>(
    options: &MigrateOptions,
    store: &S,
    prompter: &mut P,
    out: &mut W,
) -> Result<Outcome, Error>
where
    S: git::RemoteStore,
    P: prompt::LinePrompter,
    W: Write,
{
    let repositories = scan::scan_repositories(options.directory())?;
    debug!(count = repositories.len(), directory = %options.directory().display(), "scan finished");

    write_banner(out, options)?;

    if repositories.is_empty() {
        writeln!(
            out,
            "{}",
            style(format!(
                "No git repositories found in {}.",
                options.directory().display()
            ))
            .yellow()
            .bold()
        )?;
        return Ok(Outcome::Completed(apply::ApplyReport::default()));
    }

    writeln!(out, "The following git repositories have been found:\n")?;

    let transforms = transform::prepare_transforms(
        repositories,
        options.substitution(),
        options.remote(),
        store,
    );
    writeln!(out, "{}", preview::render_preview(&transforms))?;
    writeln!(out)?;
    out.flush()?;

    if !prompt::confirm_migration(prompter).map_err(Error::Prompt)? {
        writeln!(out, "{}", style("Aborted.").yellow().bold())?;
        return Ok(Outcome::Aborted);
    }

    let report = apply::apply(&transforms, out)?;

    writeln!(
        out,
        "\n{} updated, {} skipped, {} failed",
        style(report.updated).green().bold(),
        style(report.skipped).yellow().bold(),
        style(report.failed).red().bold()
    )?;
    writeln!(out, "Bye.")?;

    Ok(Outcome::Completed(report))
}

/// Main CLI entry point for `git-remote-migrate`.
///
/// This function:
/// 1. Parses arguments (clap exits on its own for `--help` and bad input).
/// 2. Initializes logging.
/// 3. Verifies that `git` is installed.
/// 4. Compiles the pattern and resolves the target directory.
/// 5. Runs the preview / confirm / apply flow on stdout.
///
/// # Exit Codes
///
/// * `0` – The run completed, even if some repositories failed to update.
/// * `1` – The user declined the confirmation.
///
/// # Errors
///
/// Returns an [`Error`] when `git` is missing, the pattern is invalid, the
/// directory cannot be scanned, or the prompt fails.
pub fn entry() -> Result<i32, Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    which::which("git").map_err(Error::GitNotFound)?;

    let options = MigrateOptions::from_args(&args)?;
    let store = git::GitCli;
    let mut prompter = prompt::TerminalLinePrompter;
    let mut out = std::io::stdout();

    let outcome = run(&options, &store, &mut prompter, &mut out)?;
    Ok(outcome.exit_code())
}
