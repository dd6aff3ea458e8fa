use std::io::{self, Write};

use console::style;
use tracing::{info, warn};

use crate::git::RemoteStore;
use crate::transform::RemoteTransform;

/// Tally of what the apply loop did, one count per remote URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Applies every transform in order, writing one status line per URL.
///
/// Each mapping is recomputed from the repository rather than reused from the
/// preview, so URLs changed in the meantime surface as failures instead of
/// being overwritten. A failure on one repository never stops the loop.
///
/// Updates go to the remote the mapping was read from.
///
/// # Errors
///
/// Only errors writing to `out` are returned.
pub fn apply<S: RemoteStore, W: Write>(
    transforms: &[RemoteTransform<'_, S>],
    out: &mut W,
) -> io::Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for t in transforms {
        let repo = t.repository();
        let mapping = t.compute_mapping();

        for change in &mapping.changes {
            write!(out, "- {}... ", repo.name())?;

            if change.is_unchanged() {
                writeln!(out, "{}", style("Skipped").yellow().bold())?;
                report.skipped += 1;
                continue;
            }

            match t.store().set_remote_url(
                repo.path(),
                &mapping.remote,
                &change.original,
                &change.replaced,
            ) {
                Ok(()) => {
                    info!(repo = %repo.path().display(), remote = %mapping.remote, new = %change.replaced, "remote updated");
                    writeln!(out, "{}", style("Done").green().bold())?;
                    report.updated += 1;
                }
                Err(e) => {
                    warn!(repo = %repo.path().display(), remote = %mapping.remote, error = %e, "remote update failed");
                    writeln!(out, "{}", style(format!("Failed ({e})")).red().bold())?;
                    report.failed += 1;
                }
            }
        }
    }

    Ok(report)
}
