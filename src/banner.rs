use std::io::{self, Write};
use std::iter;

use console::{measure_text_width, style};

use crate::cli::MigrateOptions;

/// Writes a colorized, boxed banner summarizing the pending migration.
///
/// The box is sized to the widest **visible** line, using
/// [`console::measure_text_width`] so embedded ANSI codes do not skew the
/// padding. Borders are styled separately from the content.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_banner<W: Write>(out: &mut W, options: &MigrateOptions) -> io::Result<()> {
    let lines = banner_lines(options);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).blue().bold();
    let bottom = style(format!("╚{}╝", border)).blue().bold();
    let left = style("║ ").blue().bold().to_string();
    let right = style("║").blue().bold().to_string();

    writeln!(out)?;
    writeln!(out, "{top}")?;
    for line in lines {
        let pad = max_width - measure_text_width(&line);
        writeln!(out, "{}{}{}{}", left, line, " ".repeat(pad - 1), right)?;
    }
    writeln!(out, "{bottom}")?;
    writeln!(out)
}

/// Constructs the banner text: title, the substitution, and where it applies.
///
/// Some lines carry ANSI styling; measure them with
/// `console::measure_text_width`, not `str::len()`.
fn banner_lines(options: &MigrateOptions) -> Vec<String> {
    let remote = match options.remote() {
        Some(name) => format!("remote `{name}`"),
        None => String::from("primary remote (origin, or the only remote)"),
    };

    let top = ["Migrate Git Remotes", ""].into_iter().map(|s| s.to_string());

    let details = [
        format!("Directory:   {}", options.directory().display()),
        format!(
            "Pattern:     {}",
            style(options.substitution().pattern()).cyan().bold()
        ),
        format!(
            "Replace:     {}",
            style(options.substitution().replacement()).cyan().bold()
        ),
        format!("Remote:      {remote}"),
    ]
    .into_iter();

    let bottom = iter::once(String::new()).chain(iter::once(
        style("Nothing is changed until you type `yes`.")
            .yellow()
            .to_string(),
    ));

    top.chain(details).chain(bottom).collect()
}
