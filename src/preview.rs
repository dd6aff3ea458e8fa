use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use console::style;

use crate::git::RemoteStore;
use crate::transform::{RemoteTransform, UrlChange};

/// Display width of the repository name column.
pub const NAME_WIDTH: usize = 40;

const ELLIPSIS: &str = "..";

/// Shortens `name` to at most `width` characters, ending in `..` when cut.
///
/// # Examples
///
/// ```
/// use git_remote_migrate::preview::truncate;
///
/// assert_eq!(truncate("short", 40), "short");
/// assert_eq!(truncate("abcdefgh", 6), "abcd..");
/// ```
pub fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    name.chars().take(keep).chain(ELLIPSIS.chars()).collect()
}

/// Styles the new-remote cell: green when the URL changes, otherwise the URL
/// followed by a yellow `(unchanged)` marker.
fn url_cell(change: &UrlChange) -> Cell {
    if change.is_unchanged() {
        Cell::new(format!(
            "{} {}",
            change.replaced,
            style("(unchanged)").yellow().bold()
        ))
    } else {
        Cell::new(&change.replaced)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    }
}

/// Builds the preview table with one row per repository URL.
///
/// Repositories whose mapping is empty (invalid, or without a usable remote)
/// contribute no rows.
pub fn render_preview<S: RemoteStore>(transforms: &[RemoteTransform<'_, S>]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec![Cell::new("REPOSITORY"), Cell::new("NEW REMOTE")]);

    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    for t in transforms {
        let name = truncate(t.repository().name(), NAME_WIDTH);
        for change in t.compute_mapping().changes {
            table.add_row(vec![Cell::new(&name), url_cell(&change)]);
        }
    }

    table
}
