//! Plain-text rendering of the result table.
//!
//! Everything here returns strings so the shell and the one-shot `search`
//! command print the same output and tests can inspect it. The thumbnail
//! column is not drawn; the product link is either an OSC 8 hyperlink on the
//! item text or a trailing `Link` column, see [`LinkStyle`].

use std::io::IsTerminal;

use asearch_client::{FetchOrchestrator, FetchState};
use asearch_core::{
    match_count_label, Column, DisplayResult, Page, SortDirection, SortState, ViewState, COLUMNS,
};

/// Longer cells are cut and suffixed with `...`.
const MAX_CELL_WIDTH: usize = 60;

const COLUMN_GAP: &str = "  ";

/// How product links are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkStyle {
    /// Item text wrapped in an OSC 8 terminal hyperlink.
    Hyperlink,
    /// Plain URL in an extra `Link` column after the others.
    Column,
}

impl LinkStyle {
    /// Hyperlinks on a terminal, a plain column when output is piped.
    pub(crate) fn for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            LinkStyle::Hyperlink
        } else {
            LinkStyle::Column
        }
    }
}

/// Visible cell text plus an optional link target.
struct Cell {
    text: String,
    href: Option<String>,
}

impl Cell {
    fn plain(text: String) -> Self {
        Self { text, href: None }
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }

    /// Cell padded to `width` visible characters. Escape sequences do not
    /// count towards the width.
    fn padded(&self, width: usize, links: LinkStyle) -> String {
        let padding = " ".repeat(width.saturating_sub(self.width()));
        match (&self.href, links) {
            (Some(href), LinkStyle::Hyperlink) => {
                format!("{}{padding}", hyperlink(&self.text, href))
            }
            _ => format!("{}{padding}", self.text),
        }
    }
}

/// Renders whatever the current fetch state calls for: a loading notice, a
/// failure notice, or the requested page of the table with its footer.
pub(crate) fn render_view(
    orchestrator: &FetchOrchestrator,
    view: &ViewState,
    links: LinkStyle,
) -> String {
    let lines = match orchestrator.state() {
        FetchState::Idle => vec!["no search yet; type a query to start".to_owned()],
        FetchState::Loading => vec!["loading results...".to_owned()],
        FetchState::Settled => match orchestrator.last_error() {
            Some(error) => vec![format!("search failed: {error}")],
            None if orchestrator.results().is_empty() => vec!["no results".to_owned()],
            None => {
                let page = view.render(orchestrator.results());
                let mut lines = render_table(&page.rows, view.sort, links);
                if page.rows.is_empty() {
                    lines.push("no rows match the filter".to_owned());
                }
                lines.push(footer(&page, view));
                lines
            }
        },
    };

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Header, rule and one line per row. The sorted column's header carries a
/// direction arrow.
pub(crate) fn render_table(
    rows: &[&DisplayResult],
    sort: SortState,
    links: LinkStyle,
) -> Vec<String> {
    let columns: Vec<&Column> = COLUMNS.iter().filter(|c| !c.is_image()).collect();

    let mut headers: Vec<Cell> = columns
        .iter()
        .map(|column| {
            Cell::plain(if column.sort_field == Some(sort.field) {
                format!("{} {}", column.header, arrow(sort.direction))
            } else {
                column.header.to_owned()
            })
        })
        .collect();
    if links == LinkStyle::Column {
        headers.push(Cell::plain("Link".to_owned()));
    }

    let cells: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Cell> = columns
                .iter()
                .map(|column| Cell {
                    text: truncate(&column.cell(row), MAX_CELL_WIDTH),
                    href: column.href(row).map(str::to_owned),
                })
                .collect();
            if links == LinkStyle::Column {
                let href = columns.iter().find_map(|column| column.href(row));
                cells.push(Cell::plain(href.unwrap_or("\u{2014}").to_owned()));
            }
            cells
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .fold(header.width(), usize::max)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(format_row(&headers, &widths, links));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    lines.extend(cells.iter().map(|row| format_row(row, &widths, links)));
    lines
}

/// `3 matches | page 1 of 1 | sorted by price desc | filter "usb"`
pub(crate) fn footer(page: &Page<'_>, view: &ViewState) -> String {
    let mut parts = vec![
        match_count_label(page.match_count),
        format!("page {} of {}", page.index, page.page_count),
        format!(
            "sorted by {} {}",
            view.sort.field,
            match view.sort.direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            }
        ),
    ];
    if !view.filter_text.is_empty() {
        parts.push(format!("filter \"{}\"", view.filter_text));
    }
    parts.join(" | ")
}

fn format_row(cells: &[Cell], widths: &[usize], links: LinkStyle) -> String {
    cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| cell.padded(width, links))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP)
        .trim_end()
        .to_owned()
}

/// OSC 8 hyperlink: terminals that support it show `text` as a clickable
/// link to `url`; others print `text` alone.
fn hyperlink(text: &str, url: &str) -> String {
    format!("\u{1b}]8;;{url}\u{1b}\\{text}\u{1b}]8;;\u{1b}\\")
}

fn arrow(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "\u{25b2}",
        SortDirection::Descending => "\u{25bc}",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_owned()
    }
}
