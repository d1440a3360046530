use crate::models::{Identity, Record};
use crate::sync::{AddForm, EditBuffer, StatusKind, StatusMessage};
use colored::*;
use terminal_size::{terminal_size, Width};

const DEFAULT_WIDTH: usize = 100;
const MIN_COLUMN: usize = 6;
const EMPTY_MESSAGE: &str = "No users found!";

/// Everything the screen shows at one moment.
pub struct View<'a> {
    pub identity: Option<&'a Identity>,
    pub records: &'a [Record],
    pub editing: Option<&'a EditBuffer>,
    pub form: &'a AddForm,
    pub status: Option<&'a StatusMessage>,
    pub loading: bool,
}

pub fn terminal_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Render the signed-in screen.
pub fn render_view(view: &View, width: usize) -> String {
    let mut out = String::new();

    let who = view
        .identity
        .map(|i| format!("  ({})", i.label()))
        .unwrap_or_default();
    out.push_str(&format!("{}{}\n", "User Management".bold(), who.dimmed()));

    if let Some(status) = view.status {
        out.push_str(&render_status(status));
        out.push('\n');
    }

    if !view.form.name.is_empty() || !view.form.email.is_empty() {
        out.push_str(
            &format!(
                "New user: name={:?} email={:?}  (type `add` to submit)",
                view.form.name, view.form.email
            )
            .dimmed()
            .to_string(),
        );
        out.push('\n');
    }

    out.push('\n');
    if view.loading {
        out.push_str(&"Loading...".dimmed().to_string());
        out.push('\n');
    } else {
        out.push_str(&render_records(view.records, view.editing, width));
    }
    out
}

pub fn render_status(status: &StatusMessage) -> String {
    match status.kind {
        StatusKind::Info => status.text.cyan().to_string(),
        StatusKind::Error => status.text.red().to_string(),
    }
}

/// Render the record table, or the empty-state line.
///
/// The row being edited shows the buffer's values, marked with `*`.
pub fn render_records(records: &[Record], editing: Option<&EditBuffer>, width: usize) -> String {
    if records.is_empty() {
        return format!("{}\n", EMPTY_MESSAGE.yellow());
    }

    let rows: Vec<(bool, [&str; 3])> = records
        .iter()
        .map(|record| match editing {
            Some(buffer) if buffer.editing_id == record.id => (
                true,
                [record.id.as_str(), buffer.name.as_str(), buffer.email.as_str()],
            ),
            _ => (
                false,
                [record.id.as_str(), record.name.as_str(), record.email.as_str()],
            ),
        })
        .collect();

    let headers = ["ID", "Name", "Email"];
    let mut widths = [0usize; 3];
    for (i, header) in headers.iter().enumerate() {
        widths[i] = rows
            .iter()
            .map(|(_, cells)| cells[i].chars().count())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(MIN_COLUMN);
    }
    fit_widths(&mut widths, width);

    let mut out = String::new();
    let header_line = format_row(&headers, &widths, ' ');
    out.push_str(&header_line.bold().to_string());
    out.push('\n');
    out.push_str(&"-".repeat(header_line.chars().count()).dimmed().to_string());
    out.push('\n');

    for (is_editing, cells) in rows {
        let marker = if is_editing { '*' } else { ' ' };
        let line = format_row(&cells, &widths, marker);
        if is_editing {
            out.push_str(&line.yellow().to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out
}

pub fn render_identity(identity: &Identity) -> String {
    let mut out = format!("{} {}\n", "Signed in as".green(), identity.label().bold());
    out.push_str(&format!("  subject: {}\n", identity.subject));
    if let Some(email) = &identity.email {
        out.push_str(&format!("  email:   {}\n", email));
    }
    out.push_str(&format!(
        "  since:   {}\n",
        identity.signed_in_at.format("%Y-%m-%d %H:%M")
    ));
    out
}

/// Shrink the widest column until the row fits, but never below MIN_COLUMN.
fn fit_widths(widths: &mut [usize; 3], total: usize) {
    // marker + two-space gaps between three columns
    let overhead = 2 + 2 * 2;
    while widths.iter().sum::<usize>() + overhead > total {
        let Some((index, widest)) = widths
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, w)| *w)
        else {
            return;
        };
        if widest <= MIN_COLUMN {
            return;
        }
        widths[index] = widest - 1;
    }
}

fn format_row(cells: &[&str; 3], widths: &[usize; 3], marker: char) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| pad(&truncate(cell, *width), *width))
        .collect();
    format!("{} {}", marker, padded.join("  ")).trim_end().to_string()
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}
