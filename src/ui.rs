use std::io::{self, BufRead, IsTerminal, Write};

use crate::ai::AiObserver;
use crate::app::AppError;
use crate::query::{PageInfo, RecordQuery, SortDirection, ALL};

pub struct Palette {
    enabled: bool,
    dark: bool,
}

impl Palette {
    /// Colors only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn auto(dark: bool) -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled, dark }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self {
            enabled: false,
            dark: false,
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(if self.dark { "1;96" } else { "1;36" }, text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(if self.dark { "37" } else { "2" }, text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint(if self.dark { "1;94" } else { "1;34" }, text)
    }

    pub fn status(&self, status: &str) -> String {
        self.paint(status_color_code(status, self.dark), status)
    }
}

fn status_color_code(status: &str, dark: bool) -> &'static str {
    let base = match status.trim().to_ascii_lowercase().as_str() {
        "paid" | "done" | "completed" | "delivered" | "exited" => "32",
        "sent" | "active" | "in_progress" | "in_transit" | "growth" => "36",
        "draft" | "planning" | "todo" | "pending" | "seed" => "34",
        "overdue" | "delayed" | "on_hold" => "31",
        _ => return "0",
    };
    if !dark {
        return base;
    }
    match base {
        "32" => "92",
        "36" => "96",
        "34" => "94",
        _ => "91",
    }
}

/// One table cell; `status` cells get the status colors.
pub struct Cell {
    pub text: String,
    pub status: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: false,
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: true,
        }
    }
}

/// Left-aligned columns padded to the widest cell; an empty table gets one placeholder row.
pub fn format_table(headers: &[&str], rows: &[Vec<Cell>], palette: &Palette) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(display_text(&cell.text).chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{:<width$}", header.to_ascii_uppercase(), width = width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&palette.heading(header_line.trim_end()));
    out.push('\n');

    if rows.is_empty() {
        out.push_str(&palette.dim("no records"));
        out.push('\n');
        return out;
    }

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(index, (cell, width))| {
                let text = display_text(&cell.text);
                let padded = format!("{:<width$}", text, width = width);
                if index == 0 {
                    palette.id(&padded)
                } else if cell.status {
                    palette.status(&padded)
                } else {
                    padded
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn display_text(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ")
}

pub fn format_footer(shown: usize, matched: usize, total: usize, page: Option<PageInfo>) -> String {
    let mut footer = format!("{} of {} record(s)", shown, total);
    if matched != total {
        footer = format!("{} ({} matched)", footer, matched);
    }
    if let Some(page) = page {
        footer = format!("{} - page {}/{}", footer, page.number, page.page_count);
    }
    footer
}

/// Active search, filter and sort settings, for the line above a table.
pub fn query_summary(query: &RecordQuery) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(search) = query.search.as_deref().and_then(non_empty) {
        parts.push(format!("search={search}"));
    }
    if let Some(filter) = query.filter.as_ref().filter(|filter| filter.value != ALL) {
        parts.push(format!("{}={}", filter.field, filter.value));
    }
    if let Some(sort) = query.sort.as_ref() {
        let direction = match sort.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        parts.push(format!("sort={}:{}", sort.field, direction));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Label and value pairs with the labels padded to one width.
pub fn format_detail(rows: &[(String, String)], palette: &Palette) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (label, value) in rows {
        let padded = format!("{:<width$}", label, width = width);
        out.push_str(&format!("{}  {}\n", palette.dim(&padded), value));
    }
    out
}

/// Asks on stdin unless `assume_yes`; refuses outright when stdin is not a terminal.
pub fn confirm(question: &str, assume_yes: bool) -> Result<bool, AppError> {
    if assume_yes {
        return Ok(true);
    }
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(AppError::InvalidArgument(format!(
            "{} requires --yes when not running interactively",
            question
        )));
    }
    let mut stderr = io::stderr();
    write!(stderr, "{}? [y/N] ", question)?;
    stderr.flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Shows a waiting line on an interactive stderr while the assistant works.
pub struct TerminalObserver {
    interactive: bool,
}

impl TerminalObserver {
    pub fn for_stderr() -> Self {
        Self {
            interactive: io::stderr().is_terminal(),
        }
    }
}

impl AiObserver for TerminalObserver {
    fn on_loading(&self, loading: bool) {
        if !self.interactive {
            return;
        }
        if loading {
            eprint!("waiting for assistant (Ctrl-C to cancel)...");
        } else {
            eprint!("\r\x1b[2K");
        }
    }
}

#[cfg(test)]
#[path = "ui_tests_ext.rs"]
mod tests;
