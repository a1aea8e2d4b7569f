use std::{borrow::Cow, fmt::Write as _};

use itertools::Itertools;

/// Renders left-aligned columns separated by two spaces, with a dashed rule
/// under the header. Rows shorter than the header are padded; extra cells are
/// ignored.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| width_of(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(width_of(cell));
        }
    }
    let widths = widths.into_iter().map(|w| w.max(3)).collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let cell = cells.get(idx).map(|c| flatten(c)).unwrap_or(Cow::Borrowed(""));
            let padding = width.saturating_sub(width_of(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .join("  ");
    line.trim_end().to_string()
}

fn width_of(value: &str) -> usize {
    value.chars().count()
}

fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
