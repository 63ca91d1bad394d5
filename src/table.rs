/// Renders rows as a boxed plain-text table sized to the widest cell per column.
/// Widths count characters, not bytes.
pub fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(ci) {
                *width = (*width).max(display_width(cell));
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn display_width(cell: &str) -> usize {
    cell.chars().count()
}

fn render_row<'a>(widths: &[usize], cells: impl IntoIterator<Item = &'a str>) -> String {
    let mut cells = cells.into_iter();
    let mut line = String::from("|");
    for width in widths {
        let cell = cells.next().unwrap_or("");
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(display_width(cell)) + 1));
        line.push('|');
    }
    line
}
