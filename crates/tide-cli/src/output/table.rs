#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Render an aligned table for string rows.
#[must_use]
pub fn render_rows(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
                .max(5)
        })
        .collect();

    fit_widths(&mut widths, headers, options.max_width);

    let header_line = headers
        .iter()
        .zip(widths.iter())
        .map(|(header, width)| pad_cell(&truncate_text(header, *width), *width, false))
        .collect::<Vec<_>>()
        .join("  ");
    let divider = "-".repeat(header_line.chars().count());

    let row_lines = rows.iter().map(|row| {
        widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let value = row.get(index).map_or("-", String::as_str);
                let truncated = truncate_text(value, *width);
                let numeric = looks_numeric(&truncated);
                let padded = pad_cell(&truncated, *width, numeric);
                if options.color {
                    colorize_sentiment(&padded)
                } else {
                    padded
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    });

    let mut lines = Vec::with_capacity(2 + rows.len());
    lines.push(header_line.trim_end().to_string());
    lines.push(divider);
    lines.extend(row_lines);
    lines.join("\n")
}

/// Shrink the widest shrinkable column one char at a time until the row fits.
fn fit_widths(widths: &mut [usize], headers: &[&str], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };
    let separators = widths.len().saturating_sub(1) * 2;

    while widths.iter().sum::<usize>() + separators > max_width {
        let candidate = widths
            .iter()
            .enumerate()
            .filter(|(idx, width)| **width > headers[*idx].len().max(5))
            .max_by_key(|(_, width)| **width)
            .map(|(idx, _)| idx);
        let Some(idx) = candidate else {
            break;
        };
        widths[idx] -= 1;
    }
}

pub fn truncate_text(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 1 {
        return "…".to_string();
    }

    let mut out: String = value.chars().take(width - 1).collect();
    out.push('…');
    out
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.'))
}

fn pad_cell(value: &str, width: usize, numeric: bool) -> String {
    let pad = width.saturating_sub(value.chars().count());
    if numeric {
        format!("{}{}", " ".repeat(pad), value)
    } else {
        format!("{}{}", value, " ".repeat(pad))
    }
}

/// Color a cell whose whole content is a sentiment label.
pub fn colorize_sentiment(value: &str) -> String {
    let code = match value.trim().to_ascii_lowercase().as_str() {
        "positive" => Some("32"),
        "negative" => Some("31"),
        "mixed" => Some("33"),
        _ => None,
    };

    match code {
        Some(code) => format!("\u{1b}[{code}m{value}\u{1b}[0m"),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PLAIN: TableOptions = TableOptions {
        max_width: None,
        color: false,
    };

    #[test]
    fn columns_align_across_rows() {
        let rows = vec![
            vec!["brf-1".to_string(), "3".to_string(), "short".to_string()],
            vec!["brf-200".to_string(), "12".to_string(), "a much longer headline".to_string()],
        ];
        let table = render_rows(&["id", "email_count", "headline"], &rows, PLAIN);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].chars().all(|c| c == '-'));
        let headline_col = lines[0].find("headline").unwrap();
        assert_eq!(lines[3].find("a much").unwrap(), headline_col);
    }

    #[test]
    fn narrow_terminal_truncates_widest_column() {
        let rows = vec![vec!["brf-1".to_string(), "x".repeat(80)]];
        let table = render_rows(
            &["id", "headline"],
            &rows,
            TableOptions {
                max_width: Some(40),
                color: false,
            },
        );
        let last = table.lines().last().unwrap();
        assert!(last.chars().count() <= 40);
        assert!(last.ends_with('…'));
    }

    #[test]
    fn sentiment_words_are_colored() {
        assert_eq!(colorize_sentiment("positive"), "\u{1b}[32mpositive\u{1b}[0m");
        assert_eq!(colorize_sentiment("Negative "), "\u{1b}[31mNegative \u{1b}[0m");
        assert_eq!(colorize_sentiment("neutral"), "neutral");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_text("héllo wörld", 6), "héllo…");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
