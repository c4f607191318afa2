//! Text rendering of result sets.

/// Emitted when a statement produced no rows.
pub const NO_RESULTS_TEXT: &str = "Query executed successfully. No results returned.";

/// Render a result set as a fixed-width text table.
///
/// Each column is as wide as its longest header or cell. Cells are
/// left-justified and joined with `" | "`; a dash rule frames the header and
/// closes the table, followed by a row-count line. Pipes and line breaks
/// inside cells are escaped so every line splits back into one cell per
/// column.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return NO_RESULTS_TEXT.to_string();
    }

    let columns: Vec<String> = columns.iter().map(|c| escape_cell(c)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| escape_cell(c)).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header = format_line(&columns, &widths);
    let separator = "-".repeat(header.chars().count());

    let mut out = String::new();
    out.push_str("Query Results:\n");
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&header);
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in &rows {
        out.push_str(&format_line(row, &widths));
        out.push('\n');
    }
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&format!("Total rows: {}", rows.len()));
    out
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = w)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Prefix rendered result text with a short natural-language lead-in.
///
/// Deterministic, no model call.
pub fn normalize_result(text: &str) -> String {
    let lead = if text.contains("Total rows:") {
        "Here are the results from your query:"
    } else if text.contains("executed successfully") {
        "Your query was executed successfully."
    } else {
        "Query result:"
    };
    format!("{}\n\n{}", lead, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_empty_rows() {
        let text = render_table(&strings(&["Name"]), &[]);
        assert_eq!(text, NO_RESULTS_TEXT);
    }

    #[test]
    fn test_render_exact_layout() {
        let columns = strings(&["Id", "Name"]);
        let rows = vec![strings(&["1", "AC/DC"]), strings(&["22", "Accept"])];
        let text = render_table(&columns, &rows);

        let expected = "Query Results:\n\
                        -----------\n\
                        Id | Name  \n\
                        -----------\n\
                        1  | AC/DC \n\
                        22 | Accept\n\
                        -----------\n\
                        Total rows: 2";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_width_invariant() {
        let columns = strings(&["CustomerName", "Total"]);
        let rows = vec![
            strings(&["Helena Holý", "14.85"]),
            strings(&["František Wichterlová", "13.86"]),
            strings(&["Astrid Gruber", "7.92"]),
        ];
        let text = render_table(&columns, &rows);

        let lines: Vec<&str> = text.lines().collect();
        // title, rule, header, rule, 3 rows, rule, count
        assert_eq!(lines.len(), 9);

        let table_lines = [lines[2], lines[4], lines[5], lines[6]];
        let expected_widths = ["František Wichterlová".chars().count(), "Total".len()];
        for line in table_lines {
            let cells: Vec<&str> = line.split(" | ").collect();
            assert_eq!(cells.len(), columns.len());
            for (cell, width) in cells.iter().zip(expected_widths) {
                assert_eq!(cell.chars().count(), width);
            }
            assert_eq!(line.chars().count(), lines[1].chars().count());
        }
        assert_eq!(lines[8], "Total rows: 3");
    }

    #[test]
    fn test_render_escapes_separators_in_cells() {
        let columns = strings(&["a", "b"]);
        let rows = vec![strings(&["x | y | z", "line one\nline two"])];
        let text = render_table(&columns, &rows);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        let cells: Vec<&str> = lines[4].split(" | ").map(str::trim_end).collect();
        assert_eq!(cells, vec!["x \\| y \\| z", "line one\\nline two"]);
        assert_eq!(lines[4].chars().count(), lines[1].chars().count());
    }

    #[test]
    fn test_render_is_deterministic() {
        let columns = strings(&["a"]);
        let rows = vec![strings(&["x"]), strings(&["y"])];
        assert_eq!(render_table(&columns, &rows), render_table(&columns, &rows));
    }

    #[test]
    fn test_normalize_table() {
        let columns = strings(&["n"]);
        let text = render_table(&columns, &[strings(&["1"])]);
        let normalized = normalize_result(&text);
        assert!(normalized.starts_with("Here are the results from your query:\n\n"));
        assert!(normalized.ends_with(&text));
    }

    #[test]
    fn test_normalize_success_without_rows() {
        let normalized = normalize_result(NO_RESULTS_TEXT);
        assert!(normalized.starts_with("Your query was executed successfully."));
    }

    #[test]
    fn test_normalize_generic() {
        assert_eq!(normalize_result("42"), "Query result:\n\n42");
    }
}
