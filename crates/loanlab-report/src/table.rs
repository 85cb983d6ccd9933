use std::io::Write;

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use loanlab_core::LabResult;

/// Render rows as an aligned text table. Every column is padded to its
/// widest cell; headers get a dashed underline.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let n_cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(n_cols) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .take(n_cols)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
    };

    out.push_str(format_row(headers).trim_end());
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in rows {
        out.push_str(format_row(row).trim_end());
        out.push('\n');
    }
    out
}

/// Write a table under a colored title line.
pub fn print_table<W: Write>(
    out: &mut W,
    title: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> LabResult<()> {
    execute!(
        out,
        SetForegroundColor(Color::Cyan),
        Print(format!("{title}\n")),
        ResetColor,
        Print(render_table(headers, rows)),
        Print("\n"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec!["Model".to_string(), "ROC_AUC".to_string()]
    }

    #[test]
    fn test_columns_align_to_widest_cell() {
        let rows = vec![
            vec!["LogisticRegression".to_string(), "0.8123".to_string()],
            vec!["gboost".to_string(), "0.86".to_string()],
        ];
        let table = render_table(&headers(), &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Model"));
        assert!(lines[1].starts_with("------"));
        // Both score cells start at the same offset
        let offset = lines[2].find("0.8123").unwrap();
        assert_eq!(lines[3].find("0.86").unwrap(), offset);
    }

    #[test]
    fn test_empty_rows_still_render_headers() {
        let table = render_table(&headers(), &[]);
        assert!(table.contains("Model"));
        assert_eq!(table.lines().count(), 2);
    }

    #[test]
    fn test_print_table_writes_to_buffer() {
        let mut buf = Vec::new();
        let rows = vec![vec!["forest".to_string(), "0.84".to_string()]];
        print_table(&mut buf, "results", &headers(), &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("results"));
        assert!(text.contains("forest"));
    }
}
