//! Spreadsheet writer
//!
//! Each [`Table`] becomes one worksheet with a bold header row.

use super::traits::{Cell, OutputResult, ReportWriter, Table};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Excel's limit on characters in one cell
const MAX_CELL_CHARS: usize = 32_767;

/// Excel's limit on worksheet name length
const MAX_SHEET_NAME: usize = 31;

/// [`ReportWriter`] producing `.xlsx` workbooks
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxReportWriter;

impl ReportWriter for XlsxReportWriter {
    fn write_tables(&self, path: &Path, tables: &[Table]) -> OutputResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        for table in tables {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(&table.name))?;

            for (col, title) in table.headers.iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, title, &header)?;
            }

            for (r, row) in table.rows.iter().enumerate() {
                let row_num = (r + 1) as u32;
                for (c, cell) in row.iter().enumerate() {
                    let col = c as u16;
                    match cell {
                        Cell::Text(text) => {
                            sheet.write_string(row_num, col, truncate(text))?;
                        }
                        Cell::Number(n) => {
                            sheet.write_number(row_num, col, *n)?;
                        }
                        Cell::Empty => {}
                    }
                }
            }
        }

        if tables.is_empty() {
            workbook.add_worksheet();
        }

        workbook.save(path)?;
        tracing::debug!("Wrote {} sheet(s) to {}", tables.len(), path.display());
        Ok(())
    }
}

/// Removes characters Excel rejects in sheet names and enforces the length limit
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();

    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.xlsx");

        let mut table = Table::new("products", &["Code", "Price"]);
        table.push_row(vec!["E3Z".into(), Cell::Number(12.5)]);
        table.push_row(vec!["E2E".into(), Cell::Empty]);

        XlsxReportWriter.write_tables(&path, &[table]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_sheet_name_is_cleaned() {
        assert_eq!(sheet_name("a/b:c"), "abc");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("[]"), "Sheet");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "é".repeat(MAX_CELL_CHARS + 5);
        assert_eq!(truncate(&long).chars().count(), MAX_CELL_CHARS);
        assert_eq!(truncate("short"), "short");
    }
}
