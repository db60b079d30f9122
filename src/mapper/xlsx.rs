//! Spreadsheet-backed [`TabularStore`].
//!
//! The workbook is read once with `calamine` when the store is opened and
//! rewritten in full with `rust_xlsxwriter` on every flush. Sheets other than
//! the four invoice regions are carried over as plain text.

use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use chrono::NaiveTime;
use log::{debug, info};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};

use super::store::{MemoryStore, Sheet, TabularStore};
use crate::core::FatturaError;

fn storage_err(e: XlsxError) -> FatturaError {
    FatturaError::Storage(format!("xlsx write error: {e}"))
}

/// Invoice store kept in an `.xlsx` workbook.
#[derive(Debug)]
pub struct XlsxStore {
    path: PathBuf,
    data: MemoryStore,
    /// Unrelated sheets found in the workbook, header row included.
    other_sheets: Vec<(String, Vec<Vec<String>>)>,
}

impl XlsxStore {
    /// Open the workbook at `path`, or start an empty one if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FatturaError> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path,
            data: MemoryStore::new(),
            other_sheets: Vec::new(),
        };
        if store.path.exists() {
            store.load()?;
        } else {
            debug!("{} does not exist yet, starting empty", store.path.display());
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<(), FatturaError> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            FatturaError::Storage(format!("cannot open {}: {e}", self.path.display()))
        })?;

        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| FatturaError::Storage(format!("cannot read sheet '{name}': {e}")))?;
            let grid = range_to_rows(&range);

            match Sheet::from_name(&name) {
                Some(sheet) => {
                    // First row is the header.
                    let rows = grid.into_iter().skip(1).collect();
                    self.data.insert_sheet(sheet, rows);
                }
                None => self.other_sheets.push((name, grid)),
            }
        }
        info!("loaded {}", self.path.display());
        Ok(())
    }
}

/// Cell text by absolute position, trailing empty rows dropped.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => float_text(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == NaiveTime::MIN => value.format("%Y-%m-%d").to_string(),
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string(),
    }
}

/// Integral values without a fraction, so numeric ids and codes read back as typed.
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

impl TabularStore for XlsxStore {
    fn ensure_sheet(&mut self, sheet: Sheet) -> Result<(), FatturaError> {
        self.data.ensure_sheet(sheet)
    }

    fn rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, FatturaError> {
        self.data.rows(sheet)
    }

    fn append_rows(&mut self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), FatturaError> {
        self.data.append_rows(sheet, rows)
    }

    fn retain_rows(
        &mut self,
        sheet: Sheet,
        keep: &mut dyn FnMut(&[String]) -> bool,
    ) -> Result<usize, FatturaError> {
        self.data.retain_rows(sheet, keep)
    }

    fn flush(&mut self) -> Result<(), FatturaError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        for (sheet, rows) in self.data.sheets() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name()).map_err(storage_err)?;
            for (col, title) in sheet.header().iter().enumerate() {
                worksheet
                    .write_string_with_format(0, col as u16, *title, &bold)
                    .map_err(storage_err)?;
                worksheet
                    .set_column_width(col as u16, 20)
                    .map_err(storage_err)?;
            }
            write_rows(worksheet, rows, 1)?;
        }

        for (name, rows) in &self.other_sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name).map_err(storage_err)?;
            write_rows(worksheet, rows, 0)?;
        }

        workbook.save(&self.path).map_err(storage_err)?;
        debug!("wrote {}", self.path.display());
        Ok(())
    }
}

fn write_rows(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    rows: &[Vec<String>],
    first_row: u32,
) -> Result<(), FatturaError> {
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(first_row + r as u32, c as u16, value)
                .map_err(storage_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_read_back_like_typed_text() {
        assert_eq!(float_text(30.0), "30");
        assert_eq!(float_text(12.5), "12.5");
        assert_eq!(float_text(-4.0), "-4");
    }

    #[test]
    fn cells_to_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("abc".into())), "abc");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Float(1234567890.0)), "1234567890");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = XlsxStore::open(dir.path().join("fatture.xlsx")).unwrap();
        assert!(store.rows(Sheet::Invoices).unwrap().is_empty());
    }
}
