//! Tabular input and output.
//!
//! Every cell is kept as text so values pass through to the output unchanged.

use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::NaiveTime;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open spreadsheet {}: {source}", .path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {} has no worksheets", .path.display())]
    NoWorksheet { path: PathBuf },

    #[error("row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Input file format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Spreadsheet,
}

impl Format {
    /// `.csv` (any case) is CSV; anything else is treated as a spreadsheet.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Spreadsheet,
        }
    }
}

/// A header row plus data rows, all of the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    found: row.len(),
                    expected: headers.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Overwrite the first column named `name`, or append it when absent.
    /// `values` must hold one entry per row.
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Read a CSV or spreadsheet file, dispatching on its extension.
    pub fn read_path(path: &Path) -> Result<Self, TableError> {
        match Format::from_path(path) {
            Format::Csv => {
                let file = std::fs::File::open(path).map_err(|source| TableError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_csv_reader(file)
            }
            Format::Spreadsheet => Self::from_spreadsheet(path),
        }
    }

    /// Parse CSV with a mandatory header row. Rows with a different width are an error.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(String::from).collect());
        }
        Self::new(headers, rows)
    }

    /// Read the first worksheet; its first row is the header.
    pub fn from_spreadsheet(path: &Path) -> Result<Self, TableError> {
        let spreadsheet_err = |source: calamine::Error| TableError::Spreadsheet {
            path: path.to_path_buf(),
            source,
        };
        let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TableError::NoWorksheet {
                path: path.to_path_buf(),
            })?
            .map_err(spreadsheet_err)?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(cell_text).collect(),
            None => return Ok(Self::default()),
        };
        let body: Vec<Vec<String>> = rows
            .map(|row| {
                let mut cells: Vec<String> = row.iter().map(cell_text).collect();
                cells.resize(headers.len(), String::new());
                cells
            })
            .collect();
        Self::new(headers, body)
    }

    /// Write as UTF-8 CSV with a header row and no index column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_path(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path).map_err(|source| TableError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Render a spreadsheet cell as text. Integral floats print without a fraction.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(value) => datetime_text(value),
        other => other.to_string(),
    }
}

/// Render a date, time or duration cell the way the sheet displays it, not as
/// its serial number.
fn datetime_text(value: &ExcelDateTime) -> String {
    if value.is_duration() {
        if let Some(duration) = value.as_duration() {
            let secs = duration.num_seconds();
            let sign = if secs < 0 { "-" } else { "" };
            let secs = secs.abs();
            return format!("{sign}{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
        }
    } else if let Some(datetime) = value.as_datetime() {
        // Serials below one day carry no date part
        if (0.0..1.0).contains(&value.as_f64()) {
            return datetime.format("%H:%M:%S").to_string();
        }
        if datetime.time() == NaiveTime::MIN {
            return datetime.format("%Y-%m-%d").to_string();
        }
        return datetime.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    value.as_f64().to_string()
}
