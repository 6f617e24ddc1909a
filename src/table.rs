//! Loader for the `indicadores` sheet.
//!
//! The workbook is read directly (`.xlsx`, `.xlsm`, `.xls`, `.ods`) or, as an
//! alternative, a delimited-text export of the same sheet. Both produce the
//! same [`SourceTable`] of raw text cells.

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::{Cursor, Read};
use std::num::ParseFloatError;
use tracing::debug;

pub const TOPIC_COLUMN: &str = "Topico";
pub const INDICATOR_COLUMN: &str = "Indicador";
pub const CATEGORY_COLUMN: &str = "Abertura";
pub const DEFAULT_SHEET: &str = "indicadores";

/// How the source bytes are encoded, decided from the source's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Delimited,
}

impl SourceFormat {
    /// `.csv`, `.tsv` and `.txt` are delimited text; everything else is a workbook.
    pub fn from_source(source: &str) -> Self {
        let path = source.split(['?', '#']).next().unwrap_or(source);
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => SourceFormat::Delimited,
            _ => SourceFormat::Workbook,
        }
    }
}

/// The source table: header row plus every data row, kept as raw cells.
#[derive(Debug, Clone)]
pub struct SourceTable {
    headers: Vec<String>,
    records: Vec<StringRecord>,
    topic_idx: usize,
    indicator_idx: usize,
    category_idx: usize,
    decimal: char,
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a SourceTable,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    fn field(&self, idx: usize) -> &'a str {
        self.record.get(idx).unwrap_or("")
    }

    pub fn topic(&self) -> &'a str {
        self.field(self.table.topic_idx)
    }

    pub fn indicator(&self) -> &'a str {
        self.field(self.table.indicator_idx)
    }

    pub fn category(&self) -> &'a str {
        self.field(self.table.category_idx)
    }

    /// Raw cell at column `idx`, empty when the row is short.
    pub fn cell(&self, idx: usize) -> &'a str {
        self.field(idx)
    }

    /// Numeric value at column `idx`.
    ///
    /// Blank cells and non-finite values (`NaN`, `inf`) are missing and read
    /// as `None`. The table's decimal separator is honoured.
    pub fn number(&self, idx: usize) -> Result<Option<f64>, ParseFloatError> {
        let raw = self.field(idx).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let value = if self.table.decimal == '.' {
            raw.parse::<f64>()?
        } else {
            raw.replace(self.table.decimal, ".").parse::<f64>()?
        };
        Ok(value.is_finite().then_some(value))
    }
}

impl SourceTable {
    fn from_parts(headers: Vec<String>, records: Vec<StringRecord>) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("source table has no '{name}' column"))
        };
        let topic_idx = position(TOPIC_COLUMN)?;
        let indicator_idx = position(INDICATOR_COLUMN)?;
        let category_idx = position(CATEGORY_COLUMN)?;

        debug!(
            columns = headers.len(),
            rows = records.len(),
            "Source table loaded"
        );

        Ok(Self {
            headers,
            records,
            topic_idx,
            indicator_idx,
            category_idx,
            decimal: '.',
        })
    }

    /// Parses a table from `reader` using `delimiter` between fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid delimited data or one of the
    /// `Topico`, `Indicador`, `Abertura` columns is missing.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("reading header row")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("reading data row {}", line + 1))?;
            records.push(record);
        }

        Self::from_parts(headers, records)
    }

    pub fn from_bytes(bytes: &[u8], delimiter: u8) -> Result<Self> {
        Self::from_reader(bytes, delimiter)
    }

    /// Reads worksheet `sheet` of a workbook held in `bytes`.
    ///
    /// The first row is the header. Numbers are rendered with a `.` decimal
    /// point, error cells read as blank.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a workbook, the sheet does not
    /// exist, or a required column is missing.
    pub fn from_workbook(bytes: &[u8], sheet: &str) -> Result<Self> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes)).context("opening workbook")?;
        let range = workbook
            .worksheet_range(sheet)
            .with_context(|| format!("reading worksheet '{sheet}'"))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| anyhow!("worksheet '{sheet}' is empty"))?
            .iter()
            .map(|cell| cell_text(cell).trim().to_string())
            .collect();

        let records = rows
            .map(|row| {
                row.iter()
                    .map(|cell| cell_text(cell).trim().to_string())
                    .collect::<StringRecord>()
            })
            .collect();

        Self::from_parts(headers, records)
    }

    /// Loads `bytes` in the given format: `delimiter` applies to text,
    /// `sheet` to workbooks.
    pub fn load(bytes: &[u8], format: SourceFormat, delimiter: u8, sheet: &str) -> Result<Self> {
        match format {
            SourceFormat::Workbook => Self::from_workbook(bytes, sheet),
            SourceFormat::Delimited => Self::from_bytes(bytes, delimiter),
        }
    }

    /// Reads numeric cells with `decimal` as the decimal separator.
    pub fn with_decimal(mut self, decimal: char) -> Self {
        self.decimal = decimal;
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(move |record| Row {
            table: self,
            record,
        })
    }

    /// Distinct non-blank topics, in order of first appearance.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = Vec::new();
        for row in self.rows() {
            let topic = row.topic();
            if !topic.is_empty() && !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        topics
    }

    /// Distinct non-blank indicators under `topic`, in order of first appearance.
    pub fn indicators(&self, topic: &str) -> Vec<&str> {
        let mut indicators: Vec<&str> = Vec::new();
        for row in self.rows().filter(|r| r.topic() == topic) {
            let indicator = row.indicator();
            if !indicator.is_empty() && !indicators.contains(&indicator) {
                indicators.push(indicator);
            }
        }
        indicators
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
