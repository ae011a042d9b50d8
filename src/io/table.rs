use anyhow::{bail, Context, Result};
use csv::{ByteRecord, StringRecord};
use itertools::Itertools;
use log::warn;
use std::io::{Read, Write};
use std::path::Path;

use crate::ms::report::MassReport;
use crate::ms::utils::round_to_decimals;

pub const PARSED_FORMULA_COLUMN: &str = "Parsed Formula";
pub const NEUTRAL_MASS_COLUMN: &str = "Neutral Mass (M)";
pub const AVERAGE_MASS_COLUMN: &str = "Average Mass";
pub const STATUS_COLUMN: &str = "Status";

/// Input rows with the column holding the formulas.
#[derive(Clone, Debug)]
pub struct FormulaTable {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    column_idx: usize,
}

impl FormulaTable {
    pub fn from_csv_reader<R: Read>(reader: R, column: &str) -> Result<FormulaTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = decode_record(csv_reader.byte_headers()?).0;
        let column_idx = match headers.iter().position(|h| h == column) {
            Some(idx) => idx,
            None => match headers.iter().position(|h| h.trim().eq_ignore_ascii_case(column.trim())) {
                Some(idx) => idx,
                None => bail!(
                    "column '{}' not found, available columns: {}",
                    column, headers.iter().map(|h| format!("'{}'", h)).join(", ")
                ),
            },
        };

        let mut records = Vec::new();
        for (record_idx, record_res) in csv_reader.byte_records().enumerate() {
            let record = record_res.with_context(|| format!("invalid CSV row {}", record_idx + 1))?;
            let (record, lossy) = decode_record(&record);
            if lossy {
                warn!("CSV row {} is not valid UTF-8, undecodable bytes were replaced", record_idx + 1);
            }
            records.push(record);
        }

        Ok(FormulaTable { headers, records, column_idx })
    }

    pub fn from_csv_path(path: impl AsRef<Path>, column: &str) -> Result<FormulaTable> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).with_context(|| format!("can't open {}", path.display()))?;
        FormulaTable::from_csv_reader(file, column)
            .with_context(|| format!("can't read formula table {}", path.display()))
    }

    /// A single-column table, for plain formula lists.
    pub fn from_formulas(header: &str, formulas: Vec<String>) -> FormulaTable {
        FormulaTable {
            headers: StringRecord::from(vec![header]),
            records: formulas.into_iter().map(|f| StringRecord::from(vec![f])).collect(),
            column_idx: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The formula cell of every row; short rows yield an empty cell.
    pub fn formulas(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.get(self.column_idx).unwrap_or("")).collect()
    }

    /// Writes the input columns followed by the computed columns, one line per row.
    pub fn write_with_reports<W: Write>(&self, writer: W, reports: &[MassReport], layout: &ReportLayout) -> Result<()> {
        if reports.len() != self.records.len() {
            bail!("got {} reports for {} rows", reports.len(), self.records.len())
        }

        let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

        let mut header: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        header.extend(layout.result_headers());
        csv_writer.write_record(&header)?;

        let n_input_cols = self.headers.len();
        for (record, report) in self.records.iter().zip(reports) {
            let mut row: Vec<String> = (0..n_input_cols).map(|i| record.get(i).unwrap_or("").to_string()).collect();
            row.extend(layout.result_cells(report));
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

// Cells that are not valid UTF-8 (e.g. GBK spreadsheet exports) are decoded lossily
fn decode_record(record: &ByteRecord) -> (StringRecord, bool) {
    let mut lossy = false;
    let fields: Vec<String> = record
        .iter()
        .map(|field| match std::str::from_utf8(field) {
            Ok(text) => text.to_string(),
            Err(_) => {
                lossy = true;
                String::from_utf8_lossy(field).into_owned()
            }
        })
        .collect();
    (StringRecord::from(fields), lossy)
}

/// Which computed columns appear in the output and how numbers are rounded.
#[derive(Clone, Debug)]
pub struct ReportLayout {
    pub adduct_labels: Vec<String>,
    pub with_average: bool,
    pub decimals: u32,
}

impl ReportLayout {
    pub fn result_headers(&self) -> Vec<String> {
        let mut headers = vec![PARSED_FORMULA_COLUMN.to_string(), NEUTRAL_MASS_COLUMN.to_string()];
        if self.with_average {
            headers.push(AVERAGE_MASS_COLUMN.to_string());
        }
        headers.extend(self.adduct_labels.iter().cloned());
        headers.push(STATUS_COLUMN.to_string());
        headers
    }

    pub fn result_cells(&self, report: &MassReport) -> Vec<String> {
        let mut cells = vec![
            report.formula.clone().unwrap_or_default(),
            self.format_mass(report.neutral_mass),
        ];
        if self.with_average {
            cells.push(self.format_mass(report.average_mass));
        }
        for label in self.adduct_labels.iter() {
            cells.push(self.format_mass(report.adduct_mz(label)));
        }
        cells.push(report.status.to_string());
        cells
    }

    pub fn format_mass(&self, mass: Option<f64>) -> String {
        match mass {
            Some(m) => format!("{:.*}", self.decimals as usize, round_to_decimals(m, self.decimals)),
            None => String::new(),
        }
    }
}
