//! Reader for the credit-card clients training table (CSV or TSV).
//!
//! The table must carry exactly the 23 feature columns of `Schema::Full`
//! plus the label column. An `ID` column is tolerated and ignored. The
//! spreadsheet export of the table has an extra `X1..X23, Y` banner row
//! above the real header; it is skipped when present.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::LabeledDataset;
use crate::error::PipelineError;
use crate::schema::{decode_category, FieldKind, Record, Schema, Value, LABEL_COLUMN};

const ID_COLUMN: &str = "ID";

/// Configuration for reading the training table.
#[derive(Debug, Clone)]
pub struct TableReaderConfig {
    /// Map the integer category codes of SEX, EDUCATION and MARRIAGE to the
    /// labels used by the interactive form. When false the raw cell text is
    /// used as the category.
    pub decode_codes: bool,
}

impl Default for TableReaderConfig {
    fn default() -> Self {
        Self { decode_codes: true }
    }
}

enum Column {
    Ignored,
    Label,
    Feature(usize),
}

/// Read a labelled dataset from `path`. Files ending in `.tsv` are tab
/// separated, everything else is read as comma separated.
pub fn read_training_table<P: AsRef<Path>>(
    path: P,
    config: &TableReaderConfig,
) -> Result<LabeledDataset> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open training table: {}", path.display()))?;

    let mut rows = reader.records();
    let mut header = rows
        .next()
        .ok_or_else(|| anyhow!("Training table {} is empty", path.display()))?
        .context("Failed to read header row")?;
    let mut header_line = 1;
    if find_column(&header, LABEL_COLUMN).is_none() && is_banner_row(&header) {
        header = rows
            .next()
            .ok_or_else(|| anyhow!("Training table {} has no header row", path.display()))?
            .context("Failed to read header row")?;
        header_line = 2;
    }

    let columns = resolve_columns(&header)?;
    let fields = Schema::Full.fields();

    let mut records = Vec::new();
    let mut labels = Vec::new();
    for (offset, result) in rows.enumerate() {
        let line = header_line + offset + 1;
        let row = result.with_context(|| format!("Failed to read row {}", line))?;
        if row.len() != columns.len() {
            return Err(anyhow!(
                "Row {} has {} cells but the header has {}",
                line,
                row.len(),
                columns.len()
            ));
        }

        let mut record = Record::new();
        for (cell, column) in row.iter().zip(&columns) {
            let cell = cell.trim();
            match column {
                Column::Ignored => {}
                Column::Label => {
                    let value = cell
                        .parse::<i64>()
                        .with_context(|| format!("Invalid label '{}' at row {}", cell, line))?;
                    if value != 0 && value != 1 {
                        return Err(PipelineError::InvalidLabel {
                            index: labels.len(),
                            value,
                        }
                        .into());
                    }
                    labels.push(value as u8);
                }
                Column::Feature(idx) => {
                    let spec = &fields[*idx];
                    let value = match spec.kind {
                        FieldKind::Numeric => Value::Number(parse_number(cell).with_context(
                            || format!("Invalid value '{}' for {} at row {}", cell, spec.name, line),
                        )?),
                        FieldKind::Categorical if config.decode_codes => {
                            Value::Category(decode_cell(spec.name, cell).with_context(|| {
                                format!("Invalid category for {} at row {}", spec.name, line)
                            })?)
                        }
                        FieldKind::Categorical => Value::Category(cell.to_string()),
                    };
                    record.insert(spec.name, value);
                }
            }
        }
        records.push(record);
    }

    log::info!(
        "Read {} records from {}",
        records.len(),
        path.display()
    );
    Ok(LabeledDataset::new(records, labels)?)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn is_banner_row(row: &StringRecord) -> bool {
    row.iter().any(|cell| cell.trim() == "X1")
}

fn resolve_columns(header: &StringRecord) -> Result<Vec<Column>> {
    let fields = Schema::Full.fields();
    let mut seen = vec![false; fields.len()];
    let mut has_label = false;
    let mut columns = Vec::with_capacity(header.len());

    for name in header.iter().map(str::trim) {
        let column = if name.eq_ignore_ascii_case(ID_COLUMN) {
            Column::Ignored
        } else if name.eq_ignore_ascii_case(LABEL_COLUMN) {
            if has_label {
                return Err(PipelineError::schema(name, "duplicate column").into());
            }
            has_label = true;
            Column::Label
        } else {
            let idx = fields
                .iter()
                .position(|spec| spec.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| PipelineError::schema(name, "unexpected column in training table"))?;
            if seen[idx] {
                return Err(PipelineError::schema(name, "duplicate column").into());
            }
            seen[idx] = true;
            Column::Feature(idx)
        };
        columns.push(column);
    }

    if !has_label {
        return Err(PipelineError::schema(LABEL_COLUMN, "label column missing from training table").into());
    }
    if let Some(idx) = seen.iter().position(|&present| !present) {
        return Err(PipelineError::schema(fields[idx].name, "missing from training table").into());
    }
    Ok(columns)
}

fn parse_number(cell: &str) -> Result<f64> {
    let value = cell.parse::<f64>()?;
    if !value.is_finite() {
        return Err(anyhow!("non-finite number"));
    }
    Ok(value)
}

fn decode_cell(field: &str, cell: &str) -> Result<String> {
    let code = cell
        .parse::<i64>()
        .map_err(|_| PipelineError::unknown_category(field, cell))?;
    decode_category(field, code)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::unknown_category(field, cell).into())
}
