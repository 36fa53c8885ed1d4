use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::error::DataError;
use super::table::{ColumnTable, InstrTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an instrument table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat numeric columns, schema metadata as parameters
/// * `.json`    – `{ "params": {...}, "columns": [{ "name": .., "values": [..] }] }`
/// * `.csv`     – header row with column names, numeric records
/// * anything else – whitespace-separated column text with `#` comments
pub fn load_table(path: &Path) -> Result<ColumnTable, DataError> {
    if !path.is_file() {
        return Err(DataError::LoadFailure(format!(
            "{} is not a readable file",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        _ => load_text(path)?,
    };
    debug!(
        "loaded {} column(s) x {} row(s) from {}",
        table.col_names().len(),
        table.num_rows(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Text loader
// ---------------------------------------------------------------------------

/// Column text layout:
///
/// ```text
/// # scan_vars: QH
/// # count_var: CNTS
/// # polarization: p1=1 i11=1; p1=-1 i10=1
///   QH     EN   CNTS    M1
///   1.0    2.5   132   5000
///   1.0    2.5    12   5000
/// ```
///
/// `# key: value` comments become parameters. The first non-comment line
/// that does not start with a number names the columns; without it the
/// columns are called `col1`, `col2`, ...
fn load_text(path: &Path) -> Result<ColumnTable, DataError> {
    let file = std::fs::File::open(path)?;
    read_text(std::io::BufReader::new(file))
}

pub fn read_text<R: BufRead>(reader: R) -> Result<ColumnTable, DataError> {
    let mut params = BTreeMap::new();
    let mut names: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some((key, value)) = comment.split_once(':') {
                params.insert(key.trim().to_string(), value.trim().to_string());
            }
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if names.is_none() && rows.is_empty() && tokens[0].parse::<f64>().is_err() {
            names = Some(tokens.iter().map(|t| t.to_string()).collect());
            continue;
        }

        let row = tokens
            .iter()
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| DataError::parse(line_no, format!("'{tok}' is not a number")))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let expected = names
            .as_ref()
            .map(Vec::len)
            .or_else(|| rows.first().map(Vec::len))
            .unwrap_or(row.len());
        if row.len() != expected {
            return Err(DataError::parse(
                line_no,
                format!("expected {expected} values, found {}", row.len()),
            ));
        }
        rows.push(row);
    }

    let names = match names {
        Some(names) => names,
        None => default_names(rows.first().map_or(0, Vec::len)),
    };

    let mut table = ColumnTable::from_rows(names, &rows);
    table.params = params;
    Ok(table)
}

fn default_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("col{i}")).collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonTable {
    #[serde(default)]
    params: BTreeMap<String, String>,
    columns: Vec<JsonColumn>,
}

#[derive(Debug, Deserialize)]
struct JsonColumn {
    name: String,
    values: Vec<f64>,
}

/// Expected JSON schema (column-oriented, order preserved):
///
/// ```json
/// {
///   "params": { "scan_vars": "QH", "count_var": "CNTS" },
///   "columns": [
///     { "name": "QH",   "values": [1.0, 1.1, 1.2] },
///     { "name": "CNTS", "values": [10, 42, 17] }
///   ]
/// }
/// ```
fn load_json(path: &Path) -> Result<ColumnTable, DataError> {
    let text = std::fs::read_to_string(path)?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<ColumnTable, DataError> {
    let root: JsonTable = serde_json::from_str(text)?;

    let n_rows = root.columns.first().map_or(0, |c| c.values.len());
    if let Some(bad) = root.columns.iter().find(|c| c.values.len() != n_rows) {
        return Err(DataError::LoadFailure(format!(
            "column '{}' has {} values, expected {n_rows}",
            bad.name,
            bad.values.len()
        )));
    }

    let (names, columns): (Vec<String>, Vec<Vec<f64>>) = root
        .columns
        .into_iter()
        .map(|c| (c.name, c.values))
        .unzip();
    let mut table = ColumnTable::new(names, columns);
    table.params = root.params;
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every record numeric.
fn load_csv(path: &Path) -> Result<ColumnTable, DataError> {
    let reader = csv::Reader::from_path(path)?;
    read_csv(reader)
}

pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<ColumnTable, DataError> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        let line_no = row_no + 2;

        let row = record
            .iter()
            .map(|tok| {
                tok.trim()
                    .parse::<f64>()
                    .map_err(|_| DataError::parse(line_no, format!("'{tok}' is not a number")))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    Ok(ColumnTable::from_rows(headers, &rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one numeric column per instrument variable.
///
/// Non-numeric columns are ignored; the Arrow schema metadata provides the
/// header parameters (`scan_vars`, `count_var`, ...).
fn load_parquet(path: &Path) -> Result<ColumnTable, DataError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    let params: BTreeMap<String, String> = schema
        .metadata()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let numeric: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| is_numeric(f.data_type()))
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    let reader = builder.build()?;
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); numeric.len()];

    for batch_result in reader {
        let batch = batch_result?;
        for ((col_idx, _), out) in numeric.iter().zip(columns.iter_mut()) {
            extend_f64(batch.column(*col_idx), out)?;
        }
    }

    let names = numeric.into_iter().map(|(_, name)| name).collect();
    let mut table = ColumnTable::new(names, columns);
    table.params = params;
    Ok(table)
}

// -- Parquet / Arrow helpers --

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Append a numeric Arrow column to `out`, nulls become NaN.
fn extend_f64(col: &Arc<dyn Array>, out: &mut Vec<f64>) -> Result<(), DataError> {
    let any = col.as_any();
    if let Some(arr) = any.downcast_ref::<Float64Array>() {
        out.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
    } else if let Some(arr) = any.downcast_ref::<Int64Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)));
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
    } else {
        return Err(DataError::LoadFailure(format!(
            "unsupported column type {:?}",
            col.data_type()
        )));
    }
    Ok(())
}
