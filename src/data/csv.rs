//! CSV ingestion for labeled datasets.
//!
//! Supported format:
//! - UTF-8, comma-separated
//! - Mandatory header row; its cell count fixes the column count
//! - Double-quoted fields with embedded commas are handled correctly
//! - The last column is the raw label, every other column is numeric
use std::io::BufRead;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parses CSV text into `(inputs, labels)`.
///
/// # Arguments
/// - `reader`:              source of UTF-8 CSV lines
/// - `selected_attributes`: optional input column indices to keep, in order
///
/// Rows are returned as parsed; filtering of non-finite values happens when
/// the rows are ingested into a `Dataset`.
pub fn read_csv<R: BufRead>(
    reader: R,
    selected_attributes: Option<&[usize]>,
) -> Result<(Vec<Vec<f64>>, Vec<String>)> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok((Vec::new(), Vec::new())),
    };
    let num_cols = parse_csv_row(&header).len();
    if num_cols < 2 {
        return Err(Error::MalformedInput(format!(
            "expected at least 2 columns (features + label), header has {num_cols}"
        )));
    }
    if let Some(selected) = selected_attributes {
        if let Some(&bad) = selected.iter().find(|&&i| i >= num_cols - 1) {
            return Err(Error::MalformedInput(format!(
                "selected attribute {bad} is out of range for {} input columns",
                num_cols - 1
            )));
        }
    }

    let mut inputs: Vec<Vec<f64>> = Vec::new();
    let mut labels: Vec<String> = Vec::new();

    for (row_idx, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // header is line 1
        let row_num = row_idx + 2;

        let cells = parse_csv_row(line);
        if cells.len() != num_cols {
            return Err(Error::MalformedInput(format!(
                "Row {row_num}: unequal number of columns ({} instead of {num_cols})",
                cells.len()
            )));
        }

        let feature_cells = &cells[..num_cols - 1];
        let feats = match selected_attributes {
            Some(selected) => {
                let picked: Vec<String> = selected.iter().map(|&i| feature_cells[i].clone()).collect();
                parse_floats(&picked, row_num)?
            }
            None => parse_floats(feature_cells, row_num)?,
        };

        inputs.push(feats);
        labels.push(cells[num_cols - 1].trim().to_owned());
    }

    Ok((inputs, labels))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Parses a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                    // Escaped quote inside quoted field.
                    current.push('"');
                    i += 2;
                    continue;
                }
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
        i += 1;
    }
    fields.push(current);
    fields
}

/// Parses a slice of string cells as `f64`, returning an error with row info on failure.
fn parse_floats(cells: &[String], row_num: usize) -> Result<Vec<f64>> {
    cells.iter()
        .map(|c| {
            c.trim().parse::<f64>().map_err(|_| {
                Error::MalformedInput(format!("Row {row_num}: '{c}' is not a valid number"))
            })
        })
        .collect()
}
