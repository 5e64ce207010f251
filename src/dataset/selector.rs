use tracing::{debug, info, warn};

use super::DatasetError;
use super::csv::CsvTable;
use super::schema::{LABEL_COLUMN, SchemaReport, classify_header};

/// Model inputs drawn from a dataset table.
#[derive(Debug, Clone)]
pub struct FeatureSelection {
    /// Columns used, in matrix order; persisted as the feature contract.
    pub feature_names: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Labels aligned with `x` (`1` = success).
    pub y: Vec<usize>,
    pub report: SchemaReport,
}

impl FeatureSelection {
    /// `(successes, failures)` counts.
    pub fn label_counts(&self) -> (usize, usize) {
        let successes = self.y.iter().filter(|&&label| label == 1).count();
        (successes, self.y.len() - successes)
    }

    /// Require at least `needed` rows of each class.
    pub fn check_class_sizes(&self, needed: usize) -> Result<(), DatasetError> {
        let (successes, failures) = self.label_counts();
        for (class, count) in [("failure", failures), ("success", successes)] {
            if count < needed {
                return Err(DatasetError::TooFewSamples {
                    class,
                    count,
                    needed,
                });
            }
        }
        Ok(())
    }
}

/// Restrict a table to the permitted pre-release columns plus the label.
///
/// Permitted columns absent from the table are skipped with a warning. Missing
/// and infinite cells become `0.0`.
pub fn select_features(table: &CsvTable) -> Result<FeatureSelection, DatasetError> {
    let report = classify_header(&table.headers);
    let label_idx = table
        .column_index(LABEL_COLUMN)
        .ok_or(DatasetError::MissingLabel {
            column: LABEL_COLUMN,
        })?;

    if report.permitted.is_empty() {
        return Err(DatasetError::NoFeatures);
    }
    if !report.missing_permitted.is_empty() {
        warn!(
            "Features not present in dataset: {:?}",
            report.missing_permitted
        );
    }
    if !report.leakage.is_empty() {
        info!("Excluding post-release columns: {:?}", report.leakage);
    }
    if !report.unlisted.is_empty() {
        debug!("Ignoring columns outside the schema: {:?}", report.unlisted);
    }

    let columns: Vec<usize> = report
        .permitted
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    let mut x = Vec::with_capacity(table.rows.len());
    let mut y = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let label_raw = &row[label_idx];
        let label = parse_label(label_raw).ok_or_else(|| DatasetError::InvalidLabel {
            row: row_idx + 1,
            value: label_raw.clone(),
        })?;
        let mut features = Vec::with_capacity(columns.len());
        for &col in &columns {
            let raw = &row[col];
            let value = parse_cell(raw).ok_or_else(|| DatasetError::NonNumeric {
                row: row_idx + 1,
                column: table.headers[col].clone(),
                value: raw.clone(),
            })?;
            features.push(value);
        }
        x.push(features);
        y.push(label);
    }

    info!("Using {} features", report.permitted.len());
    Ok(FeatureSelection {
        feature_names: report.permitted.clone(),
        x,
        y,
        report,
    })
}

/// Class index for a label cell. Blank and NaN labels are not a class.
fn parse_label(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return Some(1),
        "false" => return Some(0),
        _ => {}
    }
    match trimmed.parse::<f64>().ok()? {
        v if v == 0.0 => Some(0),
        v if v == 1.0 => Some(1),
        _ => None,
    }
}

/// Numeric cell value; blanks, NaN and infinities read as `0.0`, booleans as 0/1.
fn parse_cell(raw: &str) -> Option<f32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" | "na" | "null" | "none" => return Some(0.0),
        "true" => return Some(1.0),
        "false" => return Some(0.0),
        _ => {}
    }
    let value = trimmed.parse::<f64>().ok()?;
    let value = value as f32;
    Some(if value.is_finite() { value } else { 0.0 })
}
