//! Per-column standardization fitted on the training partition.

use serde::{Deserialize, Serialize};

/// Standardizing scaler: `(x - mean) / scale` per column.
///
/// `scale` is the population standard deviation; constant columns keep a scale
/// of `1.0` so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations over `rows`.
    pub fn fit(rows: &[Vec<f32>], width: usize) -> Self {
        let mut mean = vec![0.0f64; width];
        for row in rows {
            for (j, slot) in mean.iter_mut().enumerate() {
                *slot += row.get(j).copied().unwrap_or(0.0) as f64;
            }
        }
        let n = rows.len().max(1) as f64;
        for v in &mut mean {
            *v /= n;
        }

        let mut var = vec![0.0f64; width];
        for row in rows {
            for (j, slot) in var.iter_mut().enumerate() {
                let diff = row.get(j).copied().unwrap_or(0.0) as f64 - mean[j];
                *slot += diff * diff;
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std.is_finite() && std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, scale }
    }

    /// Number of columns the scaler was fitted on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err("scaler mean/scale length mismatch".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scaler scale values must be finite and > 0".to_string());
        }
        Ok(())
    }

    /// Standardize a single row.
    pub fn transform_row(&self, row: &[f32]) -> Vec<f32> {
        self.mean
            .iter()
            .zip(&self.scale)
            .enumerate()
            .map(|(j, (mean, scale))| {
                let value = row.get(j).copied().unwrap_or(0.0) as f64;
                ((value - mean) / scale) as f32
            })
            .collect()
    }

    /// Standardize every row.
    pub fn transform(&self, rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}
