//! Per-column standardisation: `(x - mean) / scale`.

use credit_core::error::ModelError;

/// Fitted mean and scale for each predictor column.
///
/// `scale` is the population standard deviation; columns with zero (or
/// non-finite) spread get a scale of `1.0` so they transform to a constant.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major `rows`. All rows must share the first row's width.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let Some(first) = rows.first() else {
            return Err(ModelError::EmptyTrainingSet);
        };
        let width = first.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *s += d * d;
            }
        }

        let scale = var
            .into_iter()
            .map(|s| {
                let sd = (s / n).sqrt();
                if sd.is_finite() && sd > f64::EPSILON { sd } else { 1.0 }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Number of columns this scaler was fitted on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Structural check used when loading a persisted scaler.
    pub(crate) fn validate(&self, width: usize) -> Result<(), String> {
        if self.mean.len() != width || self.scale.len() != width {
            return Err(format!(
                "scaler has {}/{} parameters for {} columns",
                self.mean.len(),
                self.scale.len(),
                width
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scaler has a non-positive scale".into());
        }
        Ok(())
    }
}
