use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{PredictorError, Result};

/// Below this a fit-time standard deviation counts as zero.
const STD_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaling {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation; 1.0 when the column is degenerate
    pub std: f64,
    pub degenerate: bool,
}

/// Per-column (mean, std) fixed at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    pub columns: Vec<ColumnScaling>,
}

impl ScalingParameters {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnScaling> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// One `DegenerateColumn` warning per zero-variance column.
    pub fn degenerate_columns(&self) -> Vec<PredictorError> {
        self.columns
            .iter()
            .filter(|c| c.degenerate)
            .map(|c| PredictorError::DegenerateColumn {
                column: c.name.clone(),
            })
            .collect()
    }
}

/// Standardizes numeric columns as `(value - mean) / std`.
pub struct FeatureScaler;

impl FeatureScaler {
    /// Fit mean and population standard deviation per named column. A column with
    /// zero variance gets `std = 1.0`, so it is only centred, and is flagged.
    pub fn fit(columns: &[(&str, &[f64])]) -> Result<ScalingParameters> {
        let mut fitted = Vec::with_capacity(columns.len());

        for (name, values) in columns {
            if values.is_empty() {
                return Err(PredictorError::Data(format!(
                    "cannot fit scaler on empty column '{}'",
                    name
                )));
            }
            let mean = values.iter().mean();
            let std = values.iter().population_std_dev();
            let degenerate = !(std > STD_EPSILON);
            if degenerate {
                tracing::warn!(
                    "{}",
                    PredictorError::DegenerateColumn {
                        column: name.to_string()
                    }
                );
            }
            fitted.push(ColumnScaling {
                name: name.to_string(),
                mean,
                std: if degenerate { 1.0 } else { std },
                degenerate,
            });
        }

        Ok(ScalingParameters { columns: fitted })
    }

    /// Scale one row whose values follow the parameter column order.
    pub fn transform(values: &[f64], params: &ScalingParameters) -> Result<Vec<f64>> {
        check_width(values, params)?;
        Ok(values
            .iter()
            .zip(&params.columns)
            .map(|(v, c)| (v - c.mean) / c.std)
            .collect())
    }

    pub fn inverse_transform(scaled: &[f64], params: &ScalingParameters) -> Result<Vec<f64>> {
        check_width(scaled, params)?;
        Ok(scaled
            .iter()
            .zip(&params.columns)
            .map(|(v, c)| v * c.std + c.mean)
            .collect())
    }
}

fn check_width(values: &[f64], params: &ScalingParameters) -> Result<()> {
    if values.len() != params.columns.len() {
        return Err(PredictorError::InvalidInput(format!(
            "got {} values, scaler was fit on {} columns",
            values.len(),
            params.columns.len()
        )));
    }
    Ok(())
}
