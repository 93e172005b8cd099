use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{PredictorError, Result};

/// Categories seen for one column at fit time, sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Fit-time state of the one-hot encoder. Persisted verbatim and reused at serving time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSchema {
    pub columns: Vec<EncodedColumn>,
}

impl EncodingSchema {
    /// Indicator column names, `"<column>_<category>"`, in encoding order.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|col| {
                col.categories
                    .iter()
                    .map(move |cat| indicator_name(&col.name, cat))
            })
            .collect()
    }

    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum()
    }

    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.categories.as_slice())
    }

    /// Whether `value` was seen for `column` at fit time.
    pub fn contains(&self, column: &str, value: &str) -> bool {
        self.categories(column)
            .is_some_and(|cats| cats.iter().any(|c| c == value))
    }

    /// Whether `feature` names an indicator column of one of the encoded columns,
    /// whether or not that particular category was seen at fit time.
    pub fn is_indicator(&self, feature: &str) -> bool {
        self.columns.iter().any(|c| {
            feature
                .strip_prefix(c.name.as_str())
                .is_some_and(|rest| rest.starts_with('_'))
        })
    }
}

pub fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}

/// Indicator values for one row, plus the values the schema did not know.
#[derive(Debug)]
pub struct EncodedRow {
    pub columns: Vec<(String, f64)>,
    pub unknown: Vec<PredictorError>,
}

/// One-hot encoder over a fixed list of categorical columns.
pub struct FeatureEncoder {
    columns: Vec<String>,
}

impl FeatureEncoder {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Learn the category set of every configured column. Each row holds one
    /// value per column, in configuration order.
    pub fn fit<S: AsRef<str>>(&self, rows: &[Vec<S>]) -> Result<EncodingSchema> {
        if rows.is_empty() {
            return Err(PredictorError::Data(
                "cannot fit encoder on an empty table".to_string(),
            ));
        }

        let mut seen: Vec<BTreeSet<String>> = vec![BTreeSet::new(); self.columns.len()];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(PredictorError::InvalidInput(format!(
                    "row {} has {} categorical values, expected {}",
                    i,
                    row.len(),
                    self.columns.len()
                )));
            }
            for (set, value) in seen.iter_mut().zip(row) {
                set.insert(value.as_ref().to_string());
            }
        }

        let columns = self
            .columns
            .iter()
            .zip(seen)
            .map(|(name, set)| EncodedColumn {
                name: name.clone(),
                categories: set.into_iter().collect(),
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Fitted encoder over {} columns ({} indicator columns)",
            columns.len(),
            columns.iter().map(|c| c.categories.len()).sum::<usize>()
        );

        Ok(EncodingSchema { columns })
    }

    /// Encode one row against a fitted schema. Output has exactly one column per
    /// schema category. A value the schema never saw yields an all-zero block for
    /// its column and is reported in `unknown` instead of failing.
    pub fn transform<S: AsRef<str>>(values: &[S], schema: &EncodingSchema) -> Result<EncodedRow> {
        if values.len() != schema.columns.len() {
            return Err(PredictorError::InvalidInput(format!(
                "got {} categorical values, schema has {} columns",
                values.len(),
                schema.columns.len()
            )));
        }

        let mut columns = Vec::with_capacity(schema.width());
        let mut unknown = Vec::new();

        for (col, value) in schema.columns.iter().zip(values) {
            let value = value.as_ref();
            let mut matched = false;
            for cat in &col.categories {
                let hit = cat == value;
                matched |= hit;
                columns.push((indicator_name(&col.name, cat), if hit { 1.0 } else { 0.0 }));
            }
            if !matched {
                let err = PredictorError::UnknownCategory {
                    column: col.name.clone(),
                    value: value.to_string(),
                };
                tracing::warn!("{}", err);
                unknown.push(err);
            }
        }

        Ok(EncodedRow { columns, unknown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> EncodingSchema {
        let encoder = FeatureEncoder::new(&["Visitor Team", "Home Team"]);
        encoder
            .fit(&[
                vec!["Dallas Stars", "Boston Bruins"],
                vec!["Boston Bruins", "Dallas Stars"],
                vec!["Anaheim Ducks", "Boston Bruins"],
            ])
            .unwrap()
    }

    #[test]
    fn test_fit_sorts_categories_per_column() {
        let schema = fitted();
        assert_eq!(
            schema.categories("Visitor Team").unwrap(),
            &["Anaheim Ducks", "Boston Bruins", "Dallas Stars"]
        );
        assert_eq!(
            schema.categories("Home Team").unwrap(),
            &["Boston Bruins", "Dallas Stars"]
        );
        assert_eq!(schema.width(), 5);
        assert_eq!(schema.feature_names()[0], "Visitor Team_Anaheim Ducks");
        assert_eq!(schema.feature_names()[3], "Home Team_Boston Bruins");
    }

    #[test]
    fn test_transform_sets_single_indicator_per_column() {
        let schema = fitted();
        let row = FeatureEncoder::transform(&["Boston Bruins", "Dallas Stars"], &schema).unwrap();
        let values: Vec<f64> = row.columns.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0.0, 1.0, 0.0, 0.0, 1.0]);
        assert!(row.unknown.is_empty());
        let names: Vec<String> = row.columns.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, schema.feature_names());
    }

    #[test]
    fn test_unknown_category_yields_zero_block() {
        let schema = fitted();
        let row = FeatureEncoder::transform(&["Seattle Kraken", "Boston Bruins"], &schema).unwrap();
        let values: Vec<f64> = row.columns.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(row.unknown.len(), 1);
        assert!(matches!(
            &row.unknown[0],
            PredictorError::UnknownCategory { column, value }
                if column == "Visitor Team" && value == "Seattle Kraken"
        ));
    }

    #[test]
    fn test_transform_rejects_wrong_arity() {
        let schema = fitted();
        assert!(FeatureEncoder::transform(&["Boston Bruins"], &schema).is_err());
    }

    #[test]
    fn test_is_indicator() {
        let schema = fitted();
        assert!(schema.is_indicator("Home Team_Seattle Kraken"));
        assert!(!schema.is_indicator("Home_Goals_Avg"));
        assert!(!schema.is_indicator("Goal Difference"));
    }

    #[test]
    fn test_contains_only_fitted_categories() {
        let schema = fitted();
        assert!(schema.contains("Visitor Team", "Dallas Stars"));
        assert!(!schema.contains("Home Team", "Anaheim Ducks"));
        assert!(!schema.contains("Visitor Team", "Seattle Kraken"));
        assert!(!schema.contains("Arena", "Dallas Stars"));
        // Still a well-formed indicator name, so reconcile would zero-fill it
        assert!(schema.is_indicator(&indicator_name("Visitor Team", "Seattle Kraken")));
    }

    #[test]
    fn test_fit_empty_table_fails() {
        let encoder = FeatureEncoder::new(&["Visitor Team"]);
        let rows: Vec<Vec<&str>> = Vec::new();
        assert!(encoder.fit(&rows).is_err());
    }

    #[test]
    fn test_schema_survives_json() {
        let schema = fitted();
        let json = serde_json::to_string(&schema).unwrap();
        let back: EncodingSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
