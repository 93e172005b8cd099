use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PredictorError, Result};
use crate::models::{ProcessedGame, ROLLING_AVERAGE_COLUMNS};
use crate::services::assembler::FeatureVector;
use crate::services::encoder::{EncodingSchema, FeatureEncoder};
use crate::services::scaler::{FeatureScaler, ScalingParameters};

/// A trained binary classifier. Class 1 is a visitor win.
pub trait Classifier: Send + Sync {
    /// Feature names the model was trained on, in positional order.
    fn feature_schema(&self) -> &[String];

    fn predict(&self, features: &FeatureVector) -> Result<u8>;
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2_penalty: f64,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 2000,
            l2_penalty: 1e-3,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Logistic regression over standardized features. The scaling parameters are
/// part of the model, so callers pass raw feature values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub model_version: String,
    pub feature_names: Vec<String>,
    pub scaling: ScalingParameters,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticModel {
    /// Batch gradient descent on the L2-regularized log loss.
    pub fn fit(
        feature_names: Vec<String>,
        rows: &[Vec<f64>],
        labels: &[u8],
        config: &TrainingConfig,
    ) -> Result<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(PredictorError::Data(format!(
                "cannot train on {} rows with {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let d = feature_names.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != d) {
            return Err(PredictorError::InvalidInput(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                d
            )));
        }

        let columns: Vec<Vec<f64>> = (0..d)
            .map(|j| rows.iter().map(|r| r[j]).collect())
            .collect();
        let named: Vec<(&str, &[f64])> = feature_names
            .iter()
            .zip(&columns)
            .map(|(n, c)| (n.as_str(), c.as_slice()))
            .collect();
        let scaling = FeatureScaler::fit(&named)?;

        let n = rows.len();
        let mut scaled = Vec::with_capacity(n);
        for row in rows {
            scaled.push(FeatureScaler::transform(row, &scaling)?);
        }
        let x = DMatrix::<f64>::from_fn(n, d, |i, j| scaled[i][j]);
        let y = DVector::<f64>::from_iterator(n, labels.iter().map(|&l| f64::from(l)));

        let mut w = DVector::<f64>::zeros(d);
        let mut b = 0.0;
        for _ in 0..config.epochs {
            let p = (&x * &w).map(|z| sigmoid(z + b));
            let err = p - &y;
            let grad_w = x.tr_mul(&err) / n as f64 + &w * config.l2_penalty;
            let grad_b = err.sum() / n as f64;
            w -= grad_w * config.learning_rate;
            b -= grad_b * config.learning_rate;
        }

        Ok(Self {
            model_version: format!("logistic_v1_{}f", d),
            feature_names,
            scaling,
            weights: w.iter().copied().collect(),
            bias: b,
        })
    }

    /// Probability of a visitor win.
    pub fn probability(&self, features: &FeatureVector) -> Result<f64> {
        if features.names() != self.feature_names.as_slice() {
            return Err(PredictorError::SchemaMismatch(format!(
                "model expects {} features in trained order, got {}",
                self.feature_names.len(),
                features.values().len()
            )));
        }
        let scaled = FeatureScaler::transform(features.values(), &self.scaling)?;
        let z = scaled
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.bias;
        Ok(sigmoid(z))
    }
}

impl Classifier for LogisticModel {
    fn feature_schema(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(u8::from(self.probability(features)? >= 0.5))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Training feature schema: the four rolling averages, then every indicator column.
pub fn training_schema(encoder: &EncodingSchema) -> Vec<String> {
    ROLLING_AVERAGE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(encoder.feature_names())
        .collect()
}

/// Feature rows (in `training_schema` order) and labels for processed games.
pub fn training_set(
    games: &[ProcessedGame],
    encoder: &EncodingSchema,
) -> Result<(Vec<Vec<f64>>, Vec<u8>)> {
    let mut rows = Vec::with_capacity(games.len());
    let mut labels = Vec::with_capacity(games.len());
    for game in games {
        let encoded = FeatureEncoder::transform(&[&game.visitor_team, &game.home_team], encoder)?;
        let mut row = game.rolling_averages().to_vec();
        row.extend(encoded.columns.into_iter().map(|(_, v)| v));
        rows.push(row);
        labels.push(game.visitor_won);
    }
    Ok((rows, labels))
}

/// Split indices into (train, test), keeping each class's share in both parts.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0u8, 1u8] {
        let mut idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        idx.shuffle(&mut rng);
        let n_test = (idx.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy, confusion matrix and per-class precision/recall/F1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// `confusion[actual][predicted]`
    pub confusion: [[usize; 2]; 2],
    /// Index 0 is a home win, 1 a visitor win
    pub classes: [ClassMetrics; 2],
}

impl ClassificationReport {
    pub fn from_predictions(actual: &[u8], predicted: &[u8]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            confusion[usize::from(a.min(1))][usize::from(p.min(1))] += 1;
        }
        let total: usize = confusion.iter().flatten().sum();
        let correct = confusion[0][0] + confusion[1][1];

        let class = |c: usize| {
            let tp = confusion[c][c] as f64;
            let predicted_c = (confusion[0][c] + confusion[1][c]) as f64;
            let support = confusion[c][0] + confusion[c][1];
            let precision = ratio(tp, predicted_c);
            let recall = ratio(tp, support as f64);
            ClassMetrics {
                precision,
                recall,
                f1: ratio(2.0 * precision * recall, precision + recall),
                support,
            }
        };

        Self {
            accuracy: ratio(correct as f64, total as f64),
            confusion,
            classes: [class(0), class(1)],
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.2}", self.accuracy)?;
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "[[{} {}]", self.confusion[0][0], self.confusion[0][1])?;
        writeln!(f, " [{} {}]]", self.confusion[1][0], self.confusion[1][1])?;
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for (name, m) in ["home win", "visitor win"].iter().zip(&self.classes) {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<String>, Vec<Vec<f64>>, Vec<u8>) {
        let names = vec!["Visitor_Goals_Avg".to_string(), "Home_Goals_Avg".to_string()];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let v = 1.0 + (i % 5) as f64 * 0.5;
            rows.push(vec![v + 1.5, v]);
            labels.push(1);
            rows.push(vec![v, v + 1.5]);
            labels.push(0);
        }
        (names, rows, labels)
    }

    #[test]
    fn test_fit_learns_separable_rule() {
        let (names, rows, labels) = separable();
        let model = LogisticModel::fit(names.clone(), &rows, &labels, &TrainingConfig::default()).unwrap();

        let visitor_strong = FeatureVector::new(names.clone(), vec![4.0, 1.5]).unwrap();
        let home_strong = FeatureVector::new(names, vec![1.5, 4.0]).unwrap();
        assert_eq!(model.predict(&visitor_strong).unwrap(), 1);
        assert_eq!(model.predict(&home_strong).unwrap(), 0);
    }

    #[test]
    fn test_predict_rejects_reordered_features() {
        let (names, rows, labels) = separable();
        let model = LogisticModel::fit(names, &rows, &labels, &TrainingConfig::default()).unwrap();
        let swapped = FeatureVector::new(
            vec!["Home_Goals_Avg".to_string(), "Visitor_Goals_Avg".to_string()],
            vec![1.0, 2.0],
        )
        .unwrap();
        assert!(matches!(
            model.predict(&swapped),
            Err(PredictorError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_fit_rejects_ragged_rows() {
        let names = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(LogisticModel::fit(names, &rows, &[0, 1], &TrainingConfig::default()).is_err());
    }

    #[test]
    fn test_stratified_split_keeps_class_shares() {
        let labels: Vec<u8> = (0..50).map(|i| u8::from(i % 5 == 0)).collect();
        let (train, test) = stratified_split(&labels, 0.2, 42);
        assert_eq!(train.len() + test.len(), 50);
        assert_eq!(test.len(), 10);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 2);
        assert!(train.iter().all(|i| !test.contains(i)));
        assert_eq!(stratified_split(&labels, 0.2, 42), (train, test));
    }

    #[test]
    fn test_classification_report() {
        let actual = [1, 1, 1, 0, 0];
        let predicted = [1, 1, 0, 0, 1];
        let report = ClassificationReport::from_predictions(&actual, &predicted);
        assert_eq!(report.confusion, [[1, 1], [1, 2]]);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        let visitor = report.classes[1];
        assert!((visitor.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((visitor.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(visitor.support, 3);
        assert!(report.to_string().starts_with("Accuracy: 0.60"));
    }
}
