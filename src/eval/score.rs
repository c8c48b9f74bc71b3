use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::data::labels::LabelDistance;

/// Streaming accumulator of regression error and a label confusion structure.
#[derive(Debug, Clone)]
pub struct Score<L: LabelDistance> {
    labels: L,
    margin: f64,
    pos: usize,
    neg: usize,
    squared_error: f64,
    /// expected label -> predicted labels, in record order
    prediction_matrix: BTreeMap<String, Vec<String>>,
    /// predicted label -> count
    predictions: BTreeMap<String, usize>,
}

/// Confusion counts for one expected label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelBreakdown {
    pub label: String,
    /// How often each label was predicted for instances of `label`.
    pub predicted: BTreeMap<String, usize>,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

/// Metrics derived from a `Score`'s current state.
///
/// Metrics that are undefined for the recorded data (nothing recorded, no
/// label with a defined precision) are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub breakdown: Vec<LabelBreakdown>,
    pub total: usize,
    pub margin: f64,
    /// Fraction of records whose distance was within `margin`.
    pub margin_accuracy: f64,
    pub rmse: f64,
    /// Micro-averaged `(TP + TN) / (TP + TN + FP + FN)`.
    pub accuracy: f64,
    /// Macro-averaged over labels with a defined precision.
    pub precision: f64,
    /// Macro-averaged over labels with a defined recall.
    pub recall: f64,
    pub f_score: f64,
}

impl<L: LabelDistance> Score<L> {
    pub fn new(labels: L, margin: f64) -> Score<L> {
        Score {
            labels,
            margin,
            pos: 0,
            neg: 0,
            squared_error: 0.0,
            prediction_matrix: BTreeMap::new(),
            predictions: BTreeMap::new(),
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn positives(&self) -> usize {
        self.pos
    }

    pub fn negatives(&self) -> usize {
        self.neg
    }

    /// Fraction of records within the margin. `NaN` before any record.
    pub fn accuracy(&self) -> f64 {
        self.pos as f64 / (self.pos + self.neg) as f64
    }

    /// Root of the mean squared distance so far. `NaN` before any record.
    pub fn rmse(&self) -> f64 {
        (self.squared_error / (self.pos + self.neg) as f64).sqrt()
    }

    pub fn record_result(&mut self, expected: &[f64], predicted: &[f64], verbose: bool) {
        let dist = self.labels.dist(expected, predicted);
        self.squared_error += dist * dist;
        if dist <= self.margin {
            self.pos += 1;
        } else {
            self.neg += 1;
        }

        let expected_label = self.labels.best_match(expected);
        let predicted_label = self.labels.best_match(predicted);
        self.prediction_matrix.entry(expected_label).or_default().push(predicted_label.clone());
        *self.predictions.entry(predicted_label).or_insert(0) += 1;

        if verbose {
            info!(?expected, ?predicted, error = dist, "recorded result");
        }
    }

    /// Computes every metric from the current accumulator state without
    /// modifying it.
    pub fn summary(&self) -> ScoreSummary {
        let total = self.pos + self.neg;
        let (mut global_tp, mut global_fp, mut global_tn, mut global_fn) = (0, 0, 0, 0);
        let mut precisions = Vec::new();
        let mut recalls = Vec::new();
        let mut breakdown = Vec::with_capacity(self.prediction_matrix.len());

        for (actual, observed) in &self.prediction_matrix {
            let mut predicted: BTreeMap<String, usize> = self.prediction_matrix.keys()
                .map(|k| (k.clone(), 0))
                .collect();
            let (mut tp, mut fn_) = (0, 0);
            for label in observed {
                *predicted.entry(label.clone()).or_insert(0) += 1;
                if label == actual {
                    tp += 1;
                } else {
                    fn_ += 1;
                }
            }
            let predicted_as_actual = self.predictions.get(actual).copied().unwrap_or(0);
            let fp = predicted_as_actual - tp;
            let tn = total - predicted_as_actual - fn_;

            global_tp += tp;
            global_fp += fp;
            global_tn += tn;
            global_fn += fn_;
            if tp + fp > 0 {
                precisions.push(tp as f64 / (tp + fp) as f64);
            }
            if tp + fn_ > 0 {
                recalls.push(tp as f64 / (tp + fn_) as f64);
            }
            breakdown.push(LabelBreakdown { label: actual.clone(), predicted, tp, fp, tn, fn_ });
        }

        let precision = mean(&precisions);
        let recall = mean(&recalls);
        let f_score = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        let denominator = global_tp + global_tn + global_fp + global_fn;

        ScoreSummary {
            breakdown,
            total,
            margin: self.margin,
            margin_accuracy: self.accuracy(),
            rmse: self.rmse(),
            accuracy: (global_tp + global_tn) as f64 / denominator as f64,
            precision,
            recall,
            f_score,
        }
    }

    /// Text report of `summary()`.
    pub fn print_summary(&self) -> String {
        self.summary().to_string()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

const RULE: &str = "---------------------------------";

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "=================================")?;
        writeln!(f, "====Contingency Matrix : ========")?;
        writeln!(f, "---<EXPECTED => {{PREDICTED}}>-----")?;
        writeln!(f, "{RULE}")?;
        for row in &self.breakdown {
            let counts: Vec<String> = row.predicted.iter().map(|(k, v)| format!("{k}={v}")).collect();
            writeln!(f, "{} => {{{}}}", row.label, counts.join(", "))?;
            writeln!(f, "{RULE}")?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(f, "Evaluation 1: regression")?;
        writeln!(f, ".................................")?;
        writeln!(f, "** RMSE: {:.2}", self.rmse)?;
        writeln!(f, "** Accuracy within {:.2}: \t {:.2}", self.margin, self.margin_accuracy)?;
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Evaluation 2: classification")?;
        writeln!(f, ".................................")?;
        writeln!(f, "Accuracy: {:.2}\t;   F-Score: {:.2}", self.accuracy, self.f_score)?;
        writeln!(f, "{RULE}")
    }
}
