//! Binary classification metrics for holdout evaluation.
//!
//! The confusion matrix is laid out with actual classes on rows and
//! predicted classes on columns: `[[TN, FP], [FN, TP]]`.
use std::fmt;

use serde::Serialize;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (0, 0) => cm.tn += 1,
                (0, _) => cm.fp += 1,
                (_, 0) => cm.fn_ += 1,
                _ => cm.tp += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Rows are actual (0, 1), columns are predicted (0, 1).
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassReport {
    fn new(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassReport {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// One point of the ROC curve: predicting class 1 for every probability
/// `>= threshold` gives this false and true positive rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    /// Reports for class 0 (no default) and class 1 (default).
    pub classes: [ClassReport; 2],
    pub confusion: ConfusionMatrix,
    pub macro_avg: ClassReport,
    pub weighted_avg: ClassReport,
    pub roc_auc: f64,
    pub roc_curve: Vec<RocPoint>,
}

fn check_inputs(y_true: &[u8], other_len: usize) -> Result<()> {
    if y_true.is_empty() {
        return Err(PipelineError::InsufficientData(
            "cannot evaluate an empty label sequence".to_string(),
        ));
    }
    if other_len != y_true.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: y_true.len(),
            found: other_len,
        });
    }
    crate::error::validate_labels(y_true)?;
    let positives = y_true.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == y_true.len() {
        return Err(PipelineError::InsufficientData(format!(
            "labels contain a single class ({} of {} positive)",
            positives,
            y_true.len()
        )));
    }
    Ok(())
}

/// ROC curve over every distinct probability, starting at (0, 0) with an
/// infinite threshold and ending at (1, 1).
pub fn roc_curve(y_true: &[u8], y_proba: &[f64]) -> Result<Vec<RocPoint>> {
    check_inputs(y_true, y_proba.len())?;
    if let Some(bad) = y_proba.iter().find(|p| p.is_nan()) {
        return Err(PipelineError::InvalidParameter(format!(
            "probabilities must not be NaN, got {}",
            bad
        )));
    }

    let mut order: Vec<usize> = (0..y_true.len()).collect();
    order.sort_unstable_by(|&a, &b| y_proba[b].total_cmp(&y_proba[a]));

    let positives = y_true.iter().filter(|&&l| l == 1).count();
    let negatives = y_true.len() - positives;

    let mut curve = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let (mut tp, mut fp) = (0usize, 0usize);
    for (rank, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        // Emit a point only once every row sharing this probability is counted.
        let last_of_group = order
            .get(rank + 1)
            .map_or(true, |&next| y_proba[next] != y_proba[i]);
        if last_of_group {
            curve.push(RocPoint {
                threshold: y_proba[i],
                fpr: ratio(fp, negatives),
                tpr: ratio(tp, positives),
            });
        }
    }
    Ok(curve)
}

/// Area under the ROC curve by the trapezoidal rule.
pub fn roc_auc(y_true: &[u8], y_proba: &[f64]) -> Result<f64> {
    Ok(auc(&roc_curve(y_true, y_proba)?))
}

fn auc(curve: &[RocPoint]) -> f64 {
    curve
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

fn average(a: &ClassReport, b: &ClassReport, wa: f64, wb: f64, support: usize) -> ClassReport {
    let mix = |x: f64, y: f64| (wa * x + wb * y) / (wa + wb);
    ClassReport {
        precision: mix(a.precision, b.precision),
        recall: mix(a.recall, b.recall),
        f1: mix(a.f1, b.f1),
        support,
    }
}

/// Compute all metrics from holdout labels, hard predictions and class-1
/// probabilities.
pub fn evaluate(y_true: &[u8], y_pred: &[u8], y_proba: &[f64]) -> Result<Metrics> {
    check_inputs(y_true, y_pred.len())?;
    crate::error::validate_labels(y_pred)?;

    let confusion = ConfusionMatrix::from_predictions(y_true, y_pred);
    let n = confusion.total();
    let negative = ClassReport::new(confusion.tn, confusion.fn_, confusion.fp);
    let positive = ClassReport::new(confusion.tp, confusion.fp, confusion.fn_);

    let macro_avg = average(&negative, &positive, 1.0, 1.0, n);
    let weighted_avg = average(
        &negative,
        &positive,
        negative.support as f64,
        positive.support as f64,
        n,
    );

    let roc_curve = roc_curve(y_true, y_proba)?;
    let roc_auc = auc(&roc_curve);

    let metrics = Metrics {
        accuracy: ratio(confusion.tn + confusion.tp, n),
        classes: [negative, positive],
        confusion,
        macro_avg,
        weighted_avg,
        roc_auc,
        roc_curve,
    };
    log::info!(
        "Holdout accuracy {:.4}, ROC-AUC {:.4} on {} records",
        metrics.accuracy,
        metrics.roc_auc,
        n
    );
    Ok(metrics)
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn row(f: &mut fmt::Formatter<'_>, name: &str, c: &ClassReport) -> fmt::Result {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, c.precision, c.recall, c.f1, c.support
            )
        }
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        row(f, "0", &self.classes[0])?;
        row(f, "1", &self.classes[1])?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)?;
        writeln!(f)?;
        let [[tn, fp], [fn_, tp]] = self.confusion.as_rows();
        writeln!(f, "Confusion matrix (rows: actual, columns: predicted)")?;
        writeln!(f, "{:>10} {:>8} {:>8}", "", "pred 0", "pred 1")?;
        writeln!(f, "{:>10} {:>8} {:>8}", "actual 0", tn, fp)?;
        writeln!(f, "{:>10} {:>8} {:>8}", "actual 1", fn_, tp)?;
        writeln!(f)?;
        write!(f, "ROC-AUC: {:.4}", self.roc_auc)
    }
}
