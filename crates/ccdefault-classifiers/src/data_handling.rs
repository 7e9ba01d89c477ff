//! Labelled account datasets and the train/holdout splitter.
//!
//! `LabeledDataset` keeps records and their default labels index-aligned.
//! `train_test_split` partitions any index-aligned pair of sequences into a
//! disjoint, exhaustive training and holdout set using a seeded shuffle, so
//! the same inputs and seed always give the same partition.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{validate_labels, PipelineError, Result};
use crate::schema::{Record, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub records: Vec<Record>,
    /// 1 = defaulted next period, 0 = did not.
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn new(records: Vec<Record>, labels: Vec<u8>) -> Result<Self> {
        if records.len() != labels.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: records.len(),
                found: labels.len(),
            });
        }
        validate_labels(&labels)?;
        Ok(Self { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of (non-default, default) labels.
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - positives, positives)
    }

    pub fn log_input_data_summary(&self) {
        let (negatives, positives) = self.class_counts();
        let n_fields = self.records.first().map(Record::len).unwrap_or(0);
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} records: {} default and {} non-default",
            self.len(),
            positives,
            negatives
        );
        log::info!("{} fields per record", n_fields);
        log::info!("-------------------------------");
    }

    /// Restrict every record to the fields of `schema`.
    pub fn project(&self, schema: Schema) -> Result<LabeledDataset> {
        let records = self
            .records
            .iter()
            .map(|record| record.project(schema))
            .collect::<Result<Vec<_>>>()?;
        Ok(LabeledDataset {
            records,
            labels: self.labels.clone(),
        })
    }

    /// Split into (training, holdout) datasets.
    pub fn split(&self, holdout_fraction: f64, seed: u64) -> Result<(LabeledDataset, LabeledDataset)> {
        let split = train_test_split(&self.records, &self.labels, holdout_fraction, seed)?;
        Ok((
            LabeledDataset {
                records: split.train,
                labels: split.train_labels,
            },
            LabeledDataset {
                records: split.test,
                labels: split.test_labels,
            },
        ))
    }
}

/// Result of `train_test_split`; labels stay aligned with their items.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub train_labels: Vec<u8>,
    pub test: Vec<T>,
    pub test_labels: Vec<u8>,
}

/// Shuffle `0..n_samples` with `seed` and cut it into (train, holdout)
/// index sets. The holdout receives `round(n_samples * holdout_fraction)`
/// indices.
pub fn split_indices(
    n_samples: usize,
    holdout_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "holdout_fraction must be in (0, 1), got {}",
            holdout_fraction
        )));
    }

    let n_test = (n_samples as f64 * holdout_fraction).round() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::InsufficientData(format!(
            "split of {} samples would leave an empty partition (train={}, holdout={})",
            n_samples, n_train, n_test
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(n_train);
    Ok((indices, test))
}

/// Partition `items` and `labels` into disjoint training and holdout sets.
pub fn train_test_split<T: Clone>(
    items: &[T],
    labels: &[u8],
    holdout_fraction: f64,
    seed: u64,
) -> Result<Split<T>> {
    if items.len() != labels.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: items.len(),
            found: labels.len(),
        });
    }

    let (train_idx, test_idx) = split_indices(items.len(), holdout_fraction, seed)?;
    log::info!(
        "Split {} samples into {} training and {} holdout (seed {})",
        items.len(),
        train_idx.len(),
        test_idx.len(),
        seed
    );

    let pick = |idx: &[usize]| -> (Vec<T>, Vec<u8>) {
        idx.iter().map(|&i| (items[i].clone(), labels[i])).unzip()
    };
    let (train, train_labels) = pick(&train_idx);
    let (test, test_labels) = pick(&test_idx);

    Ok(Split {
        train,
        train_labels,
        test,
        test_labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_outside_open_interval_is_rejected() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                split_indices(10, bad, 1),
                Err(PipelineError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn tiny_inputs_cannot_leave_an_empty_partition() {
        assert!(matches!(
            split_indices(1, 0.2, 1),
            Err(PipelineError::InsufficientData(_))
        ));
    }

    #[test]
    fn labels_follow_their_items() {
        let items: Vec<usize> = (0..50).collect();
        let labels: Vec<u8> = items.iter().map(|&i| (i % 2) as u8).collect();
        let split = train_test_split(&items, &labels, 0.3, 9).unwrap();
        for (item, label) in split.train.iter().zip(&split.train_labels) {
            assert_eq!(*label as usize, item % 2);
        }
        for (item, label) in split.test.iter().zip(&split.test_labels) {
            assert_eq!(*label as usize, item % 2);
        }
    }

    #[test]
    fn dataset_rejects_misaligned_labels() {
        assert!(LabeledDataset::new(vec![Record::new()], vec![0, 1]).is_err());
        assert!(matches!(
            LabeledDataset::new(vec![Record::new()], vec![4]),
            Err(PipelineError::InvalidLabel { index: 0, value: 4 })
        ));
    }
}
