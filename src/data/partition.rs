use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::dataset::Dataset;
use crate::data::labels::LabelDistance;

/// One cross-validation fold: disjoint training and testing sets derived
/// from the same parent.
#[derive(Debug, Clone)]
pub struct DatasetPartition {
    training: Dataset,
    testing: Dataset,
}

struct Instance<'a> {
    inputs: &'a [f64],
    targets: &'a [f64],
    key: i64,
}

impl DatasetPartition {
    pub fn training_set(&self) -> &Dataset {
        &self.training
    }

    pub fn testing_set(&self) -> &Dataset {
        &self.testing
    }

    pub fn into_parts(self) -> (Dataset, Dataset) {
        (self.training, self.testing)
    }

    /// Splits `dataset` into `max(2, folds)` train/test partitions.
    ///
    /// Each instance is keyed by
    /// `floor(dist(target_0, target_i)) + N / F + rand(0..N)` and the instances
    /// are stably sorted on that key. The sorted sequence is cut into `F`
    /// contiguous blocks of `N / F` (the last block takes the remainder); fold
    /// `i` tests on block `i` and trains on the others.
    ///
    /// Grouping by distance to the first target is an approximate
    /// stratification only; folds are not guaranteed to be class-balanced.
    pub fn stratify(dataset: &Dataset, folds: usize, seed: u64) -> Vec<DatasetPartition> {
        let folds = folds.max(2);
        let mut rng = StdRng::seed_from_u64(seed);
        let labels = dataset.labels();
        let n = dataset.len();

        let mut instances: Vec<Instance<'_>> = dataset.inputs().iter()
            .zip(dataset.targets())
            .map(|(inputs, targets)| Instance { inputs, targets, key: 0 })
            .collect();

        if let Some(reference) = instances.first().map(|i| i.targets) {
            let fold_offset = (n / folds) as i64;
            for instance in instances.iter_mut() {
                // f64::MAX saturates; only reachable with incomparable targets
                let distance = labels.dist(reference, instance.targets).floor() as i64;
                let jitter = rng.gen_range(0..n) as i64;
                instance.key = distance.saturating_add(fold_offset).saturating_add(jitter);
            }
        }
        instances.sort_by_key(|i| i.key);

        let partition_size = n / folds;
        let mut bounds = Vec::with_capacity(folds);
        let mut start = 0;
        for i in 0..folds {
            let size = if i < folds - 1 { partition_size } else { n - start };
            bounds.push((start, start + size));
            start += size;
        }

        bounds.into_iter()
            .map(|range| build_partition(&instances, range, dataset))
            .collect()
    }
}

fn build_partition(instances: &[Instance<'_>], (lo, hi): (usize, usize), parent: &Dataset) -> DatasetPartition {
    let mut testing_inputs = Vec::with_capacity(hi - lo);
    let mut testing_targets = Vec::with_capacity(hi - lo);
    let mut training_inputs = Vec::with_capacity(instances.len() - (hi - lo));
    let mut training_targets = Vec::with_capacity(instances.len() - (hi - lo));

    for (i, instance) in instances.iter().enumerate() {
        if (lo..hi).contains(&i) {
            testing_inputs.push(instance.inputs.to_vec());
            testing_targets.push(instance.targets.to_vec());
        } else {
            training_inputs.push(instance.inputs.to_vec());
            training_targets.push(instance.targets.to_vec());
        }
    }

    DatasetPartition {
        training: Dataset::derived(parent, training_inputs, training_targets),
        testing: Dataset::derived(parent, testing_inputs, testing_targets),
    }
}
