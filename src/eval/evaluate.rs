use std::sync::Arc;

use tracing::info;

use crate::data::dataset::Dataset;
use crate::data::labels::{LabelDistance, LabelSet};
use crate::data::partition::DatasetPartition;
use crate::eval::score::{Score, ScoreSummary};
use crate::network::mlp::MultiLayerPerceptron;
use crate::train::train_config::TrainConfig;

/// Runs every instance through `network.process` and records it in `score`.
///
/// # Panics
/// Panics if `inputs` and `targets` differ in length.
pub fn evaluate<L: LabelDistance>(
    score: &mut Score<L>,
    network: &mut MultiLayerPerceptron,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    verbose: bool,
) {
    assert_eq!(inputs.len(), targets.len(), "inputs and targets must have equal length");
    for (input, target) in inputs.iter().zip(targets) {
        let output = network.process(input);
        score.record_result(target, &output, verbose);
    }
}

/// Stratified k-fold cross-validation.
///
/// `build` creates a fresh, untrained network for each fold; it is trained
/// on the fold's training set with `config` and scored on its testing set.
pub fn cross_validate<F>(
    dataset: &Dataset,
    folds: usize,
    seed: u64,
    mut build: F,
    config: &TrainConfig,
    margin: f64,
) -> Vec<ScoreSummary>
where
    F: FnMut() -> MultiLayerPerceptron,
{
    DatasetPartition::stratify(dataset, folds, seed)
        .into_iter()
        .enumerate()
        .map(|(fold, partition)| {
            let (training, testing) = partition.into_parts();
            let mut network = build();
            network.train_network(training.inputs(), training.targets(), config);
            let mut score: Score<Arc<LabelSet>> = Score::new(Arc::clone(testing.labels()), margin);
            evaluate(&mut score, &mut network, testing.inputs(), testing.targets(), false);
            let summary = score.summary();
            info!(
                fold,
                train = training.len(),
                test = testing.len(),
                accuracy = summary.accuracy,
                rmse = summary.rmse,
                "fold evaluated"
            );
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::network::mlp::OutputMap;
    use crate::normalization::descriptors::DescriptorKind;

    fn separable() -> Dataset {
        let mut inputs = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let t = i as f64 / 20.0;
            inputs.push(vec![t, 1.0 + t]);
            labels.push("low".to_string());
            inputs.push(vec![5.0 + t, 6.0 - t]);
            labels.push("high".to_string());
        }
        Dataset::from_records(true, inputs, labels).unwrap()
    }

    #[test]
    fn evaluate_records_every_instance() {
        let ds = separable();
        let mut net = MultiLayerPerceptron::new(&[2, 2], &[ActivationFunction::Sigmoid]);
        let mut score = Score::new(Arc::clone(ds.labels()), 0.3);
        evaluate(&mut score, &mut net, ds.inputs(), ds.targets(), false);
        assert_eq!(score.positives() + score.negatives(), ds.len());
    }

    #[test]
    fn cross_validation_scores_each_fold() {
        let ds = separable();
        let config = TrainConfig::new(200, 0.5)
            .with_features(DescriptorKind::Standardized)
            .with_output_map(OutputMap::Scaled);
        let summaries = cross_validate(
            &ds,
            4,
            3,
            || MultiLayerPerceptron::new(&[2, 2], &[ActivationFunction::Sigmoid]),
            &config,
            0.3,
        );
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries.iter().map(|s| s.total).sum::<usize>(), ds.len());
        for s in &summaries {
            assert!(s.accuracy >= 0.99, "fold accuracy {}", s.accuracy);
        }
    }
}
