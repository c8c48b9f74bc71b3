use std::sync::mpsc;

use crate::network::mlp::OutputMap;
use crate::normalization::descriptors::DescriptorKind;
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `MultiLayerPerceptron::train_network` run.
///
/// # Fields
/// - `epochs`:        total number of full passes over the training data
/// - `learning_rate`: fixed SGD step size
/// - `features`:      normalization fitted on the training inputs
/// - `output_map`:    how `process` post-processes outputs
/// - `progress_tx`:   optional channel sender; one `EpochStats` is sent per
///                    completed epoch. A dropped receiver does not stop training.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub features: DescriptorKind,
    pub output_map: OutputMap,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Raw features, raw outputs, no progress channel.
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            features: DescriptorKind::Raw,
            output_map: OutputMap::Raw,
            progress_tx: None,
        }
    }

    pub fn with_features(mut self, features: DescriptorKind) -> Self {
        self.features = features;
        self
    }

    pub fn with_output_map(mut self, output_map: OutputMap) -> Self {
        self.output_map = output_map;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}
