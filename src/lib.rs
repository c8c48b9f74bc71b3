pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod normalization;
pub mod network;
pub mod data;
pub mod eval;
pub mod train;
pub mod persistence;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::perceptron::Perceptron;
pub use normalization::descriptors::{DescriptorKind, FeatureDescriptors};
pub use network::mlp::{MultiLayerPerceptron, OutputMap};
pub use network::classifier::Classifier;
pub use data::{Dataset, DatasetPartition, LabelDistance, LabelSet};
pub use eval::{cross_validate, evaluate, Score, ScoreSummary};
pub use train::{EpochStats, TrainConfig};
pub use persistence::{load_model, save_model};
