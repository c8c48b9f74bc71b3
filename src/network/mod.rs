pub mod classifier;
pub mod mlp;

pub use classifier::Classifier;
pub use mlp::{MultiLayerPerceptron, OutputMap};
