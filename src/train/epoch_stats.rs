use serde::{Serialize, Deserialize};

/// Progress of one finished epoch, sent over `TrainConfig::progress_tx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Counts from 1.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean over instances of the output layer's squared error, each taken
    /// before that instance's weight update.
    pub train_error: f64,
    pub elapsed_ms: u64,
}
