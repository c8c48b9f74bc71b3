use std::time::Instant;

use tracing::debug;

use crate::network::mlp::MultiLayerPerceptron;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Runs `config.epochs` passes of per-instance SGD over already-normalized
/// `inputs` and returns the mean error of the **last completed epoch**.
///
/// Instances are visited in dataset order every epoch.
///
/// # Panics
/// Panics if `inputs` and `targets` differ in length.
pub fn train_loop(
    network: &mut MultiLayerPerceptron,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> f64 {
    assert_eq!(
        inputs.len(),
        targets.len(),
        "inputs and targets must have equal length"
    );

    let mut last_error = 0.0;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let train_error = run_one_epoch(network, inputs, targets, config.learning_rate);
        last_error = train_error;

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        debug!(epoch, total = config.epochs, train_error, elapsed_ms, "epoch complete");

        if let Some(ref tx) = config.progress_tx {
            let stats = EpochStats {
                epoch,
                total_epochs: config.epochs,
                train_error,
                elapsed_ms,
            };
            // Nobody listening is fine; training still runs to completion.
            let _ = tx.send(stats);
        }
    }

    last_error
}

fn run_one_epoch(
    network: &mut MultiLayerPerceptron,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    rate: f64,
) -> f64 {
    if inputs.is_empty() {
        return 0.0;
    }
    let total: f64 = inputs.iter().zip(targets)
        .map(|(input, target)| network.train(input, target, rate))
        .sum();
    total / inputs.len() as f64
}
