use ferrite_learn::{ActivationFunction, MultiLayerPerceptron, TrainConfig};

fn main() {
    let mut network = MultiLayerPerceptron::new(&[2, 3, 1], &[ActivationFunction::Tanh]);

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let (tx, rx) = std::sync::mpsc::channel();
    let config = TrainConfig::new(10000, 0.3).with_progress(tx);
    network.train_network(&inputs, &expected_outputs, &config);

    for stats in rx.try_iter().filter(|s| s.epoch % 1000 == 0) {
        println!("Epoch {}: error = {:.6}", stats.epoch, stats.train_error);
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.process(input)[0]);
    }
}
