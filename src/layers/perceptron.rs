use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Constant input fed to every bias weight.
pub const THRESHOLD: f64 = -2.0;

/// Seed used by `Perceptron::new` so untrained layers are reproducible.
pub const DEFAULT_SEED: u64 = 1;

/// One fully connected layer with a bias row.
///
/// `weights` has shape `(num_inputs + 1, num_outputs)`; row `num_inputs`
/// holds the bias weights, which are multiplied by `THRESHOLD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perceptron {
    pub name: String,
    num_inputs: usize,
    num_outputs: usize,
    weights: Matrix,
    current_inputs: Vec<f64>,   // input of the pending update; zeroed after each update
    current_outputs: Vec<f64>,
    errors: Vec<f64>,
    deltas: Vec<f64>,
    activator: ActivationFunction,
}

impl Perceptron {
    pub fn new(name: &str, num_inputs: usize, num_outputs: usize, activation: ActivationFunction) -> Perceptron {
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        Perceptron::with_rng(name, num_inputs, num_outputs, activation, &mut rng)
    }

    /// Input weights are uniform in `[-1, 1)`; bias weights start at `1.0`.
    pub fn with_rng<R: Rng + ?Sized>(
        name: &str,
        num_inputs: usize,
        num_outputs: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Perceptron {
        let mut weights = Matrix::random(num_inputs + 1, num_outputs, rng);
        for i in 0..num_outputs {
            weights.set(num_inputs, i, 1.0);
        }
        Perceptron::from_weights(name, weights, activation)
    }

    /// Builds a layer from an explicit `(num_inputs + 1) × num_outputs` matrix.
    ///
    /// # Panics
    /// Panics if the matrix has fewer than two rows (no room for the bias row)
    /// or no columns.
    pub fn from_weights(name: &str, weights: Matrix, activation: ActivationFunction) -> Perceptron {
        assert!(weights.rows >= 2, "weights need at least one input row plus the bias row");
        assert!(weights.cols > 0, "a layer needs at least one output node");
        let num_inputs = weights.rows - 1;
        let num_outputs = weights.cols;
        Perceptron {
            name: name.to_owned(),
            num_inputs,
            num_outputs,
            weights,
            current_inputs: vec![0.0; num_inputs],
            current_outputs: vec![0.0; num_outputs],
            errors: vec![0.0; num_outputs],
            deltas: vec![0.0; num_outputs],
            activator: activation,
        }
    }

    pub fn num_input_nodes(&self) -> usize { self.num_inputs }
    pub fn num_output_nodes(&self) -> usize { self.num_outputs }

    /// Row index of the bias weights.
    fn threshold_row(&self) -> usize { self.num_inputs }

    pub fn output(&self, i: usize) -> f64 { self.current_outputs[i] }
    pub fn delta(&self, i: usize) -> f64 { self.deltas[i] }
    pub fn error(&self, i: usize) -> f64 { self.errors[i] }
    pub fn set_error(&mut self, i: usize, error: f64) { self.errors[i] = error; }

    pub fn weight_from_to(&self, input_node: usize, output_node: usize) -> f64 {
        self.weights.get(input_node, output_node)
    }

    pub fn weights(&self) -> &Matrix { &self.weights }
    pub fn activation(&self) -> ActivationFunction { self.activator }

    pub fn set_activation(&mut self, activation: ActivationFunction) {
        self.activator = activation;
    }

    /// Forward pass. Keeps a copy of `inputs` for the next weight update and
    /// returns a copy of the outputs.
    ///
    /// # Panics
    /// Panics if `inputs.len() != num_input_nodes()`.
    pub fn compute(&mut self, inputs: &[f64]) -> Vec<f64> {
        assert_eq!(
            inputs.len(),
            self.num_inputs,
            "layer {} expects {} inputs",
            self.name,
            self.num_inputs
        );
        self.current_inputs.copy_from_slice(inputs);
        let bias_row = self.threshold_row();
        for i in 0..self.num_outputs {
            let mut sum = 0.0;
            for j in 0..self.num_inputs {
                sum += self.current_inputs[j] * self.weights.get(j, i);
            }
            sum += THRESHOLD * self.weights.get(bias_row, i);
            self.current_outputs[i] = self.activator.output(sum);
        }
        self.current_outputs.clone()
    }

    /// Applies `delta = rate × error × gradient(output)` to every weight feeding
    /// each output node, then clears the stored inputs.
    pub fn update_weights(&mut self, rate: f64) {
        let bias_row = self.threshold_row();
        for i in 0..self.num_outputs {
            self.deltas[i] = rate * self.errors[i] * self.activator.gradient(self.current_outputs[i]);
            for j in 0..self.num_inputs {
                let w = self.weights.get(j, i) + self.deltas[i] * self.current_inputs[j];
                self.weights.set(j, i, w);
            }
            let b = self.weights.get(bias_row, i) + self.deltas[i] * THRESHOLD;
            self.weights.set(bias_row, i, b);
        }
        self.current_inputs.iter_mut().for_each(|x| *x = 0.0);
    }

    /// One training step against `targets`. Returns the mean squared error
    /// of the outputs before the update.
    pub fn train(&mut self, inputs: &[f64], targets: &[f64], rate: f64) -> f64 {
        assert_eq!(targets.len(), self.num_outputs, "target width must match layer {}", self.name);
        self.compute(inputs);
        let mut sq = 0.0;
        for i in 0..self.num_outputs {
            let e = targets[i] - self.current_outputs[i];
            self.set_error(i, e);
            sq += e * e;
        }
        self.update_weights(rate);
        sq / self.num_outputs as f64
    }

    /// Stored input buffer; all zeros between training steps.
    pub fn pending_inputs(&self) -> &[f64] {
        &self.current_inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn layer() -> Perceptron {
        Perceptron::new("L0", 3, 2, ActivationFunction::Sigmoid)
    }

    #[test]
    fn new_layer_is_seeded_and_biased() {
        let a = layer();
        let b = layer();
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.weights().rows, 4);
        assert_eq!(a.weight_from_to(3, 0), 1.0);
        assert_eq!(a.weight_from_to(3, 1), 1.0);
    }

    #[test]
    fn compute_is_deterministic() {
        let mut p = layer();
        let x = [0.2, -0.4, 0.9];
        let first = p.compute(&x);
        let second = p.compute(&x);
        assert_eq!(first, second);
    }

    #[test]
    fn compute_matches_hand_calculation() {
        let w = Matrix::from_data(vec![vec![0.5], vec![-1.0], vec![0.25]]);
        let mut p = Perceptron::from_weights("L0", w, ActivationFunction::Tanh);
        let out = p.compute(&[2.0, 1.0]);
        let z: f64 = 0.5 * 2.0 - 1.0 * 1.0 + THRESHOLD * 0.25;
        assert_abs_diff_eq!(out[0], z.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn returned_outputs_are_a_copy() {
        let mut p = layer();
        let mut out = p.compute(&[1.0, 1.0, 1.0]);
        out[0] = 42.0;
        assert_ne!(p.output(0), 42.0);
    }

    #[test]
    fn update_changes_next_output_and_clears_inputs() {
        let mut p = layer();
        let x = [0.3, 0.1, -0.5];
        let before = p.compute(&x);
        p.set_error(0, 1.0);
        p.set_error(1, -1.0);
        p.update_weights(0.5);
        assert!(p.pending_inputs().iter().all(|&v| v == 0.0));
        let after = p.compute(&x);
        assert_ne!(before, after);
        assert!(after[0] > before[0]);
        assert!(after[1] < before[1]);
    }

    #[test]
    fn bias_update_uses_threshold() {
        let w = Matrix::from_data(vec![vec![0.0], vec![0.0]]);
        let mut p = Perceptron::from_weights("L0", w, ActivationFunction::Sigmoid);
        p.compute(&[1.0]);
        p.set_error(0, 1.0);
        p.update_weights(1.0);
        // output 0.5 -> gradient 0.25 -> delta 0.25
        assert_abs_diff_eq!(p.delta(0), 0.25);
        assert_abs_diff_eq!(p.weight_from_to(0, 0), 0.25);
        assert_abs_diff_eq!(p.weight_from_to(1, 0), 0.25 * THRESHOLD);
    }

    #[test]
    fn zero_error_leaves_weights_alone() {
        let mut p = layer();
        let before = p.weights().clone();
        let out = p.compute(&[0.1, 0.2, 0.3]);
        p.train(&[0.1, 0.2, 0.3], &out, 0.7);
        assert_eq!(p.weights(), &before);
    }

    #[test]
    #[should_panic(expected = "expects 3 inputs")]
    fn wrong_input_width_panics() {
        layer().compute(&[1.0, 2.0]);
    }
}
