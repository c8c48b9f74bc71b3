use serde::{Serialize, Deserialize};
use std::f64::consts::E;

/// Element-wise activation applied by a `Perceptron` after its weighted sum.
///
/// Gradients are always expressed in terms of the activation's **output**
/// (`fx`), never the pre-activation input: back-propagation only keeps the
/// outputs around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
    /// Smooth rectifier `ln(1 + e^x)`.
    ReLU,
    Gaussian,
}

impl ActivationFunction {
    pub fn output(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => (1.0 + E.powf(x)).ln(),
            ActivationFunction::Gaussian => E.powf(-(x * x)),
        }
    }

    /// Gradient of the activation given its already-computed output `fx`.
    ///
    /// `ReLU` returns the logistic of its output and `Gaussian` returns
    /// `-2·e^{-fx²}`. Neither is the textbook derivative; both are fixed
    /// behaviour that trained models depend on.
    pub fn gradient(&self, fx: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => fx * (1.0 - fx),
            ActivationFunction::Tanh => 1.0 - fx * fx,
            ActivationFunction::ReLU => 1.0 / (1.0 + E.powf(-fx)),
            ActivationFunction::Gaussian => -2.0 * E.powf(-(fx * fx)),
        }
    }
}

impl std::str::FromStr for ActivationFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "tanh" => Ok(ActivationFunction::Tanh),
            "relu" => Ok(ActivationFunction::ReLU),
            "gaussian" => Ok(ActivationFunction::Gaussian),
            other => Err(format!("unknown activation function '{other}'")),
        }
    }
}
