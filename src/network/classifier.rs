use serde::{Serialize, Deserialize};

use crate::data::labels::{LabelDistance, LabelSet};
use crate::network::mlp::MultiLayerPerceptron;

/// A trained network bundled with the labels it predicts and the input
/// columns it was trained on. Serializable as one unit via `persistence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classifier {
    network: MultiLayerPerceptron,
    labels: LabelSet,
    /// Indices into a full-width raw instance; `None` keeps every column.
    selected_attributes: Option<Vec<usize>>,
    /// Width of a full raw instance.
    feature_len: usize,
}

impl Classifier {
    pub fn new(
        network: MultiLayerPerceptron,
        labels: LabelSet,
        selected_attributes: Option<Vec<usize>>,
        feature_len: usize,
    ) -> Classifier {
        Classifier { network, labels, selected_attributes, feature_len }
    }

    pub fn network(&self) -> &MultiLayerPerceptron {
        &self.network
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Projects `input` onto the selected attributes.
    ///
    /// A full-width instance is projected; one already at the selected width
    /// is passed through; anything else becomes a zero vector of the selected
    /// width.
    pub fn select_features(&self, input: &[f64]) -> Vec<f64> {
        let Some(selected) = &self.selected_attributes else {
            return input.to_vec();
        };
        if input.len() == self.feature_len {
            selected.iter().map(|&i| input.get(i).copied().unwrap_or(0.0)).collect()
        } else if input.len() == selected.len() {
            input.to_vec()
        } else {
            vec![0.0; selected.len()]
        }
    }

    /// Label closest to the network's output for `input`.
    pub fn classify(&mut self, input: &[f64]) -> String {
        let features = self.select_features(input);
        let output = self.network.process(&features);
        self.labels.best_match(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::dataset::Dataset;
    use crate::network::mlp::OutputMap;
    use crate::normalization::descriptors::DescriptorKind;
    use crate::train::train_config::TrainConfig;

    fn classifier(selected: Option<Vec<usize>>) -> Classifier {
        let width = selected.as_ref().map_or(3, |s| s.len());
        let net = MultiLayerPerceptron::new(&[width, 2], &[ActivationFunction::Sigmoid]);
        let mut labels = LabelSet::new();
        labels.insert("a", vec![1.0, 0.0]);
        labels.insert("b", vec![0.0, 1.0]);
        Classifier::new(net, labels, selected, 3)
    }

    #[test]
    fn selects_full_width_instances() {
        let c = classifier(Some(vec![2, 0]));
        assert_eq!(c.select_features(&[1.0, 2.0, 3.0]), vec![3.0, 1.0]);
        assert_eq!(c.select_features(&[7.0, 8.0]), vec![7.0, 8.0]);
        assert_eq!(c.select_features(&[1.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn no_selection_passes_through() {
        let c = classifier(None);
        assert_eq!(c.select_features(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn classifies_after_training() {
        let ds = Dataset::from_records(
            true,
            vec![vec![0.0, 9.0], vec![0.2, 9.0], vec![1.0, 9.0], vec![1.2, 9.0]],
            ["a", "a", "b", "b"].iter().map(|s| s.to_string()).collect(),
        ).unwrap();
        let mut net = MultiLayerPerceptron::new(&[1, 2], &[ActivationFunction::Sigmoid]);
        let selected: Vec<Vec<f64>> = ds.inputs().iter().map(|r| vec![r[0]]).collect();
        let config = TrainConfig::new(500, 0.5)
            .with_features(DescriptorKind::Standardized)
            .with_output_map(OutputMap::Scaled);
        net.train_network(&selected, ds.targets(), &config);
        let mut c = Classifier::new(net, (**ds.labels()).clone(), Some(vec![0]), 2);
        assert_eq!(c.classify(&[0.1, 9.0]), "a");
        assert_eq!(c.classify(&[1.1, 9.0]), "b");
    }
}
