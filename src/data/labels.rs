use std::sync::Arc;

use serde::{Serialize, Deserialize};

/// Label returned by `best_match` when no categories are known.
pub const UNKNOWN_CATEGORY: &str = "UNKNOWN";

/// Distance between target vectors, and projection of a vector onto the
/// closest known label.
pub trait LabelDistance {
    /// Distance between two vectors; `f64::MAX` when they are not comparable.
    fn dist(&self, a: &[f64], b: &[f64]) -> f64;

    /// Label of the known category closest to `target`.
    fn best_match(&self, target: &[f64]) -> String;
}

/// Root-mean-square distance. Vectors of different or zero length are
/// infinitely far apart (`f64::MAX`).
pub fn rms_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return f64::MAX;
    }
    let diff: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (diff / a.len() as f64).sqrt()
}

/// A label paired with the target vector that encodes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominalCategory {
    pub label: String,
    pub value: Vec<f64>,
}

/// Known categories in first-seen order, one per label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSet {
    categories: Vec<NominalCategory>,
}

impl LabelSet {
    pub fn new() -> LabelSet {
        LabelSet::default()
    }

    /// Adds a category unless its label is already known.
    pub fn insert(&mut self, label: &str, value: Vec<f64>) {
        if !self.categories.iter().any(|c| c.label == label) {
            self.categories.push(NominalCategory { label: label.to_owned(), value });
        }
    }

    pub fn categories(&self) -> &[NominalCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl LabelDistance for LabelSet {
    fn dist(&self, a: &[f64], b: &[f64]) -> f64 {
        rms_distance(a, b)
    }

    fn best_match(&self, target: &[f64]) -> String {
        let mut best: Option<(&NominalCategory, f64)> = None;
        for category in &self.categories {
            let d = self.dist(target, &category.value);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((category, d)),
            }
        }
        best.map_or_else(|| UNKNOWN_CATEGORY.to_owned(), |(c, _)| c.label.clone())
    }
}

impl<T: LabelDistance + ?Sized> LabelDistance for &T {
    fn dist(&self, a: &[f64], b: &[f64]) -> f64 {
        (**self).dist(a, b)
    }

    fn best_match(&self, target: &[f64]) -> String {
        (**self).best_match(target)
    }
}

impl<T: LabelDistance + ?Sized> LabelDistance for Arc<T> {
    fn dist(&self, a: &[f64], b: &[f64]) -> f64 {
        (**self).dist(a, b)
    }

    fn best_match(&self, target: &[f64]) -> String {
        (**self).best_match(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn one_hot_set() -> LabelSet {
        let mut set = LabelSet::new();
        set.insert("a", vec![1.0, 0.0, 0.0]);
        set.insert("b", vec![0.0, 1.0, 0.0]);
        set.insert("c", vec![0.0, 0.0, 1.0]);
        set
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = [0.3, -1.2, 4.0];
        let b = [1.0, 0.5, -2.0];
        assert_eq!(rms_distance(&a, &b), rms_distance(&b, &a));
        assert_eq!(rms_distance(&a, &a), 0.0);
        assert_abs_diff_eq!(rms_distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
    }

    #[test]
    fn incomparable_vectors_are_maximally_distant() {
        assert_eq!(rms_distance(&[1.0], &[1.0, 2.0]), f64::MAX);
        assert_eq!(rms_distance(&[], &[]), f64::MAX);
    }

    #[test]
    fn best_match_picks_nearest() {
        let set = one_hot_set();
        assert_eq!(set.best_match(&[0.1, 0.8, 0.3]), "b");
        assert_eq!(set.best_match(&[0.2, 0.1, 0.9]), "c");
    }

    #[test]
    fn ties_go_to_first_inserted() {
        let set = one_hot_set();
        assert_eq!(set.best_match(&[0.5, 0.5, 0.0]), "a");
    }

    #[test]
    fn duplicate_labels_are_ignored() {
        let mut set = one_hot_set();
        set.insert("a", vec![9.0, 9.0, 9.0]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.categories()[0].value, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_set_is_unknown() {
        assert_eq!(LabelSet::new().best_match(&[1.0]), UNKNOWN_CATEGORY);
    }

    #[test]
    fn mismatched_width_still_returns_a_label() {
        // every category is f64::MAX away; the first one wins
        assert_eq!(one_hot_set().best_match(&[1.0]), "a");
    }
}
