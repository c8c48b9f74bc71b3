use serde::{Serialize, Deserialize};

/// Smallest attribute range used as a scale.
pub const MIN_RANGE: f64 = 0.0001;

/// Which center/scale pair a `FeatureDescriptors` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    /// center 0, scale 1
    Raw,
    /// center = min, scale = range
    RangeScaled,
    /// center = mean, scale = range
    MeanNormalized,
    /// center = mean, scale = sample std
    Standardized,
}

/// Column statistics gathered by `FeatureDescriptors::normalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub range: Vec<f64>,
}

impl AttributeStats {
    /// Computes per-column statistics. `attributes` must be non-empty and rectangular.
    ///
    /// `std` uses the `n - 1` denominator and falls back to `1.0` when it is
    /// zero or undefined (a single row). `range` is floored to `MIN_RANGE`.
    pub fn from_attributes(attributes: &[Vec<f64>]) -> AttributeStats {
        let n = attributes.len();
        let dims = attributes[0].len();
        let mut mean = vec![0.0; dims];
        let mut min = vec![f64::MAX; dims];
        let mut max = vec![f64::MIN; dims];

        for row in attributes {
            assert_eq!(row.len(), dims, "all rows must have {dims} attributes");
            for (j, &x) in row.iter().enumerate() {
                mean[j] += x;
                min[j] = min[j].min(x);
                max[j] = max[j].max(x);
            }
        }
        mean.iter_mut().for_each(|m| *m /= n as f64);

        let mut std = vec![0.0; dims];
        for row in attributes {
            for (j, &x) in row.iter().enumerate() {
                std[j] += (x - mean[j]) * (x - mean[j]);
            }
        }
        for s in std.iter_mut() {
            *s = (*s / (n as f64 - 1.0)).sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }

        let range = max.iter().zip(&min)
            .map(|(hi, lo)| (hi - lo).max(MIN_RANGE))
            .collect();

        AttributeStats { mean, std, min, max, range }
    }
}

/// Per-attribute normalization fitted on a training matrix and reused for
/// single instances at inference time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptors {
    kind: DescriptorKind,
    stats: Option<AttributeStats>,
}

impl FeatureDescriptors {
    pub fn new(kind: DescriptorKind) -> FeatureDescriptors {
        FeatureDescriptors { kind, stats: None }
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    pub fn stats(&self) -> Option<&AttributeStats> {
        self.stats.as_ref()
    }

    /// Drops fitted statistics; subsequent instances are passed through unchanged.
    pub fn invalidate(&mut self) {
        self.stats = None;
    }

    /// Centers for `dims` attributes. Identity (zeros) when nothing is fitted.
    pub fn centers(&self, dims: usize) -> Vec<f64> {
        match (&self.stats, self.kind) {
            (Some(s), DescriptorKind::RangeScaled) => s.min.clone(),
            (Some(s), DescriptorKind::MeanNormalized | DescriptorKind::Standardized) => s.mean.clone(),
            _ => vec![0.0; dims],
        }
    }

    /// Scales for `dims` attributes. Identity (ones) when nothing is fitted.
    pub fn scales(&self, dims: usize) -> Vec<f64> {
        match (&self.stats, self.kind) {
            (Some(s), DescriptorKind::RangeScaled | DescriptorKind::MeanNormalized) => s.range.clone(),
            (Some(s), DescriptorKind::Standardized) => s.std.clone(),
            _ => vec![1.0; dims],
        }
    }

    /// Refits on `attributes` and returns `(x - center) / scale` for every cell.
    pub fn normalize(&mut self, attributes: &[Vec<f64>]) -> Vec<Vec<f64>> {
        self.invalidate();
        if attributes.is_empty() {
            return Vec::new();
        }
        self.stats = Some(AttributeStats::from_attributes(attributes));
        let dims = attributes[0].len();
        let centers = self.centers(dims);
        let scales = self.scales(dims);
        attributes.iter()
            .map(|row| apply(row, &centers, &scales))
            .collect()
    }

    /// Normalizes one raw instance with the last fitted statistics.
    ///
    /// # Panics
    /// Panics if statistics are fitted and `instance` has a different width.
    pub fn regularize_instance(&self, instance: &[f64]) -> Vec<f64> {
        let centers = self.centers(instance.len());
        assert_eq!(centers.len(), instance.len(), "instance width does not match fitted attributes");
        let scales = self.scales(instance.len());
        apply(instance, &centers, &scales)
    }
}

impl Default for FeatureDescriptors {
    fn default() -> Self {
        FeatureDescriptors::new(DescriptorKind::Raw)
    }
}

fn apply(row: &[f64], centers: &[f64], scales: &[f64]) -> Vec<f64> {
    row.iter().zip(centers.iter().zip(scales))
        .map(|(x, (c, s))| (x - c) / s)
        .collect()
}
