use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::data::csv::read_csv;
use crate::data::labels::{LabelDistance, LabelSet};
use crate::error::{Error, Result};

/// Where a dataset's instances came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    /// Nothing ingested yet.
    Empty,
    /// Built by one ingestion call; `path` is set when read from a file.
    Ingested { path: Option<String> },
    /// Carved out of a parent dataset; shares the parent's label set.
    Derived { path: String },
}

/// Parallel input/target matrices plus the label set used to read
/// predictions back as labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
    labels: Arc<LabelSet>,
    nominal: bool,
    source: DatasetSource,
    cursor: usize,
}

impl Dataset {
    /// An empty dataset. `nominal` selects one-hot target encoding; otherwise
    /// each target is the label's first-seen index as a single value.
    pub fn new(nominal: bool) -> Dataset {
        Dataset {
            inputs: Vec::new(),
            targets: Vec::new(),
            labels: Arc::new(LabelSet::new()),
            nominal,
            source: DatasetSource::Empty,
            cursor: 0,
        }
    }

    /// Builds a dataset from in-memory rows and raw labels.
    pub fn from_records(nominal: bool, inputs: Vec<Vec<f64>>, labels: Vec<String>) -> Result<Dataset> {
        let mut dataset = Dataset::new(nominal);
        dataset.ingest(inputs, labels)?;
        Ok(dataset)
    }

    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        nominal: bool,
        selected_attributes: Option<&[usize]>,
    ) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut dataset = Dataset::from_csv_reader(BufReader::new(file), nominal, selected_attributes)?;
        dataset.source = DatasetSource::Ingested { path: Some(path.display().to_string()) };
        Ok(dataset)
    }

    pub fn from_csv_reader<R: BufRead>(
        reader: R,
        nominal: bool,
        selected_attributes: Option<&[usize]>,
    ) -> Result<Dataset> {
        let (inputs, labels) = read_csv(reader, selected_attributes)?;
        Dataset::from_records(nominal, inputs, labels)
    }

    /// A sub-dataset with its own copies of `inputs`/`targets` and a shared
    /// handle to `parent`'s label set.
    pub fn derived(parent: &Dataset, inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Dataset {
        assert_eq!(inputs.len(), targets.len(), "inputs and targets must have equal length");
        Dataset {
            inputs,
            targets,
            labels: Arc::clone(&parent.labels),
            nominal: parent.nominal,
            source: DatasetSource::Derived {
                path: format!("{}_inherited", parent.data_path().unwrap_or("")),
            },
            cursor: 0,
        }
    }

    /// Replaces the contents with `inputs` and their raw `labels`.
    ///
    /// Rows holding a non-finite value are dropped. Ragged rows or a
    /// label count that differs from the row count fail without touching
    /// the current contents.
    pub fn ingest(&mut self, inputs: Vec<Vec<f64>>, labels: Vec<String>) -> Result<()> {
        if inputs.len() != labels.len() {
            return Err(Error::MalformedInput(format!(
                "{} input rows but {} labels",
                inputs.len(),
                labels.len()
            )));
        }
        if let Some(first) = inputs.first() {
            let width = first.len();
            if let Some(i) = inputs.iter().position(|row| row.len() != width) {
                return Err(Error::MalformedInput(format!(
                    "row {i} has {} values, expected {width}",
                    inputs[i].len()
                )));
            }
        }

        let total = inputs.len();
        let (kept_inputs, kept_labels): (Vec<Vec<f64>>, Vec<String>) = inputs.into_iter()
            .zip(labels)
            .filter(|(row, _)| row.iter().all(|x| x.is_finite()))
            .unzip();
        if kept_inputs.len() < total {
            warn!(dropped = total - kept_inputs.len(), "dropped rows with non-finite values");
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for label in &kept_labels {
            if !index.contains_key(label.as_str()) {
                index.insert(label.as_str(), order.len());
                order.push(label.as_str());
            }
        }

        let mut label_set = LabelSet::new();
        let targets: Vec<Vec<f64>> = kept_labels.iter()
            .map(|label| {
                let idx = index[label.as_str()];
                let target = if self.nominal {
                    let mut one_hot = vec![0.0; order.len()];
                    one_hot[idx] = 1.0;
                    one_hot
                } else {
                    vec![idx as f64]
                };
                label_set.insert(label, target.clone());
                target
            })
            .collect();

        self.inputs = kept_inputs;
        self.targets = targets;
        self.labels = Arc::new(label_set);
        self.source = DatasetSource::Ingested { path: None };
        self.cursor = 0;
        Ok(())
    }

    /// Re-encodes every target with `reference`'s label set, so a separately
    /// ingested testing file matches the encoding a network was trained on.
    ///
    /// Fails if a label is unknown to `reference`; nothing is changed then.
    pub fn align_labels(&mut self, reference: &Dataset) -> Result<()> {
        let targets = self.targets.iter()
            .map(|target| {
                let label = self.labels.best_match(target);
                reference.labels.categories().iter()
                    .find(|c| c.label == label)
                    .map(|c| c.value.clone())
                    .ok_or_else(|| Error::MalformedInput(format!("label '{label}' is not in the reference dataset")))
            })
            .collect::<Result<Vec<_>>>()?;
        self.targets = targets;
        self.labels = Arc::clone(&reference.labels);
        self.nominal = reference.nominal;
        Ok(())
    }

    pub fn is_nominal(&self) -> bool {
        self.nominal
    }

    /// True once instances have been ingested and the cursor is not past the end.
    pub fn has_next(&self) -> bool {
        self.source != DatasetSource::Empty && self.cursor < self.inputs.len()
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    pub fn labels(&self) -> &Arc<LabelSet> {
        &self.labels
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn data_path(&self) -> Option<&str> {
        match &self.source {
            DatasetSource::Ingested { path } => path.as_deref(),
            DatasetSource::Derived { path } => Some(path),
            DatasetSource::Empty => None,
        }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Width of each input row (0 when empty).
    pub fn input_dim(&self) -> usize {
        self.inputs.first().map_or(0, |r| r.len())
    }

    /// Width of each target vector (0 when empty).
    pub fn target_dim(&self) -> usize {
        self.targets.first().map_or(0, |r| r.len())
    }
}
