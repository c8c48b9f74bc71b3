pub mod csv;
pub mod dataset;
pub mod labels;
pub mod partition;

pub use dataset::{Dataset, DatasetSource};
pub use labels::{LabelDistance, LabelSet, NominalCategory, UNKNOWN_CATEGORY};
pub use partition::DatasetPartition;
