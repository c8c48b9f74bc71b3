pub mod descriptors;

pub use descriptors::{AttributeStats, DescriptorKind, FeatureDescriptors};
