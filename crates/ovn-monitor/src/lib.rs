pub mod descriptor;
pub mod error;
pub mod exposition;
pub mod sample;

pub use descriptor::{Descriptor, DescriptorRegistry, DescriptorSpec};
pub use error::MonitorError;
pub use exposition::{content_type, encode_text, metric_families};
pub use sample::{MetricKind, Sample};
