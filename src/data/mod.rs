//! Feed loading, feature encoding and training datasets

pub mod dataset;
pub mod features;
pub mod loader;

// Re-export commonly used types
pub use dataset::{DatasetBuilder, Example, TrainingSet};
pub use features::lane_ratio_names;
pub use loader::{load_mice, load_races, parse_mice, parse_races};
