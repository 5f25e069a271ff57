pub mod dai_classifier;
pub mod processing_unit_metadata;

pub use self::dai_classifier::*;
pub use self::processing_unit_metadata::*;
