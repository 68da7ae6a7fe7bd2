//! Similarity metrics over paired intensity samples.

pub mod mutual_information;
pub mod trait_;

pub use mutual_information::MutualInformationMetric;
pub use trait_::SimilarityMetric;
