pub mod annotate;
pub mod centroid_extractor;
pub mod contour;
pub mod error_tracker;
pub mod frame;
pub mod inference;
pub mod membership;
pub mod rule_base;
