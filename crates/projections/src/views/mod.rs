//! Read model views.

mod product_quality;

pub use product_quality::{ProductQualitySummary, ProductQualityView};
