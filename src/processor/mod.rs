//! Audio processing steps applied to decoded tracks

pub mod section;

pub use section::SectionSlicer;
