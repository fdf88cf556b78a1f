//! Report rendering for dashboard result sets.

pub mod generator;

pub use generator::*;
