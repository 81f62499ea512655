//! Mathematical utilities for the pipeline

/// Lab color distances and multi-point profile distance
pub mod distance;
/// Piecewise-linear curves for level remapping
pub mod interpolation;
