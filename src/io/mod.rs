//! Input/output boundary: codecs, pool, CLI, configuration and errors

/// Command-line parsing and pipeline runner
pub mod cli;
/// Defaults and constants
pub mod configuration;
/// Error type and result alias
pub mod error;
/// Image loading, fitting and saving
pub mod image;
/// Candidate pool contract and in-memory pool
pub mod pool;
/// Per-stage progress bars
pub mod progress;
/// Pipeline observers and GIF capture
pub mod visualization;
