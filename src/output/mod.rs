//! Terminal output for job events.

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter, error_summary_block};
