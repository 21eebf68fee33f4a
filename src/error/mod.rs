//! Errors that can occur.

mod output;
pub use output::OutputError;
