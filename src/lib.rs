//! Audio output backends for real-time audio producers.
//!
//! This crate sits between something that _generates_ audio
//! (a tracker, a synth, a mixer) and something that _plays_ it
//! (the OS audio server, or nothing at all).
//!
//! The producer implements [`Source`], an output is picked
//! (see [`OutputKind`] and [`AudioManager`]), and a dedicated
//! feeder thread pulls buffers out of the `Source` and pushes
//! them into the backend until [`AudioOutput::stop`] is called.
//!
//! Every backend goes through the exact same lifecycle:
//!
//! ```text
//! Uninitialized -[init]-> Initialized -[start]-> Running -[stop]-> Stopped -[close]-> Closed
//! ```
//!
//! ```rust
//! # use outloop::*;
//! let mut output = NullOutput::new(OutputConfig::DEFAULT, Silence);
//! output.init().unwrap();
//! output.start().unwrap();
//! std::thread::sleep(std::time::Duration::from_millis(50));
//! output.stop().unwrap();
//! output.close().unwrap();
//! assert_eq!(output.state(), State::Closed);
//! ```

//---------------------------------------------------------------------------------------------------- Lints
#![allow(
    clippy::len_zero,
    clippy::type_complexity,
    clippy::module_inception,
)]

#![deny(
    nonstandard_style,
    deprecated,
    missing_docs,
)]

#![forbid(
    unused_mut,
    unused_unsafe,
    future_incompatible,
    break_with_label_and_loop,
    coherence_leak_check,
    duplicate_macro_attributes,
    exported_private_dependencies,
    for_loops_over_fallibles,
    large_assignments,
    overlapping_range_endpoints,
    semicolon_in_expressions_from_macros,
    redundant_semicolons,
    unconditional_recursion,
    unreachable_patterns,
    unused_allocation,
    unused_braces,
    unused_comparisons,
    unused_doc_comments,
    unused_parens,
    unused_labels,
    while_true,
    keyword_idents,
    non_ascii_idents,
    noop_method_call,
    unreachable_pub,
    single_use_lifetimes,
)]

//---------------------------------------------------------------------------------------------------- Public API
mod sample;
pub use sample::{Fixed, Softclip};

mod source;
pub use source::{Source, Silence};

mod state;
pub use state::State;

pub mod config;
pub use config::{OutputConfig, OutputKind};

pub mod error;
pub use error::OutputError;

pub mod output;
pub use output::{AudioOutput, Output, NullOutput};
#[cfg(feature = "cpal")]
pub use output::CpalOutput;

mod manager;
pub use manager::AudioManager;

//---------------------------------------------------------------------------------------------------- Private Usage
mod atomic;
mod feeder;
mod macros;
