//! Null audio output.
//!
//! This implements [`Device`] and [`Sink`] with a fake
//! backend that doesn't connect to anything.
//!
//! Functionally, it behaves the exact same as other
//! backends: the feeder thread pulls from the [`Source`](crate::Source)
//! at the pace real hardware would, the samples just go nowhere.
//!
//! This is used for headless operation, testing,
//! and as the fallback when no audio device exists.

//----------------------------------------------------------------------------------------------- use
use std::{
	borrow::Cow,
	sync::Arc,
	time::Duration,
};
use crate::{
	config::OutputConfig,
	error::OutputError,
	output::{Acquired,Device,Output,Pacing,Sink,Stats},
	sample::Fixed,
	source::Source,
	macros::trace2,
};

//----------------------------------------------------------------------------------------------- Null
/// The null [`Device`].
///
/// Nothing is acquired, the buffer size is used as-is.
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq)]
pub struct Null;

/// An audio output that discards everything.
///
/// ```rust
/// # use outloop::*;
/// let mut output = NullOutput::new(OutputConfig::with_buffer_size(333), Silence);
/// output.init().unwrap();
/// assert_eq!(output.audio_api(), "null");
/// assert_eq!(output.buffer_size(), 333);
/// ```
pub type NullOutput = Output<Null>;

impl Output<Null> {
	/// Create an `Uninitialized` null output.
	pub fn new(config: OutputConfig, source: impl Source) -> Self {
		Self::with_device(Null, config, source)
	}
}

impl Device for Null {
	type Sink = NullSink;

	fn acquire(&mut self, config: &OutputConfig) -> Result<Acquired<Duration>, OutputError> {
		Ok(Acquired {
			api:         Cow::Borrowed("null"),
			device:      "null".into(),
			buffer_size: config.buffer_size,
			// 1 buffer's worth of real time.
			link:        config.duration_of(config.buffer_size),
		})
	}
}

//----------------------------------------------------------------------------------------------- NullSink
/// The [`Sink`] of [`Null`].
///
/// Takes 1 buffer's worth of time per cycle and throws the samples away.
#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub struct NullSink {
	period: Duration,
}

impl Sink for NullSink {
	type Link = Duration;

	fn connect(period: Duration, _: Arc<Stats>) -> Result<Self, OutputError> {
		Ok(Self { period })
	}

	fn write(&mut self, samples: &[Fixed]) -> Result<(), OutputError> {
		trace2!("NullSink - discarding {} samples", samples.len());
		Ok(())
	}

	fn pacing(&self) -> Pacing {
		Pacing::Timed(self.period)
	}

	fn softclip(&self) -> bool {
		false
	}
}
