//! The two halves of a backend: [`Device`] and [`Sink`].
//!
//! A backend is split in 2 because of where each half runs:
//!
//! - [`Device`] lives inside [`Output`](crate::Output) on the caller's
//!   thread. It finds the hardware/server, negotiates the buffer
//!   size, and hands out a [`Sink::Link`] describing what it found.
//! - [`Sink`] is built from that link _on the feeder thread_ and
//!   never leaves it, so it is free to hold `!Send` handles
//!   (which OS audio streams usually are).
//!
//! [`Output`](crate::Output) implements the lifecycle on
//! top of these, so a new backend only has to implement
//! these 2 traits to behave exactly like every other one.

//---------------------------------------------------------------------------------------------------- Use
use std::{
	borrow::Cow,
	sync::Arc,
	time::Duration,
};
use crate::{
	config::OutputConfig,
	error::OutputError,
	output::Stats,
	sample::Fixed,
};

//---------------------------------------------------------------------------------------------------- Pacing
/// How the feeder thread paces itself between cycles.
#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub enum Pacing {
	/// Wait this long between the start of each cycle.
	///
	/// Used by sinks that accept a buffer immediately.
	Timed(Duration),

	/// Do not wait, [`Sink::write`] blocks until the
	/// backend accepts the buffer, which paces the loop.
	Blocking,
}

//---------------------------------------------------------------------------------------------------- Acquired
/// What a [`Device`] found in [`Device::acquire`].
#[derive(Clone,Debug)]
pub struct Acquired<Link> {
	/// The audio API name, e.g `"null"` or `"cpal/ALSA"`.
	pub api: Cow<'static, str>,
	/// The device name.
	pub device: String,
	/// The actual buffer size in frames.
	///
	/// This may differ from [`OutputConfig::buffer_size`]
	/// if the hardware needs a specific granularity.
	pub buffer_size: usize,
	/// Everything the [`Sink`] needs to connect.
	pub link: Link,
}

//---------------------------------------------------------------------------------------------------- Device
/// The caller-thread half of a backend.
pub trait Device: Send + 'static {
	/// The feeder-thread half of this backend.
	type Sink: Sink;

	/// Acquire the backend resource.
	///
	/// Called from [`AudioOutput::init`](crate::AudioOutput::init),
	/// `config` has already been validated.
	///
	/// # Errors
	/// Any acquisition failure, e.g [`OutputError::DeviceUnavailable`].
	fn acquire(&mut self, config: &OutputConfig) -> Result<Acquired<<Self::Sink as Sink>::Link>, OutputError>;

	/// Release whatever [`Device::acquire`] acquired.
	///
	/// Called from [`AudioOutput::close`](crate::AudioOutput::close).
	/// By default, this does nothing.
	fn release(&mut self) {}
}

//---------------------------------------------------------------------------------------------------- Sink
/// The feeder-thread half of a backend.
///
/// Every method is called on the feeder thread. A panic in any
/// of them is caught there: during `start()` it fails `start()`
/// with [`OutputError::BackendPanicked`], after that it drops
/// the buffer being written.
pub trait Sink: Sized + 'static {
	/// What the [`Device`] passes over to build this `Sink`.
	///
	/// This is cloned for every [`AudioOutput::start`](crate::AudioOutput::start)
	/// attempt so a failed start can be retried.
	type Link: Clone + Send + 'static;

	/// Connect to the backend.
	///
	/// A failure here fails [`AudioOutput::start`](crate::AudioOutput::start).
	///
	/// # Errors
	/// Any acquisition failure.
	fn connect(link: Self::Link, stats: Arc<Stats>) -> Result<Self, OutputError>;

	/// Start playback.
	///
	/// This is called once, after the pre-buffer cycles
	/// have been written. By default, this does nothing.
	///
	/// # Errors
	/// Any acquisition failure, this fails [`AudioOutput::start`](crate::AudioOutput::start).
	fn play(&mut self) -> Result<(), OutputError> {
		Ok(())
	}

	/// Deliver 1 filled buffer of interleaved samples.
	///
	/// # Errors
	/// A runtime failure. The feeder logs it, counts the buffer
	/// as dropped, and carries on with the next cycle.
	fn write(&mut self, samples: &[Fixed]) -> Result<(), OutputError>;

	/// How the feeder should pace cycles for this sink.
	///
	/// This is read once, right after [`Sink::play`].
	fn pacing(&self) -> Pacing;

	/// Should the soft clip be applied to samples before [`Sink::write`]?
	///
	/// Sinks that nobody listens to can skip it. By default, this is `true`.
	fn softclip(&self) -> bool {
		true
	}
}
