//! The one [`AudioOutput`] implementation, generic over a [`Device`].

//----------------------------------------------------------------------------------------------- use
use std::{
	borrow::Cow,
	sync::Arc,
};
use crossbeam::channel::{bounded,Receiver,Sender};
use crate::{
	config::OutputConfig,
	error::OutputError,
	feeder::{Feed,Feeder,FeederArgs},
	output::{AudioOutput,Device,Sink,Stats},
	sample::{Fixed,Softclip},
	source::{Silence,Source},
	state::State,
	macros::{debug2,error2,warn2},
};

//----------------------------------------------------------------------------------------------- Slot
/// Where the [`Source`] currently is.
///
/// This moves in lock-step with [`State`].
enum Slot<Link> {
	/// `Uninitialized` or `Closed`, nothing is allocated.
	Idle(Box<dyn Source>),
	/// `Initialized` or `Stopped`, the buffer is allocated.
	Ready(Feed, Link),
	/// `Running`, the [`Feed`] is on the feeder thread.
	Feeding(Feeder, Link),
	/// The feeder thread panicked while holding the [`Feed`].
	Lost,
}

impl<Link> Slot<Link> {
	fn take(&mut self) -> Self {
		std::mem::replace(self, Self::Lost)
	}
}

//----------------------------------------------------------------------------------------------- Output
/// An audio output backed by the [`Device`] `D`.
///
/// This implements the whole [`AudioOutput`] lifecycle once,
/// so every backend behaves the same way. `D` only decides
/// _where_ the samples go.
///
/// Dropping an `Output` stops and closes it.
pub struct Output<D: Device> {
	device: D,
	config: OutputConfig,
	state:  State,
	stats:  Arc<Stats>,
	slot:   Slot<<D::Sink as Sink>::Link>,
	pulse:  (Sender<()>, Receiver<()>),

	// Set by `init()`.
	api:         Cow<'static, str>,
	device_name: String,
	buffer_size: usize,
}

impl<D: Device> Output<D> {
	/// Create an `Uninitialized` output.
	///
	/// Nothing is allocated or acquired until [`AudioOutput::init`].
	pub fn with_device(device: D, config: OutputConfig, source: impl Source) -> Self {
		Self::with_boxed_source(device, config, Box::new(source))
	}

	pub(crate) fn with_boxed_source(device: D, config: OutputConfig, source: Box<dyn Source>) -> Self {
		let stats = Arc::new(Stats::new(config.softclip));

		Self {
			device,
			config,
			state: State::Uninitialized,
			stats,
			slot: Slot::Idle(source),
			pulse: bounded(1),
			api: Cow::Borrowed(""),
			device_name: String::new(),
			buffer_size: 0,
		}
	}

	#[must_use]
	/// The config this output was created with.
	pub const fn config(&self) -> &OutputConfig {
		&self.config
	}

	#[must_use]
	/// Stop and close this output, returning the [`Source`].
	///
	/// If the feeder thread panicked and took the
	/// `Source` with it, [`Silence`] is returned.
	pub fn into_source(mut self) -> Box<dyn Source> {
		if self.state.is_running() {
			drop(self.stop());
		}

		match self.slot.take() {
			Slot::Idle(source) => source,
			Slot::Ready(feed, _) => feed.into_source(),
			// `stop()` above always leaves `Ready` or `Lost`.
			Slot::Feeding(..) | Slot::Lost => Box::new(Silence),
		}
		// `Drop` releases the device.
	}

	fn invalid(&self, op: &'static str) -> OutputError {
		OutputError::InvalidState { op, state: self.state }
	}

	/// A fresh buffer of `buffer_size` frames around `source`.
	fn feed(&self, source: Box<dyn Source>) -> Feed {
		let samples = self.buffer_size * usize::from(self.config.channels);
		let buffer  = vec![Fixed::ZERO; samples].into_boxed_slice();
		let seconds = self.config.duration_of(self.buffer_size).as_secs_f64();
		Feed::new(buffer, source, Arc::clone(&self.stats), seconds, self.pulse.0.clone())
	}

	fn feeder_args(&self) -> FeederArgs {
		FeederArgs {
			pre_buffer_count: self.config.pre_buffer_count,
			realtime:         self.config.realtime,
			buffer_size:      self.buffer_size,
			sample_rate:      self.config.sample_rate,
		}
	}
}

//----------------------------------------------------------------------------------------------- `AudioOutput` Impl
impl<D: Device> AudioOutput for Output<D> {
	#[cold]
	#[inline(never)]
	fn init(&mut self) -> Result<(), OutputError> {
		debug2!("Output - init(), {:?}", self.config);

		if self.state != State::Uninitialized {
			return Err(self.invalid("init"));
		}

		self.config.validate()?;
		let acquired = self.device.acquire(&self.config)?;

		let source = match self.slot.take() {
			Slot::Idle(source) => source,
			other => {
				// Unreachable while the state is `Uninitialized`.
				self.slot = other;
				self.device.release();
				return Err(self.invalid("init"));
			},
		};

		self.buffer_size = acquired.buffer_size;
		let feed = self.feed(source);

		debug2!(
			"Output - init() ... OK, api: {}, device: {}, buffer_size: {} (requested {}), samples: {}",
			acquired.api,
			acquired.device,
			acquired.buffer_size,
			self.config.buffer_size,
			feed.len(),
		);

		self.api         = acquired.api;
		self.device_name = acquired.device;
		self.slot        = Slot::Ready(feed, acquired.link);
		self.state       = State::Initialized;
		Ok(())
	}

	#[cold]
	#[inline(never)]
	fn start(&mut self) -> Result<(), OutputError> {
		debug2!("Output - start()");

		if self.state != State::Initialized {
			return Err(self.invalid("start"));
		}

		let (feed, link) = match self.slot.take() {
			Slot::Ready(feed, link) => (feed, link),
			Slot::Lost => return Err(OutputError::FeederPanicked),
			other => {
				self.slot = other;
				return Err(self.invalid("start"));
			},
		};

		match Feeder::spawn::<D::Sink>(feed, link.clone(), self.feeder_args()) {
			Ok(feeder) => {
				self.slot  = Slot::Feeding(feeder, link);
				self.state = State::Running;
				debug2!("Output - start() ... OK");
				Ok(())
			},
			Err((e, Some(feed))) => {
				warn2!("Output - start() failed: {e}");
				self.slot = Slot::Ready(feed, link);
				Err(e)
			},
			Err((e, None)) => {
				// Still retryable, but the source is gone for good.
				error2!("Output - start() failed, feeder lost the source: {e}");
				self.slot = Slot::Ready(self.feed(Box::new(Silence)), link);
				Err(e)
			},
		}
	}

	#[cold]
	#[inline(never)]
	fn stop(&mut self) -> Result<(), OutputError> {
		debug2!("Output - stop()");

		if self.state != State::Running {
			return Err(self.invalid("stop"));
		}

		let result = match self.slot.take() {
			Slot::Feeding(feeder, link) => match feeder.stop() {
				Ok(feed) => {
					self.slot = Slot::Ready(feed, link);
					Ok(())
				},
				Err(e) => Err(e),
			},
			other => {
				self.slot = other;
				Ok(())
			},
		};

		self.state = State::Stopped;
		debug2!("Output - stop() ... stream_time: {}, cycles: {}", self.stats.stream_time(), self.stats.cycles());
		result
	}

	#[cold]
	#[inline(never)]
	fn close(&mut self) -> Result<(), OutputError> {
		match self.state {
			State::Closed => return Ok(()),
			State::Running => return Err(self.invalid("close")),
			_ => debug2!("Output - close()"),
		}

		if self.state.is_acquired() {
			self.device.release();
		}

		// Free the buffer, keep the source.
		self.slot = match self.slot.take() {
			Slot::Ready(feed, _) => Slot::Idle(feed.into_source()),
			other => other,
		};

		self.state = State::Closed;
		Ok(())
	}

	fn state(&self) -> State {
		self.state
	}

	fn clipped(&self) -> bool {
		self.stats.clipped()
	}

	fn played_buffer_percentage(&self) -> u8 {
		self.stats.played_percentage()
	}

	fn audio_api(&self) -> &str {
		&self.api
	}

	fn audio_device(&self) -> &str {
		&self.device_name
	}

	fn buffer_size(&self) -> usize {
		self.buffer_size
	}

	fn requested_buffer_size(&self) -> usize {
		self.config.buffer_size
	}

	fn pre_buffer_count(&self) -> usize {
		self.config.pre_buffer_count
	}

	fn stream_time(&self) -> f64 {
		self.stats.stream_time()
	}

	fn dropped_buffers(&self) -> u64 {
		self.stats.dropped()
	}

	fn cycles(&self) -> u64 {
		self.stats.cycles()
	}

	fn set_softclip(&mut self, low: Fixed, high: Fixed) {
		self.stats.set_softclip(Softclip::new(low, high));
	}

	fn pulse(&self) -> Receiver<()> {
		self.pulse.1.clone()
	}
}

impl<D: Device> Drop for Output<D> {
	fn drop(&mut self) {
		if self.state.is_running() {
			if let Err(e) = self.stop() {
				error2!("Output - stop() on drop failed: {e}");
			}
		}
		drop(self.close());
	}
}

impl<D: Device + std::fmt::Debug> std::fmt::Debug for Output<D> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Output")
			.field("device", &self.device)
			.field("config", &self.config)
			.field("state", &self.state)
			.field("stats", &self.stats)
			.field("api", &self.api)
			.field("device_name", &self.device_name)
			.field("buffer_size", &self.buffer_size)
			.finish_non_exhaustive()
	}
}

//----------------------------------------------------------------------------------------------- TESTS
#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::{counting_source,Capture};
	use pretty_assertions::assert_eq;
	use std::{
		sync::atomic::{AtomicUsize,Ordering},
		time::Duration,
	};

	fn config() -> OutputConfig {
		OutputConfig::with_buffer_size(5)
	}

	#[test]
	fn lifecycle() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);
		assert_eq!(output.state(), State::Uninitialized);

		output.init().unwrap();
		assert_eq!(output.state(), State::Initialized);
		output.start().unwrap();
		assert_eq!(output.state(), State::Running);
		assert!(capture.played());
		std::thread::sleep(Duration::from_millis(20));
		output.stop().unwrap();
		assert_eq!(output.state(), State::Stopped);
		output.close().unwrap();
		assert_eq!(output.state(), State::Closed);
		assert_eq!(capture.released(), 1);

		// A second close is a no-op.
		output.close().unwrap();
		assert_eq!(output.state(), State::Closed);
		assert_eq!(capture.released(), 1);
	}

	#[test]
	fn queries_before_init() {
		let output = Capture::default().output(config(), Silence);
		assert_eq!(output.audio_api(), "");
		assert_eq!(output.audio_device(), "");
		assert_eq!(output.buffer_size(), 0);
		assert_eq!(output.requested_buffer_size(), 5);
		assert_eq!(output.pre_buffer_count(), config().pre_buffer_count);
		assert_eq!(output.stream_time(), 0.0);
		assert_eq!(output.cycles(), 0);
		assert!(!output.clipped());
	}

	#[test]
	fn init_snaps_buffer_size() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);
		output.init().unwrap();

		assert_eq!(output.audio_api(), "capture");
		assert_eq!(output.audio_device(), "capture");
		assert_eq!(output.buffer_size(), 6);
		assert_eq!(output.requested_buffer_size(), 5);

		output.start().unwrap();
		output.stop().unwrap();
		// Frames times channels.
		assert_eq!(capture.written()[0].len(), 6 * 2);
	}

	#[test]
	fn double_init() {
		let mut output = Capture::default().output(config(), Silence);
		output.init().unwrap();

		let e = output.init().unwrap_err();
		assert!(e.is_invalid_state());
		assert_eq!(output.state(), State::Initialized);
		assert_eq!(output.buffer_size(), 6);
	}

	#[test]
	fn init_failure_is_retryable() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);

		capture.fail_acquire(true);
		assert!(matches!(output.init(), Err(OutputError::DeviceUnavailable)));
		assert_eq!(output.state(), State::Uninitialized);

		capture.fail_acquire(false);
		output.init().unwrap();
		assert_eq!(output.state(), State::Initialized);
	}

	#[test]
	fn init_rejects_bad_config() {
		let mut output = Capture::default().output(OutputConfig::with_buffer_size(0), Silence);
		assert!(matches!(output.init(), Err(OutputError::InvalidBufferSize(0))));
		assert_eq!(output.state(), State::Uninitialized);

		// Rejected before anything is allocated.
		let huge = OutputConfig { buffer_size: 20_000, channels: u16::MAX, ..OutputConfig::DEFAULT };
		let mut output = Capture::default().output(huge, Silence);
		assert!(matches!(output.init(), Err(OutputError::InvalidBufferSize(20_000))));
		assert_eq!(output.state(), State::Uninitialized);
		assert_eq!(output.buffer_size(), 0);

		let deep = OutputConfig { pre_buffer_count: usize::MAX, ..config() };
		let mut output = Capture::default().output(deep, Silence);
		assert!(matches!(output.init(), Err(OutputError::InvalidPreBufferCount(_))));
	}

	#[test]
	fn start_failure_is_retryable() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);
		output.init().unwrap();

		capture.fail_connect(true);
		assert!(matches!(output.start(), Err(OutputError::DeviceUnavailable)));
		assert_eq!(output.state(), State::Initialized);

		capture.fail_connect(false);
		output.start().unwrap();
		assert_eq!(output.state(), State::Running);
		output.stop().unwrap();
	}

	#[test]
	fn start_survives_connect_panic() {
		let count = Arc::new(AtomicUsize::new(0));
		let capture = Capture::default();
		let mut output = capture.output(config(), counting_source(&count));
		output.init().unwrap();

		capture.panic_connects(1);
		assert!(matches!(output.start(), Err(OutputError::BackendPanicked)));
		assert_eq!(output.state(), State::Initialized);
		assert!(!capture.played());

		// Same buffer, same source.
		output.start().unwrap();
		assert_eq!(output.state(), State::Running);
		std::thread::sleep(Duration::from_millis(10));
		output.stop().unwrap();
		assert!(count.load(Ordering::Acquire) > 0);
		assert_eq!(capture.written()[0].len(), 6 * 2);
	}

	#[test]
	fn write_panics_are_counted() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);
		output.init().unwrap();
		capture.panic_writes(true);
		output.start().unwrap();

		std::thread::sleep(Duration::from_millis(10));
		let cycles = output.cycles();
		std::thread::sleep(Duration::from_millis(10));
		assert!(output.cycles() > cycles);
		assert_eq!(output.state(), State::Running);

		output.stop().unwrap();
		assert_eq!(output.state(), State::Stopped);
		assert!(output.dropped_buffers() > 0);
		assert_eq!(output.dropped_buffers(), output.cycles());
		assert_eq!(output.stream_time(), 0.0);
	}

	#[test]
	fn pulses_while_running() {
		let mut output = Capture::default().output(config(), Silence);
		let pulse = output.pulse();
		assert!(pulse.try_recv().is_err());

		output.init().unwrap();
		assert!(pulse.try_recv().is_err());

		output.start().unwrap();
		pulse.recv_timeout(Duration::from_secs(5)).unwrap();
		pulse.recv_timeout(Duration::from_secs(5)).unwrap();
		output.stop().unwrap();

		// Nothing after the feeder is joined.
		drop(pulse.try_recv());
		std::thread::sleep(Duration::from_millis(10));
		assert!(pulse.try_recv().is_err());
	}

	#[test]
	fn misuse_changes_nothing() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);

		assert!(output.start().unwrap_err().is_invalid_state());
		assert!(output.stop().unwrap_err().is_invalid_state());
		assert_eq!(output.state(), State::Uninitialized);

		output.init().unwrap();
		assert!(output.stop().unwrap_err().is_invalid_state());
		assert_eq!(output.state(), State::Initialized);

		// The buffer is still usable.
		output.start().unwrap();
		assert!(output.start().unwrap_err().is_invalid_state());
		assert!(output.init().unwrap_err().is_invalid_state());

		let e = output.close().unwrap_err();
		assert_eq!(e.to_string(), "`close()` is invalid in state `running`");
		assert_eq!(output.state(), State::Running);

		output.stop().unwrap();
		assert!(output.stop().unwrap_err().is_invalid_state());
		assert!(output.start().unwrap_err().is_invalid_state());
		output.close().unwrap();

		assert!(output.init().unwrap_err().is_invalid_state());
		assert_eq!(output.state(), State::Closed);
	}

	#[test]
	fn close_without_init() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);
		output.close().unwrap();
		assert_eq!(output.state(), State::Closed);
		// Nothing was acquired, nothing is released.
		assert_eq!(capture.released(), 0);
	}

	#[test]
	fn source_is_frozen_after_stop() {
		let count = Arc::new(AtomicUsize::new(0));
		let mut output = Capture::default().output(config(), counting_source(&count));
		output.init().unwrap();
		output.start().unwrap();

		let mut last = 0.0;
		for _ in 0..10 {
			std::thread::sleep(Duration::from_millis(2));
			let now = output.stream_time();
			assert!(now >= last);
			last = now;
		}

		output.stop().unwrap();
		let pulls = count.load(Ordering::Acquire);
		let time  = output.stream_time();
		assert!(pulls > 0);
		assert!(time > 0.0);

		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(count.load(Ordering::Acquire), pulls);
		assert_eq!(output.stream_time(), time);
		assert_eq!(output.cycles(), pulls as u64);
	}

	#[test]
	fn write_errors_are_counted() {
		let capture = Capture::default();
		let mut output = capture.output(config(), Silence);
		output.init().unwrap();
		capture.fail_writes(true);
		output.start().unwrap();
		std::thread::sleep(Duration::from_millis(10));
		output.stop().unwrap();

		assert!(output.dropped_buffers() > 0);
		assert_eq!(output.dropped_buffers(), output.cycles());
		assert_eq!(output.stream_time(), 0.0);
	}

	#[test]
	fn softclip_applies_while_running() {
		let capture = Capture::default();
		let loud = |buf: &mut [Fixed]| buf.fill(Fixed(Fixed::ONE.0 * 2));
		let mut output = capture.output(config(), loud);
		output.init().unwrap();
		output.start().unwrap();

		output.set_softclip(Fixed::ONE, Fixed(-Fixed::ONE.0));
		std::thread::sleep(Duration::from_millis(20));
		assert!(output.clipped());
		output.stop().unwrap();

		let written = capture.written();
		assert_eq!(written.last().unwrap(), &vec![Fixed::ONE; 12]);
	}

	#[test]
	fn into_source() {
		let mut output = Capture::default().output(config(), |buf: &mut [Fixed]| buf.fill(Fixed::ONE));
		output.init().unwrap();
		output.start().unwrap();

		let mut source = output.into_source();
		let mut buf = [Fixed::ZERO; 3];
		source.fill(&mut buf);
		assert_eq!(buf, [Fixed::ONE; 3]);
	}

	#[test]
	fn drop_stops_and_releases() {
		let count = Arc::new(AtomicUsize::new(0));
		let capture = Capture::default();
		let mut output = capture.output(config(), counting_source(&count));
		output.init().unwrap();
		output.start().unwrap();
		drop(output);

		let pulls = count.load(Ordering::Acquire);
		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(count.load(Ordering::Acquire), pulls);
		assert_eq!(capture.released(), 1);
	}
}
