//! Backend selection with fallback.

//---------------------------------------------------------------------------------------------------- Use
use crate::{
	config::{OutputConfig,OutputKind},
	error::OutputError,
	output::{AudioOutput,Device,Null,Output},
	source::Source,
	state::State,
	macros::{error2,info2,warn2},
};

//---------------------------------------------------------------------------------------------------- AudioManager
/// The single owner of the active [`AudioOutput`].
///
/// [`AudioManager::open`] picks a backend, starts it,
/// and falls back to [`OutputKind::Null`] if that fails,
/// so audio generation keeps running even without a
/// working audio device.
///
/// ```rust
/// # use outloop::*;
/// let mut manager = AudioManager::open(OutputKind::Null, OutputConfig::DEFAULT, Silence).unwrap();
/// assert_eq!(manager.kind(), OutputKind::Null);
/// assert_eq!(manager.output().state(), State::Running);
///
/// manager.shutdown().unwrap();
/// assert_eq!(manager.output().state(), State::Closed);
/// ```
pub struct AudioManager {
	output: Box<dyn AudioOutput>,
	kind: OutputKind,
}

/// A failed [`launch`], with the [`Source`] handed back.
type LaunchError = (OutputError, Box<dyn Source>);

impl AudioManager {
	#[cold]
	#[inline(never)]
	/// Open, `init()` and `start()` the `kind` backend.
	///
	/// If `kind` is not [`OutputKind::Null`] and any step fails (or
	/// it wasn't compiled in), a warning is logged, it is closed, and
	/// the null backend is opened with the same `config` and `source`.
	///
	/// # Errors
	/// Only if the null backend fails too, which
	/// means `config` is invalid or no thread could be spawned.
	pub fn open(kind: OutputKind, config: OutputConfig, source: impl Source) -> Result<Self, OutputError> {
		info2!("AudioManager - open({kind})");

		match kind {
			OutputKind::Null => Self::null(config, Box::new(source)),
			OutputKind::Cpal => Self::open_cpal(config, Box::new(source)),
		}
	}

	#[cfg(feature = "cpal")]
	fn open_cpal(config: OutputConfig, source: Box<dyn Source>) -> Result<Self, OutputError> {
		Self::with_fallback(crate::output::Cpal, OutputKind::Cpal, config, source)
	}

	#[cfg(not(feature = "cpal"))]
	fn open_cpal(config: OutputConfig, source: Box<dyn Source>) -> Result<Self, OutputError> {
		warn2!("AudioManager - cpal was not compiled in, falling back to null");
		Self::null(config, source)
	}

	/// Launch `device`, or the null backend if that fails.
	#[cfg_attr(not(feature = "cpal"), allow(dead_code))]
	pub(crate) fn with_fallback<D: Device>(
		device: D,
		kind: OutputKind,
		config: OutputConfig,
		source: Box<dyn Source>,
	) -> Result<Self, OutputError> {
		match launch(device, config.clone(), source) {
			Ok(output) => {
				info2!("AudioManager - {kind} is running on {}", output.audio_device());
				Ok(Self { output, kind })
			},
			Err((e, source)) => {
				warn2!("AudioManager - {kind} failed: {e}, falling back to null");
				Self::null(config, source)
			},
		}
	}

	fn null(config: OutputConfig, source: Box<dyn Source>) -> Result<Self, OutputError> {
		match launch(Null, config, source) {
			Ok(output) => Ok(Self { output, kind: OutputKind::Null }),
			Err((e, _)) => {
				error2!("AudioManager - null failed: {e}");
				Err(e)
			},
		}
	}

	#[must_use]
	/// The active output.
	pub fn output(&self) -> &dyn AudioOutput {
		self.output.as_ref()
	}

	#[must_use]
	/// The active output, mutably.
	pub fn output_mut(&mut self) -> &mut dyn AudioOutput {
		self.output.as_mut()
	}

	#[must_use]
	/// The backend that ended up active.
	///
	/// This is [`OutputKind::Null`] after a fallback.
	pub const fn kind(&self) -> OutputKind {
		self.kind
	}

	#[cold]
	#[inline(never)]
	/// Stop (if running) and close the active output.
	///
	/// The output is closed even if stopping failed.
	///
	/// # Errors
	/// The first error from `stop()` or `close()`.
	pub fn shutdown(&mut self) -> Result<(), OutputError> {
		info2!("AudioManager - shutdown()");

		let stopped = if self.output.state() == State::Running {
			self.output.stop()
		} else {
			Ok(())
		};

		let closed = self.output.close();
		stopped.and(closed)
	}
}

impl Drop for AudioManager {
	fn drop(&mut self) {
		if self.output.state() == State::Closed {
			return;
		}
		if let Err(e) = self.shutdown() {
			error2!("AudioManager - shutdown() on drop failed: {e}");
		}
	}
}

impl std::fmt::Debug for AudioManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AudioManager")
			.field("kind", &self.kind)
			.field("state", &self.output.state())
			.field("audio_api", &self.output.audio_api())
			.field("audio_device", &self.output.audio_device())
			.finish_non_exhaustive()
	}
}

//---------------------------------------------------------------------------------------------------- Launch
/// `init()` and `start()` an [`Output`] around `device`.
///
/// On failure the output is closed and the [`Source`] is returned.
fn launch<D: Device>(
	device: D,
	config: OutputConfig,
	source: Box<dyn Source>,
) -> Result<Box<dyn AudioOutput>, LaunchError> {
	let mut output = Output::with_boxed_source(device, config, source);

	match output.init().and_then(|()| output.start()) {
		Ok(()) => Ok(Box::new(output)),
		Err(e) => Err((e, output.into_source())),
	}
}

//---------------------------------------------------------------------------------------------------- TESTS
#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		tests::{counting_source,Capture},
		Silence,
	};
	use pretty_assertions::assert_eq;
	use std::{
		sync::{
			Arc,
			atomic::{AtomicUsize,Ordering},
		},
		time::Duration,
	};

	fn config() -> OutputConfig {
		OutputConfig::with_buffer_size(64)
	}

	#[test]
	fn open_null() {
		let mut manager = AudioManager::open(OutputKind::Null, config(), Silence).unwrap();
		assert_eq!(manager.kind(), OutputKind::Null);
		assert_eq!(manager.output().audio_api(), "null");
		assert_eq!(manager.output().state(), State::Running);

		manager.shutdown().unwrap();
		assert_eq!(manager.output().state(), State::Closed);
		// Again is fine.
		manager.shutdown().unwrap();
	}

	#[test]
	fn no_fallback_when_working() {
		let capture = Capture::default();
		let manager = AudioManager::with_fallback(capture.clone(), OutputKind::Cpal, config(), Box::new(Silence)).unwrap();
		assert_eq!(manager.kind(), OutputKind::Cpal);
		assert_eq!(manager.output().audio_api(), "capture");
		assert!(capture.played());
	}

	#[test]
	fn fallback_on_init_failure() {
		let count = Arc::new(AtomicUsize::new(0));
		let capture = Capture::default();
		capture.fail_acquire(true);

		let manager = AudioManager::with_fallback(
			capture.clone(),
			OutputKind::Cpal,
			config(),
			Box::new(counting_source(&count)),
		).unwrap();

		assert_eq!(manager.kind(), OutputKind::Null);
		assert_eq!(manager.output().audio_api(), "null");
		assert_eq!(manager.output().state(), State::Running);
		assert_eq!(capture.released(), 0);

		// The same source moved over to the null backend.
		let before = count.load(Ordering::Acquire);
		std::thread::sleep(Duration::from_millis(20));
		assert!(count.load(Ordering::Acquire) > before);
	}

	#[test]
	fn fallback_on_start_failure() {
		let capture = Capture::default();
		capture.fail_connect(true);

		let manager = AudioManager::with_fallback(capture.clone(), OutputKind::Cpal, config(), Box::new(Silence)).unwrap();
		assert_eq!(manager.kind(), OutputKind::Null);
		// The failed backend was closed.
		assert_eq!(capture.released(), 1);
	}

	#[test]
	#[cfg(not(feature = "cpal"))]
	fn cpal_not_compiled_in() {
		let manager = AudioManager::open(OutputKind::Cpal, config(), Silence).unwrap();
		assert_eq!(manager.kind(), OutputKind::Null);
	}

	#[test]
	fn null_failure_is_returned() {
		let e = AudioManager::open(OutputKind::Null, OutputConfig::with_buffer_size(0), Silence).unwrap_err();
		assert!(matches!(e, OutputError::InvalidBufferSize(0)));
	}

	#[test]
	fn output_mut() {
		let mut manager = AudioManager::open(OutputKind::Null, config(), Silence).unwrap();
		manager.output_mut().stop().unwrap();
		assert_eq!(manager.output().state(), State::Stopped);
	}

	#[test]
	fn pulse_follows_the_fallback() {
		let capture = Capture::default();
		capture.fail_acquire(true);
		let manager = AudioManager::with_fallback(capture, OutputKind::Cpal, config(), Box::new(Silence)).unwrap();
		assert_eq!(manager.kind(), OutputKind::Null);
		manager.output().pulse().recv_timeout(Duration::from_secs(5)).unwrap();
	}

	#[test]
	fn drop_shuts_down() {
		let count = Arc::new(AtomicUsize::new(0));
		let manager = AudioManager::open(OutputKind::Null, config(), counting_source(&count)).unwrap();
		drop(manager);

		let pulls = count.load(Ordering::Acquire);
		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(count.load(Ordering::Acquire), pulls);
	}
}
