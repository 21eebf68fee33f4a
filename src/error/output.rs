//! Errors returned by [`AudioOutput`](crate::AudioOutput).

//---------------------------------------------------------------------------------------------------- Use
use std::borrow::Cow;
use crate::state::State;

//---------------------------------------------------------------------------------------------------- OutputError
/// Error that occurs when acquiring, starting, or writing to an audio output.
///
/// Outputs will generally have the same errors, so instead
/// of being generic per backend, each one conforms to this enum.
///
/// There are 3 kinds of errors in here:
///
/// 1. Acquisition failures, e.g:
///     - Audio device was unplugged
///     - Audio server is not running
///     - The requested buffer size or format is not supported
///
///    These are returned from `init()` and `start()`, the output is left
///    in the state it was in, and the caller is free to retry or fall back
///    to another backend (see [`AudioManager`](crate::AudioManager)).
///
/// 2. Runtime failures ([`OutputError::Write`], [`OutputError::Timeout`], [`OutputError::StreamClosed`]).
///
///    These happen on the feeder thread and never leave it,
///    they are logged and counted in
///    [`AudioOutput::dropped_buffers`](crate::AudioOutput::dropped_buffers).
///
/// 3. Misuse ([`OutputError::InvalidState`]), e.g `close()` while running.
///
///    Nothing is changed when these are returned.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
	#[error("audio stream was closed")]
	/// The audio stream was closed.
	StreamClosed,

	#[error("audio hardware/server is unavailable")]
	/// The audio hardware/server is unavailable.
	DeviceUnavailable,

	#[error("audio format is invalid or unsupported")]
	/// The audio format is invalid or unsupported.
	InvalidFormat,

	#[error("failed to write samples to the audio stream")]
	/// Failed to write samples to the audio stream.
	Write,

	#[error("audio stream did not accept samples in time")]
	/// The audio stream did not accept a buffer within
	/// [`OutputConfig::write_timeout`](crate::OutputConfig::write_timeout).
	Timeout,

	#[error("audio buffer size is invalid: {0}")]
	/// The requested buffer size (in frames) was
	/// `0`, above [`MAX_BUFFER_FRAMES`](crate::config::MAX_BUFFER_FRAMES),
	/// or more than [`MAX_BUFFER_SAMPLES`](crate::config::MAX_BUFFER_SAMPLES)
	/// once multiplied by the channel count.
	InvalidBufferSize(usize),

	#[error("pre-buffer count is invalid: {0}")]
	/// The pre-buffer count was above
	/// [`MAX_PRE_BUFFER_COUNT`](crate::config::MAX_PRE_BUFFER_COUNT).
	InvalidPreBufferCount(usize),

	#[error("audio sample rate is invalid: {0}")]
	/// The sample rate was `0` or unsupported.
	InvalidSampleRate(u32),

	#[error("audio channel count is invalid: {0}")]
	/// The channel count was `0` or unsupported.
	InvalidChannels(u16),

	#[error("failed to spawn the feeder thread: {0}")]
	/// The OS refused to spawn the feeder thread.
	ThreadSpawn(#[from] std::io::Error),

	#[error("the feeder thread panicked")]
	/// The feeder thread panicked and could not be joined cleanly.
	FeederPanicked,

	#[error("the audio backend panicked while starting")]
	/// The backend panicked while connecting or starting playback.
	///
	/// The panic was contained on the feeder thread,
	/// so `start()` can be retried.
	BackendPanicked,

	#[error("`{op}()` is invalid in state `{state}`")]
	/// The operation is not valid in the current [`State`].
	InvalidState {
		/// The operation that was attempted.
		op: &'static str,
		/// The state the output was in.
		state: State,
	},

	#[error("unknown error: {0}")]
	/// An unknown or very specific error occurred.
	///
	/// The `str` will contain more information.
	Unknown(Cow<'static, str>),
}

impl OutputError {
	#[must_use]
	/// Returns `true` if this is a [`OutputError::InvalidState`].
	pub const fn is_invalid_state(&self) -> bool {
		matches!(self, Self::InvalidState { .. })
	}
}
