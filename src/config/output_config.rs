//! Configuration for opening an output.

//---------------------------------------------------------------------------------------------------- use
use std::time::Duration;
use crate::{
	error::OutputError,
	sample::Softclip,
	config::constants::{
		MAX_BUFFER_SAMPLES,
		MAX_BUFFER_FRAMES,
		MAX_PRE_BUFFER_COUNT,
		DEFAULT_BUFFER_SIZE,
		DEFAULT_PRE_BUFFER_COUNT,
		DEFAULT_SAMPLE_RATE,
		DEFAULT_CHANNELS,
		DEFAULT_WRITE_TIMEOUT,
	},
};

#[allow(unused_imports)] // docs
use crate::AudioOutput;

//---------------------------------------------------------------------------------------------------- OutputConfig
/// Configuration for an [`AudioOutput`].
///
/// This is passed once when the output is created and
/// read in [`AudioOutput::init`]; it is fixed for the
/// rest of the output's lifetime, except for the soft
/// clip, which can be changed with [`AudioOutput::set_softclip`].
#[derive(Clone,Debug,PartialEq,Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutputConfig {
	/// The requested buffer size in frames.
	///
	/// One feeding cycle pulls exactly this many frames
	/// (`buffer_size * channels` samples) out of the [`Source`](crate::Source).
	///
	/// Hardware backends may snap this to a size the device
	/// supports, see [`AudioOutput::buffer_size`].
	///
	/// Must be within `1..=MAX_BUFFER_FRAMES`, and
	/// `buffer_size * channels` must not exceed `MAX_BUFFER_SAMPLES`.
	pub buffer_size: usize,

	/// How many buffers to queue before playback starts.
	///
	/// Higher values trade latency for underrun safety.
	/// `0` starts playback right after the first buffer.
	///
	/// Must not exceed `MAX_PRE_BUFFER_COUNT`.
	pub pre_buffer_count: usize,

	/// The sample rate in Hz, must be non-zero.
	pub sample_rate: u32,

	/// The amount of interleaved channels, must be non-zero.
	pub channels: u16,

	/// The soft clip applied from the very first cycle.
	pub softclip: Softclip,

	/// Whether the feeder thread should try to get real-time priority.
	///
	/// This only does something with the `rt` feature.
	/// A failure to promote the thread is logged and ignored.
	pub realtime: bool,

	/// How long a blocking backend may hold one feeding cycle
	/// before that buffer is dropped.
	pub write_timeout: Duration,
}

//---------------------------------------------------------------------------------------------------- OutputConfig Impl
impl OutputConfig {
	/// A reasonable default [`OutputConfig`].
	///
	/// ```rust
	/// # use outloop::*;
	/// assert_eq!(OutputConfig::DEFAULT, OutputConfig {
	///     buffer_size:      1024,
	///     pre_buffer_count: 2,
	///     sample_rate:      44_100,
	///     channels:         2,
	///     softclip:         Softclip::DISABLED,
	///     realtime:         true,
	///     write_timeout:    std::time::Duration::from_millis(250),
	/// });
	/// ```
	pub const DEFAULT: Self = Self {
		buffer_size:      DEFAULT_BUFFER_SIZE,
		pre_buffer_count: DEFAULT_PRE_BUFFER_COUNT,
		sample_rate:      DEFAULT_SAMPLE_RATE,
		channels:         DEFAULT_CHANNELS,
		softclip:         Softclip::DISABLED,
		realtime:         true,
		write_timeout:    DEFAULT_WRITE_TIMEOUT,
	};

	#[must_use]
	/// [`Self::DEFAULT`] with a different `buffer_size`.
	pub const fn with_buffer_size(buffer_size: usize) -> Self {
		let mut this = Self::DEFAULT;
		this.buffer_size = buffer_size;
		this
	}

	/// Check the fields every backend relies on.
	///
	/// # Errors
	/// - [`OutputError::InvalidBufferSize`] if `buffer_size` is `0` or above [`MAX_BUFFER_FRAMES`]
	/// - [`OutputError::InvalidSampleRate`] if `sample_rate` is `0`
	/// - [`OutputError::InvalidChannels`] if `channels` is `0`
	/// - [`OutputError::InvalidBufferSize`] if `buffer_size * channels` is above [`MAX_BUFFER_SAMPLES`]
	/// - [`OutputError::InvalidPreBufferCount`] if `pre_buffer_count` is above [`MAX_PRE_BUFFER_COUNT`]
	pub fn validate(&self) -> Result<(), OutputError> {
		if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_FRAMES {
			return Err(OutputError::InvalidBufferSize(self.buffer_size));
		}
		if self.sample_rate == 0 {
			return Err(OutputError::InvalidSampleRate(self.sample_rate));
		}
		if self.channels == 0 {
			return Err(OutputError::InvalidChannels(self.channels));
		}
		match self.buffer_size.checked_mul(usize::from(self.channels)) {
			Some(samples) if samples <= MAX_BUFFER_SAMPLES => (),
			_ => return Err(OutputError::InvalidBufferSize(self.buffer_size)),
		}
		if self.pre_buffer_count > MAX_PRE_BUFFER_COUNT {
			return Err(OutputError::InvalidPreBufferCount(self.pre_buffer_count));
		}
		Ok(())
	}

	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	/// How long `frames` frames take to play at this sample rate.
	///
	/// `0` if the sample rate is `0`.
	pub fn duration_of(&self, frames: usize) -> Duration {
		if self.sample_rate == 0 {
			return Duration::ZERO;
		}

		Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
	}
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self::DEFAULT
	}
}
