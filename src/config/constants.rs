//! Default values and limits for [`OutputConfig`](crate::OutputConfig).

//---------------------------------------------------------------------------------------------------- Use
use std::time::Duration;

//---------------------------------------------------------------------------------------------------- Constants
/// The most samples (`buffer_size * channels`) 1 buffer may hold.
pub const MAX_BUFFER_SAMPLES: usize = 40_000;

/// The largest buffer size (in frames) an output accepts.
///
/// This is [`MAX_BUFFER_SAMPLES`] split into 2 channels. Outputs
/// with more channels are further limited by [`MAX_BUFFER_SAMPLES`].
pub const MAX_BUFFER_FRAMES: usize = MAX_BUFFER_SAMPLES / 2;

/// The most buffers that may be queued before playback starts.
pub const MAX_PRE_BUFFER_COUNT: usize = 16;

/// Default requested buffer size in frames.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Default amount of buffers queued before playback starts.
pub const DEFAULT_PRE_BUFFER_COUNT: usize = 2;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default channel count (stereo).
pub const DEFAULT_CHANNELS: u16 = 2;

/// Default time a blocking backend may take to accept 1 buffer.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(250);
