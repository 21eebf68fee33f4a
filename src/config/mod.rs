//! Configuration for an [`AudioOutput`](crate::AudioOutput).

mod output_config;
pub use output_config::OutputConfig;

mod kind;
pub use kind::OutputKind;

mod constants;
pub use constants::{
	MAX_BUFFER_SAMPLES,
	MAX_BUFFER_FRAMES,
	MAX_PRE_BUFFER_COUNT,
	DEFAULT_BUFFER_SIZE,
	DEFAULT_PRE_BUFFER_COUNT,
	DEFAULT_SAMPLE_RATE,
	DEFAULT_CHANNELS,
	DEFAULT_WRITE_TIMEOUT,
};
