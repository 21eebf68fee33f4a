//! Audio output backends.
//!
//! [`AudioOutput`] is the contract, [`Output`] implements it
//! once for any [`Device`], and each backend is a [`Device`]/[`Sink`] pair:
//!
//! | Backend | Output         | Feature |
//! |---------|----------------|---------|
//! | [`Null`]  | [`NullOutput`] | always  |
//! | `Cpal`  | `CpalOutput`   | `cpal`  |

mod output;
pub use output::AudioOutput;

mod device;
pub use device::{Acquired,Device,Pacing,Sink};

mod stats;
pub use stats::{Stats,percentage};

mod lifecycle;
pub use lifecycle::Output;

mod null;
pub use null::{Null,NullOutput,NullSink};

cfg_if::cfg_if! {
	if #[cfg(feature = "cpal")] {
		mod cpal;
		pub use self::cpal::{Cpal,CpalLink,CpalOutput,CpalSink};
	}
}
