//! Audio output contract.
//!
//! This file defines the trait every audio output satisfies,
//! regardless of where the samples actually end up
//! (the OS audio server, or nowhere at all).
//!
//! The trait `AudioOutput` is the ideal abstract
//! simplification of what this part of the system should do,
//! [`Output`](crate::Output) is the one implementation of it,
//! generic over the backend-specific [`Device`](crate::output::Device).

//----------------------------------------------------------------------------------------------- use
use crossbeam::channel::Receiver;
use crate::{
	error::OutputError,
	sample::Fixed,
	state::State,
};

#[allow(unused_imports)] // docs
use crate::{Source,OutputConfig};

//----------------------------------------------------------------------------------------------- AudioOutput Trait
/// A uniform audio output, independent of its backend.
///
/// Callers hold a `Box<dyn AudioOutput>` and never need to know which backend is behind it.
///
/// # Lifecycle
/// ```text
/// Uninitialized -[init]-> Initialized -[start]-> Running -[stop]-> Stopped -[close]-> Closed
/// ```
///
/// - `init()`/`start()` failing leaves the [`State`] as it was, so they can be retried
/// - calling an operation in the wrong state returns [`OutputError::InvalidState`] and changes nothing
/// - `close()` on an already [`State::Closed`] output is a no-op
///
/// # Threads
/// `start()` spawns 1 feeder thread which pulls from the
/// [`Source`] and writes into the backend, over and over.
/// `stop()` joins it: after `stop()` returns, the `Source`
/// will not be pulled again.
///
/// The sample buffer lives on the feeder thread while running.
/// Every query here reads atomics and never blocks on it.
pub trait AudioOutput: Send {
	//------------------------------------------ Lifecycle
	/// Allocate the sample buffer and acquire the backend.
	///
	/// `Uninitialized` -> `Initialized`.
	///
	/// # Errors
	/// - [`OutputError::InvalidState`] if not `Uninitialized`
	///   (including a second `init()`); nothing is changed
	/// - any acquisition failure, e.g [`OutputError::DeviceUnavailable`]
	///   or [`OutputError::InvalidBufferSize`]; the output stays `Uninitialized`
	fn init(&mut self) -> Result<(), OutputError>;

	/// Spawn the feeder thread and begin feeding.
	///
	/// `Initialized` -> `Running`.
	///
	/// This returns once the pre-buffer cycles
	/// ([`OutputConfig::pre_buffer_count`]) are written and
	/// playback has started.
	///
	/// # Errors
	/// - [`OutputError::InvalidState`] if not `Initialized`
	/// - [`OutputError::ThreadSpawn`], a backend connection error, or
	///   [`OutputError::BackendPanicked`]; the output stays `Initialized`
	fn start(&mut self) -> Result<(), OutputError>;

	/// Stop feeding and join the feeder thread.
	///
	/// `Running` -> `Stopped`.
	///
	/// This blocks until the feeder thread has exited.
	///
	/// # Errors
	/// - [`OutputError::InvalidState`] if not `Running`; nothing is changed
	/// - [`OutputError::FeederPanicked`] if the thread did not exit cleanly;
	///   the output is still `Stopped`
	fn stop(&mut self) -> Result<(), OutputError>;

	/// Release everything `init()` acquired.
	///
	/// `Uninitialized | Initialized | Stopped` -> `Closed`.
	///
	/// Calling this on a `Closed` output does nothing.
	///
	/// # Errors
	/// [`OutputError::InvalidState`] if `Running`, `stop()` first.
	fn close(&mut self) -> Result<(), OutputError>;

	//------------------------------------------ Queries
	/// The current lifecycle state.
	fn state(&self) -> State;

	/// Did the most recent feeding cycle clip any sample?
	fn clipped(&self) -> bool;

	/// How full the backend's output queue is, `0..=100`.
	///
	/// Backends without a queue always return `0`.
	fn played_buffer_percentage(&self) -> u8;

	/// The audio API name, empty before `init()`.
	fn audio_api(&self) -> &str;

	/// The audio device name, empty before `init()`.
	fn audio_device(&self) -> &str;

	/// The actual buffer size in frames, `0` before `init()`.
	///
	/// This may differ from [`AudioOutput::requested_buffer_size`]
	/// when the hardware only supports certain sizes.
	fn buffer_size(&self) -> usize;

	/// The buffer size in frames that was asked for.
	fn requested_buffer_size(&self) -> usize;

	/// How many buffers are queued before playback starts.
	fn pre_buffer_count(&self) -> usize;

	/// Seconds of audio delivered to the backend.
	///
	/// This never decreases, and only advances while
	/// `Running`, once per successful feeding cycle.
	fn stream_time(&self) -> f64;

	/// How many buffers were lost to backend write errors,
	/// a panicking backend or a panicking [`Source`].
	fn dropped_buffers(&self) -> u64;

	/// How many feeding cycles have completed.
	fn cycles(&self) -> u64;

	/// A channel that receives `()` after every feeding cycle.
	///
	/// The channel holds at most 1 pulse, so pulses nobody has
	/// received yet collapse into 1 and the feeder never waits on
	/// a slow receiver. A receiver can block on this to do work in
	/// step with the output, e.g. render the next audio ahead of time.
	///
	/// Every call returns a handle to the same channel.
	///
	/// ```rust
	/// # use outloop::*;
	/// let mut output = NullOutput::new(OutputConfig::with_buffer_size(64), Silence);
	/// let pulse = output.pulse();
	/// output.init().unwrap();
	/// output.start().unwrap();
	/// pulse.recv().unwrap();
	/// output.stop().unwrap();
	/// ```
	fn pulse(&self) -> Receiver<()>;

	//------------------------------------------ Settings
	/// Set the soft clip thresholds used by the following cycles.
	///
	/// This can be called in any state. If `low > high`, they are swapped.
	fn set_softclip(&mut self, low: Fixed, high: Fixed);
}
