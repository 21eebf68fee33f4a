//! Audio hardware output.
//!
//! This file implements [`Device`] and [`Sink`]
//! using `cpal` as a backend.
//!
//! The [`Sink`] half sends samples over a bounded channel
//! to the `cpal` data callback, which runs on a thread
//! owned by the OS audio server. A full channel blocks
//! [`Sink::write`], which is what paces the feeder thread.
//!
//! Samples only enter and leave that channel in whole
//! frames, so a timeout can't shift the channel order.

//----------------------------------------------------------------------------------------------- use
use std::{
	borrow::Cow,
	sync::Arc,
	time::{Duration,Instant},
};
use crossbeam::channel::{Sender,Receiver,SendTimeoutError};
use cpal::traits::{DeviceTrait,HostTrait,StreamTrait};
use crate::{
	config::{OutputConfig,MAX_BUFFER_FRAMES,MAX_BUFFER_SAMPLES},
	error::OutputError,
	output::{Acquired,Device,Output,Pacing,Sink,Stats,percentage},
	sample::Fixed,
	source::Source,
	macros::{debug2,error2,trace2},
};

//----------------------------------------------------------------------------------------------- Cpal
/// The `cpal` [`Device`].
///
/// This uses the default output device of the default host.
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq)]
pub struct Cpal;

/// An audio output that plays through the OS audio server.
pub type CpalOutput = Output<Cpal>;

impl Output<Cpal> {
	/// Create an `Uninitialized` `cpal` output.
	pub fn new(config: OutputConfig, source: impl Source) -> Self {
		Self::with_device(Cpal, config, source)
	}
}

/// What [`CpalSink`] needs to open a stream.
#[derive(Clone)]
pub struct CpalLink {
	device: cpal::Device,
	config: cpal::StreamConfig,
	/// Samples in 1 buffer.
	samples: usize,
	channels: usize,
	pre_buffer_count: usize,
	write_timeout: Duration,
}

impl std::fmt::Debug for CpalLink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CpalLink")
			.field("config", &self.config)
			.field("samples", &self.samples)
			.field("channels", &self.channels)
			.field("pre_buffer_count", &self.pre_buffer_count)
			.field("write_timeout", &self.write_timeout)
			.finish_non_exhaustive()
	}
}

impl Device for Cpal {
	type Sink = CpalSink;

	#[cold]
	#[inline(never)]
	fn acquire(&mut self, config: &OutputConfig) -> Result<Acquired<CpalLink>, OutputError> {
		debug2!("Cpal - acquire()");

		// Get default host.
		let host = cpal::default_host();

		// Get the default audio output device.
		let Some(device) = host.default_output_device() else {
			return Err(OutputError::DeviceUnavailable);
		};

		// Get the default device config.
		let supported = device.default_output_config()?;
		debug2!("Cpal - device config: {supported:?}");

		// SOMEDAY: support non-f32.
		if supported.sample_format() != cpal::SampleFormat::F32 {
			return Err(OutputError::InvalidFormat);
		}

		let channels = usize::from(config.channels);
		let buffer_size = snap_buffer_size(config.buffer_size, channels, supported.buffer_size());
		// Only possible if the device's minimum is above our maximum.
		if buffer_size * channels > MAX_BUFFER_SAMPLES {
			return Err(OutputError::InvalidBufferSize(buffer_size));
		}
		let frames = u32::try_from(buffer_size).map_err(|_| OutputError::InvalidBufferSize(buffer_size))?;

		let stream_config = cpal::StreamConfig {
			channels:    config.channels,
			sample_rate: cpal::SampleRate(config.sample_rate),
			buffer_size: cpal::BufferSize::Fixed(frames),
		};

		let name = device.name().unwrap_or_else(|_| "unknown".into());
		let api  = format!("cpal/{}", host.id().name());
		debug2!("Cpal - acquired {name} through {api}, buffer_size: {buffer_size}");

		Ok(Acquired {
			api: Cow::Owned(api),
			device: name,
			buffer_size,
			link: CpalLink {
				device,
				config: stream_config,
				samples: buffer_size * channels,
				channels,
				pre_buffer_count: config.pre_buffer_count,
				write_timeout: config.write_timeout,
			},
		})
	}
}

/// Snap `requested` frames to something the hardware will take.
///
/// That is the next power of 2, kept inside what the device
/// reports, [`MAX_BUFFER_FRAMES`] and [`MAX_BUFFER_SAMPLES`].
fn snap_buffer_size(requested: usize, channels: usize, supported: &cpal::SupportedBufferSize) -> usize {
	let limit = (MAX_BUFFER_SAMPLES / channels.max(1)).min(MAX_BUFFER_FRAMES);
	let snapped = requested.checked_next_power_of_two().unwrap_or(limit);

	let (min, max) = match *supported {
		cpal::SupportedBufferSize::Range { min, max } => {
			(min as usize, (max as usize).min(limit))
		},
		cpal::SupportedBufferSize::Unknown => (1, limit),
	};

	// A device reporting `min > max` gets `min`.
	snapped.min(max).max(min)
}

//----------------------------------------------------------------------------------------------- CpalSink
/// The [`Sink`] of [`Cpal`].
///
/// This holds the `cpal::Stream`, which can't
/// leave the feeder thread.
pub struct CpalSink {
	/// We send audio data to this channel which
	/// the audio stream will receive and write.
	queue: FrameQueue,

	/// Errors reported by the stream's error callback.
	error: Receiver<cpal::StreamError>,

	/// The actual audio stream.
	stream: cpal::Stream,

	write_timeout: Duration,
}

impl Sink for CpalSink {
	type Link = CpalLink;

	#[cold]
	#[inline(never)]
	fn connect(link: CpalLink, stats: Arc<Stats>) -> Result<Self, OutputError> {
		debug2!("CpalSink - connect(), {link:?}");

		// Enough room for the pre-buffer and 1 more buffer.
		// Both are capped by `OutputConfig::validate()`, this can't overflow.
		let capacity = link.samples.saturating_mul(link.pre_buffer_count.saturating_add(1));
		let channels = link.channels.max(1);

		let (sender, receiver)       = crossbeam::channel::bounded(capacity);
		let (error_send, error_recv) = crossbeam::channel::bounded(16);

		// The actual callback `cpal` will call when polling for audio data.
		let data_callback = move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
			drain(&receiver, channels, output);
			stats.set_played_percentage(percentage(receiver.len(), capacity));
		};

		// The callback `cpal` will call when errors occur.
		let error_callback = move |error: cpal::StreamError| {
			drop(error_send.try_send(error));
		};

		let stream = link.device.build_output_stream(&link.config, data_callback, error_callback, None)?;

		// Playback starts after the pre-buffer.
		stream.pause()?;

		Ok(Self {
			queue: FrameQueue::new(sender, channels),
			error: error_recv,
			stream,
			write_timeout: link.write_timeout,
		})
	}

	fn play(&mut self) -> Result<(), OutputError> {
		debug2!("CpalSink - play()");
		self.stream.play()?;
		Ok(())
	}

	fn write(&mut self, samples: &[Fixed]) -> Result<(), OutputError> {
		trace2!("CpalSink - sending {} samples to backend", samples.len());

		// This hangs until the stream has room, which
		// is how long it takes to play the backlog.
		let deadline = Instant::now() + self.write_timeout;
		self.queue.push(samples, deadline)?;

		// If the backend errored, forward it.
		if let Ok(error) = self.error.try_recv() {
			error2!("CpalSink - stream error: {error}");
			Err(error.into())
		} else {
			Ok(())
		}
	}

	fn pacing(&self) -> Pacing {
		Pacing::Blocking
	}
}

//----------------------------------------------------------------------------------------------- Frames
/// The sending half of the sample channel.
///
/// A timeout in the middle of a frame keeps the rest of that
/// frame, which is sent first on the next [`FrameQueue::push`].
/// Whatever was not sent is dropped in whole frames.
struct FrameQueue {
	sender: Sender<f32>,
	channels: usize,
	/// The unsent end of a frame cut short by a timeout.
	pending: Vec<f32>,
}

impl FrameQueue {
	fn new(sender: Sender<f32>, channels: usize) -> Self {
		Self {
			sender,
			channels: channels.max(1),
			pending: Vec::new(),
		}
	}

	fn send(&self, sample: f32, deadline: Instant) -> Result<(), OutputError> {
		match self.sender.send_deadline(sample, deadline) {
			Ok(()) => Ok(()),
			Err(SendTimeoutError::Timeout(_)) => Err(OutputError::Timeout),
			Err(SendTimeoutError::Disconnected(_)) => Err(OutputError::StreamClosed),
		}
	}

	/// Send `samples` (whole interleaved frames) before `deadline`.
	fn push(&mut self, samples: &[Fixed], deadline: Instant) -> Result<(), OutputError> {
		while let Some(&sample) = self.pending.first() {
			self.send(sample, deadline)?;
			self.pending.remove(0);
		}

		for (i, sample) in samples.iter().enumerate() {
			if let Err(e) = self.send(sample.to_f32(), deadline) {
				if i % self.channels != 0 {
					let end = (i / self.channels + 1) * self.channels;
					let rest = &samples[i..end.min(samples.len())];
					self.pending.extend(rest.iter().map(|s| s.to_f32()));
				}
				return Err(e);
			}
		}

		Ok(())
	}
}

/// Fill `output` with whole frames from `receiver` and mute the rest.
///
/// Returns how many samples were taken.
fn drain(receiver: &Receiver<f32>, channels: usize, output: &mut [f32]) -> usize {
	let available = receiver.len() / channels * channels;
	let wanted    = output.len() / channels * channels;

	let mut written = 0;
	for o in &mut output[..available.min(wanted)] {
		let Ok(sample) = receiver.try_recv() else {
			break;
		};
		*o = sample;
		written += 1;
	}

	output[written..].fill(0.0);
	written
}

//----------------------------------------------------------------------------------------------- Error re-map
fn backend_specific(error: cpal::BackendSpecificError) -> OutputError {
	OutputError::Unknown(Cow::Owned(error.description))
}

impl From<cpal::DefaultStreamConfigError> for OutputError {
	fn from(error: cpal::DefaultStreamConfigError) -> Self {
		use cpal::DefaultStreamConfigError as E;
		match error {
			E::DeviceNotAvailable => Self::DeviceUnavailable,
			E::StreamTypeNotSupported => Self::InvalidFormat,
			E::BackendSpecific { err } => backend_specific(err),
		}
	}
}

impl From<cpal::StreamError> for OutputError {
	fn from(error: cpal::StreamError) -> Self {
		use cpal::StreamError as E;
		match error {
			E::DeviceNotAvailable => Self::StreamClosed,
			E::BackendSpecific { err } => backend_specific(err),
		}
	}
}

impl From<cpal::BuildStreamError> for OutputError {
	fn from(error: cpal::BuildStreamError) -> Self {
		use cpal::BuildStreamError as E;
		match error {
			E::DeviceNotAvailable | E::StreamIdOverflow => Self::DeviceUnavailable,
			E::StreamConfigNotSupported | E::InvalidArgument => Self::InvalidFormat,
			E::BackendSpecific { err } => backend_specific(err),
		}
	}
}

impl From<cpal::PlayStreamError> for OutputError {
	fn from(error: cpal::PlayStreamError) -> Self {
		use cpal::PlayStreamError as E;
		match error {
			E::DeviceNotAvailable => Self::DeviceUnavailable,
			E::BackendSpecific { err } => backend_specific(err),
		}
	}
}

impl From<cpal::PauseStreamError> for OutputError {
	fn from(error: cpal::PauseStreamError) -> Self {
		use cpal::PauseStreamError as E;
		match error {
			E::DeviceNotAvailable => Self::DeviceUnavailable,
			E::BackendSpecific { err } => backend_specific(err),
		}
	}
}

//----------------------------------------------------------------------------------------------- TESTS
#[cfg(test)]
mod tests {
	use super::*;
	use cpal::SupportedBufferSize as S;
	use pretty_assertions::assert_eq;

	#[test]
	fn snap_to_power_of_two() {
		assert_eq!(snap_buffer_size(1000, 2, &S::Unknown), 1024);
		assert_eq!(snap_buffer_size(1024, 2, &S::Unknown), 1024);
		assert_eq!(snap_buffer_size(1, 2, &S::Unknown), 1);
		assert_eq!(snap_buffer_size(MAX_BUFFER_FRAMES, 2, &S::Unknown), MAX_BUFFER_FRAMES);
	}

	#[test]
	fn snap_within_device_range() {
		let range = S::Range { min: 256, max: 2048 };
		assert_eq!(snap_buffer_size(100, 2, &range), 256);
		assert_eq!(snap_buffer_size(300, 2, &range), 512);
		assert_eq!(snap_buffer_size(4000, 2, &range), 2048);

		// The device claims more than we allow.
		let huge = S::Range { min: 1, max: u32::MAX };
		assert_eq!(snap_buffer_size(19_000, 2, &huge), MAX_BUFFER_FRAMES);
	}

	#[test]
	fn snap_within_sample_limit() {
		// 16384 frames of 3 channels would not fit.
		assert_eq!(snap_buffer_size(13_333, 3, &S::Unknown), 13_333);
		assert_eq!(snap_buffer_size(1000, 8, &S::Unknown), 1024);
		assert_eq!(snap_buffer_size(4000, 8, &S::Unknown), MAX_BUFFER_SAMPLES / 8);
	}

	#[test]
	fn timeout_keeps_frames_whole() {
		let (sender, receiver) = crossbeam::channel::bounded(3);
		let mut queue = FrameQueue::new(sender, 2);
		let soon = || Instant::now() + Duration::from_millis(10);
		let samples = |fs: &[f32]| fs.iter().map(|f| Fixed::from_f32(*f)).collect::<Vec<Fixed>>();
		let sent = || receiver.try_iter().collect::<Vec<f32>>();

		queue.push(&samples(&[0.5, -0.5]), soon()).unwrap();

		// Room for half of the 2nd frame, none of the 3rd.
		let e = queue.push(&samples(&[0.25, -0.25, 0.75, -0.75]), soon()).unwrap_err();
		assert!(matches!(e, OutputError::Timeout));
		assert_eq!(sent(), [0.5, -0.5, 0.25]);

		// The cut frame is finished before anything new.
		queue.push(&samples(&[1.0, -1.0]), soon()).unwrap();
		assert_eq!(sent(), [-0.25, 1.0, -1.0]);
	}

	#[test]
	fn disconnected_is_stream_closed() {
		let (sender, receiver) = crossbeam::channel::bounded(4);
		drop(receiver);
		let mut queue = FrameQueue::new(sender, 2);
		let e = queue.push(&[Fixed::ONE; 2], Instant::now()).unwrap_err();
		assert!(matches!(e, OutputError::StreamClosed));
	}

	#[test]
	fn drain_takes_whole_frames() {
		let (sender, receiver) = crossbeam::channel::bounded(8);
		for f in [0.5, -0.5, 0.25, -0.25, 0.75] {
			sender.send(f).unwrap();
		}

		let mut output = [9.0; 6];
		assert_eq!(drain(&receiver, 2, &mut output), 4);
		assert_eq!(output, [0.5, -0.5, 0.25, -0.25, 0.0, 0.0]);

		// Half a frame is left for later.
		let mut output = [9.0; 2];
		assert_eq!(drain(&receiver, 2, &mut output), 0);
		assert_eq!(output, [0.0, 0.0]);
		assert_eq!(receiver.len(), 1);
	}

	#[test]
	fn map_errors() {
		let err = || cpal::BackendSpecificError { description: "oops".into() };

		assert!(matches!(
			OutputError::from(cpal::DefaultStreamConfigError::DeviceNotAvailable),
			OutputError::DeviceUnavailable,
		));
		assert!(matches!(
			OutputError::from(cpal::BuildStreamError::StreamConfigNotSupported),
			OutputError::InvalidFormat,
		));
		assert!(matches!(
			OutputError::from(cpal::StreamError::DeviceNotAvailable),
			OutputError::StreamClosed,
		));

		let e = OutputError::from(cpal::PlayStreamError::BackendSpecific { err: err() });
		assert_eq!(e.to_string(), "unknown error: oops");
		let e = OutputError::from(cpal::PauseStreamError::BackendSpecific { err: err() });
		assert_eq!(e.to_string(), "unknown error: oops");
	}
}
