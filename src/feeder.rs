//! The feeder thread.
//!
//! [`Feed`] is everything a feeding cycle touches: the sample
//! buffer and the [`Source`]. It is moved _into_ the feeder thread
//! on start and moved back out by the join on stop, so only 1 thread
//! ever has it, and nothing needs a lock.
//!
//! Nothing the [`Source`] or [`Sink`] does can take the thread down:
//! every call into them runs under `catch_unwind`.

//---------------------------------------------------------------------------------------------------- Use
use std::{
	panic::{catch_unwind,AssertUnwindSafe},
	sync::{
		Arc,
		atomic::{AtomicBool,Ordering},
	},
	thread::JoinHandle,
	time::Instant,
};
use crossbeam::channel::{bounded,Receiver,RecvTimeoutError,Sender};
use crate::{
	error::OutputError,
	output::{Pacing,Sink,Stats},
	sample::Fixed,
	source::Source,
	macros::{debug2,error2,trace2,warn2},
};

//---------------------------------------------------------------------------------------------------- Feed
/// The sample buffer, the source filling it, and where results go.
pub(crate) struct Feed {
	buffer: Box<[Fixed]>,
	source: Box<dyn Source>,
	stats:  Arc<Stats>,
	/// Seconds of audio in 1 buffer.
	seconds: f64,
	/// Signalled after every cycle.
	pulse: Sender<()>,
}

impl Feed {
	/// `buffer` is the output's one and only sample buffer.
	pub(crate) fn new(
		buffer: Box<[Fixed]>,
		source: Box<dyn Source>,
		stats: Arc<Stats>,
		seconds: f64,
		pulse: Sender<()>,
	) -> Self {
		Self { buffer, source, stats, seconds, pulse }
	}

	/// Give back the source, freeing the buffer.
	pub(crate) fn into_source(self) -> Box<dyn Source> {
		self.source
	}

	#[cfg_attr(not(feature = "log"), allow(dead_code))]
	pub(crate) fn len(&self) -> usize {
		self.buffer.len()
	}

	/// One feeding cycle.
	///
	/// Pull from the source, soft clip, write into the sink, pulse.
	///
	/// Nothing in here escapes: a panicking source, a panicking
	/// sink and a failing sink are all counted as dropped buffers.
	pub(crate) fn trigger<S: Sink>(&mut self, sink: &mut S) {
		trace2!("Feeder - trigger(), samples: {}", self.buffer.len());

		let buffer: &mut [Fixed] = &mut self.buffer;
		let source = &mut self.source;
		let stats = &self.stats;

		// INVARIANT: `source` must not take the thread down with it.
		let mut ok = true;
		if catch_unwind(AssertUnwindSafe(|| source.fill(&mut *buffer))).is_err() {
			error2!("Feeder - source panicked, writing silence");
			buffer.fill(Fixed::ZERO);
			ok = false;
		}

		// Silence is still written after a panic so a
		// blocking sink keeps pacing the loop.
		let written = catch_unwind(AssertUnwindSafe(|| {
			if sink.softclip() {
				stats.set_clipped(stats.softclip().apply(&mut *buffer));
			}
			sink.write(&*buffer)
		}));

		match written {
			Ok(Ok(())) => (),
			Ok(Err(e)) => {
				warn2!("Feeder - write failed: {e}");
				ok = false;
			},
			Err(_) => {
				error2!("Feeder - sink panicked, dropping buffer");
				ok = false;
			},
		}

		if ok {
			stats.advance(self.seconds);
		} else {
			stats.add_dropped();
		}
		stats.add_cycle();

		// A full channel means a pulse is already waiting.
		drop(self.pulse.try_send(()));
	}
}

impl std::fmt::Debug for Feed {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Feed")
			.field("buffer_len", &self.buffer.len())
			.field("stats", &self.stats)
			.field("seconds", &self.seconds)
			.finish_non_exhaustive()
	}
}

//---------------------------------------------------------------------------------------------------- FeederArgs
#[derive(Copy,Clone,Debug)]
pub(crate) struct FeederArgs {
	pub(crate) pre_buffer_count: usize,
	// Real-time promotion only.
	#[cfg_attr(not(feature = "rt"), allow(dead_code))]
	pub(crate) realtime:         bool,
	#[cfg_attr(not(feature = "rt"), allow(dead_code))]
	pub(crate) buffer_size:      usize,
	#[cfg_attr(not(feature = "rt"), allow(dead_code))]
	pub(crate) sample_rate:      u32,
}

//---------------------------------------------------------------------------------------------------- Feeder
/// A running feeder thread.
///
/// There is no way to get rid of this other than
/// [`Feeder::stop`], which always joins.
#[derive(Debug)]
pub(crate) struct Feeder {
	running: Arc<AtomicBool>,
	wake:    Sender<()>,
	handle:  JoinHandle<Option<Feed>>,
}

/// A failed [`Feeder::spawn`].
///
/// The [`Feed`] is handed back unless the thread panicked while holding it.
pub(crate) type SpawnError = (OutputError, Option<Feed>);

impl Feeder {
	#[cold]
	#[inline(never)]
	/// Spawn the feeder thread and wait until it is feeding.
	///
	/// This returns once the sink is connected, the
	/// pre-buffer cycles are written and playback started.
	pub(crate) fn spawn<S: Sink>(
		feed: Feed,
		link: S::Link,
		args: FeederArgs,
	) -> Result<Self, SpawnError> {
		debug2!("Feeder - spawn(), {args:?}");

		let running = Arc::new(AtomicBool::new(true));
		let (to_feeder, from_caller) = bounded::<(Feed, S::Link)>(1);
		let (ready_send, ready_recv) = bounded::<Result<(), OutputError>>(1);
		let (wake_send, wake_recv)   = bounded::<()>(1);

		// The `Feed` is sent over _after_ spawning
		// so that a spawn failure doesn't eat it.
		let running_clone = Arc::clone(&running);
		let handle = match std::thread::Builder::new()
			.name("Feeder".into())
			.spawn(move || {
				let (feed, link) = from_caller.recv().ok()?;
				Self::main::<S>(feed, link, args, &running_clone, &wake_recv, &ready_send)
			})
		{
			Ok(handle) => handle,
			Err(e) => return Err((OutputError::ThreadSpawn(e), Some(feed))),
		};

		if let Err(e) = to_feeder.send((feed, link)) {
			// The thread is gone before it could receive.
			let (feed, _) = e.into_inner();
			drop(handle.join());
			return Err((OutputError::FeederPanicked, Some(feed)));
		}

		match ready_recv.recv() {
			Ok(Ok(())) => Ok(Self {
				running,
				wake: wake_send,
				handle,
			}),
			Ok(Err(e)) => {
				debug2!("Feeder - failed to start: {e}");
				let feed = handle.join().ok().flatten();
				Err((e, feed))
			},
			// The sender was dropped without a message, the thread panicked.
			Err(_) => {
				error2!("Feeder - panicked while starting");
				let feed = handle.join().ok().flatten();
				Err((OutputError::FeederPanicked, feed))
			},
		}
	}

	#[cold]
	#[inline(never)]
	/// Stop triggering and join the thread.
	///
	/// After this returns, no cycle is running and none will.
	///
	/// # Errors
	/// [`OutputError::FeederPanicked`] if the thread could not be joined cleanly.
	pub(crate) fn stop(self) -> Result<Feed, OutputError> {
		debug2!("Feeder - stop()");

		self.running.store(false, Ordering::Release);

		// Cut a timed wait short, the channel
		// being full already means the same.
		drop(self.wake.try_send(()));

		match self.handle.join() {
			Ok(Some(feed)) => {
				debug2!("Feeder - stop() ... OK");
				Ok(feed)
			},
			_ => {
				error2!("Feeder - thread panicked");
				Err(OutputError::FeederPanicked)
			},
		}
	}

	//---------------------------------------------------------------------------------------------------- Main Loop
	#[cold]
	#[inline(never)]
	/// The feeder thread's main function.
	fn main<S: Sink>(
		mut feed: Feed,
		link: S::Link,
		args: FeederArgs,
		running: &AtomicBool,
		wake: &Receiver<()>,
		ready: &Sender<Result<(), OutputError>>,
	) -> Option<Feed> {
		debug2!("Feeder - main()");

		// A backend panicking here hands the `Feed`
		// back just like a backend error would.
		let started = catch_unwind(AssertUnwindSafe(|| Self::open::<S>(&mut feed, link, args)));
		let (mut sink, pacing) = match started {
			Ok(Ok(opened)) => opened,
			Ok(Err(e)) => {
				drop(ready.send(Err(e)));
				return Some(feed);
			},
			Err(_) => {
				error2!("Feeder - backend panicked while starting");
				drop(ready.send(Err(OutputError::BackendPanicked)));
				return Some(feed);
			},
		};

		drop(ready.send(Ok(())));

		#[cfg(feature = "rt")]
		let rt = rt::promote(args);

		let mut deadline = Instant::now();
		while running.load(Ordering::Acquire) {
			feed.trigger(&mut sink);

			match pacing {
				Pacing::Blocking => (),
				Pacing::Timed(period) => {
					deadline += period;

					// If we fell behind by more than a cycle, don't
					// burst to catch up, restart the schedule from now.
					let now = Instant::now();
					if deadline + period < now {
						trace2!("Feeder - behind schedule, resetting deadline");
						deadline = now;
					}

					// Returns early if `stop()` sends a wake up.
					if let Err(RecvTimeoutError::Disconnected) = wake.recv_deadline(deadline) {
						debug2!("Feeder - caller is gone, exiting");
						break;
					}
				},
			}
		}

		drop(sink);

		#[cfg(feature = "rt")]
		rt::demote(rt);

		debug2!("Feeder - main() ... OK");
		Some(feed)
	}

	/// Connect the sink, write the pre-buffer, start playback.
	///
	/// The sink's [`Pacing`] is read once, here.
	fn open<S: Sink>(
		feed: &mut Feed,
		link: S::Link,
		args: FeederArgs,
	) -> Result<(S, Pacing), OutputError> {
		let mut sink = S::connect(link, Arc::clone(&feed.stats))?;

		// Queue up audio before playback starts.
		for _ in 0..args.pre_buffer_count {
			feed.trigger(&mut sink);
		}

		sink.play()?;
		let pacing = sink.pacing();
		Ok((sink, pacing))
	}
}

//---------------------------------------------------------------------------------------------------- Real-time priority
#[cfg(feature = "rt")]
mod rt {
	use super::FeederArgs;
	use crate::macros::{debug2,warn2};
	use audio_thread_priority::{
		promote_current_thread_to_real_time,
		demote_current_thread_from_real_time,
		RtPriorityHandle,
	};

	/// Promote the current thread, if asked to.
	pub(super) fn promote(args: FeederArgs) -> Option<RtPriorityHandle> {
		if !args.realtime {
			return None;
		}

		let frames = u32::try_from(args.buffer_size).unwrap_or(u32::MAX);
		match promote_current_thread_to_real_time(frames, args.sample_rate) {
			Ok(handle) => {
				debug2!("Feeder - promoted to real-time priority");
				Some(handle)
			},
			Err(e) => {
				warn2!("Feeder - could not get real-time priority: {e:?}");
				None
			},
		}
	}

	/// Undo [`promote`].
	pub(super) fn demote(handle: Option<RtPriorityHandle>) {
		if let Some(handle) = handle {
			if let Err(e) = demote_current_thread_from_real_time(handle) {
				warn2!("Feeder - could not drop real-time priority: {e:?}");
			}
		}
	}
}
