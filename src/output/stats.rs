//! Lock-free state shared between an output and its feeder thread.

//---------------------------------------------------------------------------------------------------- Use
use std::sync::atomic::{AtomicBool,AtomicU8,AtomicU64,Ordering};
use crate::{
	atomic::AtomicF64,
	sample::Softclip,
};

//---------------------------------------------------------------------------------------------------- Stats
/// Counters written by the feeder thread and read by everyone else.
///
/// The caller's thread never touches the sample buffer,
/// everything it can observe about a running output goes
/// through here, and everything in here is a single atomic.
///
/// A [`Sink`](crate::output::Sink) receives this in
/// [`Sink::connect`](crate::output::Sink::connect) so that it
/// can report how full its queue is.
#[derive(Debug)]
pub struct Stats {
	stream_time: AtomicF64, // Seconds of audio successfully delivered
	clipped:     AtomicBool, // Did the last cycle clip?
	played:      AtomicU8,   // Sink queue fill, 0..=100
	dropped:     AtomicU64,  // Buffers lost to sink/source errors
	cycles:      AtomicU64,  // Completed feeding cycles
	softclip:    AtomicU64,  // [`Softclip::pack`]'ed thresholds
}

impl Stats {
	#[allow(clippy::declare_interior_mutable_const)]
	pub(crate) const NEW: Self = Self {
		stream_time: AtomicF64::SELF_0,
		clipped:     AtomicBool::new(false),
		played:      AtomicU8::new(0),
		dropped:     AtomicU64::new(0),
		cycles:      AtomicU64::new(0),
		softclip:    AtomicU64::new(Softclip::DISABLED.pack()),
	};

	pub(crate) fn new(softclip: Softclip) -> Self {
		let this = Self::NEW;
		this.set_softclip(softclip);
		this
	}

	//------------------------------------------ Readers
	#[inline]
	#[must_use]
	/// Seconds of audio delivered to the sink so far.
	pub fn stream_time(&self) -> f64 {
		self.stream_time.get()
	}

	#[inline]
	#[must_use]
	/// Did the most recent cycle clip any sample?
	pub fn clipped(&self) -> bool {
		self.clipped.load(Ordering::Acquire)
	}

	#[inline]
	#[must_use]
	/// How full the sink's queue is, `0..=100`.
	pub fn played_percentage(&self) -> u8 {
		self.played.load(Ordering::Acquire)
	}

	#[inline]
	#[must_use]
	/// How many buffers were lost.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Acquire)
	}

	#[inline]
	#[must_use]
	/// How many feeding cycles completed.
	pub fn cycles(&self) -> u64 {
		self.cycles.load(Ordering::Acquire)
	}

	#[inline]
	#[must_use]
	/// The soft clip the next cycle will use.
	pub fn softclip(&self) -> Softclip {
		Softclip::unpack(self.softclip.load(Ordering::Acquire))
	}

	//------------------------------------------ Writers
	#[inline]
	/// Set how full the sink's queue is.
	///
	/// Values above `100` are stored as `100`.
	pub fn set_played_percentage(&self, percent: u8) {
		self.played.store(percent.min(100), Ordering::Release);
	}

	#[inline]
	pub(crate) fn set_softclip(&self, softclip: Softclip) {
		self.softclip.store(softclip.pack(), Ordering::Release);
	}

	#[inline]
	pub(crate) fn set_clipped(&self, clipped: bool) {
		self.clipped.store(clipped, Ordering::Release);
	}

	#[inline]
	pub(crate) fn advance(&self, seconds: f64) {
		self.stream_time.fetch_add(seconds);
	}

	#[inline]
	pub(crate) fn add_dropped(&self) {
		self.dropped.fetch_add(1, Ordering::AcqRel);
	}

	#[inline]
	pub(crate) fn add_cycle(&self) {
		self.cycles.fetch_add(1, Ordering::AcqRel);
	}
}

/// `queued` out of `capacity` as `0..=100`.
///
/// A `capacity` of `0` is `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percentage(queued: usize, capacity: usize) -> u8 {
	if capacity == 0 {
		return 0;
	}
	(queued.saturating_mul(100) / capacity).min(100) as u8
}
