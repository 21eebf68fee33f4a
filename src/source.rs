//! The upstream sample producer.

//---------------------------------------------------------------------------------------------------- Use
use crate::sample::Fixed;

//---------------------------------------------------------------------------------------------------- Source
/// Something that produces audio samples on demand.
///
/// This is the pull point between an output and whatever
/// generates audio (a mixer, a synth, a tracker player).
///
/// [`Source::fill`] is called once per feeding cycle,
/// on the feeder thread, with the output's own sample buffer.
/// It must fill the _whole_ slice before returning.
///
/// The slice is interleaved by channel, and its length is
/// `buffer_size * channels` of the output that owns it.
/// Its length does not change between calls.
///
/// Any `FnMut(&mut [Fixed]) + Send + 'static` closure is a `Source`:
///
/// ```rust
/// # use outloop::{Fixed,Source};
/// let mut phase = 0;
/// let mut saw = move |buf: &mut [Fixed]| {
///     for s in buf.iter_mut() {
///         *s = Fixed((phase % 128) * 512);
///         phase += 1;
///     }
/// };
///
/// let mut buf = [Fixed::ZERO; 4];
/// saw.fill(&mut buf);
/// assert_eq!(buf[1], Fixed(512));
/// ```
///
/// # Real-time
/// This runs on the feeder thread in the middle of a
/// real-time loop. Allocating, locking or blocking here
/// will show up as dropouts.
///
/// A `Source` that panics does not take the feeder down;
/// the buffer for that cycle is zeroed and counted as dropped.
pub trait Source: Send + 'static {
	/// Fill `buffer` with the next samples.
	fn fill(&mut self, buffer: &mut [Fixed]);
}

impl<F> Source for F
where
	F: FnMut(&mut [Fixed]) + Send + 'static,
{
	#[inline]
	fn fill(&mut self, buffer: &mut [Fixed]) {
		self(buffer);
	}
}

//---------------------------------------------------------------------------------------------------- Silence
/// A [`Source`] that only produces silence.
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq)]
pub struct Silence;

impl Source for Silence {
	#[inline]
	fn fill(&mut self, buffer: &mut [Fixed]) {
		buffer.fill(Fixed::ZERO);
	}
}
