// An AtomicF64 implementation.
//
// This internally uses [AtomicU64], where the
// u64 is the bit pattern of the internal float.
//
// This uses [.to_bits()] and [from_bits()] to
// convert between actual floats, and the bit
// representations for storage.

//---------------------------------------------------------------------------------------------------- Atomic Float
use std::sync::atomic::{AtomicU64,Ordering};

pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
	/// Bit pattern for `0.0`.
	const BITS_0: u64 = 0;

	pub(crate) const SELF_0: Self = Self(AtomicU64::new(Self::BITS_0));

	#[inline]
	pub(crate) fn load(&self, ordering: Ordering) -> f64 {
		f64::from_bits(self.0.load(ordering))
	}

	#[inline]
	pub(crate) fn get(&self) -> f64 {
		self.load(Ordering::Acquire)
	}

	#[inline]
	/// Add `f` and return the previous value.
	pub(crate) fn fetch_add(&self, f: f64) -> f64 {
		let prev = self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
			Some((f64::from_bits(bits) + f).to_bits())
		});

		// The closure always returns `Some`.
		match prev {
			Ok(bits) | Err(bits) => f64::from_bits(bits),
		}
	}
}

impl std::fmt::Debug for AtomicF64 {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("AtomicF64")
			.field(&self.load(Ordering::Relaxed))
			.finish()
	}
}
