//! Soft clip thresholds.

//---------------------------------------------------------------------------------------------------- Use
use crate::sample::Fixed;

//---------------------------------------------------------------------------------------------------- Softclip
/// Amplitude limits applied to every buffer right before it reaches the backend.
///
/// Any sample below `low` becomes `low`, any sample above `high` becomes `high`.
///
/// This is a plain clamp, which keeps two properties
/// the rest of the output relies on:
/// - it is monotonic (`a <= b` implies `clip(a) <= clip(b)`)
/// - it is idempotent (`clip(clip(a)) == clip(a)`)
///
/// ```rust
/// # use outloop::{Fixed,Softclip};
/// let clip = Softclip::new(Fixed::from_f32(-0.5), Fixed::from_f32(0.5));
/// let mut buf = [Fixed::ONE, Fixed::ZERO, Fixed::from_f32(-1.0)];
///
/// assert!(clip.apply(&mut buf));
/// assert_eq!(buf, [Fixed::from_f32(0.5), Fixed::ZERO, Fixed::from_f32(-0.5)]);
///
/// // Already clipped data stays the same.
/// assert!(!clip.apply(&mut buf));
/// ```
#[derive(Copy,Clone,Debug,PartialEq,Eq,Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Softclip {
	low: Fixed,
	high: Fixed,
}

impl Softclip {
	/// No clipping, the full [`Fixed`] range passes through.
	pub const DISABLED: Self = Self {
		low: Fixed::MIN,
		high: Fixed::MAX,
	};

	/// Clip to full scale, `-1.0..=1.0`.
	pub const FULL_SCALE: Self = Self {
		low: Fixed(-Fixed::ONE.0),
		high: Fixed::ONE,
	};

	#[must_use]
	/// Create new thresholds.
	///
	/// If `low > high` they are swapped.
	pub const fn new(low: Fixed, high: Fixed) -> Self {
		if low.0 <= high.0 {
			Self { low, high }
		} else {
			Self { low: high, high: low }
		}
	}

	#[must_use]
	/// The lower threshold.
	pub const fn low(&self) -> Fixed {
		self.low
	}

	#[must_use]
	/// The upper threshold.
	pub const fn high(&self) -> Fixed {
		self.high
	}

	#[must_use]
	/// Returns `true` if this clips nothing.
	pub const fn is_disabled(&self) -> bool {
		self.low.0 == i32::MIN && self.high.0 == i32::MAX
	}

	/// Clamp all `samples` in place.
	///
	/// Returns `true` if any sample was changed.
	pub fn apply(&self, samples: &mut [Fixed]) -> bool {
		if self.is_disabled() {
			return false;
		}

		let mut clipped = false;
		for sample in samples.iter_mut() {
			if *sample < self.low {
				*sample = self.low;
				clipped = true;
			} else if *sample > self.high {
				*sample = self.high;
				clipped = true;
			}
		}
		clipped
	}

	#[allow(clippy::cast_sign_loss)]
	/// Pack into a `u64` so it can live in an `AtomicU64`.
	pub(crate) const fn pack(self) -> u64 {
		((self.low.0 as u32 as u64) << 32) | (self.high.0 as u32 as u64)
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
	/// Inverse of [`Softclip::pack`].
	pub(crate) const fn unpack(bits: u64) -> Self {
		Self::new(
			Fixed((bits >> 32) as u32 as i32),
			Fixed(bits as u32 as i32),
		)
	}
}

impl Default for Softclip {
	fn default() -> Self {
		Self::DISABLED
	}
}

//---------------------------------------------------------------------------------------------------- TESTS
#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn ramp() -> Vec<Fixed> {
		(-8..=8).map(|i| Fixed(i * Fixed::ONE.0 / 4)).collect()
	}

	#[test]
	fn new_orders_thresholds() {
		let a = Softclip::new(Fixed::ONE, Fixed::ZERO);
		assert_eq!(a.low(), Fixed::ZERO);
		assert_eq!(a.high(), Fixed::ONE);
		assert_eq!(a, Softclip::new(Fixed::ZERO, Fixed::ONE));
	}

	#[test]
	fn disabled_clips_nothing() {
		let mut buf = ramp();
		let copy = buf.clone();
		assert!(Softclip::DISABLED.is_disabled());
		assert!(!Softclip::DISABLED.apply(&mut buf));
		assert_eq!(buf, copy);

		let mut extreme = [Fixed::MIN, Fixed::MAX];
		assert!(!Softclip::DISABLED.apply(&mut extreme));
	}

	#[test]
	fn clamps() {
		let mut buf = ramp();
		assert!(Softclip::FULL_SCALE.apply(&mut buf));
		assert!(buf.iter().all(|s| (-Fixed::ONE.0..=Fixed::ONE.0).contains(&s.0)));
		assert_eq!(buf.first(), Some(&Fixed(-Fixed::ONE.0)));
		assert_eq!(buf.last(), Some(&Fixed::ONE));
	}

	#[test]
	fn idempotent() {
		let clip = Softclip::new(Fixed::from_f32(-0.3), Fixed::from_f32(0.6));
		let mut once = ramp();
		clip.apply(&mut once);
		let mut twice = once.clone();
		assert!(!clip.apply(&mut twice));
		assert_eq!(once, twice);
	}

	#[test]
	fn monotonic() {
		let clip = Softclip::new(Fixed::from_f32(-0.3), Fixed::from_f32(0.6));
		// Input is sorted, output must stay sorted.
		let mut buf = ramp();
		clip.apply(&mut buf);
		assert!(buf.windows(2).all(|w| w[0] <= w[1]));
	}

	#[test]
	fn pack_unpack() {
		for clip in [
			Softclip::DISABLED,
			Softclip::FULL_SCALE,
			Softclip::new(Fixed(-1), Fixed(1)),
			Softclip::new(Fixed(5), Fixed(5)),
		] {
			assert_eq!(Softclip::unpack(clip.pack()), clip);
		}
	}
}
