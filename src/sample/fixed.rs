//! 16.16 fixed-point audio samples.

//---------------------------------------------------------------------------------------------------- Fixed
/// A signed 16.16 fixed-point audio sample.
///
/// This is what a [`Source`](crate::Source) writes into the
/// output's sample buffer, and what backends read back out.
///
/// [`Fixed::ONE`] is full scale (`1.0`), the same as
/// `i16::MAX`-ish in 16-bit PCM and `1.0` in `f32` PCM.
///
/// Values outside of `-ONE..=ONE` are allowed; a mix
/// bus can go over full scale, that is what [`Softclip`](crate::Softclip)
/// is for. Conversions _out_ of `Fixed` saturate.
///
/// ```rust
/// # use outloop::Fixed;
/// assert_eq!(Fixed::from_f32(1.0), Fixed::ONE);
/// assert_eq!(Fixed::from_f32(0.5).to_f32(), 0.5);
/// assert_eq!(Fixed::ONE.to_i16(), i16::MAX);
/// ```
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq,PartialOrd,Ord,Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
	/// How many bits are after the point.
	pub const FRACTION_BITS: u32 = 16;
	/// `0.0`, silence.
	pub const ZERO: Self = Self(0);
	/// `1.0`, full scale.
	pub const ONE: Self = Self(1 << Self::FRACTION_BITS);
	/// The smallest representable sample.
	pub const MIN: Self = Self(i32::MIN);
	/// The largest representable sample.
	pub const MAX: Self = Self(i32::MAX);

	#[inline]
	#[must_use]
	/// Create a `Fixed` from the raw 16.16 bits.
	pub const fn from_raw(raw: i32) -> Self {
		Self(raw)
	}

	#[inline]
	#[must_use]
	/// The raw 16.16 bits.
	pub const fn raw(self) -> i32 {
		self.0
	}

	#[inline]
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	/// Convert an `f32` sample, saturating at [`Fixed::MIN`]/[`Fixed::MAX`].
	///
	/// `NaN` becomes [`Fixed::ZERO`].
	pub fn from_f32(f: f32) -> Self {
		// `as` saturates, and maps NaN to 0.
		Self((f * Self::ONE.0 as f32) as i32)
	}

	#[inline]
	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	/// Convert to an `f32` sample.
	pub fn to_f32(self) -> f32 {
		self.0 as f32 / Self::ONE.0 as f32
	}

	#[inline]
	#[must_use]
	/// Convert a 16-bit PCM sample.
	pub const fn from_i16(i: i16) -> Self {
		// i16 has 15 fractional bits.
		Self((i as i32) << 1)
	}

	#[inline]
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	/// Convert to a 16-bit PCM sample, saturating.
	pub const fn to_i16(self) -> i16 {
		let i = self.0 >> 1;
		if i > i16::MAX as i32 {
			i16::MAX
		} else if i < i16::MIN as i32 {
			i16::MIN
		} else {
			i as i16
		}
	}
}

impl From<i16> for Fixed {
	fn from(i: i16) -> Self {
		Self::from_i16(i)
	}
}

impl From<Fixed> for f32 {
	fn from(f: Fixed) -> Self {
		f.to_f32()
	}
}

//---------------------------------------------------------------------------------------------------- TESTS
#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constants() {
		assert_eq!(Fixed::ZERO.raw(), 0);
		assert_eq!(Fixed::ONE.raw(), 65_536);
		assert_eq!(Fixed::default(), Fixed::ZERO);
	}

	#[test]
	fn float() {
		assert_eq!(Fixed::from_f32(0.0),  Fixed::ZERO);
		assert_eq!(Fixed::from_f32(1.0),  Fixed::ONE);
		assert_eq!(Fixed::from_f32(-1.0), Fixed(-65_536));
		assert_eq!(Fixed::from_f32(0.25).to_f32(), 0.25);
		assert_eq!(Fixed::from_f32(f32::NAN), Fixed::ZERO);
		assert_eq!(Fixed::from_f32(f32::INFINITY), Fixed::MAX);
		assert_eq!(Fixed::from_f32(f32::NEG_INFINITY), Fixed::MIN);
	}

	#[test]
	fn pcm16() {
		assert_eq!(Fixed::from(0_i16), Fixed::ZERO);
		assert_eq!(Fixed::from(i16::MAX).to_i16(), i16::MAX);
		assert_eq!(Fixed::from(i16::MIN).to_i16(), i16::MIN);
		assert_eq!(Fixed::from(-1234_i16).to_i16(), -1234);

		// Over full scale saturates.
		assert_eq!(Fixed(Fixed::ONE.0 * 4).to_i16(), i16::MAX);
		assert_eq!(Fixed(-Fixed::ONE.0 * 4).to_i16(), i16::MIN);
	}
}
