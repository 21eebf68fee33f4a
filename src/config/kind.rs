//! Backend selection.

//---------------------------------------------------------------------------------------------------- Use
use strum::{
	AsRefStr,
	Display,
	EnumCount,
	EnumIter,
	EnumString,
	IntoStaticStr,
};

//---------------------------------------------------------------------------------------------------- OutputKind
/// Which audio output backend to use.
///
/// This can be parsed from a string, which
/// is handy for config files and CLI flags:
///
/// ```rust
/// # use outloop::OutputKind;
/// # use std::str::FromStr;
/// assert_eq!(OutputKind::from_str("null").unwrap(), OutputKind::Null);
/// assert_eq!(OutputKind::from_str("dummy").unwrap(), OutputKind::Null);
/// assert_eq!(OutputKind::Cpal.to_string(), "cpal");
/// ```
#[derive(Copy,Clone,Debug,PartialEq,Eq,PartialOrd,Ord,Hash)]
#[derive(AsRefStr,Display,EnumCount,EnumIter,EnumString,IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputKind {
	/// Pulls samples and discards them.
	///
	/// Used for headless operation and testing.
	#[strum(to_string = "null", serialize = "dummy")]
	Null,
	/// The OS audio server through `cpal`.
	///
	/// Only available with the `cpal` feature, without it
	/// this falls back to [`OutputKind::Null`] when opened.
	Cpal,
}

cfg_if::cfg_if! {
	if #[cfg(feature = "cpal")] {
		impl OutputKind {
			/// The backend used by default.
			pub const DEFAULT: Self = Self::Cpal;
		}
	} else {
		impl OutputKind {
			/// The backend used by default.
			pub const DEFAULT: Self = Self::Null;
		}
	}
}

impl OutputKind {
	#[must_use]
	/// Was this backend compiled in?
	pub const fn is_available(self) -> bool {
		match self {
			Self::Null => true,
			Self::Cpal => cfg!(feature = "cpal"),
		}
	}
}

impl Default for OutputKind {
	fn default() -> Self {
		Self::DEFAULT
	}
}

//---------------------------------------------------------------------------------------------------- TESTS
#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn parse() {
		assert_eq!(OutputKind::from_str("null").unwrap(),  OutputKind::Null);
		assert_eq!(OutputKind::from_str("NULL").unwrap(),  OutputKind::Null);
		assert_eq!(OutputKind::from_str("dummy").unwrap(), OutputKind::Null);
		assert_eq!(OutputKind::from_str("cpal").unwrap(),  OutputKind::Cpal);
		assert!(OutputKind::from_str("oss").is_err());
	}

	#[test]
	fn display() {
		assert_eq!(OutputKind::Null.to_string(), "null");
		assert_eq!(OutputKind::Cpal.as_ref(), "cpal");
		let s: &'static str = OutputKind::Null.into();
		assert_eq!(s, "null");
	}

	#[test]
	fn default_is_available() {
		assert!(OutputKind::default().is_available());
		assert!(OutputKind::Null.is_available());
		assert_eq!(OutputKind::Cpal.is_available(), cfg!(feature = "cpal"));
	}
}
