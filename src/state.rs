//! The output lifecycle.

//---------------------------------------------------------------------------------------------------- Use
use strum::{
	AsRefStr,
	Display,
	EnumCount,
	EnumIter,
	EnumString,
	IntoStaticStr,
};

//---------------------------------------------------------------------------------------------------- State
/// Where an [`AudioOutput`](crate::AudioOutput) is in its lifecycle.
///
/// ```text
/// Uninitialized -[init]-> Initialized -[start]-> Running -[stop]-> Stopped -[close]-> Closed
/// ```
///
/// A failed `init()` or `start()` leaves the state as it was.
///
/// `close()` is also allowed from `Uninitialized` and `Initialized`,
/// and [`State::Closed`] is terminal.
#[derive(Copy,Clone,Debug,Default,PartialEq,Eq,PartialOrd,Ord,Hash)]
#[derive(AsRefStr,Display,EnumCount,EnumIter,EnumString,IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum State {
	#[default]
	/// Created, nothing acquired yet.
	Uninitialized,
	/// The sample buffer and device are acquired.
	Initialized,
	/// The feeder thread is running.
	Running,
	/// The feeder thread has been joined.
	Stopped,
	/// Everything is released.
	Closed,
}

impl State {
	#[must_use]
	/// Is the feeder thread alive in this state?
	pub const fn is_running(self) -> bool {
		matches!(self, Self::Running)
	}

	#[must_use]
	/// Are the sample buffer and device held in this state?
	pub const fn is_acquired(self) -> bool {
		matches!(self, Self::Initialized | Self::Running | Self::Stopped)
	}
}
