//! Fixed-point samples and the soft clip applied to them.

mod fixed;
pub use fixed::Fixed;

mod softclip;
pub use softclip::Softclip;
