//! The detection pipeline: frame buffer, color conversion, and the
//! color-band element detector.
//!
//! Everything in this module is pure: the same [`frame::Frame`] always
//! produces the same detection result, and no state is retained between
//! calls.  This is what makes the detector trivially unit-testable with
//! synthetic frames.

pub mod detect;
pub mod frame;
pub mod hsv;
