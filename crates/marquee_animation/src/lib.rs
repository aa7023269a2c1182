//! Marquee Animation System
//!
//! Time-based interpolation for every transition in the overlay.
//!
//! # Features
//!
//! - **Easing Curves**: quad/cubic/quart/quint families plus bounce offsets
//! - **Value Animations**: delayed, eased interpolation of scalar lists with
//!   a one-shot completion callback
//! - **Composite Transforms**: independently timed position, zoom, size and
//!   opacity with mid-flight retargeting and bounce feedback

pub mod animation;
pub mod easing;
pub mod transform;

pub use animation::{Animation, Completion, Timing, Values};
pub use easing::{ease, EasingCurve, UnknownCurve};
pub use transform::{
    BounceDirection, Track, TransformAnimation, TransformSpec, TransformState, TransformTimings,
};
