//! Easing curves
//!
//! Maps a normalized time fraction to an eased fraction. Results are not
//! clamped, and the bounce curves return an oscillating offset (amplitude
//! 20 units) that callers add to the target instead of interpolating.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Easing curve families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingCurve {
    QuintInOut,
    QuintOut,
    QuintIn,
    CubicInOut,
    CubicOut,
    CubicIn,
    QuartInOut,
    QuartOut,
    QuartIn,
    QuadInOut,
    QuadOut,
    QuadIn,
    BounceLeft,
    BounceRight,
    #[default]
    Linear,
}

const BOUNCE_AMPLITUDE: f32 = 20.0;

impl EasingCurve {
    pub const ALL: [EasingCurve; 15] = [
        EasingCurve::QuintInOut,
        EasingCurve::QuintOut,
        EasingCurve::QuintIn,
        EasingCurve::CubicInOut,
        EasingCurve::CubicOut,
        EasingCurve::CubicIn,
        EasingCurve::QuartInOut,
        EasingCurve::QuartOut,
        EasingCurve::QuartIn,
        EasingCurve::QuadInOut,
        EasingCurve::QuadOut,
        EasingCurve::QuadIn,
        EasingCurve::BounceLeft,
        EasingCurve::BounceRight,
        EasingCurve::Linear,
    ];

    /// Apply the curve to fraction `t`
    pub fn apply(self, t: f32) -> f32 {
        match self {
            EasingCurve::Linear => t,

            EasingCurve::QuadIn => t * t,
            EasingCurve::QuadOut => t * (2.0 - t),
            EasingCurve::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }

            EasingCurve::CubicIn => t * t * t,
            EasingCurve::CubicOut => (t - 1.0).powi(3) + 1.0,
            EasingCurve::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    (t - 1.0) * (2.0 * t - 2.0) * (2.0 * t - 2.0) + 1.0
                }
            }

            EasingCurve::QuartIn => t.powi(4),
            EasingCurve::QuartOut => 1.0 - (t - 1.0).powi(4),
            EasingCurve::QuartInOut => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - 8.0 * (t - 1.0).powi(4)
                }
            }

            EasingCurve::QuintIn => t.powi(5),
            EasingCurve::QuintOut => 1.0 + (t - 1.0).powi(5),
            EasingCurve::QuintInOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 + 16.0 * (t - 1.0).powi(5)
                }
            }

            EasingCurve::BounceLeft => -bounce(t),
            EasingCurve::BounceRight => bounce(t),
        }
    }

    /// Bounce curves produce an offset from the target
    pub fn is_bounce(self) -> bool {
        matches!(self, EasingCurve::BounceLeft | EasingCurve::BounceRight)
    }

    /// Kebab-case name, as used in configuration
    pub fn name(self) -> &'static str {
        match self {
            EasingCurve::QuintInOut => "quint-in-out",
            EasingCurve::QuintOut => "quint-out",
            EasingCurve::QuintIn => "quint-in",
            EasingCurve::CubicInOut => "cubic-in-out",
            EasingCurve::CubicOut => "cubic-out",
            EasingCurve::CubicIn => "cubic-in",
            EasingCurve::QuartInOut => "quart-in-out",
            EasingCurve::QuartOut => "quart-out",
            EasingCurve::QuartIn => "quart-in",
            EasingCurve::QuadInOut => "quad-in-out",
            EasingCurve::QuadOut => "quad-out",
            EasingCurve::QuadIn => "quad-in",
            EasingCurve::BounceLeft => "bounce-left",
            EasingCurve::BounceRight => "bounce-right",
            EasingCurve::Linear => "linear",
        }
    }

    /// Parse a curve name, falling back to [`EasingCurve::Linear`]
    pub fn from_name_or_linear(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown easing curve '{}', using linear", name);
            EasingCurve::Linear
        })
    }
}

fn bounce(t: f32) -> f32 {
    (2.0 * PI * t).sin() * (1.0 - t) * BOUNCE_AMPLITUDE
}

/// Free-function form of [`EasingCurve::apply`]
pub fn ease(fraction: f32, curve: EasingCurve) -> f32 {
    curve.apply(fraction)
}

impl fmt::Display for EasingCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for unrecognized curve names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCurve(pub String);

impl fmt::Display for UnknownCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown easing curve '{}'", self.0)
    }
}

impl std::error::Error for UnknownCurve {}

impl FromStr for EasingCurve {
    type Err = UnknownCurve;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        EasingCurve::ALL
            .iter()
            .copied()
            .find(|curve| curve.name() == normalized)
            .ok_or_else(|| UnknownCurve(s.to_string()))
    }
}
