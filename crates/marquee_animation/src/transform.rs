//! Composite transform animation
//!
//! Movable visuals (tiles, modal windows) animate four attributes at once:
//! position, zoom, size and opacity. Each attribute runs its own
//! [`Animation`] with its own timing so, for example, the zoom can settle
//! before the move finishes. They share one clock and one "is anything
//! still moving" answer.

use crate::animation::{Animation, Timing};
use crate::easing::EasingCurve;
use marquee_core::{ClockHandle, Size, Vec2};
use std::time::Duration;

/// Snapshot of the four animated attributes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformState {
    pub position: Vec2,
    pub zoom: f32,
    pub size: Size,
    pub opacity: f32,
}

impl TransformState {
    pub fn new(position: Vec2, size: Size) -> Self {
        Self {
            position,
            zoom: 1.0,
            size,
            opacity: 1.0,
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Size after zoom
    pub fn scaled_size(&self) -> Size {
        self.size.scale(self.zoom)
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Size::ZERO)
    }
}

/// One attribute's transition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track<T> {
    pub from: T,
    pub to: T,
    pub timing: Timing,
}

impl<T> Track<T> {
    pub fn new(from: T, to: T, timing: Timing) -> Self {
        Self { from, to, timing }
    }
}

/// Parameters for all four attributes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformSpec {
    pub position: Track<Vec2>,
    pub zoom: Track<f32>,
    pub size: Track<Size>,
    pub opacity: Track<f32>,
}

impl TransformSpec {
    /// Transition between two states with per-attribute timings
    pub fn between(from: TransformState, to: TransformState, timings: TransformTimings) -> Self {
        Self {
            position: Track::new(from.position, to.position, timings.position),
            zoom: Track::new(from.zoom, to.zoom, timings.zoom),
            size: Track::new(from.size, to.size, timings.size),
            opacity: Track::new(from.opacity, to.opacity, timings.opacity),
        }
    }
}

/// Per-attribute timings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TransformTimings {
    pub position: Timing,
    pub zoom: Timing,
    pub size: Timing,
    pub opacity: Timing,
}

impl TransformTimings {
    /// Same timing for every attribute
    pub fn uniform(timing: Timing) -> Self {
        Self {
            position: timing,
            zoom: timing,
            size: timing,
            opacity: timing,
        }
    }

    /// Mid-flight retargets continue with a decelerating curve
    fn for_retarget(self) -> Self {
        let soften = |timing: Timing| {
            if timing.curve == EasingCurve::CubicInOut {
                timing.with_curve(EasingCurve::CubicOut)
            } else {
                timing
            }
        };
        Self {
            position: soften(self.position),
            zoom: soften(self.zoom),
            size: soften(self.size),
            opacity: soften(self.opacity),
        }
    }
}

/// Horizontal bounce direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BounceDirection {
    Left,
    Right,
}

impl BounceDirection {
    pub fn curve(self) -> EasingCurve {
        match self {
            BounceDirection::Left => EasingCurve::BounceLeft,
            BounceDirection::Right => EasingCurve::BounceRight,
        }
    }
}

enum PositionTrack {
    Move(Animation),
    /// Horizontal bounce around the target x; y stays put
    Bounce { x: Animation, y: f32 },
}

impl PositionTrack {
    fn update(&mut self) -> Vec2 {
        match self {
            PositionTrack::Move(anim) => Vec2::from_slice(&anim.update()),
            PositionTrack::Bounce { x, y } => Vec2::new(x.update()[0], *y),
        }
    }

    fn value_at(&self, now: Duration) -> Vec2 {
        match self {
            PositionTrack::Move(anim) => Vec2::from_slice(&anim.value_at(now)),
            PositionTrack::Bounce { x, y } => Vec2::new(x.value_at(now)[0], *y),
        }
    }

    fn is_active(&self) -> bool {
        self.animation().is_active()
    }

    fn source(&self) -> Vec2 {
        match self {
            PositionTrack::Move(anim) => Vec2::from_slice(anim.source()),
            PositionTrack::Bounce { x, y } => Vec2::new(x.source()[0], *y),
        }
    }

    fn target(&self) -> Vec2 {
        match self {
            PositionTrack::Move(anim) => Vec2::from_slice(anim.target()),
            PositionTrack::Bounce { x, y } => Vec2::new(x.target()[0], *y),
        }
    }

    fn animation(&self) -> &Animation {
        match self {
            PositionTrack::Move(anim) => anim,
            PositionTrack::Bounce { x, .. } => x,
        }
    }
}

/// Four independently timed attribute animations
pub struct TransformAnimation {
    position: PositionTrack,
    zoom: Animation,
    size: Animation,
    opacity: Animation,
}

impl TransformAnimation {
    pub fn new(clock: &ClockHandle, spec: TransformSpec) -> Self {
        let position = Animation::new(
            clock,
            spec.position.timing,
            &spec.position.from.to_array(),
            &spec.position.to.to_array(),
        );
        Self {
            position: PositionTrack::Move(position),
            zoom: Animation::new(clock, spec.zoom.timing, &[spec.zoom.from], &[spec.zoom.to]),
            size: Animation::new(
                clock,
                spec.size.timing,
                &spec.size.from.to_array(),
                &spec.size.to.to_array(),
            ),
            opacity: Animation::new(
                clock,
                spec.opacity.timing,
                &[spec.opacity.from],
                &[spec.opacity.to],
            ),
        }
    }

    /// A transform resting at `state`
    pub fn at_rest(clock: &ClockHandle, state: TransformState) -> Self {
        Self::new(
            clock,
            TransformSpec::between(state, state, TransformTimings::default()),
        )
    }

    /// Sample every attribute, finishing those whose time is up
    pub fn update(&mut self) -> TransformState {
        TransformState {
            position: self.position.update(),
            zoom: self.zoom.update()[0],
            size: Size::from_slice(&self.size.update()),
            opacity: self.opacity.update()[0],
        }
    }

    /// Pure sample at `now`
    pub fn value_at(&self, now: Duration) -> TransformState {
        TransformState {
            position: self.position.value_at(now),
            zoom: self.zoom.value_at(now)[0],
            size: Size::from_slice(&self.size.value_at(now)),
            opacity: self.opacity.value_at(now)[0],
        }
    }

    /// Current interpolated state without advancing anything
    pub fn current(&self) -> TransformState {
        self.value_at(self.clock().now())
    }

    pub fn is_active(&self) -> bool {
        self.position.is_active()
            || self.zoom.is_active()
            || self.size.is_active()
            || self.opacity.is_active()
    }

    /// Whether any attribute still has time left at `now`
    pub fn is_running_at(&self, now: Duration) -> bool {
        self.position.animation().is_running_at(now)
            || self.zoom.is_running_at(now)
            || self.size.is_running_at(now)
            || self.opacity.is_running_at(now)
    }

    pub fn is_bouncing(&self) -> bool {
        let now = self.clock().now();
        matches!(&self.position, PositionTrack::Bounce { x, .. } if x.is_running_at(now))
    }

    pub fn source(&self) -> TransformState {
        TransformState {
            position: self.position.source(),
            zoom: self.zoom.source()[0],
            size: Size::from_slice(self.size.source()),
            opacity: self.opacity.source()[0],
        }
    }

    pub fn target(&self) -> TransformState {
        TransformState {
            position: self.position.target(),
            zoom: self.zoom.target()[0],
            size: Size::from_slice(self.size.target()),
            opacity: self.opacity.target()[0],
        }
    }

    /// The animation currently driving the position
    pub fn position_animation(&self) -> &Animation {
        self.position.animation()
    }

    /// Start a transition to `to`
    ///
    /// The new transition starts from the current interpolated state. When
    /// the previous one is still running, `CubicInOut` tracks become
    /// `CubicOut` so the element keeps moving instead of easing in again.
    pub fn retarget(&mut self, to: TransformState, timings: TransformTimings) {
        let clock = ClockHandle::clone(self.clock());
        let now = clock.now();
        let from = self.value_at(now);
        let timings = if self.is_running_at(now) {
            timings.for_retarget()
        } else {
            timings
        };
        *self = Self::new(&clock, TransformSpec::between(from, to, timings));
    }

    /// Snap to `state` with no transition
    pub fn jump_to(&mut self, state: TransformState) {
        let clock = ClockHandle::clone(self.clock());
        *self = Self::at_rest(&clock, state);
    }

    /// Shake horizontally around the target position
    ///
    /// Ignored while a bounce is already running; returns whether a new
    /// bounce started. Zoom, size and opacity keep their transitions.
    pub fn bounce(&mut self, direction: BounceDirection, timing: Timing) -> bool {
        if self.is_bouncing() {
            tracing::trace!("Bounce ignored, one is already running");
            return false;
        }
        let target = self.position.target();
        let clock = ClockHandle::clone(self.clock());
        let x = Animation::new(
            &clock,
            timing.with_curve(direction.curve()),
            &[target.x],
            &[target.x],
        );
        self.position = PositionTrack::Bounce { x, y: target.y };
        true
    }

    fn clock(&self) -> &ClockHandle {
        self.zoom.clock()
    }
}

impl std::fmt::Debug for TransformAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformAnimation")
            .field("source", &self.source())
            .field("target", &self.target())
            .field("active", &self.is_active())
            .field("bouncing", &self.is_bouncing())
            .finish()
    }
}
