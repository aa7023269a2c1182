//! Time-driven value animation
//!
//! An [`Animation`] interpolates a short list of scalars from a source to a
//! target over a duration, after an optional delay. Controllers build a new
//! one on every state change and sample it once per frame with
//! [`Animation::update`]; there is no cancel, an animation is simply
//! replaced.

use crate::easing::EasingCurve;
use marquee_core::{ClockHandle, TransitionConfig};
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

/// Animated values; four inline slots cover every attribute in the overlay
pub type Values = SmallVec<[f32; 4]>;

/// Completion callback, fired once when the animation finishes
pub type Completion = Box<dyn FnOnce() + Send>;

/// Fraction at which an animation counts as finished
const FINISH_FRACTION: f32 = 0.999;

/// Duration, delay and curve of a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Timing {
    pub duration: Duration,
    pub delay: Duration,
    pub curve: EasingCurve,
}

impl Timing {
    pub fn new(duration_ms: u64, curve: EasingCurve) -> Self {
        Self {
            duration: Duration::from_millis(duration_ms),
            delay: Duration::ZERO,
            curve,
        }
    }

    /// A zero-length timing; the animation lands on its target immediately
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn with_curve(mut self, curve: EasingCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Build from configuration; unknown curve names fall back to linear
    pub fn from_config(config: &TransitionConfig) -> Self {
        Self {
            duration: Duration::from_millis(config.duration_ms),
            delay: Duration::from_millis(config.delay_ms),
            curve: EasingCurve::from_name_or_linear(&config.curve),
        }
    }
}

/// Interpolation of a list of values between source and target
pub struct Animation {
    clock: ClockHandle,
    start: Duration,
    timing: Timing,
    source: Values,
    target: Values,
    active: bool,
    on_complete: Option<Completion>,
}

impl Animation {
    /// Start an animation now
    ///
    /// Mismatched lengths are truncated to the shorter list. An empty list
    /// or a zero duration gives an animation that is inactive from the
    /// start and evaluates to the target.
    pub fn new(clock: &ClockHandle, timing: Timing, source: &[f32], target: &[f32]) -> Self {
        let len = source.len().min(target.len());
        let start = clock.now();
        Self {
            clock: ClockHandle::clone(clock),
            start,
            timing,
            source: source[..len].iter().copied().collect(),
            target: target[..len].iter().copied().collect(),
            active: len > 0 && !timing.duration.is_zero(),
            on_complete: None,
        }
    }

    /// An inactive animation resting at `values`
    pub fn at_rest(clock: &ClockHandle, values: &[f32]) -> Self {
        Self::new(clock, Timing::instant(), values, values)
    }

    /// Attach a completion callback
    ///
    /// It runs synchronously inside the first [`update`](Self::update) that
    /// observes the animation as finished, and never again.
    pub fn with_completion<F>(mut self, on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Sample at the clock's current time
    pub fn update(&mut self) -> Values {
        let now = self.clock.now();
        self.update_at(now)
    }

    /// Sample at `now`, finishing the animation when its time is up
    pub fn update_at(&mut self, now: Duration) -> Values {
        if self.active {
            if let Some(fraction) = self.fraction_at(now) {
                if fraction >= FINISH_FRACTION {
                    self.active = false;
                }
            }
        }
        if !self.active {
            if let Some(on_complete) = self.on_complete.take() {
                on_complete();
            }
        }
        self.value_at(now)
    }

    /// Pure sample at `now`; never changes state or fires the completion
    pub fn value_at(&self, now: Duration) -> Values {
        if !self.active {
            return self.target.clone();
        }
        let fraction = match self.fraction_at(now) {
            None => return self.source.clone(),
            Some(f) if f >= FINISH_FRACTION => return self.target.clone(),
            Some(f) => f,
        };
        let eased = self.timing.curve.apply(fraction);
        if self.timing.curve.is_bounce() {
            self.target.iter().map(|target| target + eased).collect()
        } else {
            self.source
                .iter()
                .zip(self.target.iter())
                .map(|(source, target)| source + (target - source) * eased)
                .collect()
        }
    }

    /// Current values without advancing state
    pub fn current(&self) -> Values {
        self.value_at(self.clock.now())
    }

    /// Elapsed fraction after the delay, `None` while still delayed
    fn fraction_at(&self, now: Duration) -> Option<f32> {
        let elapsed = now.saturating_sub(self.start);
        if elapsed < self.timing.delay {
            return None;
        }
        if self.timing.duration.is_zero() {
            return Some(1.0);
        }
        let running = elapsed - self.timing.delay;
        Some(running.as_secs_f32() / self.timing.duration.as_secs_f32())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the animation still has time left at `now`
    ///
    /// Unlike [`Animation::is_active`] this does not wait for an update to
    /// notice that the time is up. A delayed animation counts as running.
    pub fn is_running_at(&self, now: Duration) -> bool {
        self.active && self.fraction_at(now).map_or(true, |f| f < FINISH_FRACTION)
    }

    pub fn is_during_delay(&self) -> bool {
        self.active && self.clock.now().saturating_sub(self.start) < self.timing.delay
    }

    pub fn source(&self) -> &[f32] {
        &self.source
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn start_time(&self) -> Duration {
        self.start
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub(crate) fn clock(&self) -> &ClockHandle {
        &self.clock
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("start", &self.start)
            .field("timing", &self.timing)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("active", &self.active)
            .field("has_completion", &self.on_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn approx(values: &[f32], expected: &[f32]) -> bool {
        values.len() == expected.len()
            && values
                .iter()
                .zip(expected)
                .all(|(a, b)| (a - b).abs() < 1e-4)
    }

    #[test]
    fn test_linear_half_and_end() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(
            &handle,
            Timing::new(1000, EasingCurve::Linear),
            &[0.0],
            &[1.0],
        );

        clock.set_ms(500);
        assert!(approx(&anim.update(), &[0.5]));
        assert!(anim.is_active());

        clock.set_ms(1000);
        assert!(approx(&anim.update(), &[1.0]));
        assert!(!anim.is_active());
    }

    #[test]
    fn test_delay_holds_source() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(
            &handle,
            Timing::new(100, EasingCurve::QuadOut).with_delay(200),
            &[10.0, 20.0],
            &[30.0, 40.0],
        );

        clock.set_ms(150);
        assert!(anim.is_during_delay());
        assert!(approx(&anim.update(), &[10.0, 20.0]));

        clock.set_ms(200);
        assert!(!anim.is_during_delay());
        assert!(approx(&anim.update(), &[10.0, 20.0]));

        clock.set_ms(300);
        assert!(approx(&anim.update(), &[30.0, 40.0]));
        assert!(!anim.is_active());
    }

    #[test]
    fn test_overshooting_sample_lands_on_target() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(
            &handle,
            Timing::new(100, EasingCurve::Linear),
            &[0.0],
            &[10.0],
        );

        clock.set_ms(5000);
        assert!(approx(&anim.update(), &[10.0]));
        assert!(!anim.is_active());
    }

    #[test]
    fn test_zero_duration_is_inactive_at_target() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(&handle, Timing::instant(), &[1.0, 2.0], &[3.0, 4.0]);

        assert!(!anim.is_active());
        assert!(approx(&anim.update(), &[3.0, 4.0]));
    }

    #[test]
    fn test_truncation_matches_pre_truncated() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let timing = Timing::new(400, EasingCurve::CubicInOut);
        let mut long = Animation::new(&handle, timing, &[0.0, 5.0, 9.0], &[8.0]);
        let mut short = Animation::new(&handle, timing, &[0.0], &[8.0]);

        assert_eq!(long.len(), 1);
        for ms in [0, 100, 200, 399, 400] {
            clock.set_ms(ms);
            assert_eq!(long.update(), short.update());
            assert_eq!(long.is_active(), short.is_active());
        }
    }

    #[test]
    fn test_empty_values_inactive() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(&handle, Timing::new(100, EasingCurve::Linear), &[], &[1.0]);
        assert!(!anim.is_active());
        assert!(anim.update().is_empty());
    }

    #[test]
    fn test_update_is_idempotent_at_same_instant() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(
            &handle,
            Timing::new(300, EasingCurve::QuintInOut),
            &[-4.0, 2.0],
            &[4.0, 12.0],
        );
        clock.set_ms(120);
        let first = anim.update();
        let second = anim.update();
        assert_eq!(first, second);
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut anim = Animation::new(
            &handle,
            Timing::new(100, EasingCurve::Linear),
            &[0.0],
            &[1.0],
        )
        .with_completion(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        clock.set_ms(50);
        anim.update();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        clock.set_ms(100);
        anim.update();
        anim.update();
        clock.set_ms(200);
        anim.update();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completion_of_instant_animation_fires_on_first_update() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut anim = Animation::at_rest(&handle, &[1.0]).with_completion(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        anim.update();
        anim.update();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_value_at_does_not_finish() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let anim = Animation::new(
            &handle,
            Timing::new(100, EasingCurve::Linear),
            &[0.0],
            &[1.0],
        );
        assert!(approx(&anim.value_at(Duration::from_millis(200)), &[1.0]));
        assert!(anim.is_active());
    }

    #[test]
    fn test_running_follows_clock_without_update() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let anim = Animation::new(
            &handle,
            Timing::new(100, EasingCurve::Linear).with_delay(50),
            &[0.0],
            &[1.0],
        );

        assert!(anim.is_running_at(Duration::from_millis(20)));
        assert!(anim.is_running_at(Duration::from_millis(100)));
        assert!(!anim.is_running_at(Duration::from_millis(150)));
        // The cached flag only drops on update
        assert!(anim.is_active());

        let rest = Animation::at_rest(&handle, &[3.0]);
        assert!(!rest.is_running_at(Duration::ZERO));
    }

    #[test]
    fn test_bounce_offsets_from_target() {
        let clock = ManualClock::new();
        let handle = clock.handle();
        let mut anim = Animation::new(
            &handle,
            Timing::new(1000, EasingCurve::BounceRight),
            &[100.0],
            &[100.0],
        );
        clock.set_ms(250);
        assert!(approx(&anim.update(), &[115.0]));
        clock.set_ms(1000);
        assert!(approx(&anim.update(), &[100.0]));
    }

    #[test]
    fn test_timing_from_config() {
        let timing = Timing::from_config(&TransitionConfig::new(250, 40, "quart-out"));
        assert_eq!(timing.duration, Duration::from_millis(250));
        assert_eq!(timing.delay, Duration::from_millis(40));
        assert_eq!(timing.curve, EasingCurve::QuartOut);
    }
}
