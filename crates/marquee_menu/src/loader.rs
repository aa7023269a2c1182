//! Busy indicator: a ring of dots with a rotating head and a gentle pulse

use crate::frame::{Frame, Visual};
use marquee_animation::{Animation, EasingCurve, Timing};
use marquee_core::{ClockHandle, Color, Rect, Size, Vec2};
use std::f32::consts::TAU;

const DOTS: usize = 8;
const RADIUS: f32 = 36.0;
const DOT_SIZE: f32 = 12.0;

pub struct Loader {
    clock: ClockHandle,
    period_ms: u64,
    fade_timing: Timing,
    visible: bool,
    /// One revolution, 0..1; restarted whenever it finishes
    rotation: Animation,
    fade: Animation,
}

impl Loader {
    pub fn new(clock: &ClockHandle, period_ms: u64, fade_timing: Timing) -> Self {
        Self {
            clock: ClockHandle::clone(clock),
            period_ms: period_ms.max(1),
            fade_timing,
            visible: false,
            rotation: Animation::at_rest(clock, &[0.0]),
            fade: Animation::at_rest(clock, &[0.0]),
        }
    }

    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        self.restart_rotation();
        let from = self.fade.current()[0];
        self.fade = Animation::new(&self.clock, self.fade_timing, &[from], &[1.0]);
    }

    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        let from = self.fade.current()[0];
        self.fade = Animation::new(&self.clock, self.fade_timing, &[from], &[0.0]);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn restart_rotation(&mut self) {
        let timing = Timing::new(self.period_ms, EasingCurve::Linear);
        self.rotation = Animation::new(&self.clock, timing, &[0.0], &[1.0]);
    }

    /// Rotation in 0..1 and pulse scale for this frame
    fn sample(&mut self) -> (f32, f32) {
        let mut turn = self.rotation.update()[0];
        if !self.rotation.is_active() {
            self.restart_rotation();
            turn = 0.0;
        }
        let pulse = 1.0 + 0.15 * (turn * TAU * 2.0).sin();
        (turn, pulse)
    }
}

/// Opacity of dot `index` when the head is at `turn`; the head is brightest
fn dot_alpha(index: usize, turn: f32) -> f32 {
    let head = (turn * DOTS as f32).floor() as usize % DOTS;
    let behind = (head + DOTS - index) % DOTS;
    1.0 - behind as f32 / DOTS as f32
}

impl Visual for Loader {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let opacity = self.fade.update()[0];
        if opacity <= 0.0 {
            return;
        }
        let (turn, pulse) = self.sample();
        let center = Vec2::new(frame.viewport.width / 2.0, frame.viewport.height / 2.0);
        let dot = Size::new(DOT_SIZE * pulse, DOT_SIZE * pulse);

        frame.draw.push_opacity(opacity);
        for index in 0..DOTS {
            let angle = index as f32 / DOTS as f32 * TAU;
            let at = Vec2::new(
                center.x + RADIUS * angle.cos(),
                center.y + RADIUS * angle.sin(),
            );
            let color = Color::WHITE.with_alpha(dot_alpha(index, turn));
            frame.draw.fill_rect(Rect::centered(at, dot), dot.width / 2.0, color);
        }
        frame.draw.pop_opacity();
    }

    fn is_animating(&self) -> bool {
        self.visible || self.fade.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use marquee_core::DrawCommand;

    fn brightest(commands: &[DrawCommand]) -> Option<usize> {
        commands
            .iter()
            .enumerate()
            .filter_map(|(i, cmd)| match cmd {
                DrawCommand::FillRect { color, .. } => Some((i, color.a)),
                _ => None,
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    #[test]
    fn test_dot_alpha_trails_head() {
        assert_eq!(dot_alpha(0, 0.0), 1.0);
        assert_eq!(dot_alpha(7, 0.0), 1.0 - 1.0 / 8.0);
        assert_eq!(dot_alpha(3, 3.5 / 8.0), 1.0);
    }

    #[test]
    fn test_rotation_loops_while_visible() {
        let mut h = Harness::new();
        let mut loader = Loader::new(&h.clock.handle(), 800, Timing::instant());
        loader.show();

        h.clock.set_ms(300);
        assert_eq!(brightest(&h.render(&mut loader)), Some(3));

        // Past the first revolution the head starts over
        h.clock.set_ms(800);
        assert_eq!(brightest(&h.render(&mut loader)), Some(0));
        h.clock.set_ms(1100);
        assert_eq!(brightest(&h.render(&mut loader)), Some(3));
        assert!(loader.is_animating());
    }

    #[test]
    fn test_hidden_loader_draws_nothing() {
        let mut h = Harness::new();
        let mut loader = Loader::new(&h.clock.handle(), 800, Timing::instant());
        assert!(h.render(&mut loader).is_empty());
        loader.show();
        loader.hide();
        assert!(h.render(&mut loader).is_empty());
        assert!(!loader.is_animating());
    }
}
