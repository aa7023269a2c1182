//! Metrics overlay
//!
//! Each [`Trace`] keeps a bounded history that is advanced once per frame
//! with [`Trace::step`]. The [`Graph`] draws every trace as a polyline in a
//! shared box, with a `name: value` legend.

use crate::frame::{Frame, Visual};
use marquee_core::{Color, Rect, Size, Vec2};
use marquee_text::TextEffect;
use std::collections::VecDeque;
use std::time::Duration;

const BACKDROP: Color = Color::rgba(0.0, 0.0, 0.0, 0.55);
const LINE_WIDTH: f32 = 2.0;
const LEGEND_HEIGHT: f32 = 18.0;

/// A plotted series
#[derive(Clone, Debug, PartialEq)]
pub enum Trace {
    /// Host-recorded values; each step appends the latest one
    Samples {
        label: String,
        latest: f32,
        history: VecDeque<f32>,
        capacity: usize,
    },
    /// Frames per second, measured from the step times
    Framerate {
        label: String,
        last_step: Option<Duration>,
        intervals: VecDeque<Duration>,
        window: usize,
        history: VecDeque<f32>,
        capacity: usize,
    },
}

fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
    if queue.len() == capacity {
        queue.pop_front();
    }
    queue.push_back(value);
}

impl Trace {
    pub fn samples(label: impl Into<String>, capacity: usize) -> Self {
        Trace::Samples {
            label: label.into(),
            latest: 0.0,
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
        }
    }

    /// Framerate averaged over the last `window` frames
    pub fn framerate(label: impl Into<String>, window: usize, capacity: usize) -> Self {
        Trace::Framerate {
            label: label.into(),
            last_step: None,
            intervals: VecDeque::with_capacity(window),
            window: window.max(1),
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Trace::Samples { label, .. } | Trace::Framerate { label, .. } => label,
        }
    }

    /// Set the value the next step records; ignored by framerate traces
    pub fn record(&mut self, value: f32) {
        match self {
            Trace::Samples { latest, .. } => *latest = value,
            Trace::Framerate { label, .. } => {
                tracing::debug!("Ignoring recorded value for framerate trace '{}'", label)
            }
        }
    }

    /// Advance one frame
    pub fn step(&mut self, now: Duration) {
        match self {
            Trace::Samples {
                latest,
                history,
                capacity,
                ..
            } => push_bounded(history, *latest, *capacity),
            Trace::Framerate {
                last_step,
                intervals,
                window,
                history,
                capacity,
                ..
            } => {
                if let Some(previous) = last_step.replace(now) {
                    let interval = now.saturating_sub(previous);
                    if !interval.is_zero() {
                        push_bounded(intervals, interval, *window);
                    }
                }
                let fps = average_fps(intervals);
                push_bounded(history, fps, *capacity);
            }
        }
    }

    pub fn current_value(&self) -> f32 {
        match self {
            Trace::Samples { latest, .. } => *latest,
            Trace::Framerate { intervals, .. } => average_fps(intervals),
        }
    }

    pub fn history(&self) -> &VecDeque<f32> {
        match self {
            Trace::Samples { history, .. } | Trace::Framerate { history, .. } => history,
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Trace::Samples { capacity, .. } | Trace::Framerate { capacity, .. } => *capacity,
        }
    }
}

fn average_fps(intervals: &VecDeque<Duration>) -> f32 {
    if intervals.is_empty() {
        return 0.0;
    }
    let total: Duration = intervals.iter().sum();
    intervals.len() as f32 / total.as_secs_f32()
}

/// Graph of several traces
pub struct Graph {
    rect: Rect,
    traces: Vec<(Trace, Color)>,
    visible: bool,
}

impl Graph {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            traces: Vec::new(),
            visible: false,
        }
    }

    /// Add a trace; returns its index
    pub fn add_trace(&mut self, trace: Trace, color: Color) -> usize {
        self.traces.push((trace, color));
        self.traces.len() - 1
    }

    pub fn record(&mut self, index: usize, value: f32) -> bool {
        match self.traces.get_mut(index) {
            Some((trace, _)) => {
                trace.record(value);
                true
            }
            None => false,
        }
    }

    pub fn trace(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index).map(|(trace, _)| trace)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Largest value in any history, at least 1
    fn range(&self) -> f32 {
        self.traces
            .iter()
            .flat_map(|(trace, _)| trace.history().iter().copied())
            .fold(1.0f32, f32::max)
    }

    fn points(&self, trace: &Trace, range: f32) -> Vec<Vec2> {
        let step_x = self.rect.width() / (trace.capacity() - 1) as f32;
        trace
            .history()
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let y = self.rect.y() + self.rect.height() * (1.0 - value.clamp(0.0, range) / range);
                Vec2::new(self.rect.x() + i as f32 * step_x, y)
            })
            .collect()
    }
}

impl Visual for Graph {
    fn render(&mut self, frame: &mut Frame<'_>) {
        // Traces keep measuring while hidden
        for (trace, _) in &mut self.traces {
            trace.step(frame.now);
        }
        if !self.visible {
            return;
        }

        frame.draw.fill_rect(self.rect.inset(-8.0), 4.0, BACKDROP);
        let range = self.range();
        for (trace, color) in &self.traces {
            frame.draw.polyline(self.points(trace, range), LINE_WIDTH, *color);
        }

        let mut y = self.rect.y() + self.rect.height() + 12.0;
        for (trace, color) in &self.traces {
            let legend = format!("{}: {:.1}", trace.label(), trace.current_value());
            frame.label(
                &legend,
                Vec2::new(self.rect.x(), y),
                Size::new(0.0, LEGEND_HEIGHT),
                TextEffect::None,
                *color,
            );
            y += LEGEND_HEIGHT * 1.4;
        }
    }

    fn is_animating(&self) -> bool {
        self.visible
    }
}
