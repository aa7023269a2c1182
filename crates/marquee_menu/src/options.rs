//! Options side panel with an animated highlight bar

use crate::frame::{Frame, Visual};
use marquee_animation::{Animation, Timing};
use marquee_core::{ClockHandle, Color, Rect, Size, Vec2};
use marquee_text::TextEffect;

const PANEL_WIDTH: f32 = 480.0;
const PADDING: f32 = 32.0;
const PANEL: Color = Color::rgba(0.05, 0.05, 0.08, 0.85);
const HIGHLIGHT: Color = Color::rgba(1.0, 1.0, 1.0, 0.18);

pub struct Options {
    clock: ClockHandle,
    highlight_timing: Timing,
    fade_timing: Timing,
    text_height: f32,
    items: Vec<String>,
    selected: usize,
    visible: bool,
    /// Highlight position as a fractional row index
    highlight: Animation,
    fade: Animation,
}

impl Options {
    pub fn new(clock: &ClockHandle, highlight_timing: Timing, fade_timing: Timing, text_height: f32) -> Self {
        Self {
            clock: ClockHandle::clone(clock),
            highlight_timing,
            fade_timing,
            text_height,
            items: Vec::new(),
            selected: 0,
            visible: false,
            highlight: Animation::at_rest(clock, &[0.0]),
            fade: Animation::at_rest(clock, &[0.0]),
        }
    }

    pub fn show(&mut self, items: Vec<String>, selected: usize) {
        self.items = items;
        self.selected = selected.min(self.items.len().saturating_sub(1));
        self.highlight = Animation::at_rest(&self.clock, &[self.selected as f32]);
        self.visible = true;
        self.fade_to(1.0);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.fade_to(0.0);
    }

    fn fade_to(&mut self, opacity: f32) {
        let from = self.fade.current()[0];
        self.fade = Animation::new(&self.clock, self.fade_timing, &[from], &[opacity]);
    }

    /// Select `index`, sliding the highlight there; false when out of range
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        if index != self.selected {
            let from = self.highlight.current()[0];
            self.highlight = Animation::new(&self.clock, self.highlight_timing, &[from], &[index as f32]);
            self.selected = index;
        }
        true
    }

    /// Move the selection by `delta` rows, stopping at either end
    pub fn step(&mut self, delta: isize) -> bool {
        let Some(index) = self.selected.checked_add_signed(delta) else {
            return false;
        };
        index != self.selected && self.select(index)
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Highlight row at this instant
    pub fn highlight_row(&self) -> f32 {
        self.highlight.current()[0]
    }

    fn row_height(&self) -> f32 {
        self.text_height * 1.8
    }
}

impl Visual for Options {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let opacity = self.fade.update()[0];
        let row = self.highlight.update()[0];
        if opacity <= 0.0 || self.items.is_empty() {
            return;
        }

        let viewport = frame.viewport;
        let panel = Rect::new(viewport.width - PANEL_WIDTH, 0.0, PANEL_WIDTH, viewport.height);
        let row_height = self.row_height();
        let top = PADDING * 2.0;

        frame.draw.push_opacity(opacity);
        frame.draw.fill_rect(panel, 0.0, PANEL);
        frame.draw.fill_rect(
            Rect::new(panel.x() + PADDING / 2.0, top + row * row_height, PANEL_WIDTH - PADDING, row_height),
            6.0,
            HIGHLIGHT,
        );

        let bounds = Size::new(PANEL_WIDTH - PADDING * 2.0, self.text_height);
        for (index, item) in self.items.iter().enumerate() {
            let center_y = top + (index as f32 + 0.5) * row_height;
            let origin = Vec2::new(panel.x() + PADDING, center_y - self.text_height / 2.0);
            let color = if index == self.selected {
                Color::WHITE
            } else {
                Color::WHITE.with_alpha(0.7)
            };
            frame.label(item, origin, bounds, TextEffect::None, color);
        }
        frame.draw.pop_opacity();
    }

    fn is_animating(&self) -> bool {
        self.fade.is_active() || self.highlight.is_active()
    }
}
