//! On-screen view of the log console

use crate::frame::{Frame, Visual};
use marquee_core::{Color, LogConsole, Rect, Size, Vec2};
use marquee_text::TextEffect;
use tracing::Level;

const BACKDROP: Color = Color::rgba(0.0, 0.0, 0.0, 0.7);
const PADDING: f32 = 12.0;

fn level_color(level: Level) -> Color {
    match level {
        Level::ERROR => Color::rgb(1.0, 0.35, 0.35),
        Level::WARN => Color::rgb(1.0, 0.85, 0.3),
        Level::INFO => Color::WHITE,
        _ => Color::rgb(0.7, 0.7, 0.7),
    }
}

pub struct ConsoleView {
    console: LogConsole,
    visible: bool,
    visible_lines: usize,
    text_height: f32,
}

impl ConsoleView {
    pub fn new(console: LogConsole, visible_lines: usize, text_height: f32) -> Self {
        Self {
            console,
            visible: false,
            visible_lines,
            text_height,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn console(&self) -> &LogConsole {
        &self.console
    }
}

impl Visual for ConsoleView {
    fn render(&mut self, frame: &mut Frame<'_>) {
        if !self.visible {
            return;
        }
        let lines = self.console.tail(self.visible_lines);
        let line_height = self.text_height * 1.25;
        let height = self.visible_lines as f32 * line_height + PADDING * 2.0;
        let panel = Rect::new(0.0, 0.0, frame.viewport.width, height);
        frame.draw.fill_rect(panel, 0.0, BACKDROP);

        let bounds = Size::new(0.0, self.text_height);
        frame.draw.push_clip(panel);
        for (row, line) in lines.iter().enumerate() {
            let text = format!("{:>5} {}: {}", line.level.as_str(), line.target, line.message);
            let origin = Vec2::new(PADDING, PADDING + row as f32 * line_height);
            frame.label(&text, origin, bounds, TextEffect::None, level_color(line.level));
        }
        frame.draw.pop_clip();
    }

    fn is_animating(&self) -> bool {
        false
    }
}
