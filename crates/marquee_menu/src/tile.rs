//! Content tiles
//!
//! A tile is a poster with a title underneath. Its placement, zoom, size and
//! opacity are one [`TransformAnimation`]; the poster is drawn with the tile
//! program shared by every tile.

use crate::frame::{Frame, Visual};
use crate::image::Image;
use crate::Result;
use marquee_animation::{BounceDirection, Timing, TransformAnimation, TransformState, TransformTimings};
use marquee_core::{ClockHandle, Color, GpuContext, GpuProgram, GpuTexture, Rect, Size, Vec2};
use marquee_text::TextEffect;
use std::sync::Arc;

const PLACEHOLDER: Color = Color::rgba(0.18, 0.18, 0.22, 1.0);
const FOCUS: Color = Color::rgba(1.0, 1.0, 1.0, 0.9);
const CORNER_RADIUS: f32 = 8.0;
const FOCUS_BORDER: f32 = 4.0;

/// What the host supplies for each tile
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileContent {
    pub title: String,
    pub poster: Option<Image>,
}

impl TileContent {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            poster: None,
        }
    }
}

pub struct Tile {
    title: String,
    poster: Option<GpuTexture>,
    program: Option<Arc<GpuProgram>>,
    transform: TransformAnimation,
    selected: bool,
    label_height: f32,
}

impl Tile {
    /// A tile resting at `state`; `state.position` is the tile center
    pub fn new(
        clock: &ClockHandle,
        title: impl Into<String>,
        program: Option<Arc<GpuProgram>>,
        state: TransformState,
        label_height: f32,
    ) -> Self {
        Self {
            title: title.into(),
            poster: None,
            program,
            transform: TransformAnimation::at_rest(clock, state),
            selected: false,
            label_height,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_poster(&mut self, gpu: &mut GpuContext, image: &Image) -> Result<()> {
        let label = format!("poster '{}'", self.title);
        self.poster = Some(image.upload(gpu, &label)?);
        Ok(())
    }

    pub fn poster(&self) -> Option<&GpuTexture> {
        self.poster.as_ref()
    }

    pub fn program(&self) -> Option<&Arc<GpuProgram>> {
        self.program.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Transition toward `to`, continuing smoothly from wherever the tile is
    pub fn move_to(&mut self, to: TransformState, timings: TransformTimings) {
        if self.transform.target() != to {
            self.transform.retarget(to, timings);
        }
    }

    pub fn jump_to(&mut self, to: TransformState) {
        self.transform.jump_to(to);
    }

    /// Edge feedback; ignored while the tile is still shaking
    pub fn bounce(&mut self, direction: BounceDirection, timing: Timing) -> bool {
        self.transform.bounce(direction, timing)
    }

    pub fn is_bouncing(&self) -> bool {
        self.transform.is_bouncing()
    }

    pub fn current(&self) -> TransformState {
        self.transform.current()
    }

    pub fn target(&self) -> TransformState {
        self.transform.target()
    }

    pub fn transform(&self) -> &TransformAnimation {
        &self.transform
    }
}

impl Visual for Tile {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let state = self.transform.update();
        if state.opacity <= 0.0 {
            return;
        }
        let rect = Rect::centered(state.position, state.scaled_size());
        if !rect_visible(&rect, frame.viewport) {
            return;
        }

        frame.draw.push_opacity(state.opacity);

        if self.selected {
            frame
                .draw
                .fill_rect(rect.inset(-FOCUS_BORDER), CORNER_RADIUS + FOCUS_BORDER, FOCUS);
        }
        match (&self.poster, &self.program) {
            (Some(poster), Some(program)) => {
                frame
                    .draw
                    .texture(rect, poster.id(), Color::WHITE, Some(program.id()));
            }
            // No program: the poster is skipped
            (Some(_), None) => {}
            (None, _) => frame.draw.fill_rect(rect, CORNER_RADIUS, PLACEHOLDER),
        }

        let label_center = Vec2::new(
            rect.center().x,
            rect.y() + rect.height() + FOCUS_BORDER + self.label_height,
        );
        let bounds = Size::new(rect.width(), self.label_height);
        let effect = if self.selected {
            frame.text.shadow()
        } else {
            TextEffect::None
        };
        frame.label_centered(&self.title, label_center, bounds, effect, Color::WHITE);

        frame.draw.pop_opacity();
    }

    fn is_animating(&self) -> bool {
        self.transform.is_active()
    }
}

fn rect_visible(rect: &Rect, viewport: Size) -> bool {
    rect.x() + rect.width() > 0.0
        && rect.y() + rect.height() > 0.0
        && rect.x() < viewport.width
        && rect.y() < viewport.height
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("title", &self.title)
            .field("selected", &self.selected)
            .field("transform", &self.transform)
            .finish()
    }
}
