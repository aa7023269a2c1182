//! Playback HUD
//!
//! Title, animated progress bar, elapsed/total labels and an optional seek
//! preview. Preview frames are pulled from a host-provided [`FrameSource`].

use crate::frame::{Frame, Visual};
use crate::image::Image;
use marquee_animation::{Animation, Timing};
use marquee_core::{ClockHandle, Color, GpuTexture, Rect, Size, TextureId, Vec2};
use std::time::Duration;

const BAR_HEIGHT: f32 = 8.0;
const MARGIN: f32 = 96.0;
const PANEL: Color = Color::rgba(0.0, 0.0, 0.0, 0.6);
const TRACK: Color = Color::rgba(1.0, 1.0, 1.0, 0.25);
const FILL: Color = Color::rgba(0.9, 0.2, 0.2, 1.0);
const PREVIEW_SIZE: Size = Size::new(256.0, 144.0);

/// A decoded preview frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameData {
    pub image: Image,
    /// Position the frame was actually taken from
    pub position: Duration,
}

/// Supplier of seek preview frames (storyboards, trick-play thumbnails)
pub trait FrameSource: Send {
    /// Frame nearest to `position` of the media `id`, if available
    fn fetch_frame(&mut self, position: Duration, id: &str) -> Option<FrameData>;
}

struct Preview {
    requested: Duration,
    texture: Option<GpuTexture>,
}

/// Format as `m:ss`, or `h:mm:ss` from one hour up
pub fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub struct Playback {
    clock: ClockHandle,
    hud_timing: Timing,
    progress_timing: Timing,
    text_height: f32,
    visible: bool,
    hud: Animation,
    progress: Animation,
    title: String,
    media_id: String,
    position: Duration,
    duration: Duration,
    source: Option<Box<dyn FrameSource>>,
    seek: Option<Duration>,
    preview: Option<Preview>,
}

impl Playback {
    pub fn new(clock: &ClockHandle, hud_timing: Timing, progress_timing: Timing, text_height: f32) -> Self {
        Self {
            clock: ClockHandle::clone(clock),
            hud_timing,
            progress_timing,
            text_height,
            visible: false,
            hud: Animation::at_rest(clock, &[0.0]),
            progress: Animation::at_rest(clock, &[0.0]),
            title: String::new(),
            media_id: String::new(),
            position: Duration::ZERO,
            duration: Duration::ZERO,
            source: None,
            seek: None,
            preview: None,
        }
    }

    pub fn set_frame_source(&mut self, source: Box<dyn FrameSource>) {
        self.source = Some(source);
        self.preview = None;
    }

    /// Fade the HUD in for a new item
    pub fn show(&mut self, title: impl Into<String>, media_id: impl Into<String>, duration: Duration) {
        let media_id = media_id.into();
        if media_id != self.media_id {
            self.preview = None;
            self.seek = None;
            self.position = Duration::ZERO;
            self.progress = Animation::at_rest(&self.clock, &[0.0]);
        }
        self.title = title.into();
        self.media_id = media_id;
        self.duration = duration;
        self.fade_to(1.0);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.fade_to(0.0);
        self.visible = false;
        self.seek = None;
    }

    fn fade_to(&mut self, opacity: f32) {
        let from = self.hud.current()[0];
        if self.hud.target()[0] != opacity {
            self.hud = Animation::new(&self.clock, self.hud_timing, &[from], &[opacity]);
        }
    }

    /// Animate the progress bar to `position`
    pub fn set_position(&mut self, position: Duration) {
        self.position = position.min(self.duration);
        let from = self.progress.current()[0];
        self.progress = Animation::new(&self.clock, self.progress_timing, &[from], &[self.fraction()]);
    }

    /// Show a preview for `position` until [`Playback::end_seek`]
    pub fn seek_preview(&mut self, position: Duration) {
        self.seek = Some(position.min(self.duration));
    }

    pub fn end_seek(&mut self) {
        self.seek = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Target progress in 0..=1
    pub fn fraction(&self) -> f32 {
        if self.duration.is_zero() {
            0.0
        } else {
            (self.position.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
        }
    }

    /// Displayed progress, following the animation
    pub fn displayed_fraction(&self) -> f32 {
        self.progress.current()[0]
    }

    pub fn hud_opacity(&self) -> f32 {
        self.hud.current()[0]
    }

    pub fn has_preview(&self) -> bool {
        self.preview_texture().is_some()
    }

    /// Texture of the loaded seek preview
    pub fn preview_texture(&self) -> Option<TextureId> {
        self.preview.as_ref()?.texture.as_ref().map(GpuTexture::id)
    }

    /// Fetch the preview for the pending seek unless it is already loaded
    fn refresh_preview(&mut self, frame: &mut Frame<'_>) {
        let Some(seek) = self.seek else {
            return;
        };
        if matches!(&self.preview, Some(p) if p.requested == seek) {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };

        let texture = source.fetch_frame(seek, &self.media_id).and_then(|data| {
            match data.image.upload(frame.gpu, "seek preview") {
                Ok(texture) => Some(texture),
                Err(err) => {
                    tracing::warn!("Dropping seek preview at {:?}: {}", data.position, err);
                    None
                }
            }
        });
        self.preview = Some(Preview {
            requested: seek,
            texture,
        });
    }
}

impl Visual for Playback {
    fn render(&mut self, frame: &mut Frame<'_>) {
        let opacity = self.hud.update()[0];
        let shown = self.progress.update()[0].clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        self.refresh_preview(frame);

        let viewport = frame.viewport;
        let bar_width = viewport.width - MARGIN * 2.0;
        let bar_y = viewport.height - MARGIN;
        let panel_top = bar_y - self.text_height * 2.5;

        frame.draw.push_opacity(opacity);
        frame.draw.fill_rect(
            Rect::new(0.0, panel_top, viewport.width, viewport.height - panel_top),
            0.0,
            PANEL,
        );

        let line = Size::new(bar_width, self.text_height);
        let effect = frame.text.shadow();
        frame.label(&self.title, Vec2::new(MARGIN, panel_top + 8.0), line, effect, Color::WHITE);

        frame.draw.fill_rect(Rect::new(MARGIN, bar_y, bar_width, BAR_HEIGHT), BAR_HEIGHT / 2.0, TRACK);
        frame.draw.fill_rect(
            Rect::new(MARGIN, bar_y, bar_width * shown, BAR_HEIGHT),
            BAR_HEIGHT / 2.0,
            FILL,
        );

        let labels_top = bar_y + BAR_HEIGHT + 8.0;
        let elapsed = format_time(self.position);
        let total = format_time(self.duration);
        frame.label(&elapsed, Vec2::new(MARGIN, labels_top), Size::new(0.0, self.text_height), effect, Color::WHITE);
        frame.label_right(&total, MARGIN + bar_width, labels_top, Size::new(0.0, self.text_height), effect, Color::WHITE);

        if let (Some(seek), Some(Preview { texture: Some(texture), .. })) = (self.seek, &self.preview) {
            let fraction = if self.duration.is_zero() {
                0.0
            } else {
                seek.as_secs_f32() / self.duration.as_secs_f32()
            };
            let x = (MARGIN + bar_width * fraction - PREVIEW_SIZE.width / 2.0)
                .clamp(0.0, viewport.width - PREVIEW_SIZE.width);
            let rect = Rect::new(x, panel_top - PREVIEW_SIZE.height - 16.0, PREVIEW_SIZE.width, PREVIEW_SIZE.height);
            frame.image(rect, texture, Color::WHITE);
            let stamp = format_time(seek);
            frame.label_centered(
                &stamp,
                Vec2::new(rect.center().x, rect.y() + rect.height() + self.text_height / 2.0),
                Size::new(0.0, self.text_height * 0.75),
                effect,
                Color::WHITE,
            );
        }

        frame.draw.pop_opacity();
    }

    fn is_animating(&self) -> bool {
        self.hud.is_active() || self.progress.is_active()
    }
}
