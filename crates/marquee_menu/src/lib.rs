//! Marquee Menu
//!
//! The on-screen overlay of a TV media player:
//!
//! - Content tiles with animated selection and edge bounce
//! - Background cross-fades
//! - Playback HUD with progress and seek previews
//! - Options list, modal windows, subtitles and a busy loader
//! - Metrics graph and log console views
//!
//! Every element is a [`Visual`] that samples its animations and records
//! draw commands into the frame's [`DrawList`](marquee_core::DrawList).
//! The [`Menu`] owns them all and drives one frame at a time.
//!
//! # Example
//!
//! ```ignore
//! use marquee_core::{GpuContext, HeadlessBackend, LogConsole, MenuConfig, SystemClock};
//! use marquee_menu::{Direction, Menu, TileContent};
//! use marquee_text::TextCache;
//!
//! let config = MenuConfig::default();
//! let clock = SystemClock::handle();
//! let text = TextCache::with_swash(clock.clone(), &config.text);
//! let gpu = GpuContext::new(Box::new(HeadlessBackend::new()));
//! let mut menu = Menu::new(config, clock, gpu, text, LogConsole::new(256));
//!
//! menu.add_font(std::fs::read("Inter.ttf")?)?;
//! menu.set_tiles(vec![TileContent::titled("Big Buck Bunny")])?;
//! menu.navigate(Direction::Right);
//! let report = menu.render_frame();
//! ```

pub mod background;
pub mod console_view;
pub mod frame;
pub mod image;
pub mod loader;
pub mod menu;
pub mod metrics;
pub mod modal;
pub mod options;
pub mod playback;
pub mod programs;
pub mod subtitles;
pub mod tile;

pub use background::Background;
pub use console_view::ConsoleView;
pub use frame::{Frame, Visual};
pub use image::Image;
pub use loader::Loader;
pub use menu::{Direction, FrameReport, Menu};
pub use metrics::{Graph, Trace};
pub use modal::ModalWindow;
pub use options::Options;
pub use playback::{format_time, FrameData, FrameSource, Playback};
pub use programs::SharedProgram;
pub use subtitles::Subtitles;
pub use tile::{Tile, TileContent};

use marquee_core::GpuError;
use marquee_text::TextError;
use thiserror::Error;

/// Menu errors
#[derive(Error, Debug)]
pub enum MenuError {
    #[error(transparent)]
    Text(#[from] TextError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("image data is {actual} bytes, expected {width}x{height} RGBA")]
    ImageSize { width: u32, height: u32, actual: usize },

    #[error("tile {index} out of range ({len} tiles)")]
    TileIndex { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, MenuError>;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures: a block-glyph rasterizer and a headless frame harness

    use crate::frame::{Frame, Visual};
    use crate::programs::{self, SharedProgram};
    use marquee_core::{
        Clock, DrawCommand, DrawList, GpuContext, GpuProgram, HeadlessBackend, HeadlessProbe,
        ManualClock, Size, TextConfig,
    };
    use marquee_text::{
        FaceHandle, FontId, FontMetrics, GlyphRasterizer, LoadedFace, RasterizedGlyph, TextCache,
        TextError,
    };
    use std::sync::Arc;

    pub const BLOCK_FONT: &[u8] = b"BLOCKFONT";

    /// Glyphs are solid blocks: `px / 2` advance, `0.7 * px` tall
    pub struct BlockRasterizer {
        faces: u32,
    }

    impl GlyphRasterizer for BlockRasterizer {
        fn load_face(&mut self, data: Vec<u8>) -> marquee_text::Result<LoadedFace> {
            if data != BLOCK_FONT {
                return Err(TextError::InvalidFontData("not a block font".to_string()));
            }
            self.faces += 1;
            Ok(LoadedFace {
                handle: FaceHandle(self.faces - 1),
                metrics: FontMetrics {
                    units_per_em: 1000,
                    ascender: 800,
                    descender: -200,
                    line_gap: 0,
                },
                family_name: "Block".to_string(),
            })
        }

        fn render_glyph(
            &mut self,
            _face: FaceHandle,
            ch: char,
            pixel_size: u32,
        ) -> marquee_text::Result<RasterizedGlyph> {
            let advance = pixel_size as f32 / 2.0;
            if ch.is_whitespace() {
                return Ok(RasterizedGlyph {
                    advance,
                    ..RasterizedGlyph::empty()
                });
            }
            let width = (pixel_size / 2).saturating_sub(2).max(1);
            let height = (pixel_size as f32 * 0.7).round() as u32;
            Ok(RasterizedGlyph {
                bitmap: vec![255; (width * height) as usize],
                width,
                height,
                bearing_x: 1,
                bearing_y: height as i16,
                advance,
            })
        }
    }

    /// A text cache on the block rasterizer with no fonts registered
    pub fn block_text_cache(clock: &ManualClock) -> TextCache {
        TextCache::new(
            Box::new(BlockRasterizer { faces: 0 }),
            clock.handle(),
            &TextConfig::default(),
        )
    }

    /// Renders single visuals against the headless backend
    pub struct Harness {
        pub clock: ManualClock,
        pub probe: HeadlessProbe,
        pub text: TextCache,
        pub font: FontId,
        pub draw: DrawList,
        image_program: Option<Arc<GpuProgram>>,
        tile_program: SharedProgram,
        // Last, so its drop flushes the handles above
        pub gpu: GpuContext,
    }

    impl Harness {
        pub fn new() -> Self {
            let clock = ManualClock::new();
            let backend = HeadlessBackend::new();
            let probe = backend.probe();
            let mut gpu = GpuContext::new(Box::new(backend));
            let image_program = gpu.compile_program(&programs::image_source());
            let mut text = block_text_cache(&clock);
            let font = text.add_font(BLOCK_FONT.to_vec()).unwrap();
            Self {
                clock,
                gpu,
                probe,
                text,
                font,
                draw: DrawList::new(),
                image_program,
                tile_program: SharedProgram::new(programs::tile_source()),
            }
        }

        pub fn tile_program(&mut self) -> Option<Arc<GpuProgram>> {
            self.tile_program.acquire(&mut self.gpu)
        }

        /// Record one frame of `visual` at the current clock time
        pub fn render(&mut self, visual: &mut dyn Visual) -> Vec<DrawCommand> {
            self.draw.clear();
            let mut frame = Frame {
                now: self.clock.now(),
                gpu: &mut self.gpu,
                text: &mut self.text,
                draw: &mut self.draw,
                font: Some(self.font),
                image_program: self.image_program.as_ref().map(|program| program.id()),
                viewport: Size::new(1920.0, 1080.0),
            };
            visual.render(&mut frame);
            self.draw.commands().to_vec()
        }
    }
}
