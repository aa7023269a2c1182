//! The menu compositor
//!
//! [`Menu`] owns every controller plus the GPU context and text cache, and
//! exposes the host API. Host calls only change targets; all drawing
//! happens in [`Menu::render_frame`], which records one draw list, submits
//! it, sweeps the text cache and releases dropped GPU resources.

use crate::background::Background;
use crate::console_view::ConsoleView;
use crate::frame::{Frame, Visual};
use crate::image::Image;
use crate::loader::Loader;
use crate::metrics::{Graph, Trace};
use crate::modal::ModalWindow;
use crate::options::Options;
use crate::playback::{FrameSource, Playback};
use crate::programs::{self, SharedProgram};
use crate::subtitles::Subtitles;
use crate::tile::{Tile, TileContent};
use crate::{MenuError, Result};
use marquee_animation::{BounceDirection, Timing, TransformState, TransformTimings};
use marquee_core::{
    ClockHandle, Color, DrawList, GpuContext, GpuProgram, LogConsole, MenuConfig, Rect, Size,
    Vec2,
};
use marquee_text::{FontId, TextCache};
use std::sync::Arc;
use std::time::Duration;

const GRID_TOP: f32 = 160.0;
const METRICS_SIZE: Size = Size::new(300.0, 120.0);
const METRICS_HISTORY: usize = 120;

/// Remote control directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Outcome of one rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub commands: usize,
    /// GPU resources released at the end of the frame
    pub released: usize,
    /// Text cache entries evicted at the end of the frame
    pub evicted: usize,
    pub animating: bool,
}

pub struct Menu {
    config: MenuConfig,
    clock: ClockHandle,
    text: TextCache,
    font: Option<FontId>,
    draw: DrawList,
    image_program: Option<Arc<GpuProgram>>,
    tile_program: SharedProgram,
    tiles: Vec<Tile>,
    selected: usize,
    first_row: usize,
    background: Background,
    playback: Playback,
    loader: Loader,
    options: Options,
    modal: ModalWindow,
    graph: Graph,
    framerate: usize,
    console_view: ConsoleView,
    subtitles: Subtitles,
    frames: u64,
    // Fields drop in declaration order; the context flushes the release
    // queue on drop, so it must outlive every handle above.
    gpu: GpuContext,
}

impl Menu {
    pub fn new(
        config: MenuConfig,
        clock: ClockHandle,
        mut gpu: GpuContext,
        text: TextCache,
        console: LogConsole,
    ) -> Self {
        let image_program = gpu.compile_program(&programs::image_source());
        let anim = &config.animation;
        let layout = &config.layout;
        let viewport = Size::new(layout.viewport_width, layout.viewport_height);

        let mut graph = Graph::new(Rect::from_origin_size(
            Vec2::new(viewport.width - METRICS_SIZE.width - 60.0, 60.0),
            METRICS_SIZE,
        ));
        let framerate = graph.add_trace(
            Trace::framerate("fps", 30, METRICS_HISTORY),
            Color::rgb(0.3, 0.9, 0.4),
        );

        Self {
            background: Background::new(&clock, Timing::from_config(&anim.background_fade)),
            playback: Playback::new(
                &clock,
                Timing::from_config(&anim.hud_fade),
                Timing::from_config(&anim.progress),
                layout.body_text_height,
            ),
            loader: Loader::new(&clock, anim.loader_period_ms, Timing::from_config(&anim.hud_fade)),
            options: Options::new(
                &clock,
                Timing::from_config(&anim.highlight),
                Timing::from_config(&anim.hud_fade),
                layout.body_text_height,
            ),
            modal: ModalWindow::new(
                &clock,
                Timing::from_config(&anim.modal),
                Size::new(viewport.width * 0.45, viewport.height * 0.4),
                layout.title_text_height,
                layout.body_text_height,
            ),
            subtitles: Subtitles::new(
                &clock,
                Timing::from_config(&anim.subtitle_fade),
                layout.body_text_height,
            ),
            console_view: ConsoleView::new(
                console,
                config.console.visible_lines,
                config.console.text_height,
            ),
            graph,
            framerate,
            tile_program: SharedProgram::new(programs::tile_source()),
            tiles: Vec::new(),
            selected: 0,
            first_row: 0,
            image_program,
            draw: DrawList::new(),
            font: None,
            text,
            gpu,
            clock,
            config,
            frames: 0,
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    /// Register a font; the first one becomes the label font
    pub fn add_font(&mut self, data: Vec<u8>) -> Result<FontId> {
        let font = self.text.add_font(data)?;
        if self.font.is_none() {
            self.font = Some(font);
        }
        Ok(font)
    }

    pub fn set_font(&mut self, font: FontId) -> Result<()> {
        self.text.font_family(font)?;
        self.font = Some(font);
        Ok(())
    }

    fn viewport(&self) -> Size {
        Size::new(
            self.config.layout.viewport_width,
            self.config.layout.viewport_height,
        )
    }

    fn tile_timings(&self) -> TransformTimings {
        let anim = &self.config.animation;
        TransformTimings {
            position: Timing::from_config(&anim.tile_move),
            zoom: Timing::from_config(&anim.tile_zoom),
            size: Timing::from_config(&anim.tile_size),
            opacity: Timing::from_config(&anim.tile_fade),
        }
    }

    fn columns(&self) -> usize {
        self.config.layout.columns.max(1)
    }

    fn row_pitch(&self) -> f32 {
        let layout = &self.config.layout;
        layout.tile_height + layout.tile_gap + layout.label_height * 2.0
    }

    fn visible_rows(&self) -> usize {
        let rows = (self.config.layout.viewport_height - GRID_TOP) / self.row_pitch();
        (rows.floor() as usize).max(1)
    }

    /// Resting state of tile `index` for the current selection and scroll
    fn tile_state(&self, index: usize) -> TransformState {
        let layout = &self.config.layout;
        let columns = self.columns();
        let (row, column) = (index / columns, index % columns);
        let grid_width =
            columns as f32 * layout.tile_width + (columns - 1) as f32 * layout.tile_gap;
        let left = (layout.viewport_width - grid_width) / 2.0;

        let center = Vec2::new(
            left + column as f32 * (layout.tile_width + layout.tile_gap) + layout.tile_width / 2.0,
            GRID_TOP
                + (row as f32 - self.first_row as f32) * self.row_pitch()
                + layout.tile_height / 2.0,
        );
        let on_screen = row >= self.first_row && row < self.first_row + self.visible_rows();
        let zoom = if index == self.selected {
            layout.selected_zoom
        } else {
            1.0
        };

        TransformState::new(center, Size::new(layout.tile_width, layout.tile_height))
            .with_zoom(zoom)
            .with_opacity(if on_screen { 1.0 } else { 0.0 })
    }

    /// Replace all tiles; the first one is selected
    ///
    /// On error the previous tiles and selection are kept.
    pub fn set_tiles(&mut self, items: Vec<TileContent>) -> Result<()> {
        let previous = (self.selected, self.first_row);
        self.selected = 0;
        self.first_row = 0;
        match self.build_tiles(items) {
            Ok(tiles) => {
                self.tiles = tiles;
                tracing::debug!("Menu now has {} tiles", self.tiles.len());
                Ok(())
            }
            Err(err) => {
                (self.selected, self.first_row) = previous;
                tracing::warn!("Keeping {} tiles, new set failed: {}", self.tiles.len(), err);
                Err(err)
            }
        }
    }

    /// Tiles for `items`, laid out for a selection at the first tile
    fn build_tiles(&mut self, items: Vec<TileContent>) -> Result<Vec<Tile>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let program = self.tile_program.acquire(&mut self.gpu);
        let label_height = self.config.layout.label_height;
        let timings = self.tile_timings();
        let mut tiles = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let state = self.tile_state(index);
            let mut tile = Tile::new(
                &self.clock,
                item.title,
                program.clone(),
                state.with_opacity(0.0),
                label_height,
            );
            tile.set_selected(index == self.selected);
            tile.move_to(state, timings);
            if let Some(poster) = &item.poster {
                tile.set_poster(&mut self.gpu, poster)?;
            }
            tiles.push(tile);
        }
        Ok(tiles)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn selected(&self) -> Option<usize> {
        (!self.tiles.is_empty()).then_some(self.selected)
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.tiles.len() {
            return Err(MenuError::TileIndex {
                index,
                len: self.tiles.len(),
            });
        }
        self.apply_selection(index);
        Ok(())
    }

    fn apply_selection(&mut self, index: usize) {
        self.selected = index;
        let row = index / self.columns();
        let visible = self.visible_rows();
        if row < self.first_row {
            self.first_row = row;
        } else if row >= self.first_row + visible {
            self.first_row = row + 1 - visible;
        }

        let timings = self.tile_timings();
        for index in 0..self.tiles.len() {
            let state = self.tile_state(index);
            let tile = &mut self.tiles[index];
            tile.set_selected(index == self.selected);
            tile.move_to(state, timings);
        }
    }

    /// Move the selection; at a left or right edge the tile bounces instead
    ///
    /// Returns whether the selection changed.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        if self.tiles.is_empty() {
            return false;
        }
        let columns = self.columns();
        let len = self.tiles.len();
        let current = self.selected;
        let column = current % columns;
        let last_row = (len - 1) / columns;

        let next = match direction {
            Direction::Left => (column > 0).then(|| current - 1),
            Direction::Right => (column + 1 < columns && current + 1 < len).then(|| current + 1),
            Direction::Up => current.checked_sub(columns),
            Direction::Down if current + columns < len => Some(current + columns),
            Direction::Down => (current / columns < last_row).then_some(len - 1),
        };

        match next {
            Some(index) => {
                self.apply_selection(index);
                true
            }
            None => {
                let bounce = match direction {
                    Direction::Left => Some(BounceDirection::Left),
                    Direction::Right => Some(BounceDirection::Right),
                    Direction::Up | Direction::Down => None,
                };
                if let Some(bounce) = bounce {
                    let timing = Timing::from_config(&self.config.animation.bounce);
                    self.tiles[current].bounce(bounce, timing);
                }
                false
            }
        }
    }

    pub fn set_background(&mut self, image: &Image) -> Result<()> {
        self.background.set_image(&mut self.gpu, image)
    }

    pub fn clear_background(&mut self) {
        self.background.clear();
    }

    pub fn set_frame_source(&mut self, source: Box<dyn FrameSource>) {
        self.playback.set_frame_source(source);
    }

    pub fn show_playback(&mut self, title: &str, media_id: &str, duration: Duration) {
        self.playback.show(title, media_id, duration);
    }

    pub fn hide_playback(&mut self) {
        self.playback.hide();
    }

    pub fn set_progress(&mut self, position: Duration) {
        self.playback.set_position(position);
    }

    pub fn seek_preview(&mut self, position: Option<Duration>) {
        match position {
            Some(position) => self.playback.seek_preview(position),
            None => self.playback.end_seek(),
        }
    }

    pub fn show_options(&mut self, items: Vec<String>, selected: usize) {
        self.options.show(items, selected);
    }

    pub fn hide_options(&mut self) {
        self.options.hide();
    }

    pub fn step_option(&mut self, delta: isize) -> bool {
        self.options.step(delta)
    }

    pub fn open_modal(&mut self, title: &str, body: &str, buttons: Vec<String>) {
        self.modal.open(title, body, buttons);
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
    }

    pub fn set_subtitle(&mut self, text: Option<&str>) {
        self.subtitles.set(text);
    }

    pub fn show_loader(&mut self) {
        self.loader.show();
    }

    pub fn hide_loader(&mut self) {
        self.loader.hide();
    }

    /// Add a host-fed metric; returns its trace index
    pub fn add_metric(&mut self, label: &str, color: Color) -> usize {
        self.graph
            .add_trace(Trace::samples(label, METRICS_HISTORY), color)
    }

    pub fn record_metric(&mut self, trace: usize, value: f32) -> bool {
        self.graph.record(trace, value)
    }

    pub fn show_metrics(&mut self, visible: bool) {
        self.graph.set_visible(visible);
    }

    pub fn framerate(&self) -> f32 {
        self.graph
            .trace(self.framerate)
            .map_or(0.0, Trace::current_value)
    }

    pub fn show_console(&mut self, visible: bool) {
        self.console_view.set_visible(visible);
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn modal(&self) -> &ModalWindow {
        &self.modal
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn text_cache(&self) -> &TextCache {
        &self.text
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Commands recorded by the last frame
    pub fn draw_list(&self) -> &DrawList {
        &self.draw
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_animating(&self) -> bool {
        self.tiles.iter().any(Visual::is_animating)
            || self.background.is_animating()
            || self.playback.is_animating()
            || self.loader.is_animating()
            || self.options.is_animating()
            || self.modal.is_animating()
            || self.subtitles.is_animating()
    }

    /// Record, submit and clean up one frame
    pub fn render_frame(&mut self) -> FrameReport {
        let viewport = self.viewport();
        self.draw.clear();

        let mut frame = Frame {
            now: self.clock.now(),
            gpu: &mut self.gpu,
            text: &mut self.text,
            draw: &mut self.draw,
            font: self.font,
            image_program: self.image_program.as_ref().map(|program| program.id()),
            viewport,
        };

        self.background.render(&mut frame);
        // The zoomed selection overlaps its neighbours, so it goes last
        let selected = self.selected;
        for (index, tile) in self.tiles.iter_mut().enumerate() {
            if index != selected {
                tile.render(&mut frame);
            }
        }
        if let Some(tile) = self.tiles.get_mut(selected) {
            tile.render(&mut frame);
        }
        self.playback.render(&mut frame);
        self.subtitles.render(&mut frame);
        self.options.render(&mut frame);
        self.modal.render(&mut frame);
        self.loader.render(&mut frame);
        self.graph.render(&mut frame);
        self.console_view.render(&mut frame);

        self.gpu.submit(&self.draw);
        let evicted = self.text.collect_garbage();
        let released = self.gpu.flush_releases();
        self.frames += 1;

        FrameReport {
            commands: self.draw.len(),
            released,
            evicted,
            animating: self.is_animating(),
        }
    }
}

impl std::fmt::Debug for Menu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Menu")
            .field("tiles", &self.tiles.len())
            .field("selected", &self.selected)
            .field("font", &self.font)
            .field("frames", &self.frames)
            .field("gpu", &self.gpu)
            .field("text", &self.text)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block_text_cache, BLOCK_FONT};
    use marquee_core::{DrawCommand, HeadlessBackend, HeadlessProbe, ManualClock};
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    struct Fixture {
        clock: ManualClock,
        probe: HeadlessProbe,
        console: LogConsole,
        menu: Menu,
    }

    fn fixture_with(fail_programs: bool) -> Fixture {
        let clock = ManualClock::new();
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        probe.fail_programs(fail_programs);
        let console = LogConsole::new(32);
        let mut menu = Menu::new(
            MenuConfig::default(),
            clock.handle(),
            GpuContext::new(Box::new(backend)),
            block_text_cache(&clock),
            console.clone(),
        );
        menu.add_font(BLOCK_FONT.to_vec()).unwrap();
        Fixture {
            clock,
            probe,
            console,
            menu,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(false)
    }

    fn titles(count: usize) -> Vec<TileContent> {
        (0..count)
            .map(|i| TileContent::titled(format!("Title {}", i)))
            .collect()
    }

    fn count(commands: &[DrawCommand], pred: impl Fn(&DrawCommand) -> bool) -> usize {
        commands.iter().filter(|cmd| pred(cmd)).count()
    }

    #[test]
    fn test_tiles_share_one_program() {
        let mut f = fixture();
        f.menu.set_tiles(titles(3)).unwrap();
        // image program + tile program
        assert_eq!(f.probe.live_programs(), 2);

        let ids: Vec<_> = f
            .menu
            .tiles()
            .iter()
            .map(|tile| tile.program().unwrap().id())
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));

        f.menu.set_tiles(Vec::new()).unwrap();
        f.menu.render_frame();
        assert_eq!(f.probe.live_programs(), 1);
    }

    fn with_posters(count: usize) -> Vec<TileContent> {
        (0..count)
            .map(|i| TileContent {
                title: format!("Poster {}", i),
                poster: Some(Image::solid(4, 6, Color::rgb(0.2, 0.3, 0.4)).unwrap()),
            })
            .collect()
    }

    #[test]
    fn test_drop_releases_every_gpu_handle() {
        let mut f = fixture();
        let mut items = titles(2);
        items.extend(with_posters(1));
        f.menu.set_tiles(items).unwrap();
        f.menu
            .set_background(&Image::solid(8, 8, Color::rgb(0.1, 0.1, 0.1)).unwrap())
            .unwrap();
        f.menu.render_frame();
        assert!(f.probe.live_textures() > 0);
        assert_eq!(f.probe.live_programs(), 2);

        drop(f.menu);
        assert_eq!(f.probe.live_textures(), 0);
        assert_eq!(f.probe.live_programs(), 0);
        assert_eq!(f.probe.live_render_targets(), 0);
    }

    #[test]
    fn test_failed_set_tiles_keeps_previous_tiles() {
        let mut f = fixture();
        f.menu.set_tiles(titles(3)).unwrap();
        f.menu.select(2).unwrap();
        f.clock.set_ms(1000);
        f.menu.render_frame();
        let textures = f.probe.live_textures();

        f.probe.fail_textures(true);
        let mut items = titles(2);
        items.extend(with_posters(2));
        let err = f.menu.set_tiles(items).unwrap_err();
        assert!(matches!(err, MenuError::Gpu(_)));

        let kept: Vec<_> = f.menu.tiles().iter().map(|tile| tile.title().to_string()).collect();
        assert_eq!(kept, vec!["Title 0", "Title 1", "Title 2"]);
        assert_eq!(f.menu.selected(), Some(2));
        assert!(f.menu.tiles()[2].is_selected());

        // Half-built tiles are gone once the frame flushes
        f.probe.fail_textures(false);
        f.menu.render_frame();
        assert_eq!(f.probe.live_textures(), textures);
        assert_eq!(f.probe.live_programs(), 2);
    }

    #[test]
    fn test_navigate_zooms_selection() {
        let mut f = fixture();
        f.menu.set_tiles(titles(7)).unwrap();
        assert!(f.menu.navigate(Direction::Right));
        assert_eq!(f.menu.selected(), Some(1));

        f.clock.set_ms(1000);
        f.menu.render_frame();
        let zoom = f.menu.config().layout.selected_zoom;
        assert_eq!(f.menu.tiles()[1].current().zoom, zoom);
        assert_eq!(f.menu.tiles()[0].current().zoom, 1.0);

        assert!(f.menu.navigate(Direction::Down));
        assert_eq!(f.menu.selected(), Some(6));
        assert!(!f.menu.navigate(Direction::Down));
    }

    #[test]
    fn test_edge_bounce_is_not_restarted() {
        let mut f = fixture();
        f.menu.set_tiles(titles(3)).unwrap();
        f.clock.set_ms(1000);
        f.menu.render_frame();

        assert!(!f.menu.navigate(Direction::Left));
        assert!(f.menu.tiles()[0].is_bouncing());
        let started = f.menu.tiles()[0].transform().position_animation().start_time();

        f.clock.set_ms(1100);
        assert!(!f.menu.navigate(Direction::Left));
        let animation = f.menu.tiles()[0].transform().position_animation();
        assert_eq!(animation.start_time(), started);

        // Once settled, another press bounces again
        f.clock.set_ms(2000);
        f.menu.render_frame();
        assert!(!f.menu.tiles()[0].is_bouncing());
        f.menu.navigate(Direction::Left);
        assert!(f.menu.tiles()[0].is_bouncing());
    }

    #[test]
    fn test_select_out_of_range() {
        let mut f = fixture();
        f.menu.set_tiles(titles(2)).unwrap();
        let err = f.menu.select(5).unwrap_err();
        assert!(matches!(err, MenuError::TileIndex { index: 5, len: 2 }));
    }

    #[test]
    fn test_scrolling_hides_rows_above() {
        let mut f = fixture();
        f.menu.set_tiles(titles(20)).unwrap();
        f.menu.select(15).unwrap();
        assert_eq!(f.menu.tiles()[0].target().opacity, 0.0);
        assert_eq!(f.menu.tiles()[15].target().opacity, 1.0);
        // Row 1 is now the top row
        let layout = &f.menu.config().layout;
        assert_eq!(
            f.menu.tiles()[5].target().position.y,
            GRID_TOP + layout.tile_height / 2.0
        );

        f.menu.select(0).unwrap();
        assert_eq!(f.menu.tiles()[0].target().opacity, 1.0);
        assert_eq!(f.menu.tiles()[15].target().opacity, 0.0);
    }

    #[test]
    fn test_frame_submitted_and_cleaned_up() {
        let mut f = fixture();
        f.menu.set_tiles(titles(3)).unwrap();
        f.menu.show_playback("Movie", "m1", Duration::from_secs(90));
        let report = f.menu.render_frame();
        assert_eq!(f.probe.frames(), 1);
        assert_eq!(f.probe.last_frame_commands(), report.commands);
        assert!(report.animating);

        f.clock.set_ms(1000);
        let report = f.menu.render_frame();
        assert!(!report.animating);
        let before = f.menu.text_cache().stats().textures;

        // Hidden HUD labels go idle and are collected
        f.menu.hide_playback();
        f.clock.set_ms(5000);
        let report = f.menu.render_frame();
        assert!(report.evicted > 0);
        assert!(f.menu.text_cache().stats().textures < before);
        assert!(report.released > 0);
    }

    #[test]
    fn test_program_failure_logged_and_draws_skipped() {
        let errors = LogConsole::new(32);
        let subscriber = tracing_subscriber::registry().with(errors.layer(Level::WARN));
        let mut f = tracing::subscriber::with_default(subscriber, || fixture_with(true));
        assert!(errors
            .lines()
            .iter()
            .any(|line| line.level == Level::ERROR));

        f.menu.set_tiles(titles(2)).unwrap();
        f.clock.set_ms(1000);
        f.menu.render_frame();
        let commands = f.menu.draw_list().commands();
        assert_eq!(count(commands, |cmd| matches!(cmd, DrawCommand::Texture { .. })), 0);
        assert!(count(commands, |cmd| matches!(cmd, DrawCommand::FillRect { .. })) >= 2);
    }

    #[test]
    fn test_console_view_shows_log_lines() {
        let mut f = fixture();
        f.console.push(Level::WARN, "menu", "low bandwidth");
        f.menu.show_console(true);
        f.menu.render_frame();
        let commands = f.menu.draw_list().commands();
        assert_eq!(count(commands, |cmd| matches!(cmd, DrawCommand::Texture { .. })), 1);
    }

    #[test]
    fn test_metrics_record_and_framerate() {
        let mut f = fixture();
        let bitrate = f.menu.add_metric("bitrate", Color::WHITE);
        assert!(f.menu.record_metric(bitrate, 4.5));
        f.menu.show_metrics(true);
        for frame in 0..5u64 {
            f.clock.set_ms(frame * 40);
            f.menu.render_frame();
        }
        assert!((f.menu.framerate() - 25.0).abs() < 0.01);
        assert_eq!(f.menu.graph().trace(bitrate).unwrap().current_value(), 4.5);
    }

    #[test]
    fn test_overlays_toggle() {
        let mut f = fixture();
        f.menu.show_options(vec!["Audio".into(), "Subtitles".into()], 0);
        assert!(f.menu.step_option(1));
        assert_eq!(f.menu.options().selected(), Some("Subtitles"));

        f.menu.open_modal("Quit?", "Playback will stop.", vec!["Yes".into(), "No".into()]);
        assert!(f.menu.modal().is_open());
        f.menu.close_modal();
        assert!(!f.menu.modal().is_open());

        f.menu.show_loader();
        assert!(f.menu.is_animating());
        f.menu.hide_loader();
        f.menu.hide_options();
        f.menu.set_subtitle(Some("Hello"));
        f.menu.set_subtitle(None);
        f.clock.set_ms(5000);
        f.menu.render_frame();
        assert!(!f.menu.is_animating());
    }

    #[test]
    fn test_no_font_draws_no_text() {
        let clock = ManualClock::new();
        let backend = HeadlessBackend::new();
        let mut menu = Menu::new(
            MenuConfig::default(),
            clock.handle(),
            GpuContext::new(Box::new(backend)),
            block_text_cache(&clock),
            LogConsole::new(4),
        );
        menu.set_tiles(titles(2)).unwrap();
        clock.set_ms(1000);
        menu.render_frame();
        let commands = menu.draw_list().commands();
        assert_eq!(count(commands, |cmd| matches!(cmd, DrawCommand::Texture { .. })), 0);
        assert!(menu.set_font(FontId(3)).is_err());
    }
}
