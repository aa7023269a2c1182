//! Text texture cache
//!
//! Turns `(text, box, font, effect)` into a GPU texture, generating it on a
//! miss and handing back the same texture on later hits. Layouts (line
//! breaks plus measured size) are cached separately so sizing text does not
//! require a texture.
//!
//! Both caches are swept for entries idle longer than the GC timeout before
//! a new entry is generated, and on demand via [`TextCache::collect_garbage`].
//! Glyphs are never evicted.

use crate::compose::{compose, TextBitmap, TextEffect, TextStyle};
use crate::font::FontId;
use crate::glyphs::{GlyphCache, RegisteredFont};
use crate::layout::TextLayout;
use crate::rasterizer::{GlyphRasterizer, SwashRasterizer};
use crate::{Result, TextError};
use lru::LruCache;
use marquee_core::{
    ClockHandle, Color, GpuContext, GpuTexture, Size, TextConfig, TextureDescriptor,
    TextureFormat, TextureId,
};
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Text cache shared between threads
pub type SharedTextCache = Arc<Mutex<TextCache>>;

/// A cached text texture
///
/// Valid until the next GC sweep that finds it idle, or an invalidation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextTexture {
    pub id: TextureId,
    /// Pixel width, including effect padding
    pub width: u32,
    /// Pixel height, including effect padding
    pub height: u32,
    /// Size in device-independent units
    pub size: Size,
    pub font: FontId,
}

/// Counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCacheStats {
    pub textures: usize,
    pub layouts: usize,
    pub texture_hits: u64,
    pub texture_misses: u64,
    pub layout_hits: u64,
    pub layout_misses: u64,
    pub generated: u64,
    pub evicted: u64,
    pub glyphs_rasterized: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    text: String,
    wrap_px: u32,
    pixel_size: u32,
    font: FontId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextureKey {
    text: String,
    box_px: (u32, u32),
    font: FontId,
    effect: TextEffect,
}

trait Stamped {
    fn last_access(&self) -> Duration;
}

struct LayoutEntry {
    layout: Arc<TextLayout>,
    last_access: Duration,
}

impl Stamped for LayoutEntry {
    fn last_access(&self) -> Duration {
        self.last_access
    }
}

struct TextureEntry {
    // Dropping the entry queues the texture for release
    texture: GpuTexture,
    info: TextTexture,
    last_access: Duration,
}

impl Stamped for TextureEntry {
    fn last_access(&self) -> Duration {
        self.last_access
    }
}

/// Pop entries from the cold end while they are idle past `timeout`
///
/// Every access refreshes both the LRU position and the stamp, so the LRU
/// order is also the `last_access` order.
fn sweep<K: Hash + Eq, V: Stamped>(
    cache: &mut LruCache<K, V>,
    now: Duration,
    timeout: Duration,
) -> u64 {
    let mut evicted = 0;
    while let Some((_, entry)) = cache.peek_lru() {
        if now.saturating_sub(entry.last_access()) <= timeout {
            break;
        }
        cache.pop_lru();
        evicted += 1;
    }
    evicted
}

/// Glyph, layout and texture cache for one process
pub struct TextCache {
    rasterizer: Box<dyn GlyphRasterizer>,
    fonts: Vec<RegisteredFont>,
    glyphs: GlyphCache,
    layouts: LruCache<LayoutKey, LayoutEntry>,
    textures: LruCache<TextureKey, TextureEntry>,
    clock: ClockHandle,
    gc_timeout: Duration,
    scale: f32,
    style: TextStyle,
    shadow_offset: u32,
    outline_radius: u32,
    stats: TextCacheStats,
}

impl TextCache {
    pub fn new(rasterizer: Box<dyn GlyphRasterizer>, clock: ClockHandle, config: &TextConfig) -> Self {
        Self {
            rasterizer,
            fonts: Vec::new(),
            glyphs: GlyphCache::new(),
            layouts: LruCache::unbounded(),
            textures: LruCache::unbounded(),
            clock,
            gc_timeout: Duration::from_millis(config.gc_timeout_ms),
            scale: if config.scale > 0.0 { config.scale } else { 1.0 },
            style: TextStyle {
                fill: Color::from_hex_rgba(config.fill_color),
                effect: Color::from_hex_rgba(config.effect_color),
            },
            shadow_offset: config.shadow_offset,
            outline_radius: config.outline_radius,
            stats: TextCacheStats::default(),
        }
    }

    /// Cache backed by the swash rasterizer
    pub fn with_swash(clock: ClockHandle, config: &TextConfig) -> Self {
        Self::new(Box::new(SwashRasterizer::new()), clock, config)
    }

    /// Register a font from TTF/OTF bytes
    pub fn add_font(&mut self, data: Vec<u8>) -> Result<FontId> {
        let loaded = self.rasterizer.load_face(data)?;
        let id = FontId(self.fonts.len() as u32);
        tracing::debug!("Registered font '{}' as {:?}", loaded.family_name, id);
        self.fonts.push(RegisteredFont {
            face: loaded.handle,
            metrics: loaded.metrics,
            family_name: loaded.family_name,
        });
        Ok(id)
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn font_family(&self, font: FontId) -> Result<&str> {
        self.fonts
            .get(font.0 as usize)
            .map(|f| f.family_name.as_str())
            .ok_or(TextError::InvalidFontId(font))
    }

    /// Pixels per unit
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn gc_timeout(&self) -> Duration {
        self.gc_timeout
    }

    /// Drop shadow with the configured offset
    pub fn shadow(&self) -> TextEffect {
        TextEffect::Shadow {
            offset: self.shadow_offset,
        }
    }

    /// Outline with the configured radius
    pub fn outline(&self) -> TextEffect {
        TextEffect::Outline {
            radius: self.outline_radius,
        }
    }

    fn check_font(&self, font: FontId) -> Result<()> {
        if (font.0 as usize) < self.fonts.len() {
            Ok(())
        } else {
            Err(TextError::InvalidFontId(font))
        }
    }

    fn pixel_size(&self, height: f32) -> u32 {
        let px = (height * self.scale).round();
        if px > 0.0 {
            px as u32
        } else {
            0
        }
    }

    fn wrap_px(&self, width: f32) -> u32 {
        let px = (width * self.scale).round();
        if px > 0.0 {
            px as u32
        } else {
            0
        }
    }

    /// Measured size of `text` in `bounds`, in units
    ///
    /// The box height selects the pixel size; a box width of zero or less
    /// disables wrapping.
    pub fn get_text_size(&mut self, text: &str, bounds: Size, font: FontId) -> Result<Size> {
        Ok(match self.layout(text, bounds, font)? {
            Some(layout) => Size::new(layout.width / self.scale, layout.height / self.scale),
            None => Size::ZERO,
        })
    }

    /// Line-broken layout, or `None` when there is nothing to draw
    pub fn layout(
        &mut self,
        text: &str,
        bounds: Size,
        font: FontId,
    ) -> Result<Option<Arc<TextLayout>>> {
        self.check_font(font)?;
        let pixel_size = self.pixel_size(bounds.height);
        if text.is_empty() || pixel_size == 0 {
            return Ok(None);
        }

        let key = LayoutKey {
            text: text.to_string(),
            wrap_px: self.wrap_px(bounds.width),
            pixel_size,
            font,
        };
        let now = self.clock.now();

        if let Some(entry) = self.layouts.get_mut(&key) {
            entry.last_access = now;
            self.stats.layout_hits += 1;
            return Ok(Some(Arc::clone(&entry.layout)));
        }
        self.stats.layout_misses += 1;
        self.stats.evicted += sweep(&mut self.layouts, now, self.gc_timeout);

        let registered = &self.fonts[font.0 as usize];
        let set = self.glyphs.ensure(
            self.rasterizer.as_mut(),
            font,
            registered,
            pixel_size,
            text,
        )?;
        let wrap = (key.wrap_px > 0).then_some(key.wrap_px as f32);
        let layout = Arc::new(TextLayout::compute(text, set, wrap));

        self.layouts.put(
            key,
            LayoutEntry {
                layout: Arc::clone(&layout),
                last_access: now,
            },
        );
        Ok(Some(layout))
    }

    /// Texture for plain text
    pub fn get_texture(
        &mut self,
        gpu: &mut GpuContext,
        text: &str,
        bounds: Size,
        font: FontId,
    ) -> Result<Option<TextTexture>> {
        self.get_texture_with(gpu, text, bounds, font, TextEffect::None)
    }

    /// Texture for text with an effect, generated on a miss
    ///
    /// Returns `None` for empty text or a zero-height box.
    pub fn get_texture_with(
        &mut self,
        gpu: &mut GpuContext,
        text: &str,
        bounds: Size,
        font: FontId,
        effect: TextEffect,
    ) -> Result<Option<TextTexture>> {
        self.check_font(font)?;
        let pixel_size = self.pixel_size(bounds.height);
        if text.is_empty() || pixel_size == 0 {
            return Ok(None);
        }

        let key = TextureKey {
            text: text.to_string(),
            box_px: (self.wrap_px(bounds.width), pixel_size),
            font,
            effect,
        };
        let now = self.clock.now();

        if let Some(entry) = self.textures.get_mut(&key) {
            entry.last_access = now;
            self.stats.texture_hits += 1;
            return Ok(Some(entry.info));
        }
        self.stats.texture_misses += 1;
        self.stats.evicted += sweep(&mut self.textures, now, self.gc_timeout);

        let Some(layout) = self.layout(text, bounds, font)? else {
            return Ok(None);
        };
        let set = self
            .glyphs
            .get(font, layout.pixel_size)
            .ok_or_else(|| TextError::RasterizationFailed("glyph set missing".to_string()))?;
        let bitmap = compose(&layout, set, effect, &self.style)?;
        let texture = upload(gpu, text, &bitmap)?;

        let info = TextTexture {
            id: texture.id(),
            width: bitmap.width,
            height: bitmap.height,
            size: Size::new(
                bitmap.width as f32 / self.scale,
                bitmap.height as f32 / self.scale,
            ),
            font,
        };
        tracing::debug!(
            "Generated {}x{} text texture {:?} for {:?}",
            info.width,
            info.height,
            info.id,
            text
        );
        self.stats.generated += 1;
        self.textures.put(
            key,
            TextureEntry {
                texture,
                info,
                last_access: now,
            },
        );
        Ok(Some(info))
    }

    /// Evict everything idle past the timeout; returns the number evicted
    pub fn collect_garbage(&mut self) -> usize {
        let now = self.clock.now();
        let evicted = sweep(&mut self.textures, now, self.gc_timeout)
            + sweep(&mut self.layouts, now, self.gc_timeout);
        if evicted > 0 {
            tracing::debug!("Text cache GC evicted {} entries", evicted);
        }
        self.stats.evicted += evicted;
        evicted as usize
    }

    /// Forget every texture and layout of `text`
    pub fn invalidate(&mut self, text: &str) -> usize {
        let textures: Vec<TextureKey> = self
            .textures
            .iter()
            .filter(|(key, _)| key.text == text)
            .map(|(key, _)| key.clone())
            .collect();
        let layouts: Vec<LayoutKey> = self
            .layouts
            .iter()
            .filter(|(key, _)| key.text == text)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &textures {
            self.textures.pop(key);
        }
        for key in &layouts {
            self.layouts.pop(key);
        }
        textures.len() + layouts.len()
    }

    /// Drop all textures and layouts; glyphs stay
    pub fn clear(&mut self) {
        self.textures.clear();
        self.layouts.clear();
    }

    pub fn stats(&self) -> TextCacheStats {
        TextCacheStats {
            textures: self.textures.len(),
            layouts: self.layouts.len(),
            glyphs_rasterized: self.glyphs.rasterized(),
            ..self.stats
        }
    }
}

impl std::fmt::Debug for TextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCache")
            .field("fonts", &self.fonts.len())
            .field("textures", &self.textures.len())
            .field("layouts", &self.layouts.len())
            .field("gc_timeout", &self.gc_timeout)
            .field("scale", &self.scale)
            .finish()
    }
}

/// Allocate the offscreen texture for a composed bitmap and fill it
///
/// Composition happens on the CPU, so the texture itself is the offscreen
/// target and no render target is attached. A failed upload releases the
/// texture before returning.
fn upload(gpu: &mut GpuContext, text: &str, bitmap: &TextBitmap) -> Result<GpuTexture> {
    let label: String = text.chars().take(24).collect();
    let desc = TextureDescriptor::new(
        format!("text '{}'", label),
        bitmap.width,
        bitmap.height,
        TextureFormat::Rgba8,
    );
    let texture = gpu.create_texture(&desc).map_err(|err| {
        tracing::error!("Text texture for {:?} failed: {}", label, err);
        TextError::RasterizationFailed(err.to_string())
    })?;

    match gpu.upload_texture(&texture, &bitmap.pixels) {
        Ok(()) => Ok(texture),
        Err(err) => {
            tracing::error!("Text upload for {:?} failed: {}", label, err);
            drop(texture);
            gpu.flush_releases();
            Err(TextError::RasterizationFailed(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRasterizer, MOCK_FONT};
    use marquee_core::{HeadlessBackend, HeadlessProbe, ManualClock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        clock: ManualClock,
        cache: TextCache,
        font: FontId,
        gpu: GpuContext,
        probe: HeadlessProbe,
        renders: Arc<AtomicUsize>,
    }

    fn fixture_with(config: TextConfig) -> Fixture {
        let clock = ManualClock::new();
        let rasterizer = MockRasterizer::new();
        let renders = rasterizer.counter();
        let mut cache = TextCache::new(Box::new(rasterizer), clock.handle(), &config);
        let font = cache.add_font(MOCK_FONT.to_vec()).unwrap();
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        Fixture {
            clock,
            cache,
            font,
            gpu: GpuContext::new(Box::new(backend)),
            probe,
            renders,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(TextConfig::default())
    }

    const LINE: Size = Size::new(0.0, 20.0);

    #[test]
    fn test_second_request_hits() {
        let mut f = fixture();
        let first = f
            .cache
            .get_texture(&mut f.gpu, "Hello", LINE, f.font)
            .unwrap()
            .unwrap();

        f.clock.advance_ms(100);
        let second = f
            .cache
            .get_texture(&mut f.gpu, "Hello", LINE, f.font)
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(f.probe.textures_created(), 1);
        let stats = f.cache.stats();
        assert_eq!(stats.texture_hits, 1);
        assert_eq!(stats.texture_misses, 1);
        assert_eq!(stats.generated, 1);
    }

    #[test]
    fn test_effect_is_part_of_key() {
        let mut f = fixture();
        let plain = f
            .cache
            .get_texture(&mut f.gpu, "Hi", LINE, f.font)
            .unwrap()
            .unwrap();
        let outline = f.cache.outline();
        let outlined = f
            .cache
            .get_texture_with(&mut f.gpu, "Hi", LINE, f.font, outline)
            .unwrap()
            .unwrap();

        assert_ne!(plain.id, outlined.id);
        assert_eq!(outlined.width, plain.width + 4);
        assert_eq!(outlined.height, plain.height + 4);
    }

    #[test]
    fn test_idle_entries_evicted_recent_survive() {
        let mut f = fixture();
        let old = f
            .cache
            .get_texture(&mut f.gpu, "old", LINE, f.font)
            .unwrap()
            .unwrap();
        f.cache.get_texture(&mut f.gpu, "recent", LINE, f.font).unwrap();

        f.clock.set_ms(900);
        let recent = f
            .cache
            .get_texture(&mut f.gpu, "recent", LINE, f.font)
            .unwrap()
            .unwrap();

        // Generating a new texture sweeps first
        f.clock.set_ms(1500);
        f.cache.get_texture(&mut f.gpu, "new", LINE, f.font).unwrap();
        f.gpu.flush_releases();

        assert_eq!(f.cache.stats().textures, 2);
        assert_eq!(f.probe.live_textures(), 2);
        assert!(f.probe.texture_descriptor(old.id).is_none());
        assert!(f.probe.texture_descriptor(recent.id).is_some());

        let again = f
            .cache
            .get_texture(&mut f.gpu, "recent", LINE, f.font)
            .unwrap()
            .unwrap();
        assert_eq!(again.id, recent.id);
    }

    #[test]
    fn test_entry_at_exact_timeout_survives() {
        let mut f = fixture();
        f.cache.get_texture(&mut f.gpu, "edge", LINE, f.font).unwrap();
        f.clock.set_ms(1000);
        assert_eq!(f.cache.collect_garbage(), 0);
        f.clock.set_ms(1001);
        // texture and layout
        assert_eq!(f.cache.collect_garbage(), 2);
        assert_eq!(f.cache.stats().evicted, 2);
    }

    #[test]
    fn test_wraps_at_whitespace() {
        let mut f = fixture();
        let layout = f
            .cache
            .layout("aaaa bbbb cccc", Size::new(95.0, 20.0), f.font)
            .unwrap()
            .unwrap();
        assert_eq!(layout.lines, vec!["aaaa bbbb", "cccc"]);

        let size = f
            .cache
            .get_text_size("aaaa bbbb cccc", Size::new(95.0, 20.0), f.font)
            .unwrap();
        // 9 advances of 10 plus a bearing of 1; two 20px lines
        assert_eq!(size, Size::new(91.0, 40.0));
    }

    #[test]
    fn test_overlong_word_forced_break() {
        let mut f = fixture();
        let layout = f
            .cache
            .layout("abcdefgh", Size::new(35.0, 20.0), f.font)
            .unwrap()
            .unwrap();
        assert_eq!(layout.lines, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_empty_text_skips_rasterizer() {
        let mut f = fixture();
        let size = f.cache.get_text_size("", Size::new(100.0, 20.0), f.font).unwrap();
        assert_eq!(size, Size::ZERO);
        let texture = f.cache.get_texture(&mut f.gpu, "", LINE, f.font).unwrap();
        assert!(texture.is_none());

        let flat = f.cache.get_text_size("text", Size::new(100.0, 0.0), f.font).unwrap();
        assert_eq!(flat, Size::ZERO);

        assert_eq!(f.renders.load(Ordering::SeqCst), 0);
        assert_eq!(f.probe.textures_created(), 0);
    }

    #[test]
    fn test_invalid_font_id() {
        let mut f = fixture();
        let err = f
            .cache
            .get_text_size("x", LINE, FontId(7))
            .unwrap_err();
        assert_eq!(err, TextError::InvalidFontId(FontId(7)));

        let err = f
            .cache
            .get_texture(&mut f.gpu, "x", LINE, FontId(7))
            .unwrap_err();
        assert_eq!(err, TextError::InvalidFontId(FontId(7)));
    }

    #[test]
    fn test_invalid_font_data() {
        let mut f = fixture();
        let err = f.cache.add_font(b"garbage".to_vec()).unwrap_err();
        assert!(matches!(err, TextError::InvalidFontData(_)));
        assert_eq!(f.cache.font_count(), 1);
    }

    #[test]
    fn test_upload_failure_releases_texture() {
        let mut f = fixture();
        f.probe.fail_uploads(true);

        let err = f
            .cache
            .get_texture(&mut f.gpu, "boom", LINE, f.font)
            .unwrap_err();
        assert!(matches!(err, TextError::RasterizationFailed(_)));
        assert_eq!(f.probe.textures_created(), 1);
        assert_eq!(f.probe.live_textures(), 0);
        assert_eq!(f.cache.stats().textures, 0);

        // Recovers once uploads work again
        f.probe.fail_uploads(false);
        assert!(f
            .cache
            .get_texture(&mut f.gpu, "boom", LINE, f.font)
            .unwrap()
            .is_some());
        f.gpu.flush_releases();
        assert_eq!(f.probe.live_textures(), 1);
        // Composed on the CPU; no render target is ever set up
        assert_eq!(f.probe.live_render_targets(), 0);
    }

    #[test]
    fn test_allocation_failure_reported() {
        let mut f = fixture();
        f.probe.fail_textures(true);

        let err = f
            .cache
            .get_texture(&mut f.gpu, "boom", LINE, f.font)
            .unwrap_err();
        assert!(matches!(err, TextError::RasterizationFailed(_)));
        assert_eq!(f.probe.live_textures(), 0);
        assert_eq!(f.cache.stats().textures, 0);
    }

    #[test]
    fn test_oversized_text_reported_without_allocation() {
        let mut f = fixture();
        let long = "a".repeat(2000);
        // One unwrapped 20000 px line
        let err = f
            .cache
            .get_texture(&mut f.gpu, &long, LINE, f.font)
            .unwrap_err();
        assert!(matches!(err, TextError::RasterizationFailed(_)));
        assert_eq!(f.probe.textures_created(), 0);
    }

    #[test]
    fn test_glyphs_rasterized_once_per_size() {
        let mut f = fixture();
        f.cache.get_text_size("abab", Size::new(100.0, 20.0), f.font).unwrap();
        f.cache.get_text_size("ba", Size::new(50.0, 20.0), f.font).unwrap();
        assert_eq!(f.renders.load(Ordering::SeqCst), 2);

        f.cache.get_text_size("ab", Size::new(50.0, 30.0), f.font).unwrap();
        assert_eq!(f.renders.load(Ordering::SeqCst), 4);
        assert_eq!(f.cache.stats().glyphs_rasterized, 4);
    }

    #[test]
    fn test_missing_glyph_takes_no_space() {
        let mut f = fixture();
        let size = f.cache.get_text_size("a\u{2603}", LINE, f.font).unwrap();
        assert_eq!(size, Size::new(11.0, 20.0));
    }

    #[test]
    fn test_scale_converts_units() {
        let mut f = fixture_with(TextConfig {
            scale: 2.0,
            ..TextConfig::default()
        });
        // 40px glyphs: advance 20 each, bearing 1
        let size = f.cache.get_text_size("ab", LINE, f.font).unwrap();
        assert_eq!(size, Size::new(20.5, 20.0));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut f = fixture();
        let first = f
            .cache
            .get_texture(&mut f.gpu, "title", LINE, f.font)
            .unwrap()
            .unwrap();
        f.cache.get_texture(&mut f.gpu, "other", LINE, f.font).unwrap();

        assert_eq!(f.cache.invalidate("title"), 2);
        let regenerated = f
            .cache
            .get_texture(&mut f.gpu, "title", LINE, f.font)
            .unwrap()
            .unwrap();
        assert_ne!(first.id, regenerated.id);

        f.cache.clear();
        f.gpu.flush_releases();
        assert_eq!(f.probe.live_textures(), 0);
        assert_eq!(f.cache.stats().layouts, 0);
    }

    #[test]
    fn test_texture_pixels_uploaded() {
        let mut f = fixture();
        let texture = f
            .cache
            .get_texture(&mut f.gpu, "a", LINE, f.font)
            .unwrap()
            .unwrap();
        let pixels = f.probe.texture_pixels(texture.id).unwrap();
        assert_eq!(pixels.len(), (texture.width * texture.height * 4) as usize);
        assert!(pixels.chunks_exact(4).any(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_shared_cache_across_threads() {
        let f = fixture();
        let shared: SharedTextCache = Arc::new(Mutex::new(f.cache));
        let font = f.font;
        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let mut cache = shared.lock().unwrap();
                cache.get_text_size("threaded", LINE, font).unwrap()
            })
        };
        let size = worker.join().unwrap();
        assert_eq!(size.height, 20.0);
        assert_eq!(shared.lock().unwrap().stats().layouts, 1);
    }
}
