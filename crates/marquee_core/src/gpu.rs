//! GPU resource seam
//!
//! The renderer binding itself (wgpu, GL, a headless software target) lives
//! behind [`GpuBackend`]. Everything above the seam holds owned handles:
//! [`GpuTexture`], [`GpuRenderTarget`] and [`GpuProgram`] are not `Clone`,
//! and dropping one enqueues its release on the shared [`ReleaseQueue`].
//! [`GpuContext::flush_releases`] hands the queued ids back to the backend,
//! normally once at the end of every frame.

use crate::draw::DrawList;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Backend texture handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Backend offscreen render target handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u64);

/// Backend program (shader pipeline) handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u64);

/// Pixel layout of a texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA, premultiplied alpha
    #[default]
    Rgba8,
    /// Single 8-bit coverage channel
    R8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R8 => 1,
        }
    }
}

/// Parameters for texture creation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDescriptor {
    pub fn new(label: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
        }
    }

    /// Size in bytes of a tightly packed upload
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Source of a shader program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSource {
    pub label: String,
    /// Backend-specific shader text (WGSL for the wgpu backend)
    pub source: String,
}

impl ProgramSource {
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
        }
    }
}

/// Errors reported by a GPU backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpuError {
    #[error("texture allocation failed: {0}")]
    TextureAllocation(String),

    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),

    #[error("texture upload size mismatch: expected {expected} bytes, got {actual}")]
    UploadSize { expected: usize, actual: usize },

    #[error("texture upload failed: {0}")]
    Upload(String),

    #[error("render target setup failed: {0}")]
    RenderTarget(String),

    #[error("program compilation failed: {0}")]
    ProgramCompile(String),
}

pub type Result<T> = std::result::Result<T, GpuError>;

/// Low-level rendering API binding
///
/// Implementations own the raw resources. Ids they return are only ever
/// released once, through the release queue.
pub trait GpuBackend: Send {
    /// Short name for diagnostics
    fn name(&self) -> &str;

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId>;

    /// Replace the full contents of a texture with tightly packed pixels
    fn upload_texture(&mut self, id: TextureId, pixels: &[u8]) -> Result<()>;

    fn delete_texture(&mut self, id: TextureId);

    /// Attach an offscreen render target to an existing texture
    fn create_render_target(&mut self, texture: TextureId) -> Result<RenderTargetId>;

    fn delete_render_target(&mut self, id: RenderTargetId);

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId>;

    fn delete_program(&mut self, id: ProgramId);

    /// Submit one frame worth of draw commands
    fn submit(&mut self, list: &DrawList);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Release {
    Texture(TextureId),
    RenderTarget(RenderTargetId),
    Program(ProgramId),
}

/// Deferred destruction queue fed by handle drops
#[derive(Clone, Debug, Default)]
pub struct ReleaseQueue {
    pending: Arc<Mutex<Vec<Release>>>,
}

impl ReleaseQueue {
    fn push(&self, release: Release) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(release);
    }

    fn drain(&self) -> Vec<Release> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of releases waiting for the next flush
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned texture; released when dropped
#[derive(Debug)]
pub struct GpuTexture {
    id: TextureId,
    width: u32,
    height: u32,
    format: TextureFormat,
    releases: ReleaseQueue,
}

impl GpuTexture {
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.releases.push(Release::Texture(self.id));
    }
}

/// Owned offscreen render target; released when dropped
#[derive(Debug)]
pub struct GpuRenderTarget {
    id: RenderTargetId,
    texture: TextureId,
    releases: ReleaseQueue,
}

impl GpuRenderTarget {
    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    /// Texture this target renders into
    pub fn texture(&self) -> TextureId {
        self.texture
    }
}

impl Drop for GpuRenderTarget {
    fn drop(&mut self) {
        self.releases.push(Release::RenderTarget(self.id));
    }
}

/// Compiled program
///
/// Controllers that share one program hold it as `Arc<GpuProgram>`; the
/// program is released when the last clone goes away.
#[derive(Debug)]
pub struct GpuProgram {
    id: ProgramId,
    label: String,
    releases: ReleaseQueue,
}

impl GpuProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for GpuProgram {
    fn drop(&mut self) {
        self.releases.push(Release::Program(self.id));
    }
}

/// Counters kept by [`GpuContext`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GpuStats {
    pub textures_created: u64,
    pub textures_released: u64,
    pub render_targets_created: u64,
    pub render_targets_released: u64,
    pub programs_compiled: u64,
    pub program_failures: u64,
    pub frames_submitted: u64,
}

/// Process-scoped GPU service handed to controllers
pub struct GpuContext {
    backend: Box<dyn GpuBackend>,
    releases: ReleaseQueue,
    stats: GpuStats,
}

impl GpuContext {
    pub fn new(backend: Box<dyn GpuBackend>) -> Self {
        tracing::debug!("GPU context using backend '{}'", backend.name());
        Self {
            backend,
            releases: ReleaseQueue::default(),
            stats: GpuStats::default(),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn stats(&self) -> GpuStats {
        self.stats
    }

    /// Allocate a texture owned by the returned handle
    pub fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<GpuTexture> {
        let id = self.backend.create_texture(desc)?;
        self.stats.textures_created += 1;
        Ok(GpuTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            releases: self.releases.clone(),
        })
    }

    /// Allocate a texture and fill it in one step
    ///
    /// A failed upload releases the texture before the error is returned.
    pub fn create_texture_with_data(
        &mut self,
        desc: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<GpuTexture> {
        let texture = self.create_texture(desc)?;
        self.upload_texture(&texture, pixels)?;
        Ok(texture)
    }

    pub fn upload_texture(&mut self, texture: &GpuTexture, pixels: &[u8]) -> Result<()> {
        let expected = texture.width as usize
            * texture.height as usize
            * texture.format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(GpuError::UploadSize {
                expected,
                actual: pixels.len(),
            });
        }
        self.backend.upload_texture(texture.id, pixels)
    }

    /// Attach an offscreen render target to `texture`
    pub fn create_render_target(&mut self, texture: &GpuTexture) -> Result<GpuRenderTarget> {
        let id = self.backend.create_render_target(texture.id)?;
        self.stats.render_targets_created += 1;
        Ok(GpuRenderTarget {
            id,
            texture: texture.id,
            releases: self.releases.clone(),
        })
    }

    /// Compile a program
    ///
    /// Failures are logged, not returned: the caller keeps `None` and skips
    /// the draws that would have used the program.
    pub fn compile_program(&mut self, source: &ProgramSource) -> Option<Arc<GpuProgram>> {
        match self.backend.compile_program(source) {
            Ok(id) => {
                self.stats.programs_compiled += 1;
                tracing::debug!("Compiled program '{}' as {:?}", source.label, id);
                Some(Arc::new(GpuProgram {
                    id,
                    label: source.label.clone(),
                    releases: self.releases.clone(),
                }))
            }
            Err(err) => {
                self.stats.program_failures += 1;
                tracing::error!("Program '{}' unavailable: {}", source.label, err);
                None
            }
        }
    }

    /// Submit a recorded frame
    pub fn submit(&mut self, list: &DrawList) {
        self.stats.frames_submitted += 1;
        self.backend.submit(list);
    }

    /// Number of handle drops not yet handed to the backend
    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    /// Hand every queued release to the backend
    pub fn flush_releases(&mut self) -> usize {
        let released = self.releases.drain();
        let count = released.len();
        for release in released {
            match release {
                Release::Texture(id) => {
                    self.stats.textures_released += 1;
                    self.backend.delete_texture(id);
                }
                Release::RenderTarget(id) => {
                    self.stats.render_targets_released += 1;
                    self.backend.delete_render_target(id);
                }
                Release::Program(id) => self.backend.delete_program(id),
            }
        }
        if count > 0 {
            tracing::trace!("Released {} GPU resources", count);
        }
        count
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        self.flush_releases();
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("backend", &self.backend.name())
            .field("pending_releases", &self.releases.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;

    fn context() -> (GpuContext, crate::headless::HeadlessProbe) {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        (GpuContext::new(Box::new(backend)), probe)
    }

    #[test]
    fn test_texture_released_once_after_drop_and_flush() {
        let (mut gpu, probe) = context();
        let desc = TextureDescriptor::new("test", 4, 4, TextureFormat::Rgba8);

        let texture = gpu.create_texture(&desc).unwrap();
        assert_eq!(probe.live_textures(), 1);

        // Moving the handle does not release anything
        let moved = texture;
        assert_eq!(gpu.pending_releases(), 0);

        drop(moved);
        assert_eq!(gpu.pending_releases(), 1);
        assert_eq!(probe.live_textures(), 1);

        assert_eq!(gpu.flush_releases(), 1);
        assert_eq!(probe.live_textures(), 0);
        assert_eq!(gpu.flush_releases(), 0);
        assert_eq!(gpu.stats().textures_released, 1);
    }

    #[test]
    fn test_upload_size_checked() {
        let (mut gpu, _probe) = context();
        let desc = TextureDescriptor::new("test", 2, 2, TextureFormat::R8);
        let texture = gpu.create_texture(&desc).unwrap();

        assert_eq!(
            gpu.upload_texture(&texture, &[0; 3]),
            Err(GpuError::UploadSize {
                expected: 4,
                actual: 3
            })
        );
        assert!(gpu.upload_texture(&texture, &[0; 4]).is_ok());
    }

    #[test]
    fn test_shared_program_released_with_last_clone() {
        let (mut gpu, probe) = context();
        let program = gpu
            .compile_program(&ProgramSource::new("tile", "// tile"))
            .unwrap();
        let second = Arc::clone(&program);

        drop(program);
        gpu.flush_releases();
        assert_eq!(probe.live_programs(), 1);

        drop(second);
        gpu.flush_releases();
        assert_eq!(probe.live_programs(), 0);
    }

    #[test]
    fn test_compile_failure_yields_none() {
        let (mut gpu, probe) = context();
        probe.fail_programs(true);

        assert!(gpu
            .compile_program(&ProgramSource::new("broken", "// broken"))
            .is_none());
        assert_eq!(gpu.stats().program_failures, 1);
        assert_eq!(probe.live_programs(), 0);
    }

    #[test]
    fn test_context_drop_flushes_pending() {
        let (mut gpu, probe) = context();
        let desc = TextureDescriptor::new("test", 1, 1, TextureFormat::Rgba8);
        drop(gpu.create_texture(&desc).unwrap());
        drop(gpu);
        assert_eq!(probe.live_textures(), 0);
    }
}
