//! Headless GPU backend
//!
//! Keeps textures as CPU pixel buffers. Used by tests, by the CLI driver and
//! by hosts that composite the overlay themselves.

use crate::draw::DrawList;
use crate::gpu::{
    GpuBackend, GpuError, ProgramId, ProgramSource, RenderTargetId, Result, TextureDescriptor,
    TextureId,
};
use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct HeadlessTexture {
    desc: TextureDescriptor,
    pixels: Vec<u8>,
}

#[derive(Default)]
struct HeadlessState {
    textures: SlotMap<DefaultKey, HeadlessTexture>,
    render_targets: SlotMap<DefaultKey, TextureId>,
    programs: SlotMap<DefaultKey, String>,
    textures_created: u64,
    uploads: u64,
    frames: u64,
    last_frame_commands: usize,
    fail_textures: bool,
    fail_uploads: bool,
    fail_render_targets: bool,
    fail_programs: bool,
}

fn to_key(raw: u64) -> DefaultKey {
    DefaultKey::from(KeyData::from_ffi(raw))
}

fn to_raw(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

/// CPU-only [`GpuBackend`]
pub struct HeadlessBackend {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState::default())),
        }
    }

    /// Inspection handle that stays valid after the backend is boxed
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GpuError::TextureAllocation(format!(
                "'{}' has zero extent {}x{}",
                desc.label, desc.width, desc.height
            )));
        }
        let mut state = self.state();
        if state.fail_textures {
            return Err(GpuError::TextureAllocation(format!(
                "'{}': out of texture memory (injected)",
                desc.label
            )));
        }
        state.textures_created += 1;
        let key = state.textures.insert(HeadlessTexture {
            desc: desc.clone(),
            pixels: vec![0; desc.byte_len()],
        });
        Ok(TextureId(to_raw(key)))
    }

    fn upload_texture(&mut self, id: TextureId, pixels: &[u8]) -> Result<()> {
        let mut state = self.state();
        if state.fail_uploads {
            return Err(GpuError::Upload("rejected (injected)".to_string()));
        }
        let texture = state
            .textures
            .get_mut(to_key(id.0))
            .ok_or(GpuError::UnknownTexture(id))?;
        if pixels.len() != texture.desc.byte_len() {
            return Err(GpuError::UploadSize {
                expected: texture.desc.byte_len(),
                actual: pixels.len(),
            });
        }
        texture.pixels.copy_from_slice(pixels);
        state.uploads += 1;
        Ok(())
    }

    fn delete_texture(&mut self, id: TextureId) {
        if self.state().textures.remove(to_key(id.0)).is_none() {
            tracing::warn!("Headless backend: delete of unknown texture {:?}", id);
        }
    }

    fn create_render_target(&mut self, texture: TextureId) -> Result<RenderTargetId> {
        let mut state = self.state();
        if state.fail_render_targets {
            return Err(GpuError::RenderTarget(
                "framebuffer incomplete (injected)".to_string(),
            ));
        }
        if !state.textures.contains_key(to_key(texture.0)) {
            return Err(GpuError::UnknownTexture(texture));
        }
        let key = state.render_targets.insert(texture);
        Ok(RenderTargetId(to_raw(key)))
    }

    fn delete_render_target(&mut self, id: RenderTargetId) {
        self.state().render_targets.remove(to_key(id.0));
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        let mut state = self.state();
        if state.fail_programs {
            return Err(GpuError::ProgramCompile(format!(
                "'{}': compilation disabled (injected)",
                source.label
            )));
        }
        let key = state.programs.insert(source.label.clone());
        Ok(ProgramId(to_raw(key)))
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.state().programs.remove(to_key(id.0));
    }

    fn submit(&mut self, list: &DrawList) {
        let mut state = self.state();
        state.frames += 1;
        state.last_frame_commands = list.len();
    }
}

/// Read-only view into a [`HeadlessBackend`] plus failure injection
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn live_textures(&self) -> usize {
        self.state().textures.len()
    }

    pub fn live_render_targets(&self) -> usize {
        self.state().render_targets.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state().programs.len()
    }

    /// Total textures ever created
    pub fn textures_created(&self) -> u64 {
        self.state().textures_created
    }

    pub fn uploads(&self) -> u64 {
        self.state().uploads
    }

    pub fn frames(&self) -> u64 {
        self.state().frames
    }

    pub fn last_frame_commands(&self) -> usize {
        self.state().last_frame_commands
    }

    /// Copy of a texture's pixels
    pub fn texture_pixels(&self, id: TextureId) -> Option<Vec<u8>> {
        self.state()
            .textures
            .get(to_key(id.0))
            .map(|texture| texture.pixels.clone())
    }

    pub fn texture_descriptor(&self, id: TextureId) -> Option<TextureDescriptor> {
        self.state()
            .textures
            .get(to_key(id.0))
            .map(|texture| texture.desc.clone())
    }

    /// Make every texture allocation fail
    pub fn fail_textures(&self, fail: bool) {
        self.state().fail_textures = fail;
    }

    /// Make every texture upload fail
    pub fn fail_uploads(&self, fail: bool) {
        self.state().fail_uploads = fail;
    }

    /// Make every render target setup fail
    pub fn fail_render_targets(&self, fail: bool) {
        self.state().fail_render_targets = fail;
    }

    /// Make every program compilation fail
    pub fn fail_programs(&self, fail: bool) {
        self.state().fail_programs = fail;
    }
}

impl std::fmt::Debug for HeadlessProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("HeadlessProbe")
            .field("textures", &state.textures.len())
            .field("render_targets", &state.render_targets.len())
            .field("programs", &state.programs.len())
            .field("frames", &state.frames)
            .finish()
    }
}
