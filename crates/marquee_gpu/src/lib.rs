//! Marquee GPU
//!
//! [`WgpuBackend`] implements the overlay's [`GpuBackend`] seam on wgpu.
//! Textures, render targets and shader modules live in id-keyed maps; the
//! host renderer looks them up by the ids carried in draw commands and
//! takes each submitted frame with [`WgpuBackend::take_frame`].

use marquee_core::gpu::Result;
use marquee_core::{
    DrawCommand, DrawList, GpuBackend, GpuError, ProgramId, ProgramSource, RenderTargetId,
    TextureDescriptor, TextureFormat, TextureId,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

/// Device setup errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("failed to create device: {0}")]
    DeviceError(#[from] wgpu::RequestDeviceError),
}

/// Map an overlay texture format to wgpu
pub fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
    }
}

struct TextureSlot {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TextureDescriptor,
}

struct RenderTargetSlot {
    texture: TextureId,
    view: wgpu::TextureView,
}

/// wgpu implementation of [`GpuBackend`]
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    textures: FxHashMap<u64, TextureSlot>,
    render_targets: FxHashMap<u64, RenderTargetSlot>,
    programs: FxHashMap<u64, wgpu::ShaderModule>,
    next_id: u64,
    frame: Vec<DrawCommand>,
    frames: u64,
}

impl WgpuBackend {
    /// Wrap a device the host already created
    pub fn from_device(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            textures: FxHashMap::default(),
            render_targets: FxHashMap::default(),
            programs: FxHashMap::default(),
            next_id: 1,
            frame: Vec::new(),
            frames: 0,
        }
    }

    /// Create a device without a surface
    pub fn new_headless() -> std::result::Result<Self, BackendError> {
        pollster::block_on(Self::request_headless())
    }

    async fn request_headless() -> std::result::Result<Self, BackendError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(BackendError::AdapterNotFound)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Marquee GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        tracing::debug!("Using adapter {:?}", adapter.get_info().name);
        Ok(Self::from_device(Arc::new(device), Arc::new(queue)))
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&wgpu::Texture> {
        self.textures.get(&id.0).map(|slot| &slot.texture)
    }

    pub fn texture_view(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.textures.get(&id.0).map(|slot| &slot.view)
    }

    pub fn render_target_view(&self, id: RenderTargetId) -> Option<&wgpu::TextureView> {
        self.render_targets.get(&id.0).map(|slot| &slot.view)
    }

    pub fn shader_module(&self, id: ProgramId) -> Option<&wgpu::ShaderModule> {
        self.programs.get(&id.0)
    }

    /// Commands of the last submitted frame, leaving the slot empty
    pub fn take_frame(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.frame)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > limit || desc.height > limit {
            return Err(GpuError::TextureAllocation(format!(
                "'{}' extent {}x{} outside 1..={}",
                desc.label, desc.width, desc.height, limit
            )));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = self.next_id();
        self.textures.insert(
            id,
            TextureSlot {
                texture,
                view,
                desc: desc.clone(),
            },
        );
        Ok(TextureId(id))
    }

    fn upload_texture(&mut self, id: TextureId, pixels: &[u8]) -> Result<()> {
        let slot = self
            .textures
            .get(&id.0)
            .ok_or(GpuError::UnknownTexture(id))?;
        let desc = &slot.desc;
        if pixels.len() != desc.byte_len() {
            return Err(GpuError::UploadSize {
                expected: desc.byte_len(),
                actual: pixels.len(),
            });
        }

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &slot.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * desc.format.bytes_per_pixel() as u32),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn delete_texture(&mut self, id: TextureId) {
        match self.textures.remove(&id.0) {
            Some(slot) => slot.texture.destroy(),
            None => tracing::warn!("wgpu backend: delete of unknown texture {:?}", id),
        }
    }

    fn create_render_target(&mut self, texture: TextureId) -> Result<RenderTargetId> {
        let slot = self
            .textures
            .get(&texture.0)
            .ok_or(GpuError::UnknownTexture(texture))?;
        if !slot.texture.usage().contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(GpuError::RenderTarget(format!(
                "'{}' is not renderable",
                slot.desc.label
            )));
        }

        let view = slot.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Marquee Render Target"),
            ..Default::default()
        });
        let id = self.next_id();
        self.render_targets
            .insert(id, RenderTargetSlot { texture, view });
        Ok(RenderTargetId(id))
    }

    fn delete_render_target(&mut self, id: RenderTargetId) {
        if let Some(slot) = self.render_targets.remove(&id.0) {
            tracing::trace!("Released render target on {:?}", slot.texture);
        }
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.label),
                source: wgpu::ShaderSource::Wgsl(source.source.as_str().into()),
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::ProgramCompile(format!("'{}': {}", source.label, err)));
        }

        let id = self.next_id();
        self.programs.insert(id, module);
        Ok(ProgramId(id))
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.programs.remove(&id.0);
    }

    fn submit(&mut self, list: &DrawList) {
        // Flush pending texture writes before the host draws
        self.queue.submit(std::iter::empty());
        self.frame = list.commands().to_vec();
        self.frames += 1;
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("textures", &self.textures.len())
            .field("render_targets", &self.render_targets.len())
            .field("programs", &self.programs.len())
            .field("frames", &self.frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::{Color, GpuContext, Rect};

    #[test]
    fn test_format_mapping() {
        assert_eq!(wgpu_format(TextureFormat::Rgba8), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(wgpu_format(TextureFormat::R8), wgpu::TextureFormat::R8Unorm);
    }

    /// Needs a GPU adapter; skipped on machines without one
    #[test]
    fn test_texture_lifecycle_on_device() {
        let Ok(backend) = WgpuBackend::new_headless() else {
            return;
        };
        let mut gpu = GpuContext::new(Box::new(backend));

        let desc = TextureDescriptor::new("readback", 4, 2, TextureFormat::Rgba8);
        let texture = gpu.create_texture_with_data(&desc, &[255; 32]).unwrap();
        let target = gpu.create_render_target(&texture).unwrap();
        assert_eq!(target.texture(), texture.id());

        let bad = ProgramSource::new("broken", "fn main( {");
        assert!(gpu.compile_program(&bad).is_none());

        let mut list = DrawList::new();
        list.fill_rect(Rect::new(0.0, 0.0, 4.0, 2.0), 0.0, Color::WHITE);
        gpu.submit(&list);

        drop(target);
        drop(texture);
        assert_eq!(gpu.flush_releases(), 2);
    }
}
