//! Shader programs used by the overlay
//!
//! Programs are compiled through [`GpuContext::compile_program`]; a failed
//! compile is logged there and leaves the owner with `None`, which makes
//! the owner skip its textured draws.

use marquee_core::{GpuContext, GpuProgram, ProgramSource};
use std::sync::{Arc, Weak};

/// Textured quad tinted by a per-draw color
pub const IMAGE_WGSL: &str = r#"
struct Quad {
    rect: vec4<f32>,
    tint: vec4<f32>,
    viewport: vec2<f32>,
    corner_radius: f32,
    _pad: f32,
};

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> quad: Quad;
@group(0) @binding(1) var image: texture_2d<f32>;
@group(0) @binding(2) var image_sampler: sampler;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOut {
    let corner = vec2<f32>(f32(index & 1u), f32(index >> 1u));
    let pixel = quad.rect.xy + corner * quad.rect.zw;
    let ndc = pixel / quad.viewport * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0);
    var out: VertexOut;
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return textureSample(image, image_sampler, in.uv) * quad.tint;
}
"#;

/// Poster quad with rounded corners
pub const TILE_WGSL: &str = r#"
struct Quad {
    rect: vec4<f32>,
    tint: vec4<f32>,
    viewport: vec2<f32>,
    corner_radius: f32,
    _pad: f32,
};

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> quad: Quad;
@group(0) @binding(1) var poster: texture_2d<f32>;
@group(0) @binding(2) var poster_sampler: sampler;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOut {
    let corner = vec2<f32>(f32(index & 1u), f32(index >> 1u));
    let pixel = quad.rect.xy + corner * quad.rect.zw;
    let ndc = pixel / quad.viewport * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0);
    var out: VertexOut;
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    let half = quad.rect.zw * 0.5;
    let p = abs(in.uv * quad.rect.zw - half) - (half - vec2<f32>(quad.corner_radius));
    let dist = length(max(p, vec2<f32>(0.0))) - quad.corner_radius;
    let mask = clamp(0.5 - dist, 0.0, 1.0);
    return textureSample(poster, poster_sampler, in.uv) * quad.tint * mask;
}
"#;

pub fn image_source() -> ProgramSource {
    ProgramSource::new("marquee-image", IMAGE_WGSL)
}

pub fn tile_source() -> ProgramSource {
    ProgramSource::new("marquee-tile", TILE_WGSL)
}

/// A program shared by every instance of one controller type
///
/// Only a weak reference is kept here: the instances own the program, it is
/// released with the last of them and recompiled for the next one.
#[derive(Debug)]
pub struct SharedProgram {
    source: ProgramSource,
    live: Weak<GpuProgram>,
}

impl SharedProgram {
    pub fn new(source: ProgramSource) -> Self {
        Self {
            source,
            live: Weak::new(),
        }
    }

    /// The live program, compiling it if no instance holds one
    pub fn acquire(&mut self, gpu: &mut GpuContext) -> Option<Arc<GpuProgram>> {
        if let Some(program) = self.live.upgrade() {
            return Some(program);
        }
        let program = gpu.compile_program(&self.source)?;
        self.live = Arc::downgrade(&program);
        Some(program)
    }

    /// Number of instances holding the program
    pub fn users(&self) -> usize {
        self.live.strong_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::HeadlessBackend;

    #[test]
    fn test_shared_program_compiled_once_released_with_last_user() {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let mut gpu = GpuContext::new(Box::new(backend));
        let mut shared = SharedProgram::new(tile_source());

        let a = shared.acquire(&mut gpu).unwrap();
        let b = shared.acquire(&mut gpu).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(shared.users(), 2);
        assert_eq!(probe.live_programs(), 1);

        drop(a);
        gpu.flush_releases();
        assert_eq!(probe.live_programs(), 1);

        drop(b);
        gpu.flush_releases();
        assert_eq!(probe.live_programs(), 0);
        assert_eq!(shared.users(), 0);

        let again = shared.acquire(&mut gpu).unwrap();
        assert_eq!(probe.live_programs(), 1);
        drop(again);
    }

    #[test]
    fn test_compile_failure_leaves_none() {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        probe.fail_programs(true);
        let mut gpu = GpuContext::new(Box::new(backend));
        let mut shared = SharedProgram::new(image_source());
        assert!(shared.acquire(&mut gpu).is_none());
        assert_eq!(shared.users(), 0);
    }
}
