//! Marquee Core
//!
//! Foundational services for the Marquee TV menu overlay:
//!
//! - **Clock**: monotonic frame time shared by animations and caches
//! - **GPU seam**: backend trait with owned, release-on-drop handles
//! - **Draw lists**: per-frame recorded draw commands
//! - **Log console**: on-screen diagnostics fed by `tracing`
//! - **Configuration**: TOML-backed menu settings

pub mod config;
pub mod console;
pub mod draw;
pub mod geometry;
pub mod gpu;
pub mod headless;
pub mod time;

pub use config::{
    AnimationConfig, ConfigError, ConsoleConfig, LayoutConfig, MenuConfig, TextConfig,
    TransitionConfig,
};
pub use console::{ConsoleLayer, LogConsole, LogLine};
pub use draw::{DrawCommand, DrawList};
pub use geometry::{Color, Rect, Size, Vec2};
pub use gpu::{
    GpuBackend, GpuContext, GpuError, GpuProgram, GpuRenderTarget, GpuStats, GpuTexture,
    ProgramId, ProgramSource, ReleaseQueue, RenderTargetId, TextureDescriptor, TextureFormat,
    TextureId,
};
pub use headless::{HeadlessBackend, HeadlessProbe};
pub use time::{Clock, ClockHandle, ManualClock, SystemClock};
