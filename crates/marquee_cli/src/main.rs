//! Marquee CLI
//!
//! Drive the menu overlay through a scripted session and report what it
//! drew and cached.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use marquee_core::{
    Color, ConsoleLayer, GpuBackend, GpuContext, HeadlessBackend, LogConsole, ManualClock,
    MenuConfig,
};
use marquee_gpu::WgpuBackend;
use marquee_menu::{FrameReport, Image, Menu, TileContent};
use marquee_text::TextCache;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod script;

use script::Storyboard;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Marquee TV menu overlay driver", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted navigation session and print statistics
    Run {
        /// Font file used for every label
        #[arg(short, long)]
        font: PathBuf,

        /// Menu configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to render
        #[arg(long, default_value = "600")]
        frames: u64,

        /// Simulated time between frames
        #[arg(long, default_value = "16")]
        frame_ms: u64,

        /// Number of content tiles
        #[arg(long, default_value = "24")]
        tiles: usize,

        /// GPU backend
        #[arg(short, long, value_enum, default_value = "headless")]
        backend: Backend,
    },

    /// Print the default configuration as TOML
    Config,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// CPU backend that only keeps resource bookkeeping
    Headless,
    /// wgpu device without a surface
    Wgpu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            font,
            config,
            frames,
            frame_ms,
            tiles,
            backend,
        } => cmd_run(
            cli.verbose,
            &font,
            config.as_deref(),
            frames,
            frame_ms,
            tiles,
            backend,
        ),
        Commands::Config => {
            init_logging(cli.verbose, None);
            cmd_config()
        }
    }
}

fn init_logging(verbose: bool, console: Option<ConsoleLayer>) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .with(console)
        .init();
}

fn cmd_config() -> Result<()> {
    let text = toml::to_string_pretty(&MenuConfig::default())?;
    print!("{}", text);
    Ok(())
}

fn create_backend(backend: Backend) -> Result<Box<dyn GpuBackend>> {
    Ok(match backend {
        Backend::Headless => Box::new(HeadlessBackend::new()),
        Backend::Wgpu => Box::new(WgpuBackend::new_headless()?),
    })
}

/// Posters in a repeating palette
fn tile_contents(count: usize) -> Result<Vec<TileContent>> {
    const PALETTE: [u32; 6] = [0x3B82F6, 0xEF4444, 0x10B981, 0xF59E0B, 0x8B5CF6, 0xEC4899];
    (0..count)
        .map(|i| {
            let color = Color::from_hex(PALETTE[i % PALETTE.len()]);
            Ok(TileContent {
                title: format!("Episode {}", i + 1),
                poster: Some(Image::solid(64, 36, color)?),
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct Totals {
    commands: usize,
    released: usize,
    evicted: usize,
    animating_frames: u64,
}

impl Totals {
    fn add(&mut self, report: FrameReport) {
        self.commands += report.commands;
        self.released += report.released;
        self.evicted += report.evicted;
        if report.animating {
            self.animating_frames += 1;
        }
    }
}

fn cmd_run(
    verbose: bool,
    font: &Path,
    config: Option<&Path>,
    frames: u64,
    frame_ms: u64,
    tiles: usize,
    backend: Backend,
) -> Result<()> {
    let config = match config {
        Some(path) => MenuConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MenuConfig::default(),
    };
    let console = LogConsole::new(config.console.capacity);
    init_logging(verbose, Some(console.layer(Level::WARN)));

    let clock = ManualClock::new();
    let gpu = GpuContext::new(create_backend(backend)?);
    info!("Using {} backend", gpu.backend_name());
    let text = TextCache::with_swash(clock.handle(), &config.text);

    let mut menu = Menu::new(config, clock.handle(), gpu, text, console.clone());
    let data = fs::read(font).with_context(|| format!("reading font {}", font.display()))?;
    let font = menu.add_font(data)?;
    info!("Loaded font '{}'", menu.text_cache().font_family(font)?);

    menu.set_tiles(tile_contents(tiles)?)?;
    menu.set_frame_source(Box::new(Storyboard::new(10)));
    let cached = menu.add_metric("text textures", Color::rgb(0.4, 0.6, 1.0));

    let mut steps = script::demo(frames).into_iter().peekable();
    let mut totals = Totals::default();
    for frame in 0..frames {
        while let Some(step) = steps.next_if(|step| step.frame <= frame) {
            tracing::debug!("Frame {}: {:?}", frame, step.action);
            script::apply(&mut menu, &step.action);
        }
        menu.record_metric(cached, menu.text_cache().stats().textures as f32);
        totals.add(menu.render_frame());
        clock.advance_ms(frame_ms);
    }

    let gpu = menu.gpu().stats();
    let text = menu.text_cache().stats();
    println!("frames             {}", menu.frames());
    println!("animating frames   {}", totals.animating_frames);
    println!("draw commands      {}", totals.commands);
    println!("released           {}", totals.released);
    println!("evicted            {}", totals.evicted);
    println!("selected tile      {:?}", menu.selected());
    println!(
        "textures           {} created, {} released",
        gpu.textures_created, gpu.textures_released
    );
    println!(
        "render targets     {} created, {} released",
        gpu.render_targets_created, gpu.render_targets_released
    );
    println!(
        "programs           {} compiled, {} failed",
        gpu.programs_compiled, gpu.program_failures
    );
    println!(
        "text textures      {} cached, {} hits, {} misses, {} evicted",
        text.textures, text.texture_hits, text.texture_misses, text.evicted
    );
    println!(
        "text layouts       {} cached, {} hits, {} misses",
        text.layouts, text.layout_hits, text.layout_misses
    );
    println!("glyphs rasterized  {}", text.glyphs_rasterized);
    println!("console lines      {}", console.len());
    Ok(())
}
