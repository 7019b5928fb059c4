pub mod common;
pub mod console;
pub mod device;
pub mod frontend;
pub mod monitor;

use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::AtomicBool,
    time::Instant,
};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::{
    common::{
        config::{Backend, Config},
        state::SharedStats,
        surface::Surface,
    },
    device::video::MappedFramebuffer,
    frontend::{menu::Menu, winit::winit_window_loop},
};

const DEFAULT_CONFIG: &str = "fbconsole.toml";

fn init_tracing() {
    // RUST_LOG=fbconsole=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

fn load_config() -> anyhow::Result<Config> {
    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => {
            tracing::info!("no config file, using board defaults");
            return Ok(Config::default());
        }
    };
    let config = Config::load(&path)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

fn operator_menu(
    config: &Config,
    surface: &Surface,
    stats: &SharedStats,
    quit: &AtomicBool,
) -> anyhow::Result<()> {
    let stdin = io::stdin().lock();
    Menu::new(config, stdin, io::stdout()).run(surface, stats, quit)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let stats = SharedStats::new(Instant::now());
    let config = load_config()?;
    let quit = AtomicBool::new(false);
    let (width, height) = (config.screen.width, config.screen.height);

    match config.backend {
        Backend::Device => {
            let framebuffer = MappedFramebuffer::open(&config.devices.video, width, height)
                .inspect_err(|err| tracing::error!("{err}"))
                .context("failed to open vga driver")?;
            let surface = Surface::mapped(width, height, framebuffer);
            operator_menu(&config, &surface, &stats, &quit)
        }
        Backend::Window => {
            let surface = Surface::in_memory(width, height);
            std::thread::scope(|s| {
                let operator = s.spawn(|| operator_menu(&config, &surface, &stats, &quit));
                if let Err(err) = winit_window_loop(&config, &surface, &quit) {
                    tracing::error!("{err:#}; continuing without preview");
                }
                operator
                    .join()
                    .map_err(|_| anyhow::anyhow!("operator thread panicked"))?
            })
        }
    }
}
