use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{anyhow, Context};

use crate::{
    common::{config::Config, state::SharedStats, surface::Surface},
    device::{
        serial::{ByteSource, Disconnected, SerialByteSource},
        timer::{CycleCounter, TimerDevice, TimerGateway},
    },
    monitor::{
        sysinfo::{LinuxProbe, SystemProbe},
        PerformanceMonitor,
    },
};

use super::{glyphs::GlyphSheet, input::InputLoop, terminal::Terminal};

/// Opens the console devices and runs [`run_session`] on them.
pub fn run_console(
    config: &Config,
    surface: &Surface,
    stats: &SharedStats,
    quit: &AtomicBool,
) -> anyhow::Result<()> {
    let glyphs = Arc::new(
        GlyphSheet::load(&config.glyphs).context("failed to load the glyph sheet")?,
    );
    let timer = TimerDevice::open(&config.devices.timer)
        .context("failed to initialise timer driver")?;
    let source: Box<dyn ByteSource> =
        match SerialByteSource::open(&config.devices.serial, config.devices.baud_rate) {
            Ok(port) => Box::new(port),
            Err(err) => {
                tracing::warn!("{err}; console will receive no input");
                Box::new(Disconnected)
            }
        };

    run_session(
        config,
        surface,
        stats,
        quit,
        SessionParts {
            glyphs,
            source,
            counter: timer,
            probe: LinuxProbe,
        },
    )
}

/// What a console session reads from and draws with.
pub struct SessionParts<S, C, P> {
    pub glyphs: Arc<GlyphSheet>,
    pub source: S,
    pub counter: C,
    pub probe: P,
}

/// Runs the serial console and the performance monitor side by side until
/// the exit byte arrives or `quit` is raised.
///
/// The console only ever draws above the partition row and the monitor only
/// below it.
pub fn run_session<S, C, P>(
    config: &Config,
    surface: &Surface,
    stats: &SharedStats,
    quit: &AtomicBool,
    parts: SessionParts<S, C, P>,
) -> anyhow::Result<()>
where
    S: ByteSource,
    C: CycleCounter,
    P: SystemProbe + Send,
{
    let SessionParts {
        glyphs,
        source,
        counter,
        probe,
    } = parts;
    let (scrolling, status) = surface.split_at_row(config.screen.partition);
    let background = config.monitor.background();
    let padded_lines = config.glyphs.padded_lines;

    let monitor = PerformanceMonitor::new(
        Terminal::new(status, glyphs.clone(), padded_lines, background),
        stats,
        probe,
        config.monitor.sample_period(),
    );
    let mut input = InputLoop::new(
        source,
        TimerGateway::new(counter, config.timer.frequency_hz),
        Terminal::new(scrolling, glyphs, padded_lines, background),
        stats,
    );

    let stop = AtomicBool::new(false);
    let stop_ref = &stop;
    thread::scope(|s| {
        let monitor_thread = thread::Builder::new()
            .name("monitor".into())
            .spawn_scoped(s, move || monitor.run_blocking(stop_ref))
            .context("failed to start the monitor thread")?;

        tracing::info!("console session started");
        input.run(quit);
        stop.store(true, Ordering::Relaxed);

        monitor_thread
            .join()
            .map_err(|_| anyhow!("monitor thread panicked"))?
            .context("monitor runtime failed")
    })
}
