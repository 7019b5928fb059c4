//! Background sampler that keeps the status region up to date.

use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use monoio::RuntimeBuilder;

use crate::{common::state::SharedStats, console::terminal::Terminal};

use status::{format_status, StatusFields, StatusText};
use sysinfo::SystemProbe;

pub mod status;
pub mod sysinfo;

pub struct PerformanceMonitor<'a, 's, P> {
    terminal: Terminal<'s>,
    stats: &'a SharedStats,
    probe: P,
    period: Duration,
}

impl<'a, 's, P: SystemProbe> PerformanceMonitor<'a, 's, P> {
    pub fn new(terminal: Terminal<'s>, stats: &'a SharedStats, probe: P, period: Duration) -> Self {
        Self {
            terminal,
            stats,
            probe,
            period,
        }
    }

    pub fn sample(&mut self) -> StatusText {
        let fields = StatusFields {
            app_uptime_secs: self.stats.start_time().elapsed().as_secs(),
            stats: self.stats.snapshot(),
            system: self.probe.sample(),
        };
        format_status(&fields)
    }

    pub fn render_once(&mut self) {
        let text = self.sample();
        self.terminal.print_line(&text);
    }

    /// Redraws once per period until `stop` is raised. The block is always
    /// drawn at least once, and once more after `stop` so the final counts
    /// stay on screen.
    pub async fn run(mut self, stop: &AtomicBool) {
        tracing::info!(period = ?self.period, "performance monitor started");
        loop {
            self.render_once();
            if stop.load(Ordering::Relaxed) {
                break;
            }
            monoio::time::sleep(self.period).await;
        }
        tracing::info!("performance monitor stopped");
    }

    /// Drives [`run`](Self::run) on a timer-enabled runtime owned by the
    /// calling thread.
    pub fn run_blocking(self, stop: &AtomicBool) -> io::Result<()> {
        let mut runtime = RuntimeBuilder::<monoio::FusionDriver>::new()
            .with_entries(256)
            .enable_timer()
            .build()?;
        runtime.block_on(self.run(stop));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Instant};

    use super::{
        sysinfo::{testing::FixedProbe, SystemSample},
        *,
    };
    use crate::{
        common::{config::GlyphConfig, pixel::SurfacePixel, surface::Surface},
        console::glyphs::testing::sheet,
    };

    fn monitor<'a, 's>(
        surface: &'s Surface,
        stats: &'a SharedStats,
    ) -> PerformanceMonitor<'a, 's, FixedProbe> {
        let (_, status) = surface.split_at_row(394);
        let terminal = Terminal::new(
            status,
            Arc::new(sheet(&GlyphConfig::default())),
            17,
            SurfacePixel::ZERO,
        );
        PerformanceMonitor::new(
            terminal,
            stats,
            FixedProbe(SystemSample {
                processes: 12,
                ..SystemSample::default()
            }),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn sample_reflects_the_shared_counters() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        stats.record_read(0.5);
        stats.record_write(20.0);
        let mut monitor = monitor(&surface, &stats);

        let text = monitor.sample();
        assert!(text.contains("Characters Received: 000001"));
        assert!(text.contains("Characters Sent: 000001"));
        assert!(text.contains("Average Read Time: 0000.50s"));
        assert!(text.contains("Process Count: 12"));
    }

    #[test]
    fn rendering_stays_in_the_status_region() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        monitor(&surface, &stats).render_once();

        assert!((0..394).all(|y| (0..640).all(|x| surface.get_pixel(x, y) == SurfacePixel::ZERO)));
        // 'A' of "Application" is the first glyph of the block
        assert_eq!(surface.get_pixel(0, 394), SurfacePixel::from_rgb(b'A', 4, 1));
    }

    #[test]
    fn raised_stop_ends_the_loop() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        let stop = AtomicBool::new(false);

        std::thread::scope(|s| {
            let handle = s.spawn(|| monitor(&surface, &stats).run_blocking(&stop));
            std::thread::sleep(Duration::from_millis(30));
            stop.store(true, Ordering::Relaxed);
            handle.join().unwrap().unwrap();
        });
        assert_eq!(surface.get_pixel(0, 394), SurfacePixel::from_rgb(b'A', 4, 1));
    }
}
