//! The console input loop: poll a byte, account for how long it took to
//! arrive, draw it, account for how long the draw took.
//!
//! ```text
//! Idle --start timer--> TimingRead --byte--> Dispatch --'!'--> Exit
//!   ^                     |  ^                  |
//!   |                     +--+ no byte          |
//!   +-------------------------------------------+ anything else
//! ```
//!
//! A timer wrap seen while waiting folds the interval measured so far into
//! the read total and restarts the timer, so no waiting time is lost.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    common::state::SharedStats,
    device::{
        serial::{ByteSource, Poll},
        timer::{CycleCounter, Elapsed, TimerGateway},
    },
};

use super::terminal::{GlyphProbe, Terminal};

/// Ends the console session.
pub const EXIT_BYTE: u8 = b'!';

const MICROS_PER_SECOND: f64 = 1_000_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    TimingRead,
    Dispatch(u8),
    Exit,
}

/// Times the glyph draw inside `put_char` and books it as a write.
struct WriteTiming<'t, 'a, C> {
    timer: &'t mut TimerGateway<C>,
    stats: &'a SharedStats,
}

impl<C: CycleCounter> GlyphProbe for WriteTiming<'_, '_, C> {
    fn before_glyph(&mut self) {
        self.timer.start();
    }

    fn after_glyph(&mut self) {
        let seconds = match self.timer.read_elapsed() {
            Elapsed::Seconds(seconds) => seconds,
            Elapsed::Wrapped => self.timer.last_elapsed(),
        };
        self.stats.record_write(seconds * MICROS_PER_SECOND);
    }
}

pub struct InputLoop<'a, 's, S, C> {
    source: S,
    timer: TimerGateway<C>,
    terminal: Terminal<'s>,
    stats: &'a SharedStats,
    state: LoopState,
    /// Seconds spent waiting for the next byte since the timer last started.
    held: f64,
}

impl<'a, 's, S: ByteSource, C: CycleCounter> InputLoop<'a, 's, S, C> {
    pub fn new(
        source: S,
        timer: TimerGateway<C>,
        terminal: Terminal<'s>,
        stats: &'a SharedStats,
    ) -> Self {
        Self {
            source,
            timer,
            terminal,
            stats,
            state: LoopState::Idle,
            held: 0.0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn terminal(&self) -> &Terminal<'s> {
        &self.terminal
    }

    pub fn timer(&self) -> &TimerGateway<C> {
        &self.timer
    }

    /// Performs one transition and returns the new state.
    pub fn step(&mut self) -> LoopState {
        self.state = match self.state {
            LoopState::Idle => {
                self.timer.start();
                self.held = 0.0;
                LoopState::TimingRead
            }
            LoopState::TimingRead => self.poll(),
            LoopState::Dispatch(EXIT_BYTE) => LoopState::Exit,
            LoopState::Dispatch(byte) => {
                self.dispatch(byte);
                LoopState::Idle
            }
            LoopState::Exit => LoopState::Exit,
        };
        self.state
    }

    fn poll(&mut self) -> LoopState {
        let poll = self.source.poll_byte();

        match self.timer.read_elapsed() {
            Elapsed::Seconds(seconds) => self.held = seconds,
            Elapsed::Wrapped => {
                self.stats.fold_read_time(self.timer.last_elapsed());
                self.held = 0.0;
                self.timer.start();
            }
        }

        match poll {
            Poll::Byte(byte) => {
                self.stats.record_read(self.held);
                LoopState::Dispatch(byte)
            }
            Poll::Empty => LoopState::TimingRead,
        }
    }

    fn dispatch(&mut self, byte: u8) {
        let mut probe = WriteTiming {
            timer: &mut self.timer,
            stats: self.stats,
        };
        let effect = self.terminal.put_char_probed(byte, &mut probe);
        tracing::trace!(byte, ?effect, "console byte");
    }

    /// Runs until the exit byte arrives or `quit` is raised.
    pub fn run(&mut self, quit: &AtomicBool) {
        while !quit.load(Ordering::Relaxed) {
            if self.step() == LoopState::Exit {
                tracing::info!("exit byte received, leaving console");
                return;
            }
        }
        tracing::info!("console asked to stop");
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Instant};

    use super::*;
    use crate::{
        common::{config::GlyphConfig, pixel::SurfacePixel, surface::Surface},
        console::{glyphs::testing::sheet, terminal::Cursor},
        device::{serial::testing::ScriptedSource, timer::testing::ScriptedCounter},
    };

    fn terminal(surface: &Surface) -> Terminal<'_> {
        let (scrolling, _) = surface.split_at_row(394);
        Terminal::new(
            scrolling,
            Arc::new(sheet(&GlyphConfig::default())),
            17,
            SurfacePixel::ZERO,
        )
    }

    fn input_loop<'a, 's>(
        surface: &'s Surface,
        stats: &'a SharedStats,
        source: ScriptedSource,
        readings: impl IntoIterator<Item = u32>,
    ) -> InputLoop<'a, 's, ScriptedSource, ScriptedCounter> {
        InputLoop::new(
            source,
            TimerGateway::new(ScriptedCounter::new(readings), 100),
            terminal(surface),
            stats,
        )
    }

    #[test]
    fn characters_reach_the_terminal_until_exit() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        let mut console = input_loop(&surface, &stats, ScriptedSource::bytes(b"AB\n!Z"), []);

        console.run(&AtomicBool::new(false));

        assert_eq!(console.state(), LoopState::Exit);
        assert_eq!(console.terminal().cursor(), Cursor { x: 0, y: 22 });
        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 4);
        assert_eq!(snap.write_count, 2);
    }

    #[test]
    fn read_and_write_latency_are_booked_separately() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        let source = ScriptedSource(
            [Poll::Empty, Poll::Empty, Poll::Byte(b'A'), Poll::Byte(b'!')].into(),
        );
        let mut console = input_loop(&surface, &stats, source, [100, 200, 300, 50, 80]);

        let mut states = Vec::new();
        while console.step() != LoopState::Exit {
            states.push(console.state());
        }

        assert_eq!(
            states,
            [
                LoopState::TimingRead,
                LoopState::TimingRead,
                LoopState::TimingRead,
                LoopState::Dispatch(b'A'),
                LoopState::Idle,
                LoopState::TimingRead,
                LoopState::Dispatch(b'!'),
            ]
        );
        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 2);
        assert!((snap.avg_read - 1.9).abs() < 1e-9);
        assert_eq!(snap.write_count, 1);
        assert!((snap.avg_write - 500_000.0).abs() < 1e-6);
        // idle, glyph, idle
        assert_eq!(console.timer().counter().restarts, 3);
    }

    #[test]
    fn wrapped_timer_keeps_the_waiting_time() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        let source = ScriptedSource([Poll::Empty, Poll::Empty, Poll::Byte(b'!')].into());
        let mut console = input_loop(&surface, &stats, source, [500, 100, 200]);

        console.run(&AtomicBool::new(false));

        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 1);
        assert!((snap.avg_read - 7.0).abs() < 1e-9);
        assert_eq!(console.timer().counter().restarts, 2);
    }

    #[test]
    fn control_bytes_are_reads_but_not_writes() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        let source = ScriptedSource::bytes(b"a\x7f\n\x7f!");
        let mut console = input_loop(&surface, &stats, source, []);

        console.run(&AtomicBool::new(false));

        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 5);
        assert_eq!(snap.write_count, 1);
        assert_eq!(console.terminal().cursor(), Cursor { x: 630, y: 0 });
    }

    #[test]
    fn quit_flag_stops_an_idle_console() {
        let surface = Surface::in_memory(640, 480);
        let stats = SharedStats::new(Instant::now());
        let mut console = input_loop(&surface, &stats, ScriptedSource::bytes(b""), []);

        console.run(&AtomicBool::new(true));

        assert_eq!(console.state(), LoopState::Idle);
        assert_eq!(stats.snapshot().read_count, 0);
    }
}
