//! The fixed-width status block shown under the console.
//!
//! Four lines of exactly [`LINE_WIDTH`] characters, so that wrapping at the
//! screen edge lays them out and every field stays in the same column from
//! one frame to the next.

use arrayvec::ArrayString;

use crate::common::state::StatsSnapshot;

use super::sysinfo::SystemSample;

pub const LINE_WIDTH: usize = 64;
pub const LINES: usize = 4;

pub type StatusText = ArrayString<{ LINE_WIDTH * LINES }>;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

const MAX_LATENCY_INT: u64 = 9999;
const MAX_PROCESSES: u32 = 99;

pub struct StatusFields {
    pub app_uptime_secs: u64,
    pub stats: StatsSnapshot,
    pub system: SystemSample,
}

/// `value` as a capped integer part and two decimal digits.
fn split_fixed(value: f64) -> (u64, u64) {
    let hundredths = (value.max(0.0) * 100.0).round() as u64;
    ((hundredths / 100).min(MAX_LATENCY_INT), hundredths % 100)
}

/// Appends `line` cut or space-padded to exactly one line.
fn push_line(out: &mut StatusText, line: &str) {
    let mut written = 0;
    for c in line.chars().filter(char::is_ascii).take(LINE_WIDTH) {
        out.push(c);
        written += 1;
    }
    for _ in written..LINE_WIDTH {
        out.push(' ');
    }
}

pub fn format_status(fields: &StatusFields) -> StatusText {
    let app = fields.app_uptime_secs;
    let sys = fields.system.uptime_secs;
    let stats = &fields.stats;
    let (read_int, read_frac) = split_fixed(stats.avg_read);
    let (write_int, write_frac) = split_fixed(stats.avg_write);

    let mut out = StatusText::new();
    push_line(
        &mut out,
        &format!(
            "Application Uptime: {:02}h:{:02}m:{:02}s   System Uptime: {:02}d:{:02}h:{:02}m:{:02}s",
            (app % DAY) / HOUR,
            (app % HOUR) / MINUTE,
            app % MINUTE,
            sys / DAY,
            (sys % DAY) / HOUR,
            (sys % HOUR) / MINUTE,
            sys % MINUTE,
        ),
    );
    push_line(
        &mut out,
        &format!(
            "Characters Received: {:06}              Characters Sent: {:06}",
            stats.read_count, stats.write_count,
        ),
    );
    push_line(
        &mut out,
        &format!(
            "Average Read Time: {read_int:04}.{read_frac:02}s        \
             Average Write Time: {write_int:04}.{write_frac:02}us",
        ),
    );
    push_line(
        &mut out,
        &format!(
            "Process Count: {:02}     Total RAM: {:03.2}MB     Free RAM: {:03.2}MB",
            fields.system.processes.min(MAX_PROCESSES),
            fields.system.total_ram_mb,
            fields.system.free_ram_mb,
        ),
    );
    out
}
