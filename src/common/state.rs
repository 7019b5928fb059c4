use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

#[derive(Default, Debug)]
struct Counters {
    read_count: u64,
    write_count: u64,
    /// seconds
    read_time: f64,
    /// microseconds
    write_time: f64,
}

/// Counters shared by the console input loop and the performance monitor.
///
/// Every counter update and its matching accumulator update happen under a
/// single lock acquisition, so a snapshot never sees one without the other.
pub struct SharedStats {
    start_time: Instant,
    counters: Mutex<Counters>,
}

/// A consistent view of the counters, with averages already worked out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsSnapshot {
    pub read_count: u64,
    pub write_count: u64,
    /// seconds
    pub avg_read: f64,
    /// microseconds
    pub avg_write: f64,
}

fn average(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl SharedStats {
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One byte arrived after waiting `latency` seconds.
    pub fn record_read(&self, latency: f64) {
        let mut counters = self.lock();
        counters.read_count += 1;
        counters.read_time += latency;
    }

    /// Read time that elapsed without a byte, carried over a timer wrap.
    pub fn fold_read_time(&self, latency: f64) {
        self.lock().read_time += latency;
    }

    /// One glyph drawn in `micros` microseconds.
    pub fn record_write(&self, micros: f64) {
        let mut counters = self.lock();
        counters.write_count += 1;
        counters.write_time += micros;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.lock();
        StatsSnapshot {
            read_count: counters.read_count,
            write_count: counters.write_count,
            avg_read: average(counters.read_time, counters.read_count),
            avg_write: average(counters.write_time, counters.write_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_are_zero_before_any_sample() {
        let stats = SharedStats::new(Instant::now());
        stats.fold_read_time(3.0);
        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 0);
        assert_eq!(snap.avg_read, 0.0);
        assert_eq!(snap.avg_write, 0.0);
    }

    #[test]
    fn folded_time_counts_toward_the_next_average() {
        let stats = SharedStats::new(Instant::now());
        stats.fold_read_time(1.0);
        stats.record_read(0.5);
        stats.record_read(1.5);
        stats.record_write(10.0);
        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 2);
        assert_eq!(snap.avg_read, 1.5);
        assert_eq!(snap.avg_write, 10.0);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let stats = SharedStats::new(Instant::now());
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        stats.record_read(1.0);
                        stats.record_write(2.0);
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..200 {
                    let snap = stats.snapshot();
                    if snap.read_count > 0 {
                        assert_eq!(snap.avg_read, 1.0);
                    }
                }
            });
        });
        let snap = stats.snapshot();
        assert_eq!(snap.read_count, 4000);
        assert_eq!(snap.write_count, 4000);
        assert_eq!(snap.avg_write, 2.0);
    }
}
