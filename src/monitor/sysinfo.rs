const MEGABYTE: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SystemSample {
    pub uptime_secs: u64,
    pub total_ram_mb: f64,
    pub free_ram_mb: f64,
    pub processes: u32,
}

pub trait SystemProbe {
    /// Never fails; anything that cannot be read comes back as zero.
    fn sample(&mut self) -> SystemSample;
}

/// Reads `sysinfo(2)`.
pub struct LinuxProbe;

impl SystemProbe for LinuxProbe {
    fn sample(&mut self) -> SystemSample {
        // SAFETY: sysinfo only writes into the struct it is given.
        let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
        if unsafe { libc::sysinfo(&mut info) } != 0 {
            tracing::warn!("sysinfo failed: {}", std::io::Error::last_os_error());
            return SystemSample::default();
        }

        let unit = u64::from(info.mem_unit.max(1));
        SystemSample {
            uptime_secs: info.uptime.max(0) as u64,
            total_ram_mb: (info.totalram as u64 * unit / MEGABYTE) as f64,
            free_ram_mb: (info.freeram as u64 * unit / MEGABYTE) as f64,
            processes: u32::from(info.procs),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Reports the same sample every time.
    pub struct FixedProbe(pub SystemSample);

    impl SystemProbe for FixedProbe {
        fn sample(&mut self) -> SystemSample {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_sample_is_plausible() {
        let sample = LinuxProbe.sample();
        assert!(sample.total_ram_mb >= sample.free_ram_mb);
        assert!(sample.processes > 0);
    }
}
