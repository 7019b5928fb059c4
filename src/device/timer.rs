//! Free-running hardware counter used as a clock-cycle stopwatch.

use std::{
    fs::{File, OpenOptions},
    os::fd::AsRawFd,
    path::Path,
};

use super::DeviceError;

/// A counter that can be zeroed and started, then read back.
pub trait CycleCounter {
    fn restart(&mut self) -> Result<(), DeviceError>;
    fn read(&mut self) -> Result<u32, DeviceError>;
}

/// Register access block understood by the timer driver.
#[repr(C)]
#[derive(Default)]
pub struct TimerRegister {
    pub offset: u32,
    pub data: u32,
}

const TIMER_IOCTL_MAGIC: u8 = b't';

nix::ioctl_write_ptr!(timer_write_reg, TIMER_IOCTL_MAGIC, 1, TimerRegister);
nix::ioctl_readwrite!(timer_read_reg, TIMER_IOCTL_MAGIC, 2, TimerRegister);

// AXI timer 0 register offsets and control bits
const CONTROL_REG: u32 = 0x00;
const LOAD_REG: u32 = 0x04;
const TIMER_REG: u32 = 0x08;
const LOAD0: u32 = 1 << 5;
const ENT0: u32 = 1 << 7;

/// The timer character device.
pub struct TimerDevice {
    file: File,
}

impl TimerDevice {
    pub fn open(path: &Path) -> Result<Self, DeviceError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self { file })
    }

    fn write_reg(&self, offset: u32, data: u32, what: &'static str) -> Result<(), DeviceError> {
        let reg = TimerRegister { offset, data };
        // SAFETY: `reg` is a live repr(C) value for the duration of the call.
        unsafe { timer_write_reg(self.file.as_raw_fd(), &reg) }
            .map(drop)
            .map_err(|source| DeviceError::Ioctl { what, source })
    }
}

impl CycleCounter for TimerDevice {
    fn restart(&mut self) -> Result<(), DeviceError> {
        self.write_reg(LOAD_REG, 0, "reset the counter")?;
        self.write_reg(CONTROL_REG, LOAD0, "load the counter")?;
        self.write_reg(CONTROL_REG, ENT0, "start counting")
    }

    fn read(&mut self) -> Result<u32, DeviceError> {
        let mut reg = TimerRegister {
            offset: TIMER_REG,
            data: 0,
        };
        // SAFETY: as above; the driver fills `reg.data`.
        unsafe { timer_read_reg(self.file.as_raw_fd(), &mut reg) }.map_err(|source| {
            DeviceError::Ioctl {
                what: "read the counter",
                source,
            }
        })?;
        Ok(reg.data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Elapsed {
    Seconds(f64),
    /// The counter rolled over since the last reading; the caller must fold
    /// [`TimerGateway::last_elapsed`] into its total and restart.
    Wrapped,
}

/// `start()`/`read_elapsed()` over a [`CycleCounter`].
///
/// Control failures are logged and otherwise ignored: a failed restart
/// leaves the counter where it was, a failed read repeats the last value.
pub struct TimerGateway<C> {
    counter: C,
    frequency_hz: f64,
    last_raw: u32,
    failures: u64,
}

impl<C: CycleCounter> TimerGateway<C> {
    pub fn new(counter: C, frequency_hz: u32) -> Self {
        Self {
            counter,
            frequency_hz: frequency_hz.max(1) as f64,
            last_raw: 0,
            failures: 0,
        }
    }

    fn report(&mut self, err: DeviceError) {
        self.failures += 1;
        if self.failures == 1 {
            tracing::warn!("timer ioctl failed: {err}");
        } else {
            tracing::debug!(failures = self.failures, "timer ioctl failed: {err}");
        }
    }

    pub fn start(&mut self) {
        if let Err(err) = self.counter.restart() {
            self.report(err);
        }
        self.last_raw = 0;
    }

    pub fn read_elapsed(&mut self) -> Elapsed {
        let raw = match self.counter.read() {
            Ok(raw) => raw,
            Err(err) => {
                self.report(err);
                self.last_raw
            }
        };
        if raw < self.last_raw {
            return Elapsed::Wrapped;
        }
        self.last_raw = raw;
        Elapsed::Seconds(raw as f64 / self.frequency_hz)
    }

    /// Seconds at the most recent non-wrapped reading since `start()`.
    pub fn last_elapsed(&self) -> f64 {
        self.last_raw as f64 / self.frequency_hz
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }
}
