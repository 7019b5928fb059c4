use std::{
    fs::{File, OpenOptions},
    io::{self, Read},
    os::unix::fs::OpenOptionsExt,
    time::Duration,
};

use nix::sys::termios::{self, SetArg, Termios};
use serialport::SerialPort;

use super::DeviceError;

/// Result of one non-blocking poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    Byte(u8),
    /// No byte was waiting, or the read failed; both mean "nothing to do".
    Empty,
}

pub trait ByteSource {
    fn poll_byte(&mut self) -> Poll;
}

impl<B: ByteSource + ?Sized> ByteSource for Box<B> {
    fn poll_byte(&mut self) -> Poll {
        (**self).poll_byte()
    }
}

/// Line settings as they were before the port was put in raw mode; written
/// back on drop so the shell gets a canonical line again.
struct SavedLine {
    file: File,
    termios: Termios,
}

impl SavedLine {
    fn save(file: File) -> nix::Result<Self> {
        let termios = termios::tcgetattr(&file)?;
        Ok(Self { file, termios })
    }
}

impl Drop for SavedLine {
    fn drop(&mut self) {
        match termios::tcsetattr(&self.file, SetArg::TCSANOW, &self.termios) {
            Ok(()) => tracing::debug!("serial line settings restored"),
            Err(e) => tracing::warn!("failed to restore serial line settings: {e}"),
        }
    }
}

/// Raw-mode serial line read without blocking.
pub struct SerialByteSource {
    port: Box<dyn SerialPort>,
    _saved: Option<SavedLine>,
}

impl SerialByteSource {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, DeviceError> {
        let saved = match OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(path)
        {
            Ok(file) => SavedLine::save(file)
                .inspect_err(|e| tracing::debug!(path, "line settings not saved: {e}"))
                .ok(),
            Err(_) => None,
        };

        let port = serialport::new(path, baud_rate)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|source| DeviceError::Serial {
                path: path.to_owned(),
                source,
            })?;
        tracing::info!(path, baud_rate, "serial console opened");
        Ok(Self {
            port,
            _saved: saved,
        })
    }
}

impl ByteSource for SerialByteSource {
    fn poll_byte(&mut self) -> Poll {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Poll::Byte(byte[0]),
            Ok(_) => Poll::Empty,
            Err(ref e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Poll::Empty
            }
            Err(e) => {
                tracing::trace!("serial read failed: {e}");
                Poll::Empty
            }
        }
    }
}

/// Stand-in when the serial line could not be opened.
pub struct Disconnected;

impl ByteSource for Disconnected {
    fn poll_byte(&mut self) -> Poll {
        Poll::Empty
    }
}
