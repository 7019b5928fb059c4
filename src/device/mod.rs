use std::path::PathBuf;

use thiserror::Error;

pub mod serial;
pub mod timer;
pub mod video;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to map {path}")]
    Map {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
    #[error("failed to open serial port {path}")]
    Serial {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("ioctl failed - failed to {what}")]
    Ioctl {
        what: &'static str,
        #[source]
        source: nix::Error,
    },
}
