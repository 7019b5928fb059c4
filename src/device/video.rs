use std::{
    ffi::c_void,
    fs::{File, OpenOptions},
    num::NonZeroUsize,
    path::Path,
    ptr::NonNull,
    sync::atomic::AtomicU32,
};

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};

use super::DeviceError;

/// The video device's pixel memory, mapped shared and writable.
pub struct MappedFramebuffer {
    base: NonNull<c_void>,
    len_bytes: usize,
    pixel_count: usize,
    _device: File,
}

// The mapping is plain memory; all access goes through `AtomicU32`.
unsafe impl Send for MappedFramebuffer {}
unsafe impl Sync for MappedFramebuffer {}

impl MappedFramebuffer {
    pub fn open(path: &Path, width: usize, height: usize) -> Result<Self, DeviceError> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_owned(),
                source,
            })?;

        let pixel_count = width * height;
        let len_bytes = pixel_count * std::mem::size_of::<u32>();
        let length = NonZeroUsize::new(len_bytes).ok_or_else(|| DeviceError::Map {
            path: path.to_owned(),
            source: nix::Error::EINVAL,
        })?;

        // SAFETY: a fresh shared mapping of the device; nothing else in this
        // process aliases it.
        let base = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &device,
                0,
            )
        }
        .map_err(|source| DeviceError::Map {
            path: path.to_owned(),
            source,
        })?;

        tracing::info!(path = %path.display(), width, height, "video framebuffer mapped");
        Ok(Self {
            base,
            len_bytes,
            pixel_count,
            _device: device,
        })
    }

    pub fn pixels(&self) -> &[AtomicU32] {
        // SAFETY: the mapping is page aligned, `len_bytes` long and lives
        // until drop; AtomicU32 has the layout of u32.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr().cast::<AtomicU32>(), self.pixel_count) }
    }
}

impl Drop for MappedFramebuffer {
    fn drop(&mut self) {
        // SAFETY: `base`/`len_bytes` came from the successful mmap above.
        if let Err(err) = unsafe { munmap(self.base, self.len_bytes) } {
            tracing::warn!("failed to unmap framebuffer: {err}");
        }
    }
}
