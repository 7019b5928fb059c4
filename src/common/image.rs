use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use thiserror::Error;

use super::pixel::Channels;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read image {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image {path} holds {actual} bytes, {expected} needed for its dimensions")]
    Truncated {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("image {path} is too large: {width}x{height}")]
    TooLarge {
        path: PathBuf,
        width: usize,
        height: usize,
    },
}

/// Bytes per source pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// red, green, blue; implicitly opaque
    Rgb,
    /// red, green, blue, alpha
    Rgba,
}

impl PixelLayout {
    pub fn stride(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// A headerless, row-major decoded image.
#[derive(Debug)]
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    layout: PixelLayout,
    data: Box<[u8]>,
}

/// Bytes needed for `width x height` pixels, `None` on overflow.
fn byte_len(width: usize, height: usize, layout: PixelLayout) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(layout.stride())
}

impl RawImage {
    pub fn from_bytes(
        width: usize,
        height: usize,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, AssetError> {
        let expected = byte_len(width, height, layout).ok_or(AssetError::TooLarge {
            path: PathBuf::new(),
            width,
            height,
        })?;
        if data.len() < expected {
            return Err(AssetError::Truncated {
                path: PathBuf::new(),
                expected,
                actual: data.len(),
            });
        }
        let mut data = data;
        data.truncate(expected);
        Ok(Self {
            width,
            height,
            layout,
            data: data.into_boxed_slice(),
        })
    }

    /// Reads exactly `width * height * stride` bytes from `path`.
    pub fn load(
        path: &Path,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> Result<Self, AssetError> {
        let io_err = |source: std::io::Error| AssetError::Io {
            path: path.to_owned(),
            source,
        };
        let expected = byte_len(width, height, layout).ok_or_else(|| AssetError::TooLarge {
            path: path.to_owned(),
            width,
            height,
        })?;
        // grows with what the file actually holds, not with what was asked for
        let mut data = Vec::new();
        File::open(path)
            .map_err(io_err)?
            .take(expected as u64)
            .read_to_end(&mut data)
            .map_err(io_err)?;

        Self::from_bytes(width, height, layout, data).map_err(|err| match err {
            AssetError::Truncated {
                expected, actual, ..
            } => AssetError::Truncated {
                path: path.to_owned(),
                expected,
                actual,
            },
            other => other,
        })
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn bounds_check(&self, px: usize, py: usize) -> bool {
        px < self.width && py < self.height
    }

    pub fn get_pixel(&self, px: usize, py: usize) -> Channels {
        assert!(self.bounds_check(px, py));
        let stride = self.layout.stride();
        let i = (py * self.width + px) * stride;
        let p = &self.data[i..i + stride];
        match self.layout {
            PixelLayout::Rgb => Channels::new_rgb(p[0], p[1], p[2]),
            PixelLayout::Rgba => Channels::new_rgba(p[0], p[1], p[2], p[3]),
        }
    }
}
