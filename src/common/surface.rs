use std::sync::atomic::{AtomicU32, Ordering};

use crate::device::video::MappedFramebuffer;

use super::pixel::SurfacePixel;

enum Storage {
    Heap(Box<[AtomicU32]>),
    Mapped(MappedFramebuffer),
}

/// The fixed-size screen. Pixels are atomics so the two drawing tasks and
/// the preview window can share it without a lock; which rows each task may
/// touch is decided by the [`SurfaceRegion`] it is handed.
pub struct Surface {
    width: usize,
    height: usize,
    storage: Storage,
}

impl Surface {
    pub fn in_memory(width: usize, height: usize) -> Self {
        let total = width * height;
        Self {
            width,
            height,
            storage: Storage::Heap((0..total).map(|_| AtomicU32::new(0)).collect()),
        }
    }

    pub fn mapped(width: usize, height: usize, framebuffer: MappedFramebuffer) -> Self {
        assert!(framebuffer.pixels().len() >= width * height);
        Self {
            width,
            height,
            storage: Storage::Mapped(framebuffer),
        }
    }

    fn pixels(&self) -> &[AtomicU32] {
        match &self.storage {
            Storage::Heap(pixels) => pixels,
            Storage::Mapped(framebuffer) => framebuffer.pixels(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, px: usize, py: usize) -> usize {
        assert!(px < self.width && py < self.height);
        py * self.width + px
    }

    pub fn get_pixel(&self, px: usize, py: usize) -> SurfacePixel {
        SurfacePixel(self.pixels()[self.index(px, py)].load(Ordering::Relaxed))
    }

    /// The whole screen as one region.
    pub fn full(&self) -> SurfaceRegion<'_> {
        SurfaceRegion {
            surface: self,
            top: 0,
            height: self.height,
        }
    }

    /// Splits into the rows above `row` and the rows from `row` down.
    pub fn split_at_row(&self, row: usize) -> (SurfaceRegion<'_>, SurfaceRegion<'_>) {
        let row = row.min(self.height);
        (
            SurfaceRegion {
                surface: self,
                top: 0,
                height: row,
            },
            SurfaceRegion {
                surface: self,
                top: row,
                height: self.height - row,
            },
        )
    }

    /// Copies the screen into a `0x00RRGGBB` buffer of another size,
    /// cropping whatever does not fit.
    pub fn scanout(&self, out: &mut [u32], out_width: usize, out_height: usize) {
        for y in 0..self.height.min(out_height) {
            for x in 0..self.width.min(out_width) {
                out[y * out_width + x] = self.get_pixel(x, y).into_xrgb();
            }
        }
    }
}

/// A horizontal band of the surface addressed in local coordinates:
/// `(0, 0)` is the band's top-left pixel.
pub struct SurfaceRegion<'s> {
    surface: &'s Surface,
    top: usize,
    height: usize,
}

impl<'s> SurfaceRegion<'s> {
    pub fn width(&self) -> usize {
        self.surface.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Screen row of the region's local row 0.
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn bounds_check(&self, px: usize, py: usize) -> bool {
        px < self.width() && py < self.height
    }

    fn cell(&self, px: usize, py: usize) -> &AtomicU32 {
        assert!(self.bounds_check(px, py));
        let i = self.surface.index(px, self.top + py);
        &self.surface.pixels()[i]
    }

    pub fn get_pixel(&self, px: usize, py: usize) -> SurfacePixel {
        SurfacePixel(self.cell(px, py).load(Ordering::Relaxed))
    }

    pub fn set_pixel(&self, px: usize, py: usize, pixel: SurfacePixel) {
        self.cell(px, py).store(pixel.0, Ordering::Relaxed);
    }

    /// Zeroes rows `0..=to_line` across the full width.
    pub fn clear(&self, to_line: usize) {
        if self.height == 0 {
            return;
        }
        let last = to_line.min(self.height - 1);
        for py in 0..=last {
            for px in 0..self.width() {
                self.set_pixel(px, py, SurfacePixel::ZERO);
            }
        }
    }
}
