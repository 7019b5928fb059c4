/// A colour constant written as `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argb(pub u32);

impl Argb {
    pub const OPAQUE_BLACK: Argb = Argb(0xFF00_0000);

    pub fn channels(self) -> Channels {
        let [a, r, g, b] = self.0.to_be_bytes();
        Channels { a, r, g, b }
    }
}

/// One source pixel, unpacked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channels {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Channels {
    pub fn new_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 0xFF, r, g, b }
    }

    pub fn new_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { a, r, g, b }
    }
}

/// A pixel in the surface's native layout: alpha, blue, green, red from the
/// most significant byte down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePixel(pub u32);

impl SurfacePixel {
    pub const ZERO: SurfacePixel = SurfacePixel(0);

    /// Packs with full opacity.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(u32::from_be_bytes([0xFF, b, g, r]))
    }

    pub fn red(self) -> u8 {
        self.0 as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// `0x00RRGGBB`, the layout desktop windows expect.
    pub fn into_xrgb(self) -> u32 {
        u32::from_be_bytes([0, self.red(), self.green(), self.blue()])
    }
}

fn mix(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
}

/// Linear interpolation of every channel by the source alpha; the result is
/// always fully opaque.
pub fn blend_pixels(src: Channels, dst: SurfacePixel) -> SurfacePixel {
    SurfacePixel::from_rgb(
        mix(src.r, dst.red(), src.a),
        mix(src.g, dst.green(), src.a),
        mix(src.b, dst.blue(), src.a),
    )
}
