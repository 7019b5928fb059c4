use crate::common::{
    compositor::{Coord, Placement, SourceRect},
    config::GlyphConfig,
    image::{AssetError, PixelLayout, RawImage},
};

const GRID: usize = 16;
/// Each sheet cell has a one pixel border before the glyph proper.
const BORDER: usize = 1;

/// A 16x16 grid of glyph cells cut from one RGBA bitmap. Immutable once
/// loaded.
pub struct GlyphSheet {
    image: RawImage,
    cell_width: usize,
    cell_height: usize,
    glyph_width: usize,
    glyph_height: usize,
}

impl GlyphSheet {
    pub fn load(config: &GlyphConfig) -> Result<Self, AssetError> {
        let image = RawImage::load(
            &config.sheet,
            config.sheet_width,
            config.sheet_height,
            PixelLayout::Rgba,
        )?;
        tracing::debug!(sheet = %config.sheet.display(), "glyph sheet loaded");
        Ok(Self::from_image(image, config))
    }

    pub fn from_image(image: RawImage, config: &GlyphConfig) -> Self {
        Self {
            image,
            cell_width: config.cell_width,
            cell_height: config.cell_height,
            glyph_width: config.glyph_width,
            glyph_height: config.glyph_height,
        }
    }

    pub fn image(&self) -> &RawImage {
        &self.image
    }

    pub fn glyph_width(&self) -> usize {
        self.glyph_width
    }

    pub fn glyph_height(&self) -> usize {
        self.glyph_height
    }

    /// Where glyph `code` sits on the sheet.
    pub fn cell(&self, code: u8) -> SourceRect {
        let (row, col) = (code as usize / GRID, code as usize % GRID);
        let x_start = (col * self.cell_width + BORDER) as Coord;
        let y_start = (row * self.cell_height + BORDER) as Coord;
        SourceRect {
            x_start,
            y_start,
            x_end: x_start + self.glyph_width as Coord,
            y_end: y_start + self.glyph_height as Coord,
        }
    }

    /// Glyph `code` with its top-left at `(x, y)`.
    pub fn placement(&self, code: u8, x: usize, y: usize) -> Placement {
        Placement {
            x: x as Coord,
            y: y as Coord,
            src: self.cell(code),
            width: self.image.width as Coord,
            height: self.image.height as Coord,
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A sheet whose every glyph pixel is opaque `(code, row, col)`, with
    /// transparent borders.
    pub fn sheet(config: &GlyphConfig) -> GlyphSheet {
        let (w, h) = (config.sheet_width, config.sheet_height);
        let mut data = vec![0u8; w * h * 4];
        for y in 0..h {
            for x in 0..w {
                let (col, cx) = (x / config.cell_width, x % config.cell_width);
                let (row, cy) = (y / config.cell_height, y % config.cell_height);
                let inside = (1..=config.glyph_width).contains(&cx)
                    && (1..=config.glyph_height).contains(&cy);
                if inside {
                    let code = (row * GRID + col) as u8;
                    let i = (y * w + x) * 4;
                    data[i..i + 4].copy_from_slice(&[code, row as u8, col as u8, 0xFF]);
                }
            }
        }
        let image = RawImage::from_bytes(w, h, PixelLayout::Rgba, data).unwrap();
        GlyphSheet::from_image(image, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> GlyphSheet {
        testing::sheet(&GlyphConfig::default())
    }

    #[test]
    fn code_selects_row_and_column() {
        let sheet = sheet();
        let a = sheet.cell(b'A'); // 65 = row 4, col 1
        assert_eq!((a.x_start, a.y_start), (13, 93));
        assert_eq!((a.x_end - a.x_start, a.y_end - a.y_start), (10, 21));
    }

    #[test]
    fn every_cell_fits_the_sheet() {
        let sheet = sheet();
        for code in 0..=255u8 {
            let cell = sheet.cell(code);
            assert!(cell.x_end as usize <= sheet.image().width);
            assert!(cell.y_end as usize <= sheet.image().height);
        }
    }

    #[test]
    fn different_codes_never_overlap() {
        let sheet = sheet();
        let cells: Vec<_> = (0..=255u8).map(|c| sheet.cell(c)).collect();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                let disjoint = a.x_end <= b.x_start
                    || b.x_end <= a.x_start
                    || a.y_end <= b.y_start
                    || b.y_end <= a.y_start;
                assert!(disjoint, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn glyph_pixels_carry_their_code() {
        let sheet = sheet();
        let cell = sheet.cell(0xA7);
        let px = sheet
            .image()
            .get_pixel(cell.x_start as usize, cell.y_start as usize);
        assert_eq!((px.r, px.g, px.b), (0xA7, 0xA, 0x7));
    }
}
