//! Cursor-driven glyph output into one surface region.

use std::sync::Arc;

use crate::common::{
    compositor::{self, Placement, Source},
    pixel::{Argb, SurfacePixel},
    surface::SurfaceRegion,
};

use super::glyphs::GlyphSheet;

/// The byte that erases the previous character.
pub const ERASE: u8 = 127;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

/// What `put_char` did with its byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharEffect {
    NewLine,
    Erased,
    /// Erase with nothing left to erase.
    Ignored,
    Glyph {
        /// The scrolling region was full and has been cleared first.
        scrolled: bool,
    },
}

/// Hooks around the glyph draw itself, so callers can time just that part.
pub trait GlyphProbe {
    fn before_glyph(&mut self) {}
    fn after_glyph(&mut self) {}
}

impl GlyphProbe for () {}

pub struct Terminal<'s> {
    region: SurfaceRegion<'s>,
    glyphs: Arc<GlyphSheet>,
    cursor: Cursor,
    /// Rows from here down are never written by `put_char`.
    partition: usize,
    padded_lines: usize,
    background: SurfacePixel,
}

impl<'s> Terminal<'s> {
    pub fn new(
        region: SurfaceRegion<'s>,
        glyphs: Arc<GlyphSheet>,
        padded_lines: usize,
        background: SurfacePixel,
    ) -> Self {
        Self {
            partition: region.height(),
            region,
            glyphs,
            cursor: Cursor::default(),
            padded_lines,
            background,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn padded_limit(&self) -> usize {
        (self.glyphs.glyph_height() + 1) * self.padded_lines
    }

    /// The first few lines get an extra pixel so rows of text line up with
    /// the sheet's cell pitch.
    fn next_line(&self, y: usize) -> usize {
        let height = self.glyphs.glyph_height();
        if y >= self.padded_limit() {
            y + height
        } else {
            y + height + 1
        }
    }

    fn previous_line(&self, y: usize) -> usize {
        let height = self.glyphs.glyph_height();
        match y.checked_sub(height) {
            Some(prev) if prev >= self.padded_limit() => prev,
            _ => y.saturating_sub(height + 1),
        }
    }

    pub fn put_char(&mut self, c: u8) -> CharEffect {
        self.put_char_probed(c, &mut ())
    }

    pub fn put_char_probed<P: GlyphProbe>(&mut self, c: u8, probe: &mut P) -> CharEffect {
        let width = self.region.width();
        let glyph_width = self.glyphs.glyph_width();

        if c == b'\n' || self.cursor.x >= width {
            self.cursor.y = self.next_line(self.cursor.y);
            self.cursor.x = 0;
            return CharEffect::NewLine;
        }

        if c == ERASE {
            if self.cursor == Cursor::default() {
                return CharEffect::Ignored;
            }
            self.erase();
            return CharEffect::Erased;
        }

        let scrolled = self.cursor.y >= self.partition;
        if scrolled {
            self.clear(self.partition.saturating_sub(1));
            self.cursor.y = 0;
        }

        probe.before_glyph();
        self.draw_glyph(c, self.cursor, true);
        probe.after_glyph();
        self.cursor.x += glyph_width;

        CharEffect::Glyph { scrolled }
    }

    fn erase(&mut self) {
        let glyph_width = self.glyphs.glyph_width();
        if self.cursor.x > 0 {
            self.cursor.x = self.cursor.x.saturating_sub(glyph_width);
        } else {
            self.cursor.y = self.previous_line(self.cursor.y);
            self.cursor.x = self.region.width().saturating_sub(glyph_width);
        }
        let cell = Placement::whole(
            self.cursor.x as i32,
            self.cursor.y as i32,
            glyph_width as i32,
            self.glyphs.glyph_height() as i32 + 1,
        );
        compositor::draw(
            &self.region,
            &cell,
            &Source::Solid(Argb::OPAQUE_BLACK),
            true,
            self.background,
        );
    }

    /// Zeroes rows `0..=to_line` of this terminal's region.
    pub fn clear(&self, to_line: usize) {
        self.region.clear(to_line);
    }

    fn draw_glyph(&self, c: u8, at: Cursor, blend: bool) {
        let placement = self.glyphs.placement(c, at.x, at.y);
        compositor::draw(
            &self.region,
            &placement,
            &Source::Image(self.glyphs.image()),
            blend,
            self.background,
        );
    }

    /// Writes `text` opaquely from the region's top-left corner, wrapping at
    /// the right edge and on `\n`. Stops once a line would no longer fit.
    pub fn print_line(&mut self, text: &str) {
        let width = self.region.width();
        let (glyph_width, glyph_height) = (self.glyphs.glyph_width(), self.glyphs.glyph_height());
        self.cursor = Cursor::default();

        for c in text.bytes() {
            if self.cursor.y + glyph_height > self.region.height() {
                break;
            }
            if c != b'\n' {
                self.draw_glyph(c, self.cursor, false);
                self.cursor.x += glyph_width;
            }
            if c == b'\n' || self.cursor.x >= width {
                self.cursor.x = 0;
                self.cursor.y += glyph_height;
            }
        }
    }
}
