//! Clipped, optionally alpha-blended drawing into a [`SurfaceRegion`].
//!
//! A [`Placement`] names where the source lands and which part of the
//! source to use. Clipping is done independently on each axis: whatever
//! falls outside the region is trimmed off the source sub-rectangle, and a
//! placement that is entirely off-screen draws nothing.

use super::{
    image::RawImage,
    pixel::{blend_pixels, Argb, Channels, SurfacePixel},
    surface::SurfaceRegion,
};

pub type Coord = i32;

/// Half-open sub-rectangle `[x_start, x_end) x [y_start, y_end)` of the
/// source content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRect {
    pub x_start: Coord,
    pub y_start: Coord,
    pub x_end: Coord,
    pub y_end: Coord,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Where `src`'s top-left lands, in region coordinates.
    pub x: Coord,
    pub y: Coord,
    pub src: SourceRect,
    /// Size of the whole source content.
    pub width: Coord,
    pub height: Coord,
}

impl Placement {
    /// The whole `width x height` content at `(x, y)`.
    pub fn whole(x: Coord, y: Coord, width: Coord, height: Coord) -> Self {
        Self {
            x,
            y,
            src: SourceRect {
                x_start: 0,
                y_start: 0,
                x_end: width,
                y_end: height,
            },
            width,
            height,
        }
    }
}

pub enum Source<'i> {
    Solid(Argb),
    Image(&'i RawImage),
}

impl Source<'_> {
    fn channels(&self, sx: usize, sy: usize) -> Channels {
        match self {
            Source::Solid(colour) => colour.channels(),
            Source::Image(image) => image.get_pixel(sx, sy),
        }
    }
}

/// What the visible part of a placement turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub dst_x: usize,
    pub dst_y: usize,
    pub src_x: usize,
    pub src_y: usize,
    pub width: usize,
    pub height: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipOutcome {
    Visible(Span),
    Partial(Span),
    OffScreen,
}

impl ClipOutcome {
    pub fn span(&self) -> Option<Span> {
        match *self {
            ClipOutcome::Visible(span) | ClipOutcome::Partial(span) => Some(span),
            ClipOutcome::OffScreen => None,
        }
    }

    /// Message for the operator, if any clipping happened.
    pub fn advisory(&self) -> Option<&'static str> {
        match self {
            ClipOutcome::Visible(_) => None,
            ClipOutcome::Partial(_) => Some("Image partially on screen."),
            ClipOutcome::OffScreen => Some("Image not on screen."),
        }
    }
}

struct AxisSpan {
    dst: usize,
    src: usize,
    len: usize,
    clipped: bool,
}

fn clip_axis(
    target: Coord,
    src_start: Coord,
    src_end: Coord,
    content: Coord,
    bound: usize,
) -> Option<AxisSpan> {
    let mut dst = target as i64;
    let mut start = src_start as i64;
    let mut end = (src_end as i64).min(content as i64);

    // source pixels that do not exist are skipped, not drawn
    if start < 0 {
        dst -= start;
        start = 0;
    }

    let mut clipped = false;
    if dst < 0 {
        start -= dst;
        dst = 0;
        clipped = true;
    }
    let bound = bound as i64;
    if dst + (end - start) > bound {
        end = start + (bound - dst);
        clipped = true;
    }

    if start >= end || dst >= bound {
        return None;
    }
    Some(AxisSpan {
        dst: dst as usize,
        src: start as usize,
        len: (end - start) as usize,
        clipped,
    })
}

/// Intersects a placement with a `bound_w x bound_h` area.
pub fn clip(placement: &Placement, bound_w: usize, bound_h: usize) -> ClipOutcome {
    let src = placement.src;
    let x = clip_axis(placement.x, src.x_start, src.x_end, placement.width, bound_w);
    let y = clip_axis(placement.y, src.y_start, src.y_end, placement.height, bound_h);
    let (Some(x), Some(y)) = (x, y) else {
        return ClipOutcome::OffScreen;
    };
    let span = Span {
        dst_x: x.dst,
        dst_y: y.dst,
        src_x: x.src,
        src_y: y.src,
        width: x.len,
        height: y.len,
    };
    if x.clipped || y.clipped {
        ClipOutcome::Partial(span)
    } else {
        ClipOutcome::Visible(span)
    }
}

/// Draws `source` through `placement` into `region`.
///
/// With `blend` set every source pixel is mixed over what is already on
/// screen. Without it the destination is assumed to be `background` and is
/// never read, so the result does not depend on earlier draws.
pub fn draw(
    region: &SurfaceRegion<'_>,
    placement: &Placement,
    source: &Source<'_>,
    blend: bool,
    background: SurfacePixel,
) -> ClipOutcome {
    let mut placement = *placement;
    if let Source::Image(image) = source {
        placement.width = placement.width.min(image.width as Coord);
        placement.height = placement.height.min(image.height as Coord);
    }
    let outcome = clip(&placement, region.width(), region.height());
    let Some(span) = outcome.span() else {
        return outcome;
    };

    for row in 0..span.height {
        for col in 0..span.width {
            let (dx, dy) = (span.dst_x + col, span.dst_y + row);
            let channels = source.channels(span.src_x + col, span.src_y + row);
            let dst = if blend {
                region.get_pixel(dx, dy)
            } else {
                background
            };
            region.set_pixel(dx, dy, blend_pixels(channels, dst));
        }
    }
    outcome
}
