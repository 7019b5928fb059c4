//! The operator prompt: clear the screen, start the console, or draw an
//! image or rectangle at a typed-in position.

use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::Context;

use crate::{
    common::{
        compositor::{self, ClipOutcome, Coord, Placement, SourceRect, Source},
        config::Config,
        image::{PixelLayout, RawImage},
        pixel::{Argb, SurfacePixel},
        state::SharedStats,
        surface::Surface,
    },
    console::session,
};

/// Whitespace separated words, read a line at a time like `scanf`.
struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn next(&mut self) -> io::Result<String> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

enum Shape {
    Image,
    Rectangle,
}

pub struct Menu<'c, R, W> {
    config: &'c Config,
    input: Tokens<R>,
    out: W,
}

fn parse_colour(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).ok()
}

impl<'c, R: BufRead, W: Write> Menu<'c, R, W> {
    pub fn new(config: &'c Config, input: R, out: W) -> Self {
        Self {
            config,
            input: Tokens {
                reader: input,
                pending: VecDeque::new(),
            },
            out,
        }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    fn ask_yes(&mut self, prompt: &str) -> io::Result<bool> {
        self.say(prompt)?;
        Ok(self.input.next()?.starts_with('y'))
    }

    fn ask_int(&mut self, prompt: &str) -> io::Result<Coord> {
        self.say(prompt)?;
        loop {
            match self.input.next()?.parse() {
                Ok(value) => return Ok(value),
                Err(_) => self.say("\nPlease enter a whole number: ")?,
            }
        }
    }

    fn ask_colour(&mut self) -> io::Result<Argb> {
        loop {
            self.say("\nEnter the rectangle colour in hex format (0xaaRRGGBB):")?;
            match parse_colour(&self.input.next()?) {
                Some(colour) if colour != 0 => return Ok(Argb(colour)),
                _ => self.say("\nColour must be a non zero number!")?,
            }
        }
    }

    /// Runs until the operator's input ends or `quit` is raised.
    pub fn run(
        &mut self,
        surface: &Surface,
        stats: &SharedStats,
        quit: &AtomicBool,
    ) -> anyhow::Result<()> {
        match self.run_prompts(surface, stats, quit) {
            Err(err)
                if err
                    .downcast_ref::<io::Error>()
                    .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof) =>
            {
                tracing::info!("operator input closed");
                Ok(())
            }
            other => other,
        }
    }

    fn run_prompts(
        &mut self,
        surface: &Surface,
        stats: &SharedStats,
        quit: &AtomicBool,
    ) -> anyhow::Result<()> {
        while !quit.load(Ordering::Relaxed) {
            if self.ask_yes("\nClear the screen? (y/n) ")? {
                surface.full().clear(surface.height().saturating_sub(1));
            }
            if self.ask_yes("\nPrint a string? (y/n) ")? {
                session::run_console(self.config, surface, stats, quit)?;
                continue;
            }
            let shape = if self.ask_yes("\nPrint an image? (y/n) ")? {
                Shape::Image
            } else if self.ask_yes("\nPrint a rectangle? (y/n) ")? {
                Shape::Rectangle
            } else {
                continue;
            };

            let width = self.ask_int("\nEnter the width:")?;
            let height = self.ask_int("\nEnter the height:")?;
            self.say("\nEnter the x,y location:")?;
            let x = self.ask_int("")?;
            let y = self.ask_int("")?;
            let placement = Placement::whole(x, y, width, height);

            let outcome = match shape {
                Shape::Image => self.draw_image(surface, placement)?,
                Shape::Rectangle => {
                    let colour = self.ask_colour()?;
                    Some(draw_on(surface, &placement, &Source::Solid(colour)))
                }
            };
            if let Some(advisory) = outcome.as_ref().and_then(ClipOutcome::advisory) {
                tracing::warn!(?placement, "{advisory}");
                self.say(advisory)?;
            }
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        surface: &Surface,
        mut placement: Placement,
    ) -> anyhow::Result<Option<ClipOutcome>> {
        self.say("\nEnter the name of the file: ")?;
        let file = self.input.next()?;
        if self.ask_yes("\nDo you want to print a sub image (y/n)? ")? {
            self.say("\nEnter the x and y start and end points (xStart xEnd yStart yEnd). ")?;
            placement.src = SourceRect {
                x_start: self.ask_int("")?,
                x_end: self.ask_int("")?,
                y_start: self.ask_int("")?,
                y_end: self.ask_int("")?,
            };
        }
        let layout = if self.ask_yes("\nDoes the image have an alpha layer? (y/n)? ")? {
            PixelLayout::Rgba
        } else {
            PixelLayout::Rgb
        };

        let (width, height) = (placement.width.max(0), placement.height.max(0));
        let image = match RawImage::load(Path::new(&file), width as usize, height as usize, layout)
        {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!("{err}");
                self.say(&format!("\n{err}"))
                    .context("failed to report image error")?;
                return Ok(None);
            }
        };
        Ok(Some(draw_on(surface, &placement, &Source::Image(&image))))
    }
}

fn draw_on(surface: &Surface, placement: &Placement, source: &Source<'_>) -> ClipOutcome {
    compositor::draw(&surface.full(), placement, source, true, SurfacePixel::ZERO)
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, time::Instant};

    use super::*;

    fn run(surface: &Surface, script: &str) -> String {
        let config = Config::default();
        let stats = SharedStats::new(Instant::now());
        let mut out = Vec::new();
        Menu::new(&config, Cursor::new(script.to_owned()), &mut out)
            .run(surface, &stats, &AtomicBool::new(false))
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn rectangle_is_drawn_where_asked() {
        let surface = Surface::in_memory(64, 48);
        let out = run(&surface, "n n n y\n4\n4\n2 3\n0xFFFF0000\n");

        assert!(out.contains("Enter the rectangle colour"));
        let red = SurfacePixel::from_rgb(0xFF, 0, 0);
        assert_eq!(surface.get_pixel(2, 3), red);
        assert_eq!(surface.get_pixel(5, 6), red);
        assert_eq!(surface.get_pixel(6, 6), SurfacePixel::ZERO);
        assert!(!out.contains("on screen"));
    }

    #[test]
    fn zero_colour_is_asked_again() {
        let surface = Surface::in_memory(8, 8);
        let out = run(&surface, "n n n y 1 1 0 0 0x0 zz 0xFF00FF00");
        assert_eq!(out.matches("Colour must be a non zero number!").count(), 2);
        assert_eq!(surface.get_pixel(0, 0), SurfacePixel::from_rgb(0, 0xFF, 0));
    }

    #[test]
    fn clipping_is_reported_to_the_operator() {
        let surface = Surface::in_memory(16, 16);
        let out = run(&surface, "n n n y 4 4 14 0 0xFF0000FF n n n y 4 4 99 99 0xFF0000FF");
        assert!(out.contains("Image partially on screen."));
        assert!(out.contains("Image not on screen."));
        assert_eq!(surface.get_pixel(15, 0), SurfacePixel::from_rgb(0, 0, 0xFF));
    }

    #[test]
    fn clear_wipes_the_whole_screen() {
        let surface = Surface::in_memory(4, 4);
        surface.full().set_pixel(3, 3, SurfacePixel(7));
        run(&surface, "y n n n");
        assert_eq!(surface.get_pixel(3, 3), SurfacePixel::ZERO);
    }

    #[test]
    fn bad_numbers_are_asked_again() {
        let surface = Surface::in_memory(8, 8);
        let out = run(&surface, "n n n y two 1 1 0 0 0xFFFFFFFF");
        assert!(out.contains("Please enter a whole number"));
        assert_eq!(surface.get_pixel(0, 0), SurfacePixel::from_rgb(0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn sub_image_of_an_opaque_file() {
        let path = std::env::temp_dir().join(format!("fbconsole-menu-{}.raw", std::process::id()));
        // 3x2 RGB, pixel (x, y) = (x, y, 9)
        let data: Vec<u8> = (0..2u8)
            .flat_map(|y| (0..3u8).flat_map(move |x| [x, y, 9]))
            .collect();
        std::fs::write(&path, data).unwrap();

        let surface = Surface::in_memory(8, 8);
        let script = format!("n n y 3 2 5 5 {} y 1 3 1 2 n", path.display());
        run(&surface, &script);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(surface.get_pixel(5, 5), SurfacePixel::from_rgb(1, 1, 9));
        assert_eq!(surface.get_pixel(6, 5), SurfacePixel::from_rgb(2, 1, 9));
        assert_eq!(surface.get_pixel(7, 5), SurfacePixel::ZERO);
        assert_eq!(surface.get_pixel(5, 6), SurfacePixel::ZERO);
    }

    #[test]
    fn absurd_image_size_is_reported_not_fatal() {
        let path = std::env::temp_dir().join(format!("fbconsole-menu-big-{}.raw", std::process::id()));
        std::fs::write(&path, [0u8; 16]).unwrap();

        let surface = Surface::in_memory(8, 8);
        let script = format!("n n y 2147483647 2147483647 0 0 {} n y", path.display());
        let out = run(&surface, &script);
        std::fs::remove_file(&path).unwrap();

        assert!(out.contains("holds 16 bytes"), "{out}");
        assert!(out.matches("Clear the screen?").count() >= 2);
    }

    #[test]
    fn missing_image_goes_back_to_the_menu() {
        let surface = Surface::in_memory(8, 8);
        let out = run(&surface, "n n y 2 2 0 0 /nonexistent/pic.raw n n");
        assert!(out.contains("failed to read image /nonexistent/pic.raw"));
        assert!(out.matches("Clear the screen?").count() >= 2);
    }
}
