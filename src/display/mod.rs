//! Brain screen status output.
//!
//! The driver loop does not draw anything itself. It hands the latest
//! [`PuncherStatus`] to a [`StatusPanel`], which formats one short line per
//! quantity and forwards the lines that changed to a [`StatusDisplay`]. On the
//! brain that is a [`TextPanel`] drawing with `embedded-graphics`; in tests it
//! is the simulated `RecordingDisplay`.

use std::fmt::{Debug, Write};

use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_10X20},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
};
use heapless::String;
use log::warn;

use crate::puncher::PuncherStatus;

/// `embedded-graphics` target for the V5 brain screen.
#[cfg(target_os = "vexos")]
pub mod brain;

/// Longest status line, in bytes.
pub const LINE_CAPACITY: usize = 32;

/// Pixel height of one text line.
pub const LINE_HEIGHT: u32 = 20;

/// Number of lines the status panel writes.
pub const STATUS_LINES: usize = 5;

/// One formatted status line.
pub type StatusLine = String<LINE_CAPACITY>;

/// Something that can show a line of text.
pub trait StatusDisplay {
    /// Replaces the contents of `line` with `text`.
    fn print_line(&mut self, line: u8, text: &str);
}

/// Formats puncher and lift status and skips lines that did not change.
#[derive(Debug, Default)]
pub struct StatusPanel {
    shown: [Option<StatusLine>; STATUS_LINES],
}

impl StatusPanel {
    pub fn new() -> Self { Self::default() }

    /// The status lines for `status`, with the lift position if it could be read.
    pub fn lines(status: &PuncherStatus, lift: Option<f64>) -> [StatusLine; STATUS_LINES] {
        let mut lines: [StatusLine; STATUS_LINES] = Default::default();
        let preset = status.preset.map_or("--", |preset| preset.label());
        let ready = match (status.ready, status.busy) {
            (_, true) => "busy",
            (true, false) => "yes",
            (false, false) => "no",
        };

        // Lines are short enough that overflow only truncates.
        let _ = match status.angle {
            Some(angle) => write!(lines[0], "Angle  {} {:.1}", preset, angle),
            None => write!(lines[0], "Angle  {} --", preset),
        };
        let _ = write!(lines[1], "Target {:.1}", status.target);
        let _ = write!(lines[2], "Ready  {}", ready);
        let _ = write!(lines[3], "Shots  {}", status.launches);
        let _ = match lift {
            Some(position) => write!(lines[4], "Lift   {:.1}", position),
            None => write!(lines[4], "Lift   --"),
        };
        lines
    }

    /// Prints every line that differs from what is already shown.
    pub fn refresh<D: StatusDisplay + ?Sized>(&mut self, display: &mut D, status: &PuncherStatus, lift: Option<f64>) {
        for (index, line) in Self::lines(status, lift).into_iter().enumerate() {
            if self.shown[index].as_ref() != Some(&line) {
                display.print_line(index as u8, &line);
                self.shown[index] = Some(line);
            }
        }
    }

    /// Forgets what is shown so the next refresh redraws everything.
    pub fn invalidate(&mut self) { self.shown = Default::default(); }
}

/// Renders status lines onto an `embedded-graphics` target.
pub struct TextPanel<T: DrawTarget<Color = Rgb888>> {
    target:     T,
    style:      MonoTextStyle<'static, Rgb888>,
    background: Rgb888,
}

impl<T: DrawTarget<Color = Rgb888>> TextPanel<T> {
    /// White text on black.
    pub fn new(target: T) -> Self {
        TextPanel {
            target,
            style: MonoTextStyle::new(&FONT_10X20, Rgb888::WHITE),
            background: Rgb888::BLACK,
        }
    }

    pub fn with_colors(target: T, text: Rgb888, background: Rgb888) -> Self {
        TextPanel {
            target,
            style: MonoTextStyle::new(&FONT_10X20, text),
            background,
        }
    }

    pub fn target(&self) -> &T { &self.target }

    pub fn into_inner(self) -> T { self.target }
}

impl<T> StatusDisplay for TextPanel<T>
where
    T: DrawTarget<Color = Rgb888>,
    T::Error: Debug,
{
    fn print_line(&mut self, line: u8, text: &str) {
        let top = line as u32 * LINE_HEIGHT;
        let width = self.target.bounding_box().size.width;
        let row = Rectangle::new(Point::new(0, top as i32), Size::new(width, LINE_HEIGHT));

        if let Err(e) = self.target.fill_solid(&row, self.background) {
            warn!("Display Clear Error: {:?}", e);
            return;
        }
        if let Err(e) = Text::with_baseline(text, row.top_left, self.style, Baseline::Top).draw(&mut self.target) {
            warn!("Display Draw Error: {:?}", e);
        }
    }
}
