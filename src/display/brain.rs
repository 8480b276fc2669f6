use std::convert::Infallible;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};
use vexide::display::{Display, Rect, Rgb};

/// An `embedded-graphics` draw target over the brain's display.
pub struct BrainCanvas {
    display: Display,
}

impl BrainCanvas {
    pub fn new(display: Display) -> Self { BrainCanvas { display } }

    fn fill_rect(&mut self, top_left: Point, bottom_right: Point, color: Rgb888) {
        self.display.fill(
            &Rect::new(
                [top_left.x as i16, top_left.y as i16],
                [bottom_right.x as i16, bottom_right.y as i16],
            ),
            Rgb::new(color.r(), color.g(), color.b()),
        );
    }
}

impl OriginDimensions for BrainCanvas {
    fn size(&self) -> Size {
        Size::new(Display::HORIZONTAL_RESOLUTION as u32, Display::VERTICAL_RESOLUTION as u32)
    }
}

impl DrawTarget for BrainCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.fill_rect(point, point, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = area.bottom_right() {
            self.fill_rect(area.top_left, bottom_right, color);
        }
        Ok(())
    }
}
