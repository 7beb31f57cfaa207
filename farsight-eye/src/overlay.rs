//! Debug overlay of accepted targets

use crate::contour::CandidateRegion;
use crate::Frame;
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Colour of region outlines; boxes use the profile colour
const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// A frame copy that accepted regions are drawn onto
pub struct Overlay {
    canvas: Frame,
}

impl Overlay {
    pub fn new(canvas: Frame) -> Self {
        Self { canvas }
    }

    /// Outline `region` and draw its bounding box in `box_color`
    pub fn mark(&mut self, region: &CandidateRegion, box_color: [u8; 3]) {
        let (width, height) = self.canvas.dimensions();
        for point in &region.contour {
            if point.x >= 0 && point.y >= 0 && (point.x as u32) < width && (point.y as u32) < height {
                self.canvas.put_pixel(point.x as u32, point.y as u32, CONTOUR_COLOR);
            }
        }

        let bbox = &region.bounding_box;
        let rect = Rect::at(bbox.x, bbox.y).of_size(bbox.width, bbox.height);
        draw_hollow_rect_mut(&mut self.canvas, rect, Rgb(box_color));
    }

    pub fn into_image(self) -> Frame {
        self.canvas
    }
}
