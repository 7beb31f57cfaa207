//! Mask cleanup and closed-region extraction

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::point::Point;

/// Axis-aligned bounding box, inclusive of its border pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box holding every point; `None` for an empty contour
    pub fn enclosing(points: &[Point<i32>]) -> Option<BoundingBox> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// `log2(width / height)`, so doubling the ratio adds a constant
    pub fn log_aspect_ratio(&self) -> f64 {
        (self.width as f64 / self.height as f64).log2()
    }
}

/// A closed region found in one thresholded frame, scored during a single pass
#[derive(Debug, Clone)]
pub struct CandidateRegion {
    pub contour: Vec<Point<i32>>,
    pub bounding_box: BoundingBox,
    pub area: f64,
    pub score: f64,
}

impl CandidateRegion {
    pub fn new(contour: Vec<Point<i32>>) -> Option<CandidateRegion> {
        let bounding_box = BoundingBox::enclosing(&contour)?;
        let area = contour_area(&contour);
        Some(CandidateRegion {
            contour,
            bounding_box,
            area,
            score: 0.0,
        })
    }

    /// Fraction of the bounding box covered by the region
    pub fn area_fraction(&self) -> f64 {
        self.area / self.bounding_box.area()
    }
}

/// Opening with a 3x3 square element, removing speckle noise
pub fn open(mask: &GrayImage) -> GrayImage {
    morphology::open(mask, Norm::LInf, 1)
}

/// Outer borders of every connected foreground region of `mask`
pub fn find_regions(mask: &GrayImage) -> Vec<CandidateRegion> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer)
        .filter_map(|contour| CandidateRegion::new(contour.points))
        .collect()
}

/// Polygon area of a closed contour (shoelace formula, always non-negative)
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    let mut prev = points[points.len() - 1];
    for p in points {
        twice_area += prev.x as i64 * p.y as i64 - p.x as i64 * prev.y as i64;
        prev = *p;
    }
    (twice_area as f64 / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(x0: i32, y0: i32, side: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ]
    }

    #[test]
    fn test_contour_area_square() {
        assert_eq!(contour_area(&square(2, 3, 10)), 100.0);
        let mut reversed = square(2, 3, 10);
        reversed.reverse();
        assert_eq!(contour_area(&reversed), 100.0);
    }

    #[test]
    fn test_degenerate_area() {
        assert_eq!(contour_area(&[]), 0.0);
        assert_eq!(contour_area(&[Point::new(1, 1), Point::new(5, 5)]), 0.0);
    }

    #[test]
    fn test_bounding_box_inclusive() {
        let bbox = BoundingBox::enclosing(&square(2, 3, 10)).unwrap();
        assert_eq!(bbox, BoundingBox { x: 2, y: 3, width: 11, height: 11 });
        assert_eq!(bbox.center(), (7.5, 8.5));
        assert_eq!(bbox.log_aspect_ratio(), 0.0);
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_find_regions_counts_blobs() {
        let mut mask = GrayImage::new(40, 20);
        for y in 2..10 {
            for x in 2..10 {
                mask.put_pixel(x, y, Luma([255]));
                mask.put_pixel(x + 20, y + 5, Luma([255]));
            }
        }
        let regions = find_regions(&mask);
        assert_eq!(regions.len(), 2);
        for region in &regions {
            assert_eq!(region.bounding_box.width, 8);
            assert_eq!(region.bounding_box.height, 8);
            assert!(region.area > 0.0);
        }
    }

    #[test]
    fn test_holes_are_not_regions() {
        let mut mask = GrayImage::new(20, 20);
        for y in 2..18 {
            for x in 2..18 {
                let border = x < 5 || x >= 15 || y < 5 || y >= 15;
                if border {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        assert_eq!(find_regions(&mask).len(), 1);
    }

    #[test]
    fn test_open_removes_speckle() {
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(3, 3, Luma([255]));
        for y in 8..16 {
            for x in 8..16 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let opened = open(&mask);
        assert_eq!(opened.get_pixel(3, 3)[0], 0);
        assert_eq!(opened.get_pixel(12, 12)[0], 255);
        assert_eq!(find_regions(&opened).len(), 1);
    }
}
