use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Inclusive pixel extents of one connected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl BoundingBox {
    /// `(y_max - y_min) * (x_max - x_min)`; a single pixel has area 0.
    pub fn area(&self) -> u64 {
        u64::from(self.y_max - self.y_min) * u64::from(self.x_max - self.x_min)
    }
}

/// Boxes around every outermost foreground region of a mask.
///
/// Hole borders, and regions nested inside a hole, are skipped. Boxes come
/// out in raster order of each region's first border pixel. Pixels outside
/// the mask count as background, so regions touching the edge are kept.
pub fn outer_bounding_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<u32>(&pad_with_background(mask))
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| bounding_box(&c.points))
        .map(|b| BoundingBox {
            x_min: b.x_min - 1,
            y_min: b.y_min - 1,
            x_max: b.x_max - 1,
            y_max: b.y_max - 1,
        })
        .collect()
}

/// Copy of `mask` inside a 1 px zero frame; foreground coordinates shift by one.
fn pad_with_background(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width + 2, height + 2, |x, y| {
        if x == 0 || y == 0 || x > width || y > height {
            Luma([0])
        } else {
            *mask.get_pixel(x - 1, y - 1)
        }
    })
}

fn bounding_box(points: &[Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let init = BoundingBox {
        x_min: first.x,
        y_min: first.y,
        x_max: first.x,
        y_max: first.y,
    };
    Some(points.iter().fold(init, |b, p| BoundingBox {
        x_min: b.x_min.min(p.x),
        y_min: b.y_min.min(p.y),
        x_max: b.x_max.max(p.x),
        y_max: b.y_max.max(p.y),
    }))
}
