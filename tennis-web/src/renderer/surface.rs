//! Drawing surface - an RGBA pixel buffer filled through `imageproc`
//!
//! Shapes arrive as triangle lists (see `shapes`). Consecutive triangles of
//! one color are treated as a single path: their coverage is merged first and
//! blended once, so a translucent capsule does not darken where its quad and
//! end caps overlap.

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut, Blend};
use imageproc::point::Point;
use imageproc::rect::Rect;

use super::shapes::{Color, Vertex};
use crate::error::{PipelineError, PipelineResult};

/// A pixel surface (canvas equivalent). Zero-sized surfaces are valid and
/// ignore all drawing.
#[derive(Clone, Debug)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wrap raw RGBA bytes (e.g. `ImageData.data` from a video frame)
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> PipelineResult<Self> {
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or(PipelineError::InvalidDimensions { width, height })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Match new dimensions, discarding contents only when they change
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    /// Reset every pixel to transparent
    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Overwrite every pixel with a color (no blending)
    pub fn fill(&mut self, color: Color) {
        let px = to_rgba8(color);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    /// Blend a rectangle in pixel coordinates
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let px = to_rgba8(color);
        if px[3] == 0 || self.is_empty() {
            return;
        }
        if let Some(rect) = pixel_rect(x, y, width, height) {
            self.with_blend(|canvas| draw_filled_rect_mut(canvas, rect, px));
        }
    }

    /// Fill a triangle list; trailing vertices that do not form a triangle
    /// are ignored
    pub fn draw_vertices(&mut self, vertices: &[Vertex]) {
        if self.is_empty() {
            return;
        }
        let usable = vertices.len() / 3 * 3;
        let mut start = 0;
        while start < usable {
            let color = vertices[start].color;
            let mut end = start + 3;
            while end < usable && vertices[end].color == color {
                end += 3;
            }
            self.fill_run(&vertices[start..end], color);
            start = end;
        }
    }

    /// Draw another image scaled into the rectangle (x, y, width, height),
    /// alpha-compositing over what is already here
    pub fn draw_image(&mut self, src: &RgbaImage, x: i64, y: i64, width: u32, height: u32) {
        if self.is_empty() || src.width() == 0 || src.height() == 0 || width == 0 || height == 0 {
            return;
        }
        if src.dimensions() == (width, height) {
            imageops::overlay(&mut self.image, src, x, y);
        } else {
            let scaled = imageops::resize(src, width, height, FilterType::Triangle);
            imageops::overlay(&mut self.image, &scaled, x, y);
        }
    }

    /// Draw another surface at its own size
    pub fn draw_surface(&mut self, src: &Surface, x: i64, y: i64) {
        self.draw_image(&src.image, x, y, src.width(), src.height());
    }

    /// Pixel value, `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width() && y < self.height() {
            Some(self.image.get_pixel(x, y).0)
        } else {
            None
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Draw onto the pixels with alpha blending
    fn with_blend(&mut self, draw: impl FnOnce(&mut Blend<RgbaImage>)) {
        let mut canvas = Blend(std::mem::take(&mut self.image));
        draw(&mut canvas);
        self.image = canvas.0;
    }

    fn fill_run(&mut self, vertices: &[Vertex], color: Color) {
        let px = to_rgba8(color);
        if px[3] == 0 {
            return;
        }
        let polygons: Vec<Vec<Point<i32>>> = vertices.chunks_exact(3).filter_map(triangle_points).collect();
        if polygons.is_empty() {
            return;
        }

        if px[3] == u8::MAX {
            self.with_blend(|canvas| {
                for poly in &polygons {
                    draw_polygon_mut(canvas, poly, px);
                }
            });
            return;
        }

        // Translucent: cover the run on a layer first so overlaps blend once
        let (w, h) = (self.width() as i32, self.height() as i32);
        let points = polygons.iter().flatten();
        let x0 = points.clone().map(|p| p.x).min().unwrap_or(0).max(0);
        let y0 = points.clone().map(|p| p.y).min().unwrap_or(0).max(0);
        let x1 = points.clone().map(|p| p.x.saturating_add(1)).max().unwrap_or(0).min(w);
        let y1 = points.map(|p| p.y.saturating_add(1)).max().unwrap_or(0).min(h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let mut layer = RgbaImage::new((x1 - x0) as u32, (y1 - y0) as u32);
        for poly in &polygons {
            let shifted: Vec<Point<i32>> = poly
                .iter()
                .map(|p| Point::new(p.x.saturating_sub(x0), p.y.saturating_sub(y0)))
                .collect();
            draw_polygon_mut(&mut layer, &shifted, px);
        }
        imageops::overlay(&mut self.image, &layer, x0 as i64, y0 as i64);
    }
}

/// Integer polygon for one triangle, `None` when it collapses to a point
fn triangle_points(tri: &[Vertex]) -> Option<Vec<Point<i32>>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(3);
    for v in tri {
        let [x, y] = v.position;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let p = Point::new(x.round() as i32, y.round() as i32);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    // draw_polygon_mut wants an open ring
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() > 1).then_some(points)
}

/// Pixel-aligned rectangle, `None` when it covers no pixel
fn pixel_rect(x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
    if ![x, y, width, height].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (left, top) = (x.round(), y.round());
    let (right, bottom) = ((x + width).round(), (y + height).round());
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32))
}

fn to_rgba8(color: Color) -> Rgba<u8> {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([c(color[0]), c(color[1]), c(color[2]), c(color[3])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shapes::{create_circle_vertices, create_rect_vertices};

    const RED: Color = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn test_fill_rect() {
        let mut surface = Surface::new(20, 10);
        surface.fill_rect(2.0, 2.0, 4.0, 4.0, RED);
        assert_eq!(surface.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(10, 3), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(6, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_circle_coverage() {
        let mut surface = Surface::new(40, 40);
        surface.draw_vertices(&create_circle_vertices(20.0, 20.0, 8.0, RED, 24));
        assert_eq!(surface.pixel(20, 20), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(20, 26), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(20, 30), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_translucent_run_blends_once() {
        let mut surface = Surface::new(10, 10);
        surface.fill([1.0, 1.0, 1.0, 1.0]);
        // Two overlapping rects of the same color count as one path
        let mut vertices = create_rect_vertices(0.0, 0.0, 6.0, 6.0, [1.0, 0.0, 0.0, 0.5]);
        vertices.extend(create_rect_vertices(2.0, 2.0, 6.0, 6.0, [1.0, 0.0, 0.0, 0.5]));
        surface.draw_vertices(&vertices);
        let overlap = surface.pixel(3, 3).unwrap();
        assert_eq!(surface.pixel(1, 1), Some(overlap));
        assert_eq!(overlap[0], 255);
        assert!((126..=128).contains(&overlap[1]));
    }

    #[test]
    fn test_degenerate_triangles_skipped() {
        let mut surface = Surface::new(10, 10);
        let point = Vertex { position: [4.2, 4.2], color: RED };
        let far = Vertex { position: [f32::NAN, 1.0], color: RED };
        surface.draw_vertices(&[point, point, point, far, point, point]);
        assert!(surface.as_raw().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_fractional_rect_snaps_to_pixels() {
        let mut surface = Surface::new(10, 10);
        surface.fill_rect(1.4, 1.6, 2.2, 0.3, RED);
        assert!(surface.as_raw().iter().all(|b| *b == 0));
        surface.fill_rect(-3.0, -3.0, 5.0, 5.0, RED);
        assert_eq!(surface.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_image_scaled() {
        let mut src = RgbaImage::new(2, 2);
        for px in src.pixels_mut() {
            *px = Rgba([0, 0, 255, 255]);
        }
        let mut surface = Surface::new(20, 20);
        surface.fill([0.0, 0.0, 0.0, 1.0]);
        surface.draw_image(&src, 10, 0, 10, 10);
        assert_eq!(surface.pixel(15, 5), Some([0, 0, 255, 255]));
        assert_eq!(surface.pixel(5, 5), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(15, 15), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_zero_sized_surface_ignores_drawing() {
        let mut surface = Surface::new(0, 0);
        assert!(surface.is_empty());
        surface.fill_rect(0.0, 0.0, 5.0, 5.0, RED);
        surface.draw_image(&RgbaImage::new(4, 4), 0, 0, 4, 4);
        assert_eq!(surface.pixel(0, 0), None);
    }

    #[test]
    fn test_from_rgba_validates_length() {
        assert!(Surface::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Surface::from_rgba(2, 2, vec![0; 15]),
            Err(PipelineError::InvalidDimensions { width: 2, height: 2 })
        ));
    }
}
