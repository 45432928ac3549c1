//! Frame decorations drawn around the skeleton: background fill, knee-bend
//! badge and detected court lines

use serde::{Deserialize, Serialize};

use super::shapes::{create_dashed_line_vertices, Color};
use super::surface::Surface;
use crate::physics::KneeStatus;

/// Background of the skeleton-only surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkeletonBackground {
    #[default]
    Transparent,
    Black,
    Blue,
}

impl SkeletonBackground {
    /// Fill color, `None` for transparent
    pub fn color(&self) -> Option<Color> {
        match self {
            SkeletonBackground::Transparent => None,
            SkeletonBackground::Black => Some([0.0, 0.0, 0.0, 1.0]),
            // #3B82F6
            SkeletonBackground::Blue => Some([0.231, 0.510, 0.965, 1.0]),
        }
    }

    /// Clear the surface and lay down the background
    pub fn paint(&self, surface: &mut Surface) {
        match self.color() {
            Some(color) => surface.fill(color),
            None => surface.clear(),
        }
    }
}

// ============================================================================
// KNEE BADGE
// ============================================================================

pub const BADGE_WIDTH: f32 = 180.0;
pub const BADGE_HEIGHT: f32 = 30.0;
/// Gap to the top and right edges
pub const BADGE_MARGIN: f32 = 15.0;

const BADGE_BAD: Color = [0.863, 0.149, 0.149, 0.9];
const BADGE_GOOD: Color = [0.086, 0.639, 0.290, 0.7];
const BADGE_BORDER: Color = [1.0, 1.0, 1.0, 0.8];

/// Badge fill for a knee status
pub fn badge_color(status: KneeStatus) -> Color {
    match status {
        KneeStatus::GrannysLegs => BADGE_BAD,
        KneeStatus::Good => BADGE_GOOD,
    }
}

/// Top-left corner of the badge on a surface of the given width
pub fn badge_origin(surface_width: u32) -> (f32, f32) {
    (surface_width as f32 - BADGE_WIDTH - BADGE_MARGIN, BADGE_MARGIN)
}

/// Colored status badge in the top-right corner with a 1px light border
pub fn draw_knee_badge(surface: &mut Surface, status: KneeStatus) {
    let (x, y) = badge_origin(surface.width());
    let (w, h) = (BADGE_WIDTH, BADGE_HEIGHT);

    surface.fill_rect(x, y, w, h, badge_color(status));

    surface.fill_rect(x, y, w, 1.0, BADGE_BORDER);
    surface.fill_rect(x, y + h - 1.0, w, 1.0, BADGE_BORDER);
    surface.fill_rect(x, y + 1.0, 1.0, h - 2.0, BADGE_BORDER);
    surface.fill_rect(x + w - 1.0, y + 1.0, 1.0, h - 2.0, BADGE_BORDER);
}

// ============================================================================
// COURT LINES
// ============================================================================

/// A detected line segment in normalized frame coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CourtLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

const COURT_LINE_COLOR: Color = [1.0, 1.0, 1.0, 0.2];
const COURT_LINE_WIDTH: f32 = 2.0;
const COURT_DASH: f32 = 10.0;

/// Faint dashed court lines
pub fn draw_court_lines(surface: &mut Surface, lines: &[CourtLine]) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    let mut vertices = Vec::new();
    for line in lines {
        vertices.extend(create_dashed_line_vertices(
            line.x1 * w,
            line.y1 * h,
            line.x2 * w,
            line.y2 * h,
            COURT_LINE_WIDTH,
            COURT_LINE_COLOR,
            COURT_DASH,
            COURT_DASH,
        ));
    }
    surface.draw_vertices(&vertices);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_fill() {
        let mut surface = Surface::new(4, 4);
        SkeletonBackground::Blue.paint(&mut surface);
        assert_eq!(surface.pixel(2, 2), Some([59, 130, 246, 255]));
        SkeletonBackground::Transparent.paint(&mut surface);
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_badge_in_top_right() {
        let mut surface = Surface::new(640, 360);
        draw_knee_badge(&mut surface, KneeStatus::GrannysLegs);
        assert_eq!(badge_origin(640), (445.0, 15.0));
        // Inside: red
        let inside = surface.pixel(500, 30).unwrap();
        assert!(inside[0] > 200 && inside[1] < 60);
        // Border row is white
        let border = surface.pixel(500, 15).unwrap();
        assert!(border[0] > 200 && border[1] > 200);
        // Left of the badge untouched
        assert_eq!(surface.pixel(400, 30), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_good_badge_is_green() {
        let mut surface = Surface::new(640, 360);
        draw_knee_badge(&mut surface, KneeStatus::Good);
        let inside = surface.pixel(500, 30).unwrap();
        assert!(inside[1] > inside[0]);
    }

    #[test]
    fn test_court_lines_are_dashed() {
        let mut surface = Surface::new(100, 10);
        draw_court_lines(&mut surface, &[CourtLine { x1: 0.0, y1: 0.5, x2: 1.0, y2: 0.5 }]);
        // First dash covers 0..10, gap 10..20
        assert!(surface.pixel(5, 4).unwrap()[3] > 0);
        assert_eq!(surface.pixel(15, 4).unwrap()[3], 0);
        assert!(surface.pixel(25, 4).unwrap()[3] > 0);
    }
}
