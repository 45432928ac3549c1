//! Skeleton styles - one painter per visual style

use super::shapes::{
    circle_segments, create_capsule_vertices, create_circle_vertices, create_rect_vertices,
    with_opacity, Color, Vertex,
};
use super::skeleton::{bone_side, joint_side, Side, SkeletonGeometry, SkeletonPainter};
use super::surface::Surface;
use crate::bridge::NOSE;

mod colors {
    use super::Color;

    pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
    pub const BLACK: Color = [0.0, 0.0, 0.0, 1.0];
    /// #00FFFF
    pub const NEON_LEFT: Color = [0.0, 1.0, 1.0, 1.0];
    /// #FF00FF
    pub const NEON_RIGHT: Color = [1.0, 0.0, 1.0, 1.0];
    /// #FFFF00
    pub const NEON_CENTER: Color = [1.0, 1.0, 0.0, 1.0];
    pub const MINIMAL: Color = [1.0, 1.0, 1.0, 0.9];
    /// #D4F804
    pub const LIME: Color = [0.831, 0.973, 0.016, 1.0];
    /// #FFC0CB
    pub const PINK: Color = [1.0, 0.753, 0.796, 1.0];
}

fn circle(x: f32, y: f32, radius: f32, color: Color) -> Vec<Vertex> {
    create_circle_vertices(x, y, radius, color, circle_segments(radius))
}

fn bone_pass(geometry: &SkeletonGeometry, width: f32, color_of: impl Fn(usize, usize) -> Color) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for bone in &geometry.bones {
        let (x1, y1) = bone.start;
        let (x2, y2) = bone.end;
        vertices.extend(create_capsule_vertices(x1, y1, x2, y2, width, color_of(bone.from, bone.to)));
    }
    vertices
}

// ============================================================================
// NEON
// ============================================================================

/// Glowing lines, cyan left / magenta right, yellow nose
pub struct NeonPainter;

const NEON_LINE_WIDTH: f32 = 4.0;
const NEON_GLOW_WIDTH: f32 = 14.0;
const NEON_GLOW_ALPHA: f32 = 0.25;
const NEON_JOINT_RADIUS: f32 = 5.0;

fn neon_color(side: Option<Side>) -> Color {
    match side {
        Some(Side::Left) => colors::NEON_LEFT,
        Some(Side::Right) => colors::NEON_RIGHT,
        Some(Side::Center) => colors::NEON_CENTER,
        None => colors::WHITE,
    }
}

impl SkeletonPainter for NeonPainter {
    fn render(&self, surface: &mut Surface, geometry: &SkeletonGeometry, opacity: f32) {
        // Glow halo under every bone
        surface.draw_vertices(&bone_pass(geometry, NEON_GLOW_WIDTH, |a, b| {
            with_opacity(neon_color(bone_side(a, b)), NEON_GLOW_ALPHA * opacity)
        }));
        surface.draw_vertices(&bone_pass(geometry, NEON_LINE_WIDTH, |a, b| {
            with_opacity(neon_color(bone_side(a, b)), opacity)
        }));

        // Joints: colored dot with a 1px white rim
        for joint in &geometry.joints {
            let color = neon_color(Some(joint_side(joint.index)));
            surface.draw_vertices(&circle(joint.x, joint.y, NEON_JOINT_RADIUS + 0.5, with_opacity(colors::WHITE, opacity)));
            surface.draw_vertices(&circle(joint.x, joint.y, NEON_JOINT_RADIUS - 0.5, with_opacity(color, opacity)));
        }
    }
}

// ============================================================================
// MINIMAL
// ============================================================================

/// Thin white lines and small dots
pub struct MinimalPainter;

impl SkeletonPainter for MinimalPainter {
    fn render(&self, surface: &mut Surface, geometry: &SkeletonGeometry, opacity: f32) {
        let line = with_opacity(colors::MINIMAL, opacity);
        surface.draw_vertices(&bone_pass(geometry, 2.0, |_, _| line));

        let dot = with_opacity(colors::WHITE, opacity);
        let mut vertices = Vec::new();
        for joint in &geometry.joints {
            vertices.extend(circle(joint.x, joint.y, 3.0, dot));
        }
        surface.draw_vertices(&vertices);
    }
}

// ============================================================================
// GEOMETRIC
// ============================================================================

/// Lime lines with square joints
pub struct GeometricPainter;

const GEOMETRIC_LINE_WIDTH: f32 = 3.0;
/// Square side before the outline stroke
const GEOMETRIC_SQUARE: f32 = 8.0;

impl SkeletonPainter for GeometricPainter {
    fn render(&self, surface: &mut Surface, geometry: &SkeletonGeometry, opacity: f32) {
        let lime = with_opacity(colors::LIME, opacity);
        surface.draw_vertices(&bone_pass(geometry, GEOMETRIC_LINE_WIDTH, |_, _| lime));

        // Black square with a lime stroke straddling its edge
        let outer = GEOMETRIC_SQUARE + GEOMETRIC_LINE_WIDTH;
        let inner = GEOMETRIC_SQUARE - GEOMETRIC_LINE_WIDTH;
        let black = with_opacity(colors::BLACK, opacity);
        for joint in &geometry.joints {
            surface.fill_rect(joint.x - outer / 2.0, joint.y - outer / 2.0, outer, outer, lime);
            surface.draw_vertices(&create_rect_vertices(
                joint.x - inner / 2.0,
                joint.y - inner / 2.0,
                inner,
                inner,
                black,
            ));
        }
    }
}

// ============================================================================
// CARTOON
// ============================================================================

/// Thick outlined limbs, pink joints, big head and paws
pub struct CartoonPainter;

const CARTOON_OUTLINE: f32 = 2.0;

/// Joint radius, with hands (15-22) and feet (27+) enlarged
fn cartoon_radius(index: usize) -> f32 {
    match index {
        NOSE => 20.0,
        15..=22 => 10.0,
        i if i >= 27 => 10.0,
        _ => 6.0,
    }
}

impl SkeletonPainter for CartoonPainter {
    fn render(&self, surface: &mut Surface, geometry: &SkeletonGeometry, opacity: f32) {
        let outline = with_opacity(colors::BLACK, opacity);
        let limb = with_opacity(colors::WHITE, opacity);
        surface.draw_vertices(&bone_pass(geometry, 14.0, |_, _| outline));
        surface.draw_vertices(&bone_pass(geometry, 10.0, |_, _| limb));

        for joint in &geometry.joints {
            let radius = cartoon_radius(joint.index);
            let fill = if joint.index == NOSE { colors::WHITE } else { colors::PINK };
            surface.draw_vertices(&circle(joint.x, joint.y, radius + CARTOON_OUTLINE, outline));
            surface.draw_vertices(&circle(joint.x, joint.y, radius, with_opacity(fill, opacity)));

            if joint.index == NOSE {
                let mut eyes = circle(joint.x - 6.0, joint.y - 2.0, 2.0, outline);
                eyes.extend(circle(joint.x + 6.0, joint.y - 2.0, 2.0, outline));
                surface.draw_vertices(&eyes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::landmarks::tests::standing_pose;
    use crate::physics::ConfidenceGate;

    fn geometry(size: u32) -> SkeletonGeometry {
        SkeletonGeometry::project(&standing_pose(), size, size, &ConfidenceGate::new())
    }

    #[test]
    fn test_neon_left_right_colors() {
        let mut surface = Surface::new(200, 200);
        NeonPainter.render(&mut surface, &geometry(200), 1.0);
        // Left elbow (130, 80) cyan, right elbow (70, 80) magenta, nose (100, 20) yellow
        assert_eq!(surface.pixel(130, 80), Some([0, 255, 255, 255]));
        assert_eq!(surface.pixel(70, 80), Some([255, 0, 255, 255]));
        assert_eq!(surface.pixel(100, 20), Some([255, 255, 0, 255]));
    }

    #[test]
    fn test_geometric_square_joint() {
        let mut surface = Surface::new(200, 200);
        GeometricPainter.render(&mut surface, &geometry(200), 1.0);
        // Nose square: black center, lime ring
        assert_eq!(surface.pixel(100, 20), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(104, 20), Some([212, 248, 4, 255]));
    }

    #[test]
    fn test_cartoon_big_head() {
        let mut surface = Surface::new(200, 200);
        CartoonPainter.render(&mut surface, &geometry(200), 1.0);
        // 15px right of the nose is still inside the white head
        assert_eq!(surface.pixel(115, 20), Some([255, 255, 255, 255]));
        // Eye
        assert_eq!(surface.pixel(94, 18), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_cartoon_radii() {
        assert_eq!(cartoon_radius(NOSE), 20.0);
        assert_eq!(cartoon_radius(16), 10.0);
        assert_eq!(cartoon_radius(31), 10.0);
        assert_eq!(cartoon_radius(13), 6.0);
        assert_eq!(cartoon_radius(25), 6.0);
    }

    #[test]
    fn test_opacity_applies() {
        let mut surface = Surface::new(200, 200);
        MinimalPainter.render(&mut surface, &geometry(200), 0.5);
        let px = surface.pixel(100, 20).unwrap();
        assert!((127..=128).contains(&px[3]));
    }
}
