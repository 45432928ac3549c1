//! Renderer module - CPU skeleton drawing onto RGBA surfaces
//!
//! Re-exports only. All logic in submodules.

mod fit;
mod overlays;
mod shapes;
mod skeleton;
mod styles;
mod surface;

pub use fit::{fit_landmarks, FitTransform};
pub use overlays::{
    badge_color, badge_origin, draw_court_lines, draw_knee_badge, CourtLine, SkeletonBackground,
    BADGE_HEIGHT, BADGE_MARGIN, BADGE_WIDTH,
};
pub use shapes::{
    create_capsule_vertices, create_circle_vertices, create_dashed_line_vertices,
    create_line_vertices, create_rect_vertices, with_opacity, Color, Vertex,
};
pub use skeleton::{
    bone_side, joint_side, painter_for, render_skeleton, ProjectedBone, ProjectedJoint, Side,
    SkeletonGeometry, SkeletonPainter, SkeletonStyle, POSE_CONNECTIONS,
};
pub use styles::{CartoonPainter, GeometricPainter, MinimalPainter, NeonPainter};
pub use surface::Surface;
