//! Skeleton rendering - projects landmarks to pixels and hands the geometry
//! to the painter for the selected style
//!
//! Gating and projection are shared; styles only decide how bones and
//! joints look (see `styles`).

use serde::{Deserialize, Serialize};

use super::styles::{CartoonPainter, GeometricPainter, MinimalPainter, NeonPainter};
use super::surface::Surface;
use crate::bridge::{
    LandmarkSet, LEFT_HIP, LEFT_SHOULDER, LANDMARK_COUNT, NOSE, RIGHT_HIP, RIGHT_SHOULDER,
};
use crate::physics::ConfidenceGate;

/// Bone connections drawn for every style
pub const POSE_CONNECTIONS: [(usize, usize); 16] = [
    // Upper body
    (11, 12), (11, 13), (13, 15), (12, 14), (14, 16),
    // Torso
    (11, 23), (12, 24), (23, 24),
    // Legs
    (23, 25), (25, 27), (24, 26), (26, 28),
    // Feet
    (27, 29), (27, 31), (28, 30), (28, 32),
];

/// Visual style for the skeleton
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkeletonStyle {
    #[default]
    Neon,
    Minimal,
    Geometric,
    Cartoon,
}

impl SkeletonStyle {
    pub const ALL: [SkeletonStyle; 4] = [
        SkeletonStyle::Neon,
        SkeletonStyle::Minimal,
        SkeletonStyle::Geometric,
        SkeletonStyle::Cartoon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkeletonStyle::Neon => "neon",
            SkeletonStyle::Minimal => "minimal",
            SkeletonStyle::Geometric => "geometric",
            SkeletonStyle::Cartoon => "cartoon",
        }
    }

    /// Parse a style name; unknown names fall back to neon
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "minimal" => SkeletonStyle::Minimal,
            "geometric" => SkeletonStyle::Geometric,
            "cartoon" => SkeletonStyle::Cartoon,
            _ => SkeletonStyle::Neon,
        }
    }
}

/// Body side used for left/right color coding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Center,
}

/// Odd indices are the subject's left, even their right; the nose is center
pub fn joint_side(index: usize) -> Side {
    if index == NOSE {
        Side::Center
    } else if index % 2 == 1 {
        Side::Left
    } else {
        Side::Right
    }
}

/// Side of a bone; `None` for a bone that crosses sides without touching a
/// shoulder or hip anchor
pub fn bone_side(from: usize, to: usize) -> Option<Side> {
    let touches = |idx: usize| from == idx || to == idx;
    if (from % 2 == 1 && to % 2 == 1) || touches(LEFT_SHOULDER) || touches(LEFT_HIP) {
        Some(Side::Left)
    } else if (from % 2 == 0 && to % 2 == 0) || touches(RIGHT_SHOULDER) || touches(RIGHT_HIP) {
        Some(Side::Right)
    } else {
        None
    }
}

/// A bone that passed visibility gating, in surface pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedBone {
    pub from: usize,
    pub to: usize,
    pub start: (f32, f32),
    pub end: (f32, f32),
}

/// A joint that passed visibility gating, in surface pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedJoint {
    pub index: usize,
    pub x: f32,
    pub y: f32,
}

/// Everything a painter needs: gated bones and joints in pixel space
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkeletonGeometry {
    pub bones: Vec<ProjectedBone>,
    pub joints: Vec<ProjectedJoint>,
}

impl SkeletonGeometry {
    /// Project normalized landmarks onto a `width` x `height` surface,
    /// dropping bones with a hidden endpoint and hidden joints
    pub fn project(landmarks: &LandmarkSet, width: u32, height: u32, gate: &ConfidenceGate) -> Self {
        let (w, h) = (width as f32, height as f32);
        let to_px = |idx: usize| landmarks.get(idx).map(|lm| (lm.x * w, lm.y * h));

        let bones = POSE_CONNECTIONS
            .iter()
            .filter(|(a, b)| gate.passes_pair(landmarks.get(*a), landmarks.get(*b)))
            .filter_map(|&(from, to)| {
                Some(ProjectedBone { from, to, start: to_px(from)?, end: to_px(to)? })
            })
            .collect();

        let joints = landmarks
            .iter()
            .enumerate()
            .take(LANDMARK_COUNT)
            .filter(|(_, lm)| gate.passes(Some(*lm)))
            .map(|(index, lm)| ProjectedJoint { index, x: lm.x * w, y: lm.y * h })
            .collect();

        Self { bones, joints }
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty() && self.joints.is_empty()
    }
}

/// One visual style. Implementations draw bones, then joints.
pub trait SkeletonPainter {
    fn render(&self, surface: &mut Surface, geometry: &SkeletonGeometry, opacity: f32);
}

/// Painter registered for a style
pub fn painter_for(style: SkeletonStyle) -> &'static dyn SkeletonPainter {
    match style {
        SkeletonStyle::Neon => &NeonPainter,
        SkeletonStyle::Minimal => &MinimalPainter,
        SkeletonStyle::Geometric => &GeometricPainter,
        SkeletonStyle::Cartoon => &CartoonPainter,
    }
}

/// Draw a landmark set onto a surface. Empty sets and zero opacity draw nothing.
pub fn render_skeleton(
    surface: &mut Surface,
    landmarks: &LandmarkSet,
    style: SkeletonStyle,
    opacity: f32,
    gate: &ConfidenceGate,
) {
    if landmarks.is_empty() || surface.is_empty() || opacity <= 0.0 {
        return;
    }
    let geometry = SkeletonGeometry::project(landmarks, surface.width(), surface.height(), gate);
    if geometry.is_empty() {
        return;
    }
    painter_for(style).render(surface, &geometry, opacity.min(1.0));
}
