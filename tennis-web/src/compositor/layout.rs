//! Output layouts - where each source surface lands in the composite frame
//!
//! Plans are computed from the actual source dimensions every frame, so a
//! missing (zero-sized) source simply has no placement.

use serde::{Deserialize, Serialize};

/// How source surfaces are tiled into the output surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeLayout {
    /// One source, unscaled
    Single,
    /// Annotated video left, skeleton right
    SideBySide,
    /// 2x2 grid with the reference video top-right and the skeleton centered
    /// in the bottom row
    Quad,
}

/// Which source a placement draws
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Surface A (video with skeleton and badge), or the only source of `Single`
    Primary,
    /// Surface B: skeleton only
    Skeleton,
    /// Raw reference video frame
    ReferenceVideo,
}

/// A source drawn into the output rectangle (x, y, width, height)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub slot: Slot,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Divider rectangle in output pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Divider {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Divider {
    /// Vertical divider centered on `x`
    fn vertical(x: f32, top: f32, bottom: f32, thickness: f32) -> Self {
        Self { x: x - thickness / 2.0, y: top, width: thickness, height: bottom - top }
    }

    /// Horizontal divider centered on `y`
    fn horizontal(y: f32, left: f32, right: f32, thickness: f32) -> Self {
        Self { x: left, y: y - thickness / 2.0, width: right - left, height: thickness }
    }
}

/// Output size plus everything to draw for one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutPlan {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
    pub dividers: Vec<Divider>,
}

fn non_empty((w, h): (u32, u32)) -> bool {
    w > 0 && h > 0
}

impl CompositeLayout {
    /// Plan a frame from the primary and skeleton surface sizes.
    /// `Quad` sizes every quadrant from the primary surface.
    pub fn plan(&self, primary: (u32, u32), skeleton: (u32, u32), divider_width: f32) -> LayoutPlan {
        match self {
            CompositeLayout::Single => plan_single(primary),
            CompositeLayout::SideBySide => plan_side_by_side(primary, skeleton, divider_width),
            CompositeLayout::Quad => plan_quad(primary, divider_width),
        }
    }
}

fn plan_single(source: (u32, u32)) -> LayoutPlan {
    let mut plan = LayoutPlan { width: source.0, height: source.1, ..Default::default() };
    if non_empty(source) {
        plan.placements.push(Placement {
            slot: Slot::Primary,
            x: 0,
            y: 0,
            width: source.0,
            height: source.1,
        });
    }
    plan
}

fn plan_side_by_side(a: (u32, u32), b: (u32, u32), divider_width: f32) -> LayoutPlan {
    // Zero-sized sources contribute no width
    let a = if non_empty(a) { a } else { (0, 0) };
    let b = if non_empty(b) { b } else { (0, 0) };

    let mut plan = LayoutPlan {
        width: a.0 + b.0,
        height: a.1.max(b.1),
        ..Default::default()
    };
    if non_empty(a) {
        plan.placements.push(Placement { slot: Slot::Primary, x: 0, y: 0, width: a.0, height: a.1 });
    }
    if non_empty(b) {
        plan.placements.push(Placement {
            slot: Slot::Skeleton,
            x: i64::from(a.0),
            y: 0,
            width: b.0,
            height: b.1,
        });
    }
    if non_empty(a) && non_empty(b) {
        plan.dividers.push(Divider::vertical(a.0 as f32, 0.0, a.1 as f32, divider_width));
    }
    plan
}

fn plan_quad(a: (u32, u32), divider_width: f32) -> LayoutPlan {
    if !non_empty(a) {
        return LayoutPlan::default();
    }
    let (w, h) = a;
    let mut plan = LayoutPlan { width: w * 2, height: h * 2, ..Default::default() };

    plan.placements.push(Placement { slot: Slot::Primary, x: 0, y: 0, width: w, height: h });
    plan.placements.push(Placement {
        slot: Slot::ReferenceVideo,
        x: i64::from(w),
        y: 0,
        width: w,
        height: h,
    });
    // Skeleton centered across the bottom row
    plan.placements.push(Placement {
        slot: Slot::Skeleton,
        x: i64::from(w / 2),
        y: i64::from(h),
        width: w,
        height: h,
    });

    plan.dividers.push(Divider::vertical(w as f32, 0.0, h as f32, divider_width));
    plan.dividers.push(Divider::horizontal(h as f32, 0.0, (w * 2) as f32, divider_width));
    plan
}
