//! Frame compositor - assembles source surfaces into the recorded frame
//!
//! The output surface belongs to the compositor alone. It is rebuilt from
//! scratch every frame: black fill, sources per the layout plan, dividers.

use image::RgbaImage;

use super::layout::{CompositeLayout, LayoutPlan, Slot};
use crate::renderer::{Color, Surface};

/// #333
const DIVIDER_COLOR: Color = [0.2, 0.2, 0.2, 1.0];
const OUTPUT_BACKGROUND: Color = [0.0, 0.0, 0.0, 1.0];
pub const DEFAULT_DIVIDER_WIDTH: f32 = 2.0;

/// Surfaces available for one frame
#[derive(Clone, Copy)]
pub struct CompositeSources<'a> {
    /// Surface A, or the single recorded surface
    pub primary: &'a Surface,
    /// Surface B
    pub skeleton: &'a Surface,
    /// Current reference video frame, when one is loaded
    pub reference_video: Option<&'a RgbaImage>,
}

/// Owns the output surface and draws into it
#[derive(Debug)]
pub struct FrameCompositor {
    output: Surface,
    layout: CompositeLayout,
    divider_width: f32,
}

impl FrameCompositor {
    pub fn new(layout: CompositeLayout) -> Self {
        Self {
            output: Surface::new(0, 0),
            layout,
            divider_width: DEFAULT_DIVIDER_WIDTH,
        }
    }

    pub fn with_divider_width(mut self, width: f32) -> Self {
        self.divider_width = width.max(0.0);
        self
    }

    pub fn layout(&self) -> CompositeLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: CompositeLayout) {
        self.layout = layout;
    }

    /// Plan for the given sources without drawing
    pub fn plan(&self, sources: &CompositeSources<'_>) -> LayoutPlan {
        self.layout.plan(
            sources.primary.dimensions(),
            sources.skeleton.dimensions(),
            self.divider_width,
        )
    }

    /// Draw one frame. A missing source leaves its area black.
    pub fn compose(&mut self, sources: &CompositeSources<'_>) -> &Surface {
        let plan = self.plan(sources);
        self.output.resize(plan.width, plan.height);
        self.output.fill(OUTPUT_BACKGROUND);

        for placement in &plan.placements {
            let image = match placement.slot {
                Slot::Primary => Some(sources.primary.as_image()),
                Slot::Skeleton => Some(sources.skeleton.as_image()),
                Slot::ReferenceVideo => sources.reference_video,
            };
            match image {
                Some(image) => self.output.draw_image(
                    image,
                    placement.x,
                    placement.y,
                    placement.width,
                    placement.height,
                ),
                None => log::trace!("no {:?} source this frame", placement.slot),
            }
        }

        for divider in &plan.dividers {
            self.output
                .fill_rect(divider.x, divider.y, divider.width, divider.height, DIVIDER_COLOR);
        }

        &self.output
    }

    /// Last composed frame
    pub fn output(&self) -> &Surface {
        &self.output
    }
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new(CompositeLayout::SideBySide)
    }
}
