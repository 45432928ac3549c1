//! Contain-fit remapping of landmarks between surfaces of different aspect
//! ratio
//!
//! Landmarks are normalized to the frame they were detected on. To overlay
//! them on a differently shaped surface without distortion, the source frame
//! is scaled to fit inside the destination and centered; the unused band
//! (letterbox or pillarbox) becomes an offset.

use crate::bridge::{Landmark, LandmarkSet};

/// Scale and offsets of a contain fit, in normalized destination units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitTransform {
    /// Pixel scale from source to destination
    pub scale: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitTransform {
    pub const IDENTITY: FitTransform = FitTransform {
        scale: 1.0,
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Contain fit of `src` (width, height) into `dest`. Any zero dimension
    /// yields the identity.
    pub fn contain(src: (u32, u32), dest: (u32, u32)) -> Self {
        let (src_w, src_h) = (src.0 as f32, src.1 as f32);
        let (dest_w, dest_h) = (dest.0 as f32, dest.1 as f32);
        if src_w <= 0.0 || src_h <= 0.0 || dest_w <= 0.0 || dest_h <= 0.0 {
            return Self::IDENTITY;
        }

        let src_ratio = src_w / src_h;
        let dest_ratio = dest_w / dest_h;

        let (scale, offset_x, offset_y) = if src_ratio > dest_ratio {
            // Wider source: width binds, letterbox top and bottom
            let scale = dest_w / src_w;
            (scale, 0.0, (dest_h - src_h * scale) / 2.0)
        } else {
            // Taller (or equal) source: height binds, pillarbox left and right
            let scale = dest_h / src_h;
            (scale, (dest_w - src_w * scale) / 2.0, 0.0)
        };

        Self {
            scale,
            scale_x: src_w * scale / dest_w,
            scale_y: src_h * scale / dest_h,
            offset_x: offset_x / dest_w,
            offset_y: offset_y / dest_h,
        }
    }

    pub fn apply(&self, lm: &Landmark) -> Landmark {
        Landmark {
            x: lm.x * self.scale_x + self.offset_x,
            y: lm.y * self.scale_y + self.offset_y,
            z: lm.z * self.scale,
            ..*lm
        }
    }
}

/// Remap a landmark set detected on a `src` frame so it draws correctly on a
/// `dest` surface. Visibility passes through; the length is unchanged.
pub fn fit_landmarks(landmarks: &LandmarkSet, src: (u32, u32), dest: (u32, u32)) -> LandmarkSet {
    if landmarks.is_empty() {
        return LandmarkSet::empty();
    }
    let transform = FitTransform::contain(src, dest);
    landmarks.map_points(|lm| transform.apply(lm))
}
