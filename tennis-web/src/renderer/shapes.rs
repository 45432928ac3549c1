//! Shape primitives - triangle vertices for circles, lines and rects
//!
//! All coordinates are in surface pixels; colors are straight RGBA in 0-1.

/// RGBA color, components in 0-1
pub type Color = [f32; 4];

/// Vertex structure for rendering colored shapes
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: Color,
}

/// Scale a color's alpha (global opacity)
pub fn with_opacity(color: Color, opacity: f32) -> Color {
    [color[0], color[1], color[2], color[3] * opacity.clamp(0.0, 1.0)]
}

/// Generate vertices for a filled circle (triangle fan)
pub fn create_circle_vertices(
    cx: f32,
    cy: f32,
    radius: f32,
    color: Color,
    segments: u32,
) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let angle1 = (i as f32 / segments as f32) * std::f32::consts::TAU;
        let angle2 = ((i + 1) as f32 / segments as f32) * std::f32::consts::TAU;

        vertices.push(Vertex { position: [cx, cy], color });
        vertices.push(Vertex {
            position: [cx + radius * angle1.cos(), cy + radius * angle1.sin()],
            color,
        });
        vertices.push(Vertex {
            position: [cx + radius * angle2.cos(), cy + radius * angle2.sin()],
            color,
        });
    }

    vertices
}

/// Segment count that keeps circle edges smooth at a given radius
pub fn circle_segments(radius: f32) -> u32 {
    ((radius * 1.5) as u32).clamp(12, 48)
}

/// Generate vertices for a line segment (rendered as a quad of `width` pixels)
pub fn create_line_vertices(
    x1: f32, y1: f32,
    x2: f32, y2: f32,
    width: f32,
    color: Color,
) -> Vec<Vertex> {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len = (dx * dx + dy * dy).sqrt();

    if len < 0.001 { return vec![]; }

    // Perpendicular offset of half the width on each side
    let half = width / 2.0;
    let px = -dy / len * half;
    let py = dx / len * half;

    vec![
        Vertex { position: [x1 - px, y1 - py], color },
        Vertex { position: [x1 + px, y1 + py], color },
        Vertex { position: [x2 + px, y2 + py], color },

        Vertex { position: [x1 - px, y1 - py], color },
        Vertex { position: [x2 + px, y2 + py], color },
        Vertex { position: [x2 - px, y2 - py], color },
    ]
}

/// Line with round caps, like a canvas stroke with `lineCap = 'round'`
pub fn create_capsule_vertices(
    x1: f32, y1: f32,
    x2: f32, y2: f32,
    width: f32,
    color: Color,
) -> Vec<Vertex> {
    let radius = width / 2.0;
    let segments = circle_segments(radius);
    let mut vertices = create_line_vertices(x1, y1, x2, y2, width, color);
    vertices.extend(create_circle_vertices(x1, y1, radius, color, segments));
    vertices.extend(create_circle_vertices(x2, y2, radius, color, segments));
    vertices
}

/// Dashed line: `on` pixels drawn, `off` pixels skipped, repeating
pub fn create_dashed_line_vertices(
    x1: f32, y1: f32,
    x2: f32, y2: f32,
    width: f32,
    color: Color,
    on: f32,
    off: f32,
) -> Vec<Vertex> {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len = (dx * dx + dy * dy).sqrt();
    let period = on + off;
    if len < 0.001 || on <= 0.0 || period <= 0.0 {
        return vec![];
    }

    let (ux, uy) = (dx / len, dy / len);
    let mut vertices = Vec::new();
    let mut start = 0.0;
    while start < len {
        let end = (start + on).min(len);
        vertices.extend(create_line_vertices(
            x1 + ux * start, y1 + uy * start,
            x1 + ux * end, y1 + uy * end,
            width,
            color,
        ));
        start += period;
    }
    vertices
}

/// Generate vertices for an axis-aligned filled rectangle
pub fn create_rect_vertices(x: f32, y: f32, width: f32, height: f32, color: Color) -> Vec<Vertex> {
    if width <= 0.0 || height <= 0.0 {
        return vec![];
    }
    let (x2, y2) = (x + width, y + height);
    vec![
        Vertex { position: [x, y], color },
        Vertex { position: [x2, y], color },
        Vertex { position: [x2, y2], color },

        Vertex { position: [x, y], color },
        Vertex { position: [x2, y2], color },
        Vertex { position: [x, y2], color },
    ]
}
