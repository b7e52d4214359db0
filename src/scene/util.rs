use crate::math::{Vec2f, Vec3f};

/// Barycentric weights below this count as outside the triangle.
///
/// Pixels exactly on an edge are rejected too, which keeps shared edges from
/// being shaded twice and leaves a thin unfilled seam between neighbors.
pub const INSIDE_EPSILON: f32 = 1e-5;

/// Twice the screen area below which a triangle has no usable barycentric frame.
const DEGENERATE_AREA: f32 = 1e-2;

/// Inclusive integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    /// Rounded min/max of the triangle's screen x and y.
    pub fn of_triangle(points: &[Vec3f; 3]) -> BoundingBox {
        let xs = points.iter().map(|p| p.x);
        let ys = points.iter().map(|p| p.y);
        let x_min = xs.clone().fold(f32::INFINITY, f32::min);
        let x_max = xs.fold(f32::NEG_INFINITY, f32::max);
        let y_min = ys.clone().fold(f32::INFINITY, f32::min);
        let y_max = ys.fold(f32::NEG_INFINITY, f32::max);
        return BoundingBox {
            x_min: x_min.round() as i32,
            y_min: y_min.round() as i32,
            x_max: x_max.round() as i32,
            y_max: y_max.round() as i32,
        };
    }

    /// Intersection with a `width` x `height` surface, or `None` if nothing is left.
    pub fn clip(self, width: u32, height: u32) -> Option<BoundingBox> {
        let clipped = BoundingBox {
            x_min: self.x_min.max(0),
            y_min: self.y_min.max(0),
            x_max: self.x_max.min(width as i32 - 1),
            y_max: self.y_max.min(height as i32 - 1),
        };
        if clipped.x_min > clipped.x_max || clipped.y_min > clipped.y_max {
            return None;
        }
        return Some(clipped);
    }
}

/// Barycentric weights of pixel `(x, y)` with respect to the screen triangle
/// `points` (only x and y are used). `None` for a degenerate triangle.
pub fn barycentric(points: &[Vec3f; 3], x: f32, y: f32) -> Option<Vec3f> {
    let [a, b, c] = *points;
    let u = Vec3f::new(c.x - a.x, b.x - a.x, a.x - x)
        .cross(Vec3f::new(c.y - a.y, b.y - a.y, a.y - y));
    if u.z.abs() < DEGENERATE_AREA || !u.is_finite() {
        return None;
    }
    return Some(Vec3f::new(1.0 - (u.x + u.y) / u.z, u.y / u.z, u.x / u.z));
}

/// Inside test used by the rasterizer.
pub fn is_inside(weights: Vec3f) -> bool {
    return weights.x >= INSIDE_EPSILON
        && weights.y >= INSIDE_EPSILON
        && weights.z >= INSIDE_EPSILON;
}

/// True for triangles wound clockwise on screen (y up).
pub fn is_backfacing(points: &[Vec3f; 3]) -> bool {
    let edge1 = points[1] - points[0];
    let edge2 = points[2] - points[0];
    return edge1.cross(edge2).z < 0.0;
}

/// Tangent and bitangent of a triangle from its positions and texture coordinates,
/// solved from the 2x2 UV-delta system. `None` if the UV mapping is degenerate.
pub fn tangent_basis(positions: &[Vec3f; 3], uvs: &[Vec2f; 3]) -> Option<(Vec3f, Vec3f)> {
    let edge1 = positions[1] - positions[0];
    let edge2 = positions[2] - positions[0];
    let delta_uv1 = uvs[1] - uvs[0];
    let delta_uv2 = uvs[2] - uvs[0];

    let determinant = delta_uv1.x * delta_uv2.y - delta_uv2.x * delta_uv1.y;
    if !determinant.is_finite() || determinant.abs() < f32::EPSILON {
        return None;
    }
    let f = 1.0 / determinant;
    let tangent = f * (delta_uv2.y * edge1 - delta_uv1.y * edge2);
    let bitangent = f * (-delta_uv2.x * edge1 + delta_uv1.x * edge2);
    if !tangent.is_finite() || !bitangent.is_finite() {
        return None;
    }
    return Some((tangent, bitangent));
}

/// Mirrors `incident` about `normal` (expected to be unit length).
pub fn reflect(incident: Vec3f, normal: Vec3f) -> Vec3f {
    return incident - 2.0 * normal.dot(incident) * normal;
}

pub fn interpolate(values: &[Vec3f; 3], weights: Vec3f) -> Vec3f {
    return values[0] * weights.x + values[1] * weights.y + values[2] * weights.z;
}

pub fn interpolate_uv(values: &[Vec2f; 3], weights: Vec3f) -> Vec2f {
    return values[0] * weights.x + values[1] * weights.y + values[2] * weights.z;
}
