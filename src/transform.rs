//! Builders for the view, projection and viewport matrices.
//!
//! A vertex travels `viewport * projection * view * position` and is divided by
//! `w` before rasterization. The camera looks down -Z, so `near` and `far` are
//! negative and a larger depth means closer to the eye.

use crate::math::{Mat4, Vec3f};

/// Right-handed view matrix placing the camera at `eye` looking at `center`.
///
/// Fails in the sense of producing a degenerate basis when `eye == center` or
/// the view direction is parallel to the world up axis; callers pick a valid
/// camera.
pub fn look_at(eye: Vec3f, center: Vec3f) -> Mat4 {
    let forward = (center - eye).normalize();
    let right = forward.cross(Vec3f::UP).normalize();
    let up = right.cross(forward);

    return Mat4::from_rows([
        [right.x, right.y, right.z, -right.dot(eye)],
        [up.x, up.y, up.z, -up.dot(eye)],
        [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
        [0.0, 0.0, 0.0, 1.0],
    ]);
}

/// Maps the box `[left, right] x [bottom, top] x [far, near]` onto the `[-1, 1]` cube.
/// The near plane lands on z = 1 and the far plane on z = -1.
pub fn orthographic_project(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    let scale = Mat4::from_rows([
        [2.0 / (right - left), 0.0, 0.0, 0.0],
        [0.0, 2.0 / (top - bottom), 0.0, 0.0],
        [0.0, 0.0, 2.0 / (near - far), 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    let translate = Mat4::from_rows([
        [1.0, 0.0, 0.0, -(right + left) / 2.0],
        [0.0, 1.0, 0.0, -(top + bottom) / 2.0],
        [0.0, 0.0, 1.0, -(near + far) / 2.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    return scale * translate;
}

/// Perspective projection built by squashing the frustum into a box and then
/// normalizing the box orthographically.
///
/// `near` and `far` are signed plane positions on the Z axis (conventionally
/// negative), `fov_degrees` is the vertical field of view.
pub fn perspective_project(near: f32, far: f32, fov_degrees: f32, aspect_ratio: f32) -> Mat4 {
    let half_fov = fov_degrees.to_radians() / 2.0;
    let top = near.abs() * half_fov.tan();
    let right = top * aspect_ratio;

    let perspective_to_orthographic = Mat4::from_rows([
        [near, 0.0, 0.0, 0.0],
        [0.0, near, 0.0, 0.0],
        [0.0, 0.0, near + far, -near * far],
        [0.0, 0.0, 1.0, 0.0],
    ]);
    let orthographic = orthographic_project(-right, right, -top, top, near, far);
    return orthographic * perspective_to_orthographic;
}

/// Maps NDC x/y from `[-1, 1]` to `[0, width] x [0, height]`. Z passes through.
pub fn viewport(width: f32, height: f32) -> Mat4 {
    return Mat4::from_rows([
        [width / 2.0, 0.0, 0.0, width / 2.0],
        [0.0, height / 2.0, 0.0, height / 2.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
}

/// Same as [`viewport`], but also maps NDC z from `[-1, 1]` to `[0, depth]`
/// so the integer depth buffer gets `depth` distinct levels.
pub fn viewport_with_depth(width: f32, height: f32, depth: f32) -> Mat4 {
    let mut m = viewport(width, height);
    m[2][2] = depth / 2.0;
    m[2][3] = depth / 2.0;
    return m;
}
