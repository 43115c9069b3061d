//! Matrices of a frame, as pure functions of the framing, the time and the user transform.

use crate::extents::CameraFraming;
use crate::transform::TransformState;
use glamx::{Mat4, Vec2, Vec3};

/// The camera-to-world matrix of an eye at `eye` looking at `target`.
pub fn camera_matrix(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let z_axis = (eye - target).normalize_or_zero();
    let x_axis = up.cross(z_axis).normalize_or_zero();
    let y_axis = z_axis.cross(x_axis).normalize_or_zero();

    Mat4::from_cols(
        x_axis.extend(0.0),
        y_axis.extend(0.0),
        z_axis.extend(0.0),
        eye.extend(1.0),
    )
}

/// The view matrix of a framing: the inverse of its camera matrix.
pub fn view_matrix(framing: &CameraFraming) -> Mat4 {
    camera_matrix(framing.position, framing.target, Vec3::Y).inverse()
}

/// Perspective projection of a framing for a target of the given aspect ratio.
pub fn projection_matrix(framing: &CameraFraming, fov: f32, aspect: f32) -> Mat4 {
    Mat4::perspective_rh(fov, aspect, framing.znear, framing.zfar)
}

/// Rotation around Y by `time_ms` (in milliseconds) times `spin_speed` (in radians per second).
#[inline]
pub fn spin(time_ms: f64, spin_speed: f32) -> Mat4 {
    Mat4::from_rotation_y((time_ms * 0.001) as f32 * spin_speed)
}

/// World size of one pixel on the plane through the target, facing the camera.
pub fn world_units_per_pixel(framing: &CameraFraming, fov: f32, height_px: u32) -> f32 {
    2.0 * framing.radius * (fov * 0.5).tan() / height_px.max(1) as f32
}

/// The user transform: rotate around X, then translate, then scale.
///
/// The translation is measured from `origin`, in pixels, and converted to world
/// units with `units_per_pixel`. At the default state this is the identity.
pub fn user_matrix(state: &TransformState, origin: Vec2, units_per_pixel: f32) -> Mat4 {
    let displacement = (state.translation - origin) * units_per_pixel;

    Mat4::from_rotation_x(state.rotation.angle())
        * Mat4::from_translation(displacement.extend(0.0))
        * Mat4::from_scale(Vec3::new(state.scale.x, state.scale.y, 1.0))
}

/// World matrix of a part: the spin, then the centering offset, then the user transform.
#[inline]
pub fn world_matrix(spin: Mat4, offset: Vec3, user: Mat4) -> Mat4 {
    spin * Mat4::from_translation(offset) * user
}
