/*
 * Frame Module
 *
 * Orientation of a butterfly expressed as the world-space images of its
 * body axes. The body faces -X, so looking along a direction means mapping
 * local -X onto it while keeping local +Y as close to world up as possible.
 */

use nannou::prelude::{vec3, Vec3};

const EPSILON: f32 = 1.0e-6;
// Above this |forward · up| the up reference is swapped to avoid a degenerate cross product
const UP_ALIGNMENT_LIMIT: f32 = 0.97;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Frame {
    pub const IDENTITY: Frame = Frame {
        x_axis: Vec3::X,
        y_axis: Vec3::Y,
        z_axis: Vec3::Z,
    };

    /// Frame whose facing axis (local -X) points along `direction`.
    /// Returns `None` for a zero-length direction.
    pub fn looking_along(direction: Vec3) -> Option<Frame> {
        let length_sq = direction.length_squared();
        if !(length_sq > EPSILON * EPSILON) || !length_sq.is_finite() {
            return None;
        }
        let forward = direction / length_sq.sqrt();

        let mut up_ref = Vec3::Y;
        if forward.dot(up_ref).abs() > UP_ALIGNMENT_LIMIT {
            up_ref = Vec3::Z;
        }

        // Gram-Schmidt the up reference against the facing direction
        let up = (up_ref - forward * forward.dot(up_ref)).normalize();
        let x_axis = -forward;
        let z_axis = x_axis.cross(up);

        Some(Frame {
            x_axis,
            y_axis: up,
            z_axis,
        })
    }

    // Direction the body faces in world space
    pub fn forward(&self) -> Vec3 {
        -self.x_axis
    }

    // Map a body-space point to world space (rotation only)
    #[inline]
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.x_axis * local.x + self.y_axis * local.y + self.z_axis * local.z
    }

    pub fn to_world(&self, origin: Vec3, local: Vec3) -> Vec3 {
        origin + self.apply(local)
    }
}

// Rotate a point about the Z axis
pub fn roll(v: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    vec3(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z)
}

// Rotate a point about the X axis
pub fn pitch(v: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    vec3(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos)
}
