/*
 * Camera Module
 *
 * This module defines a fixed perspective Camera for the viewer. It looks
 * at the confinement box from a set distance and projects world points to
 * screen space with a pinhole model. There is no user input: the camera
 * never moves once created.
 */

use nannou::geom::Rect;
use nannou::prelude::{vec2, vec3, Vec2, Vec3};

use crate::params::Bounds;

pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    // Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, fov_y: f32) -> Self {
        let forward = (target - eye).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        Self {
            eye,
            target,
            fov_y,
            near: 1.0,
            far: 1000.0,
            right,
            up,
            forward,
        }
    }

    // Slightly raised view of the whole box, backed off along +Z
    pub fn framing(bounds: &Bounds) -> Self {
        let center = bounds.center();
        let size = bounds.size();
        let distance = size.x.max(size.y).max(size.z) * 1.6;
        let eye = center + vec3(0.0, size.y * 0.5, distance);
        Self::new(eye, center, 60f32.to_radians())
    }

    // Distance in front of the camera, along the view direction
    pub fn depth(&self, point: Vec3) -> f32 {
        (point - self.eye).dot(self.forward)
    }

    // Convert a point from world space to screen space; None when it is
    // outside the near/far range
    pub fn world_to_screen(&self, point: Vec3, window_rect: Rect) -> Option<Vec2> {
        let relative = point - self.eye;
        let z = relative.dot(self.forward);
        if z < self.near || z > self.far {
            return None;
        }

        let focal = window_rect.h() * 0.5 / (self.fov_y * 0.5).tan();
        let projected = vec2(relative.dot(self.right), relative.dot(self.up)) * (focal / z);
        Some(projected + window_rect.xy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Rect {
        Rect::from_w_h(800.0, 600.0)
    }

    #[test]
    fn target_lands_in_the_middle() {
        let camera = Camera::framing(&Bounds::default());
        let screen = camera.world_to_screen(camera.target, window()).unwrap();
        assert!(screen.length() < 1.0e-3);
    }

    #[test]
    fn axes_keep_their_screen_direction() {
        let camera = Camera::new(vec3(0.0, 0.0, 100.0), Vec3::ZERO, 60f32.to_radians());
        let right = camera.world_to_screen(vec3(10.0, 0.0, 0.0), window()).unwrap();
        let above = camera.world_to_screen(vec3(0.0, 10.0, 0.0), window()).unwrap();
        assert!(right.x > 0.0 && right.y.abs() < 1.0e-3);
        assert!(above.y > 0.0 && above.x.abs() < 1.0e-3);
    }

    #[test]
    fn points_behind_are_culled() {
        let camera = Camera::new(vec3(0.0, 0.0, 100.0), Vec3::ZERO, 60f32.to_radians());
        assert!(camera.world_to_screen(vec3(0.0, 0.0, 150.0), window()).is_none());
        assert!(camera.depth(vec3(0.0, 0.0, -50.0)) > camera.depth(Vec3::ZERO));
    }
}
