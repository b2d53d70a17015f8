/*
 * Renderer Module
 *
 * This module draws the swarm with nannou. Wing panels come from the
 * published render buffers; body segments and antennae are read straight
 * from the butterflies since they only ever move rigidly.
 *
 * Faces are flat shaded and drawn back to front (painter's algorithm), which
 * is enough for a handful of thin boxes per butterfly.
 */

use nannou::prelude::*;

use crate::app::Model;
use crate::camera::Camera;
use crate::params::Bounds;
use crate::ui;
use crate::wing::{PanelSlot, WingPanel};

const SKY: (u8, u8, u8) = (0xc5, 0xda, 0xed);
const WING: (u8, u8, u8) = (0xce, 0x82, 0x48);
const BODY: (u8, u8, u8) = (0x59, 0x4a, 0x36);
const BOUNDS_GREY: (u8, u8, u8) = (0x92, 0x9d, 0xaf);

const AMBIENT: f32 = 0.55;

struct Face {
    corners: [Vec3; 4],
    depth: f32,
    base: (u8, u8, u8),
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let (r, g, b) = SKY;
    draw.background().color(rgb8(r, g, b));

    let window_rect = app.window_rect();
    draw_bounds(&draw, &model.camera, &model.params.bounds, window_rect);

    let mut faces = Vec::new();
    for agent in 0..model.buffers.len() {
        for slot in PanelSlot::ALL {
            if let Some(corners) = model.buffers.world_panel(agent, slot) {
                push_box_faces(&mut faces, &model.camera, &corners, WING);
            }
        }
    }
    for butterfly in model.swarm.butterflies() {
        for segment in butterfly.body().segments() {
            let corners = butterfly.segment_world_corners(segment);
            push_box_faces(&mut faces, &model.camera, &corners, BODY);
        }
    }

    // Farthest first
    faces.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    for face in &faces {
        draw_face(&draw, &model.camera, face, window_rect);
    }

    let (r, g, b) = BODY;
    for butterfly in model.swarm.butterflies() {
        for antenna in butterfly.body().antennae() {
            let (root, tip) = butterfly.antenna_world_points(antenna);
            let projected = (
                model.camera.world_to_screen(root, window_rect),
                model.camera.world_to_screen(tip, window_rect),
            );
            if let (Some(start), Some(end)) = projected {
                draw.line().start(start).end(end).weight(1.5).color(rgb8(r, g, b));
            }
        }
    }

    if model.settings.show_debug {
        ui::draw_debug_info(&draw, &model.debug_info, window_rect, model.swarm.len());
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        tracing::warn!("Failed to draw frame: {:?}", err);
    }

    if let Err(err) = model.egui.draw_to_frame(&frame) {
        tracing::warn!("Failed to draw UI: {}", err);
    }
}

fn push_box_faces(faces: &mut Vec<Face>, camera: &Camera, corners: &[Vec3; 8], base: (u8, u8, u8)) {
    for quad in WingPanel::FACES {
        let face = quad.map(|i| corners[i]);
        let center = face.iter().fold(Vec3::ZERO, |acc, &c| acc + c) * 0.25;
        faces.push(Face {
            corners: face,
            depth: camera.depth(center),
            base,
        });
    }
}

fn draw_face(draw: &Draw, camera: &Camera, face: &Face, window_rect: Rect) {
    let mut points = [Vec2::ZERO; 4];
    for (point, &corner) in points.iter_mut().zip(face.corners.iter()) {
        match camera.world_to_screen(corner, window_rect) {
            Some(p) => *point = p,
            None => return,
        }
    }

    let [a, b, _, d] = face.corners;
    let normal = (b - a).cross(d - a).normalize_or_zero();
    // Light from above and slightly in front
    let light = normal.dot(vec3(0.3, 0.9, 0.3).normalize()).abs();
    let shade = AMBIENT + (1.0 - AMBIENT) * light;

    let (red, green, blue) = face.base;
    let channel = |c: u8| c as f32 / 255.0 * shade;
    draw.polygon()
        .color(rgb(channel(red), channel(green), channel(blue)))
        .points(points);
}

// Outline the confinement box
fn draw_bounds(draw: &Draw, camera: &Camera, bounds: &Bounds, window_rect: Rect) {
    let (lo, hi) = (bounds.min, bounds.max);
    let corner = |i: usize| {
        vec3(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        )
    };

    let (r, g, b) = BOUNDS_GREY;
    for i in 0..8 {
        for bit in [1, 2, 4] {
            // Each edge once, from the corner with the bit cleared
            if i & bit != 0 {
                continue;
            }
            let start = camera.world_to_screen(corner(i), window_rect);
            let end = camera.world_to_screen(corner(i | bit), window_rect);
            if let (Some(start), Some(end)) = (start, end) {
                draw.line().start(start).end(end).weight(1.0).color(rgba8(r, g, b, 160));
            }
        }
    }
}
