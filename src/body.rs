/*
 * Body Module
 *
 * Head, thorax, abdomen and antennae of a butterfly. These parts never
 * deform; they only bob and flex a little with the wing stroke. Every tick
 * the offsets are recomputed from the stored rest pose, so no motion
 * accumulates over a long session.
 */

use nannou::prelude::{vec3, Vec3};
use std::f32::consts::PI;

use crate::frame::{pitch, roll};
use crate::oscillator::WingSignals;

// Peak vertical bob of each part, in body units
const HEAD_BOB: f32 = 0.25;
const THORAX_BOB: f32 = 0.15;
const ANTENNA_BOB: f32 = 0.25;
const WING_MOUNT_BOB: f32 = 0.15;
// Peak abdomen flex about the lateral axis, in radians
const ABDOMEN_FLEX: f32 = 0.18;

const ANTENNA_LENGTH: f32 = 2.0;

// A rigid box-shaped body segment
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    size: Vec3,
    rest_position: Vec3,
    rest_roll: f32,
    position: Vec3,
    roll: f32,
}

impl Segment {
    fn new(size: Vec3, rest_position: Vec3, rest_roll: f32) -> Self {
        Self {
            size,
            rest_position,
            rest_roll,
            position: rest_position,
            roll: rest_roll,
        }
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn rest_position(&self) -> Vec3 {
        self.rest_position
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    fn pose(&mut self, lift: f32, extra_roll: f32) {
        self.position = self.rest_position + vec3(0.0, lift, 0.0);
        self.roll = self.rest_roll + extra_roll;
    }

    // Box corners in the body frame, in the same order as wing panel corners
    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.size * 0.5;
        let local = [
            vec3(-h.x, h.y, -h.z),
            vec3(-h.x, -h.y, -h.z),
            vec3(h.x, h.y, -h.z),
            vec3(h.x, -h.y, -h.z),
            vec3(-h.x, h.y, h.z),
            vec3(-h.x, -h.y, h.z),
            vec3(h.x, h.y, h.z),
            vec3(h.x, -h.y, h.z),
        ];
        local.map(|v| roll(v, self.roll) + self.position)
    }
}

// A thin antenna, drawn as a segment from its root on the head to its tip
#[derive(Clone, Debug, PartialEq)]
pub struct Antenna {
    rest_root: Vec3,
    rest_tip: Vec3,
    root: Vec3,
    tip: Vec3,
}

impl Antenna {
    // Cone along +Y with its apex on the head, tipped forward and splayed sideways
    fn new(lateral_sign: f32) -> Self {
        let place = |v: Vec3| {
            let v = roll(v, 1.175 * PI);
            let v = pitch(v, lateral_sign * 0.125 * PI);
            v + vec3(-3.0, 1.25, lateral_sign * 0.35)
        };
        let rest_root = place(vec3(0.0, ANTENNA_LENGTH * 0.5, 0.0));
        let rest_tip = place(vec3(0.0, -ANTENNA_LENGTH * 0.5, 0.0));

        Self {
            rest_root,
            rest_tip,
            root: rest_root,
            tip: rest_tip,
        }
    }

    pub fn root(&self) -> Vec3 {
        self.root
    }

    pub fn tip(&self) -> Vec3 {
        self.tip
    }

    fn pose(&mut self, lift: f32) {
        let offset = vec3(0.0, lift, 0.0);
        self.root = self.rest_root + offset;
        self.tip = self.rest_tip + offset;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyPose {
    head: Segment,
    thorax: Segment,
    abdomen: Segment,
    antenna_left: Antenna,
    antenna_right: Antenna,
    wing_lift: f32,
}

impl Default for BodyPose {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyPose {
    pub fn new() -> Self {
        Self {
            head: Segment::new(vec3(1.0, 1.0, 1.0), vec3(-2.45, 0.3, 0.0), 0.0),
            thorax: Segment::new(vec3(3.5, 1.0, 1.5), Vec3::ZERO, 0.0),
            abdomen: Segment::new(vec3(2.0, 0.75, 1.0), vec3(2.9, -0.2, 0.0), 0.9375 * PI),
            antenna_left: Antenna::new(1.0),
            antenna_right: Antenna::new(-1.0),
            wing_lift: 0.0,
        }
    }

    pub fn head(&self) -> &Segment {
        &self.head
    }

    pub fn thorax(&self) -> &Segment {
        &self.thorax
    }

    pub fn abdomen(&self) -> &Segment {
        &self.abdomen
    }

    pub fn segments(&self) -> [&Segment; 3] {
        [&self.head, &self.thorax, &self.abdomen]
    }

    pub fn antennae(&self) -> [&Antenna; 2] {
        [&self.antenna_left, &self.antenna_right]
    }

    // Vertical offset applied to every wing mount this tick
    pub fn wing_offset(&self) -> Vec3 {
        vec3(0.0, self.wing_lift, 0.0)
    }

    pub fn update(&mut self, phase: f32) {
        self.apply(&WingSignals::from_phase(phase));
    }

    pub fn apply(&mut self, signals: &WingSignals) {
        // The body dips as the wings push down
        let stroke = signals.vertical_fore;

        self.head.pose(-HEAD_BOB * stroke, 0.0);
        self.thorax.pose(-THORAX_BOB * stroke, 0.0);
        self.abdomen.pose(0.0, ABDOMEN_FLEX * stroke);
        self.antenna_left.pose(-ANTENNA_BOB * stroke);
        self.antenna_right.pose(-ANTENNA_BOB * stroke);
        self.wing_lift = -WING_MOUNT_BOB * stroke;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rest_pose_matches_layout() {
        let body = BodyPose::new();
        assert_eq!(body.head().position(), vec3(-2.45, 0.3, 0.0));
        assert_eq!(body.thorax().position(), Vec3::ZERO);
        assert!((body.abdomen().roll() - 0.9375 * PI).abs() < 1.0e-6);
        assert_eq!(body.wing_offset(), Vec3::ZERO);
    }

    #[test]
    fn pose_is_absolute_not_accumulated() {
        let mut body = BodyPose::new();
        body.update(FRAC_PI_2);
        let first = body.clone();

        // Run many full strokes and come back to the same phase
        for i in 0..5000 {
            body.update(i as f32 * 0.07);
        }
        body.update(FRAC_PI_2);

        assert_eq!(body, first);
    }

    #[test]
    fn head_dips_on_downstroke() {
        let mut body = BodyPose::new();
        body.update(FRAC_PI_2);
        let rest_y = body.head().rest_position().y;
        assert!((body.head().position().y - (rest_y - HEAD_BOB)).abs() < 1.0e-6);
        assert!((body.wing_offset().y + WING_MOUNT_BOB).abs() < 1.0e-6);
    }

    #[test]
    fn phase_zero_returns_to_rest() {
        let mut body = BodyPose::new();
        body.update(1.0);
        body.update(0.0);
        assert_eq!(body, BodyPose::new());
    }

    #[test]
    fn antennae_are_mirror_images() {
        let body = BodyPose::new();
        let [left, right] = body.antennae();
        assert!((left.tip().x - right.tip().x).abs() < 1.0e-5);
        assert!((left.tip().y - right.tip().y).abs() < 1.0e-5);
        assert!((left.tip().z + right.tip().z).abs() < 1.0e-5);
        assert!(left.tip().x < left.root().x, "antenna should reach forward");
        assert!(left.tip().y > left.root().y, "antenna should point up");
    }

    #[test]
    fn segment_corners_surround_position() {
        let body = BodyPose::new();
        let thorax = body.thorax();
        let sum = thorax.corners().iter().fold(Vec3::ZERO, |acc, &c| acc + c);
        assert!((sum / 8.0 - thorax.position()).length() < 1.0e-5);
    }
}
