/*
 * Butterfly Module
 *
 * This module defines the Butterfly struct, one agent of the swarm.
 * A butterfly owns its flight state (position, velocity, orientation, phase)
 * and its geometry: four wing panels and a rigid body that bobs with the
 * stroke. The swarm decides where it flies; the butterfly only turns to
 * face its velocity and flaps.
 */

use nannou::prelude::Vec3;

use crate::body::{Antenna, BodyPose, Segment};
use crate::frame::Frame;
use crate::oscillator::{wrap_phase, WingSignals};
use crate::wing::{PanelSlot, WingKinematics};

#[derive(Clone, Debug)]
pub struct Butterfly {
    pub position: Vec3,
    pub velocity: Vec3,
    id: usize,
    frame: Frame,
    phase: f32,
    wings: WingKinematics,
    body: BodyPose,
}

impl Butterfly {
    pub fn new(id: usize, position: Vec3, velocity: Vec3, phase: f32) -> Self {
        let mut butterfly = Self {
            position,
            velocity,
            id,
            frame: Frame::IDENTITY,
            phase: wrap_phase(phase),
            wings: WingKinematics::new(),
            body: BodyPose::new(),
        };

        butterfly.orient_to_velocity();
        // Start in the pose for the spawn phase rather than the flat rest shape
        butterfly.pose();
        butterfly
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    // Current phase, always in [0, 2π)
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn wings(&self) -> &WingKinematics {
        &self.wings
    }

    pub fn body(&self) -> &BodyPose {
        &self.body
    }

    // Turn to face the current velocity; a stalled butterfly keeps its heading
    pub fn orient_to_velocity(&mut self) {
        if let Some(frame) = Frame::looking_along(self.velocity) {
            self.frame = frame;
        }
    }

    // Advance the phase by `steps` reference frames and reshape wings and body
    pub fn animate(&mut self, steps: f32, phase_step: f32) {
        self.phase = wrap_phase(self.phase + phase_step * steps);
        self.pose();
    }

    fn pose(&mut self) {
        // One set of signals drives both the wings and the body
        let signals = WingSignals::from_phase(self.phase);
        self.wings.apply(&signals);
        self.body.apply(&signals);
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.frame.to_world(self.position, local)
    }

    // Corners of a panel in world space, mounted on the bobbing body
    pub fn panel_world_corners(&self, slot: PanelSlot) -> [Vec3; 8] {
        self.panel_local_corners(slot).map(|c| self.to_world(c))
    }

    // Corners of a panel in the body frame, before the world transform
    pub fn panel_local_corners(&self, slot: PanelSlot) -> [Vec3; 8] {
        let panel = self.wings.panel(slot);
        let offset = panel.mount() + self.body.wing_offset();
        panel.corners().map(|c| c + offset)
    }

    pub fn segment_world_corners(&self, segment: &Segment) -> [Vec3; 8] {
        segment.corners().map(|c| self.to_world(c))
    }

    pub fn antenna_world_points(&self, antenna: &Antenna) -> (Vec3, Vec3) {
        (self.to_world(antenna.root()), self.to_world(antenna.tip()))
    }

    // Integrate one step of `steps` reference frames
    pub(crate) fn advance(&mut self, steps: f32) {
        self.position += self.velocity * steps;
    }
}
