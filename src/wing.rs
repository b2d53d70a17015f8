/*
 * Wing Module
 *
 * This module defines the deformable wing panels and the kinematics that
 * flap them. Each panel is a thin box of eight corners: the four root corners
 * along the attachment edge never move after construction, the four tip
 * corners are rewritten every tick.
 *
 * Body axes: X runs from head (-X) to tail (+X), Y is up and Z is lateral
 * with the left side on +Z. Only the left panels are simulated; the right
 * panels copy them with Z negated.
 */

use nannou::prelude::{vec3, Vec3};

use crate::oscillator::{asymmetric, WingSignals};

// Tilt of the panels about the longitudinal axis (left is positive)
const PANEL_TILT: f32 = 0.0625 * std::f32::consts::PI;
// Vertical gap between the top and bottom faces of a free edge
const TIP_THICKNESS: f32 = 0.15;

// Rest span-wise positions the front/back tips oscillate around
const FORE_FRONT_SPAN: f32 = 2.75;
const HIND_FRONT_SPAN: f32 = 2.25;
const FORE_BACK_SPAN: f32 = 2.0;
const FORE_BACK_SPAN_AMPLITUDE: f32 = 0.75;
const HIND_BACK_SPAN: f32 = 1.75;

// Downstroke (positive signal) vs upstroke (negative signal) scales
const FORE_FRONT_STROKE: (f32, f32) = (2.5, 3.0);
const FORE_BACK_STROKE: (f32, f32) = (1.0, 1.25);
const HIND_BACK_STROKE: (f32, f32) = (2.0, 2.5);
const FORE_BACK_LIFT: f32 = 0.5;
const HIND_FRONT_DROP: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WingKind {
    Fore,
    Hind,
}

// Identifies one of the four panels of a butterfly
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelSlot {
    ForeLeft,
    HindLeft,
    ForeRight,
    HindRight,
}

impl PanelSlot {
    pub const ALL: [PanelSlot; 4] = [
        PanelSlot::ForeLeft,
        PanelSlot::HindLeft,
        PanelSlot::ForeRight,
        PanelSlot::HindRight,
    ];

    pub fn kind(self) -> WingKind {
        match self {
            PanelSlot::ForeLeft | PanelSlot::ForeRight => WingKind::Fore,
            PanelSlot::HindLeft | PanelSlot::HindRight => WingKind::Hind,
        }
    }

    // Dense index, stable across the crate (used by render buffers)
    pub fn index(self) -> usize {
        match self {
            PanelSlot::ForeLeft => 0,
            PanelSlot::HindLeft => 1,
            PanelSlot::ForeRight => 2,
            PanelSlot::HindRight => 3,
        }
    }
}

// Reflect a point across the body's longitudinal plane
#[inline]
pub fn mirror(v: Vec3) -> Vec3 {
    vec3(v.x, v.y, -v.z)
}

/// The four corners of one edge of a panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCorners {
    pub front_top: Vec3,
    pub front_bottom: Vec3,
    pub back_top: Vec3,
    pub back_bottom: Vec3,
}

impl EdgeCorners {
    fn map(self, f: impl Fn(Vec3) -> Vec3) -> Self {
        Self {
            front_top: f(self.front_top),
            front_bottom: f(self.front_bottom),
            back_top: f(self.back_top),
            back_bottom: f(self.back_bottom),
        }
    }

    fn shift_front(&mut self, offset: Vec3) {
        self.front_top += offset;
        self.front_bottom += offset;
    }

    fn shift_back(&mut self, offset: Vec3) {
        self.back_top += offset;
        self.back_bottom += offset;
    }

    pub fn as_array(&self) -> [Vec3; 4] {
        [self.front_top, self.front_bottom, self.back_top, self.back_bottom]
    }
}

#[derive(Clone, Debug)]
pub struct WingPanel {
    slot: PanelSlot,
    root: EdgeCorners,
    tip: EdgeCorners,
    mount: Vec3,
    revision: u64,
}

impl WingPanel {
    // Quads over `corners()`: root 0..4, tip 4..8, each edge ordered
    // front_top, front_bottom, back_top, back_bottom
    pub const FACES: [[usize; 4]; 6] = [
        [0, 4, 6, 2], // top
        [1, 3, 7, 5], // bottom
        [0, 1, 5, 4], // front
        [2, 6, 7, 3], // back
        [0, 2, 3, 1], // root
        [4, 5, 7, 6], // tip
    ];

    // Build a left panel in its rest shape
    fn left(slot: PanelSlot) -> Self {
        let kind = slot.kind();
        let (size, mount) = match kind {
            WingKind::Fore => (vec3(2.2, 0.15, 5.0), vec3(-0.5, -0.3, 3.4)),
            WingKind::Hind => (vec3(1.5, 0.15, 3.75), vec3(1.3, -0.4, 2.775)),
        };
        let half = size * 0.5;
        let edge = |z: f32| EdgeCorners {
            front_top: vec3(-half.x, half.y, z),
            front_bottom: vec3(-half.x, -half.y, z),
            back_top: vec3(half.x, half.y, z),
            back_bottom: vec3(half.x, -half.y, z),
        };

        let (sin, cos) = PANEL_TILT.sin_cos();
        let tilt = |v: Vec3| vec3(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos);

        let root = edge(-half.z).map(tilt);
        let mut tip = edge(half.z).map(tilt);

        // Sweep the outer edge into a wing outline
        match kind {
            WingKind::Fore => {
                tip.shift_front(vec3(-2.5, 0.0, 2.5));
                tip.shift_back(vec3(1.5, 0.0, 0.0));
            }
            WingKind::Hind => {
                tip.shift_front(vec3(1.0, 0.0, 1.25));
                tip.shift_back(vec3(4.5, 0.0, -1.5));
            }
        }

        Self {
            slot,
            root,
            tip,
            mount,
            revision: 0,
        }
    }

    fn mirrored(&self, slot: PanelSlot) -> Self {
        Self {
            slot,
            root: self.root.map(mirror),
            tip: self.tip.map(mirror),
            mount: mirror(self.mount),
            revision: self.revision,
        }
    }

    pub fn slot(&self) -> PanelSlot {
        self.slot
    }

    pub fn root(&self) -> &EdgeCorners {
        &self.root
    }

    pub fn tip(&self) -> &EdgeCorners {
        &self.tip
    }

    // Rest attachment point of the panel in the body frame
    pub fn mount(&self) -> Vec3 {
        self.mount
    }

    // Bumped every time the tip corners are rewritten
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let r = &self.root;
        let t = &self.tip;
        [
            r.front_top,
            r.front_bottom,
            r.back_top,
            r.back_bottom,
            t.front_top,
            t.front_bottom,
            t.back_top,
            t.back_bottom,
        ]
    }

    fn set_tip_heights(&mut self, front_top: f32, back_top: f32) {
        self.tip.front_top.y = front_top;
        self.tip.front_bottom.y = front_top - TIP_THICKNESS;
        self.tip.back_top.y = back_top;
        self.tip.back_bottom.y = back_top - TIP_THICKNESS;
    }

    fn set_tip_spans(&mut self, front: f32, back: f32) {
        self.tip.front_top.z = front;
        self.tip.front_bottom.z = front;
        self.tip.back_top.z = back;
        self.tip.back_bottom.z = back;
    }

    fn copy_mirrored_tip(&mut self, source: &WingPanel) {
        self.tip = source.tip.map(mirror);
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[derive(Clone, Debug)]
pub struct WingKinematics {
    fore_left: WingPanel,
    hind_left: WingPanel,
    fore_right: WingPanel,
    hind_right: WingPanel,
}

impl Default for WingKinematics {
    fn default() -> Self {
        Self::new()
    }
}

impl WingKinematics {
    pub fn new() -> Self {
        let fore_left = WingPanel::left(PanelSlot::ForeLeft);
        let hind_left = WingPanel::left(PanelSlot::HindLeft);
        let fore_right = fore_left.mirrored(PanelSlot::ForeRight);
        let hind_right = hind_left.mirrored(PanelSlot::HindRight);

        Self {
            fore_left,
            hind_left,
            fore_right,
            hind_right,
        }
    }

    pub fn panel(&self, slot: PanelSlot) -> &WingPanel {
        match slot {
            PanelSlot::ForeLeft => &self.fore_left,
            PanelSlot::HindLeft => &self.hind_left,
            PanelSlot::ForeRight => &self.fore_right,
            PanelSlot::HindRight => &self.hind_right,
        }
    }

    pub fn panels(&self) -> [&WingPanel; 4] {
        [&self.fore_left, &self.hind_left, &self.fore_right, &self.hind_right]
    }

    // Recompute the free corners for a phase value
    pub fn update(&mut self, phase: f32) {
        self.apply(&WingSignals::from_phase(phase));
    }

    pub fn apply(&mut self, s: &WingSignals) {
        // Span-wise flutter, phase-delayed from the stroke
        self.fore_left.set_tip_spans(
            s.lag_horizontal_fore + FORE_FRONT_SPAN,
            s.horizontal_fore * FORE_BACK_SPAN_AMPLITUDE + FORE_BACK_SPAN,
        );
        self.hind_left.set_tip_spans(
            s.lag_horizontal_hind + HIND_FRONT_SPAN,
            s.horizontal_hind + HIND_BACK_SPAN,
        );

        // Up/down stroke; the downstroke half of each signal moves faster
        let fore_front =
            -asymmetric(s.vertical_fore, FORE_FRONT_STROKE.0, FORE_FRONT_STROKE.1);
        let fore_back = -asymmetric(s.lag_vertical_fore, FORE_BACK_STROKE.0, FORE_BACK_STROKE.1)
            + FORE_BACK_LIFT;
        let hind_front = fore_back - HIND_FRONT_DROP;
        let hind_back = -asymmetric(s.lag_vertical_hind, HIND_BACK_STROKE.0, HIND_BACK_STROKE.1);

        self.fore_left.set_tip_heights(fore_front, fore_back);
        self.hind_left.set_tip_heights(hind_front, hind_back);

        self.fore_right.copy_mirrored_tip(&self.fore_left);
        self.hind_right.copy_mirrored_tip(&self.hind_left);

        self.fore_left.touch();
        self.hind_left.touch();
        self.fore_right.touch();
        self.hind_right.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_mirrored(left: &WingPanel, right: &WingPanel) {
        for (l, r) in left.corners().iter().zip(right.corners().iter()) {
            assert_eq!(r.x, l.x);
            assert_eq!(r.y, l.y);
            assert_eq!(r.z, -l.z);
        }
    }

    #[test]
    fn rest_shape_is_mirrored() {
        let wings = WingKinematics::new();
        assert_mirrored(wings.panel(PanelSlot::ForeLeft), wings.panel(PanelSlot::ForeRight));
        assert_mirrored(wings.panel(PanelSlot::HindLeft), wings.panel(PanelSlot::HindRight));
        assert_eq!(wings.panel(PanelSlot::ForeRight).mount(), vec3(-0.5, -0.3, -3.4));
    }

    #[test]
    fn panels_know_their_slot() {
        let wings = WingKinematics::new();
        for slot in PanelSlot::ALL {
            assert_eq!(wings.panel(slot).slot(), slot);
        }
        assert_eq!(PanelSlot::HindRight.kind(), WingKind::Hind);
        // Fore panels are longer span-wise than hind panels
        let fore = wings.panel(PanelSlot::ForeLeft);
        let hind = wings.panel(PanelSlot::HindLeft);
        assert!(fore.tip().front_top.z - fore.root().front_top.z > hind.tip().front_top.z - hind.root().front_top.z);
    }

    #[test]
    fn left_tips_sit_outboard_of_roots() {
        let wings = WingKinematics::new();
        let fore = wings.panel(PanelSlot::ForeLeft);
        assert!(fore.tip().front_top.z > fore.root().front_top.z);
        assert!(fore.tip().front_top.x < fore.root().front_top.x);
    }

    #[test]
    fn mirror_holds_after_updates() {
        let mut wings = WingKinematics::new();
        let mut phase = 0.0;
        for _ in 0..200 {
            phase += 0.07;
            wings.update(phase);
            assert_mirrored(wings.panel(PanelSlot::ForeLeft), wings.panel(PanelSlot::ForeRight));
            assert_mirrored(wings.panel(PanelSlot::HindLeft), wings.panel(PanelSlot::HindRight));
        }
    }

    #[test]
    fn roots_never_move() {
        let mut wings = WingKinematics::new();
        let rest: Vec<EdgeCorners> = PanelSlot::ALL.iter().map(|&s| *wings.panel(s).root()).collect();
        for i in 0..100 {
            wings.update(i as f32 * 0.31);
        }
        for (slot, root) in PanelSlot::ALL.iter().zip(rest.iter()) {
            assert_eq!(wings.panel(*slot).root(), root);
        }
    }

    #[test]
    fn tip_longitudinal_coordinate_is_kept() {
        let mut wings = WingKinematics::new();
        let before = wings.panel(PanelSlot::HindLeft).tip().back_top.x;
        wings.update(2.0);
        assert_eq!(wings.panel(PanelSlot::HindLeft).tip().back_top.x, before);
    }

    #[test]
    fn downstroke_and_upstroke_use_different_scales() {
        let mut wings = WingKinematics::new();

        wings.update(FRAC_PI_2);
        let down = wings.panel(PanelSlot::ForeLeft).tip().front_top.y;
        assert!((down + 2.5).abs() < 1.0e-5);

        wings.update(3.0 * FRAC_PI_2);
        let up = wings.panel(PanelSlot::ForeLeft).tip().front_top.y;
        assert!((up - 3.0).abs() < 1.0e-5);
    }

    #[test]
    fn zero_crossings_stay_finite() {
        let mut wings = WingKinematics::new();
        for &phase in &[0.0, PI, 1.0, 1.0 + PI / 32.0, 2.0 * PI] {
            wings.update(phase);
            for panel in wings.panels() {
                for corner in panel.corners() {
                    assert!(corner.x.is_finite() && corner.y.is_finite() && corner.z.is_finite());
                }
            }
        }
    }

    #[test]
    fn bottom_faces_follow_top_faces() {
        let mut wings = WingKinematics::new();
        wings.update(0.9);
        for panel in wings.panels() {
            let tip = panel.tip();
            assert!((tip.front_top.y - tip.front_bottom.y - TIP_THICKNESS).abs() < 1.0e-6);
            assert!((tip.back_top.y - tip.back_bottom.y - TIP_THICKNESS).abs() < 1.0e-6);
        }
    }

    #[test]
    fn hind_front_trails_fore_back() {
        let mut wings = WingKinematics::new();
        wings.update(4.2);
        let fore_back = wings.panel(PanelSlot::ForeLeft).tip().back_top.y;
        let hind_front = wings.panel(PanelSlot::HindLeft).tip().front_top.y;
        assert!((fore_back - hind_front - HIND_FRONT_DROP).abs() < 1.0e-6);
    }

    #[test]
    fn every_update_bumps_revision() {
        let mut wings = WingKinematics::new();
        assert_eq!(wings.panel(PanelSlot::HindRight).revision(), 0);
        wings.update(0.1);
        wings.update(0.2);
        for panel in wings.panels() {
            assert_eq!(panel.revision(), 2);
        }
    }
}
