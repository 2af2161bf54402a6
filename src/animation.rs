//! Animation drivers for group transformations.
//!
//! Each driver owns one group node. Advancing it by a time step produces a
//! new [`Transformation`] that replaces the group's transform wholesale;
//! nothing else in the graph is touched. Time steps are in milliseconds.
//!
//! | Driver | Motion |
//! |--------|--------|
//! | [`RotationAnimator`] | spins about one axis at one radian per second |
//! | [`JumperAnimator`] | bounces between `±magnitude` along its axes |
//! | [`DriverAnimator`] | moves in the xy plane while steering keys are held |
//! | [`FreeFlightAnimator`] | moves and turns in its own frame |
//! | [`SlerpAnimator`] | swings between two orientations |
//!
//! # Example
//!
//! ```
//! use twinpass::animation::{Animator, RotationAnimator};
//! use twinpass::math::Axes;
//! use twinpass::scene::SceneGraph;
//! use twinpass::transform::Transformation;
//! use glam::Vec3;
//!
//! let mut graph = SceneGraph::default();
//! let spinner = graph.add_group(graph.root(), Transformation::rotation(Axes::Y, Vec3::ZERO))?;
//!
//! let mut spin = RotationAnimator::new(&graph, spinner, Axes::Y)?;
//! spin.simulate(500.0, &mut graph)?;
//! assert_eq!(graph.transform(spinner)?.angles(), Some(Vec3::new(0.0, 0.5, 0.0)));
//! # Ok::<(), twinpass::scene::SceneError>(())
//! ```

use glam::{Vec2, Vec3};
use log::warn;

use crate::math::Axes;
use crate::quaternion::Quaternion;
use crate::scene::{NodeId, SceneError, SceneGraph};
use crate::transform::{TransformError, TransformKind, Transformation};

/// Milliseconds per radian of rotation.
const TURN_RATE: f32 = 1000.0;
/// Milliseconds per unit of jumper travel.
const JUMP_RATE: f32 = 250.0;
/// Milliseconds per unit of steered travel.
const DRIVE_RATE: f32 = 500.0;

/// A time-driven producer of group transformations.
pub trait Animator {
    /// The group node this driver writes to.
    fn group(&self) -> NodeId;

    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    fn toggle_active(&mut self) {
        let active = self.is_active();
        self.set_active(!active);
    }

    /// Advance internal state by `dt_ms` and return the group's new
    /// transformation, or `None` when it is unchanged.
    fn advance(&mut self, dt_ms: f32) -> Option<Transformation>;

    /// Advance while active and write the result into `graph`.
    fn simulate(&mut self, dt_ms: f32, graph: &mut SceneGraph) -> Result<(), SceneError> {
        if !self.is_active() {
            return Ok(());
        }
        match self.advance(dt_ms) {
            Some(transform) => graph.set_transform(self.group(), transform),
            None => Ok(()),
        }
    }
}

/// Spins a group about a single axis.
#[derive(Clone, Debug)]
pub struct RotationAnimator {
    group: NodeId,
    active: bool,
    axis: Axes,
    angle: f32,
}

impl RotationAnimator {
    /// Drive `group` about `axis`, starting from the group's current angle
    /// about that axis when it already holds a rotation.
    ///
    /// Only the first of x, y and z set in `axis` is used.
    pub fn new(graph: &SceneGraph, group: NodeId, axis: Axes) -> Result<Self, SceneError> {
        let axis = single_axis(axis);
        let angles = graph.transform(group)?.angles().unwrap_or(Vec3::ZERO);
        Ok(Self {
            group,
            active: true,
            axis,
            angle: (angles * axes_mask(axis)).element_sum(),
        })
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl Animator for RotationAnimator {
    fn group(&self) -> NodeId {
        self.group
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn advance(&mut self, dt_ms: f32) -> Option<Transformation> {
        if self.axis.is_empty() {
            return None;
        }
        self.angle += dt_ms / TURN_RATE;
        Some(Transformation::rotation(
            self.axis,
            axes_mask(self.axis) * self.angle,
        ))
    }
}

/// Bounces a group back and forth along its axes.
#[derive(Clone, Debug)]
pub struct JumperAnimator {
    group: NodeId,
    active: bool,
    axis: Axes,
    magnitude: f32,
    offset: f32,
    direction: f32,
}

impl JumperAnimator {
    /// Drive `group` between `-magnitude` and `magnitude` along `axis`,
    /// starting from the group's current translation on the first axis set.
    pub fn new(
        graph: &SceneGraph,
        group: NodeId,
        axis: Axes,
        magnitude: f32,
    ) -> Result<Self, SceneError> {
        let start = graph.transform(group)?.translation_part();
        let offset = if axis.x {
            start.x
        } else if axis.y {
            start.y
        } else if axis.z {
            start.z
        } else {
            0.0
        };
        Ok(Self {
            group,
            active: true,
            axis,
            magnitude: magnitude.abs(),
            offset,
            direction: 1.0,
        })
    }

    pub fn axis(&self) -> Axes {
        self.axis
    }

    /// Jump along different axes from the current offset on.
    pub fn set_axis(&mut self, axis: Axes) {
        self.axis = axis;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }
}

impl Animator for JumperAnimator {
    fn group(&self) -> NodeId {
        self.group
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn advance(&mut self, dt_ms: f32) -> Option<Transformation> {
        if self.offset >= self.magnitude {
            self.direction = -1.0;
            self.offset = self.magnitude;
        } else if self.offset <= -self.magnitude {
            self.direction = 1.0;
            self.offset = -self.magnitude;
        }

        // A single step never travels further than the full amplitude.
        let step = if self.magnitude > 0.0 {
            (dt_ms / JUMP_RATE) % self.magnitude
        } else {
            0.0
        };
        self.offset += self.direction * step;

        Some(Transformation::translation(
            axes_mask(self.axis) * self.offset,
        ))
    }
}

/// Direction keys for steered drivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steer {
    Right,
    Left,
    Up,
    Down,
    Forward,
    Back,
}

/// Held state of each [`Steer`] direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SteerState {
    right: bool,
    left: bool,
    up: bool,
    down: bool,
    forward: bool,
    back: bool,
}

impl SteerState {
    fn set(&mut self, steer: Steer, held: bool) {
        match steer {
            Steer::Right => self.right = held,
            Steer::Left => self.left = held,
            Steer::Up => self.up = held,
            Steer::Down => self.down = held,
            Steer::Forward => self.forward = held,
            Steer::Back => self.back = held,
        }
    }

    /// Unit offsets per axis. Right, up and back win over their opposites.
    fn direction(&self) -> Vec3 {
        fn axis(positive: bool, negative: bool) -> f32 {
            if positive {
                1.0
            } else if negative {
                -1.0
            } else {
                0.0
            }
        }
        Vec3::new(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.back, self.forward),
        )
    }
}

/// Moves a group in the xy plane while steering keys are held.
#[derive(Clone, Debug)]
pub struct DriverAnimator {
    group: NodeId,
    active: bool,
    steer: SteerState,
    offset: Vec2,
}

impl DriverAnimator {
    /// Drive `group`, starting from its current x and y translation.
    pub fn new(graph: &SceneGraph, group: NodeId) -> Result<Self, SceneError> {
        let start = graph.transform(group)?.translation_part();
        Ok(Self {
            group,
            active: true,
            steer: SteerState::default(),
            offset: start.truncate(),
        })
    }

    /// Press or release a direction. Forward and back are ignored.
    pub fn steer(&mut self, steer: Steer, held: bool) {
        self.steer.set(steer, held);
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

impl Animator for DriverAnimator {
    fn group(&self) -> NodeId {
        self.group
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn advance(&mut self, dt_ms: f32) -> Option<Transformation> {
        self.offset += self.steer.direction().truncate() * (dt_ms / DRIVE_RATE);
        Some(Transformation::translation(self.offset.extend(0.0)))
    }
}

/// Moves and turns a group in its own frame, like a camera rig.
///
/// Motion accumulates into a free-flight transform: each step appends a
/// translation and then a rotation about the rig's x and y axes.
#[derive(Clone, Debug)]
pub struct FreeFlightAnimator {
    group: NodeId,
    active: bool,
    steer: SteerState,
    turn: Vec2,
    current: Transformation,
}

impl FreeFlightAnimator {
    /// Fly `group` starting from its current transformation.
    pub fn new(graph: &SceneGraph, group: NodeId) -> Result<Self, SceneError> {
        let start = graph.transform(group)?;
        Ok(Self {
            group,
            active: true,
            steer: SteerState::default(),
            turn: Vec2::ZERO,
            current: Transformation::free_flight(start.matrix(), start.inverse()),
        })
    }

    pub fn steer(&mut self, steer: Steer, held: bool) {
        self.steer.set(steer, held);
    }

    /// Turn rates about the rig's x and y axes, each clamped to `[-1, 1]`.
    /// Positive values turn clockwise when looking down the axis.
    pub fn set_turn(&mut self, turn: Vec2) {
        self.turn = turn.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }
}

impl Animator for FreeFlightAnimator {
    fn group(&self) -> NodeId {
        self.group
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn advance(&mut self, dt_ms: f32) -> Option<Transformation> {
        let offset = self.steer.direction() * (dt_ms / DRIVE_RATE);
        let angles = -self.turn * (dt_ms / TURN_RATE);

        let mut next = self.current;
        if offset != Vec3::ZERO {
            next = next.translated(offset);
        }
        if angles != Vec2::ZERO {
            next = next.rotated(Axes::XY, angles.extend(0.0));
        }
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}

/// Swings a group back and forth between two orientations.
#[derive(Clone, Debug)]
pub struct SlerpAnimator {
    group: NodeId,
    active: bool,
    from: Quaternion,
    to: Quaternion,
    period_ms: f32,
    elapsed_ms: f32,
}

impl SlerpAnimator {
    /// One full swing from `from` to `to` and back takes `period_ms`.
    ///
    /// The group's scale and translation are kept.
    pub fn new(
        graph: &SceneGraph,
        group: NodeId,
        from: Quaternion,
        to: Quaternion,
        period_ms: f32,
    ) -> Result<Self, SceneError> {
        graph.transform(group)?;
        Ok(Self {
            group,
            active: true,
            from,
            to,
            period_ms: period_ms.abs().max(f32::EPSILON),
            elapsed_ms: 0.0,
        })
    }

    /// Interpolation parameter of the current orientation, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        let phase = (self.elapsed_ms / self.period_ms).fract();
        1.0 - (2.0 * phase - 1.0).abs()
    }

    /// Apply one step on top of `current`, the group's present transform.
    pub fn step(
        &mut self,
        dt_ms: f32,
        current: &Transformation,
    ) -> Result<Transformation, TransformError> {
        self.elapsed_ms = (self.elapsed_ms + dt_ms) % self.period_ms;
        let rotation = self.from.slerp(self.to, self.progress());
        match current.kind() {
            TransformKind::Sqt {
                scale, translation, ..
            } => Transformation::sqt(scale, rotation, translation),
            _ => Transformation::sqt(Vec3::ONE, rotation, current.translation_part()),
        }
    }
}

impl Animator for SlerpAnimator {
    fn group(&self) -> NodeId {
        self.group
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn advance(&mut self, dt_ms: f32) -> Option<Transformation> {
        self.step(dt_ms, &Transformation::identity()).ok()
    }

    fn simulate(&mut self, dt_ms: f32, graph: &mut SceneGraph) -> Result<(), SceneError> {
        if !self.active {
            return Ok(());
        }
        let current = graph.transform(self.group)?;
        match self.step(dt_ms, &current) {
            Ok(next) => graph.set_transform(self.group, next),
            Err(e) => {
                warn!("{} keeps its transform: {e}", self.group);
                Ok(())
            }
        }
    }
}

/// The first of x, y and z set in `axes`.
fn single_axis(axes: Axes) -> Axes {
    if axes.x {
        Axes::X
    } else if axes.y {
        Axes::Y
    } else if axes.z {
        Axes::Z
    } else {
        Axes::NONE
    }
}

fn axes_mask(axes: Axes) -> Vec3 {
    Vec3::new(
        f32::from(u8::from(axes.x)),
        f32::from(u8::from(axes.y)),
        f32::from(u8::from(axes.z)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Mat4;
    use std::f32::consts::FRAC_PI_2;

    fn graph_with(transform: Transformation) -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::default();
        let group = graph.add_group(graph.root(), transform).unwrap();
        (graph, group)
    }

    #[test]
    fn rotation_resumes_from_current_angle() {
        let (mut graph, group) =
            graph_with(Transformation::rotation(Axes::Z, Vec3::new(0.0, 0.0, 1.0)));
        let mut spin = RotationAnimator::new(&graph, group, Axes::Z).unwrap();
        assert_eq!(spin.angle(), 1.0);

        spin.simulate(250.0, &mut graph).unwrap();
        let t = graph.transform(group).unwrap();
        assert_eq!(t.angles(), Some(Vec3::new(0.0, 0.0, 1.25)));
    }

    #[test]
    fn inactive_drivers_leave_the_graph_alone() {
        let (mut graph, group) = graph_with(Transformation::rotation(Axes::X, Vec3::ZERO));
        let before = graph.transform(group).unwrap();
        let mut spin = RotationAnimator::new(&graph, group, Axes::X).unwrap();
        spin.toggle_active();

        spin.simulate(1000.0, &mut graph).unwrap();
        assert_eq!(graph.transform(group).unwrap(), before);
        assert_eq!(spin.angle(), 0.0);
    }

    #[test]
    fn jumper_turns_around_at_the_magnitude() {
        let (mut graph, group) = graph_with(Transformation::translation(Vec3::ZERO));
        let mut jumper = JumperAnimator::new(&graph, group, Axes::Y, 2.0).unwrap();

        for _ in 0..4 {
            jumper.simulate(150.0, &mut graph).unwrap();
        }
        // 4 steps of 0.6 reach 2.4, past the top.
        assert_relative_eq!(jumper.offset(), 2.4, epsilon = 1e-5);
        jumper.simulate(150.0, &mut graph).unwrap();
        assert_relative_eq!(jumper.offset(), 1.4, epsilon = 1e-5);

        let t = graph.transform(group).unwrap().translation_part();
        assert!(t.abs_diff_eq(Vec3::new(0.0, 1.4, 0.0), 1e-5));
    }

    #[test]
    fn jumper_stays_within_bounds_over_time() {
        let (mut graph, group) = graph_with(Transformation::translation(Vec3::ZERO));
        let mut jumper = JumperAnimator::new(&graph, group, Axes::X, 1.0).unwrap();
        for _ in 0..200 {
            jumper.simulate(33.0, &mut graph).unwrap();
            assert!(jumper.offset().abs() <= 1.0 + 33.0 / JUMP_RATE);
        }
    }

    #[test]
    fn jumper_axis_can_change() {
        let (mut graph, group) = graph_with(Transformation::translation(Vec3::ZERO));
        let mut jumper = JumperAnimator::new(&graph, group, Axes::Y, 2.0).unwrap();
        jumper.set_axis(Axes::Z);
        jumper.simulate(250.0, &mut graph).unwrap();
        let t = graph.transform(group).unwrap().translation_part();
        assert!(t.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn driver_moves_while_keys_are_held() {
        let (mut graph, group) = graph_with(Transformation::translation(Vec3::new(1.0, 2.0, 3.0)));
        let mut driver = DriverAnimator::new(&graph, group).unwrap();

        driver.steer(Steer::Left, true);
        driver.steer(Steer::Up, true);
        driver.simulate(500.0, &mut graph).unwrap();
        assert_eq!(driver.offset(), Vec2::new(0.0, 3.0));

        driver.steer(Steer::Up, false);
        driver.simulate(250.0, &mut graph).unwrap();
        let t = graph.transform(group).unwrap().translation_part();
        assert_eq!(t, Vec3::new(-0.5, 3.0, 0.0));
    }

    #[test]
    fn free_flight_moves_in_its_own_frame() {
        let (mut graph, group) = graph_with(Transformation::rotation(
            Axes::Y,
            Vec3::new(0.0, FRAC_PI_2, 0.0),
        ));
        let mut flight = FreeFlightAnimator::new(&graph, group).unwrap();

        flight.steer(Steer::Forward, true);
        flight.simulate(500.0, &mut graph).unwrap();

        let t = graph.transform(group).unwrap();
        assert!(matches!(t.kind(), TransformKind::FreeFlight));
        // Local -z is world -x after a quarter turn about y.
        assert!(t.translation_part().abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5));
        assert!((t.matrix() * t.inverse()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn free_flight_without_input_changes_nothing() {
        let (mut graph, group) = graph_with(Transformation::translation(Vec3::X));
        let mut flight = FreeFlightAnimator::new(&graph, group).unwrap();
        assert!(flight.advance(16.0).is_none());

        flight.set_turn(Vec2::new(0.0, 3.0));
        flight.simulate(1000.0, &mut graph).unwrap();
        let t = graph.transform(group).unwrap();
        // Clamped to one radian per second, turning clockwise about y.
        let forward = t.matrix().transform_vector3(Vec3::NEG_Z);
        assert!(forward.abs_diff_eq(Vec3::new(1.0f32.sin(), 0.0, -1.0f32.cos()), 1e-5));
    }

    #[test]
    fn slerp_swings_between_endpoints() {
        let (mut graph, group) = graph_with(Transformation::translation(Vec3::new(0.0, 0.0, -5.0)));
        let to = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        let mut swing =
            SlerpAnimator::new(&graph, group, Quaternion::IDENTITY, to, 1000.0).unwrap();

        swing.simulate(500.0, &mut graph).unwrap();
        assert_relative_eq!(swing.progress(), 1.0, epsilon = 1e-5);
        let t = graph.transform(group).unwrap();
        assert!(t.translation_part().abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
        assert!(
            t.matrix()
                .transform_vector3(Vec3::Z)
                .abs_diff_eq(Vec3::X, 1e-5)
        );

        swing.simulate(500.0, &mut graph).unwrap();
        assert_relative_eq!(swing.progress(), 0.0, epsilon = 1e-5);
        let t = graph.transform(group).unwrap();
        assert!(t.matrix().transform_vector3(Vec3::Z).abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn drivers_reject_non_group_targets() {
        let mut graph = SceneGraph::default();
        let light = graph.add_child(graph.root(), crate::scene::Node::Light).unwrap();
        assert!(matches!(
            RotationAnimator::new(&graph, light, Axes::Y),
            Err(SceneError::NotAGroup(_))
        ));
    }
}
