//! Turtle state and symbol classes for plant interpretation.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// One of the three rotation accumulators of the turtle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// The pose of the plant turtle.
///
/// Orientation is kept as three independent Euler accumulators in degrees and
/// only converted to a quaternion when a direction is needed, so repeated
/// turns never accumulate drift in a stored matrix. The type is `Copy`: the
/// branch stack stores snapshots, never references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current world-space position of the cursor.
    pub position: Vec3,

    /// Accumulated rotation about X, Y and Z, in degrees.
    pub rotation: Vec3,
}

impl TurtleState {
    /// Direction in which segments grow when the rotation is zero.
    pub const GROWTH_AXIS: Vec3 = Vec3::Y;

    /// Converts the accumulated angles into a world-space orientation.
    ///
    /// Rotations apply X first, then Y, then Z.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.rotation.z.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
        )
    }

    /// Returns the turtle's growth direction in world space.
    pub fn heading(&self) -> Vec3 {
        self.orientation() * Self::GROWTH_AXIS
    }

    /// Position reached by advancing `length` along the current heading.
    pub fn advanced(&self, length: f32) -> Vec3 {
        self.position + self.heading() * length
    }

    /// Adds `degrees` to the accumulator of `axis`.
    pub fn rotate(&mut self, axis: Axis, degrees: f32) {
        self.rotation[axis.index()] += degrees;
    }
}

/// Operations the plant turtle performs for a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlantOp {
    /// Draw a segment and move to its end (`F`, `f` and other letters).
    Move,
    /// Add `sign * angle` to one rotation accumulator.
    Rotate { axis: Axis, sign: f32 },
    /// Turn 180 degrees about X (`*`).
    Flip,
    /// Save the turtle state (`[`).
    Push,
    /// Restore the most recently pushed state (`]`).
    Pop,
    /// Place a leaf at the current pose (`L`).
    Leaf,
    /// Place a blossom at the current pose (`B`).
    Blossom,
    /// No-op, the symbol has no meaning for the turtle.
    Ignore,
}

/// The reserved alphabet and its operations.
pub const STANDARD_SYMBOLS: [(char, PlantOp); 13] = [
    ('F', PlantOp::Move),
    ('f', PlantOp::Move),
    ('L', PlantOp::Leaf),
    ('B', PlantOp::Blossom),
    // Yaw
    ('+', PlantOp::Rotate { axis: Axis::X, sign: 1.0 }),
    ('-', PlantOp::Rotate { axis: Axis::X, sign: -1.0 }),
    // Roll
    ('&', PlantOp::Rotate { axis: Axis::Z, sign: 1.0 }),
    ('^', PlantOp::Rotate { axis: Axis::Z, sign: -1.0 }),
    // Pitch
    ('<', PlantOp::Rotate { axis: Axis::Y, sign: 1.0 }),
    ('>', PlantOp::Rotate { axis: Axis::Y, sign: -1.0 }),
    ('*', PlantOp::Flip),
    ('[', PlantOp::Push),
    (']', PlantOp::Pop),
];

impl PlantOp {
    /// Operation for a symbol that has no explicit binding.
    ///
    /// Letters move forward; anything else is ignored.
    pub fn classify(sym: char) -> PlantOp {
        if sym.is_alphabetic() {
            PlantOp::Move
        } else {
            PlantOp::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rotation_grows_up() {
        let t = TurtleState::default();
        assert!(t.heading().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(t.advanced(2.0).abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn rotation_about_x_tilts_towards_z() {
        let mut t = TurtleState::default();
        t.rotate(Axis::X, 90.0);
        assert!(t.heading().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn rotation_about_z_tilts_towards_negative_x() {
        let mut t = TurtleState::default();
        t.rotate(Axis::Z, 90.0);
        assert!(t.heading().abs_diff_eq(Vec3::NEG_X, 1e-6));
    }

    #[test]
    fn rotation_about_y_keeps_heading() {
        let mut t = TurtleState::default();
        t.rotate(Axis::Y, 45.0);
        assert!(t.heading().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn x_is_applied_before_z() {
        let mut t = TurtleState::default();
        t.rotate(Axis::X, 90.0);
        t.rotate(Axis::Z, 90.0);
        // +Y -> (X 90) +Z -> (Z 90) +Z
        assert!(t.heading().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn unbound_letters_move() {
        assert_eq!(PlantOp::classify('S'), PlantOp::Move);
        assert_eq!(PlantOp::classify('x'), PlantOp::Move);
        assert_eq!(PlantOp::classify('7'), PlantOp::Ignore);
        assert_eq!(PlantOp::classify(' '), PlantOp::Ignore);
    }
}
