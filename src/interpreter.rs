//! Interpreter that turns an L-System symbol sequence into placement events.
//!
//! The entry point is [`PlantInterpreter`]. Configure it with [`GeometryParams`],
//! optionally rebind symbols via [`PlantInterpreter::set_op`], then either pull
//! events lazily with [`PlantInterpreter::interpret`] or push them into a
//! [`PlacementSink`] with [`PlantInterpreter::drive`].

use crate::blueprint::{
    Decoration, Placement, PlacementEvent, PlacementSink, PlantSkeleton, SegmentPlacement,
};
use crate::error::PlantError;
use crate::turtle::{Axis, PlantOp, STANDARD_SYMBOLS, TurtleState};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::Enumerate;
use std::str::Chars;
use std::time::Duration;
use tracing::{trace, warn};

/// Leaf size relative to the base segment radius.
const LEAF_SCALE: f32 = 0.5;
/// Per-level shrink applied to leaves.
const LEAF_FALLOFF: f32 = 0.85;
/// Per-level shrink applied to blossoms.
const BLOSSOM_FALLOFF: f32 = 0.95;

/// Geometry parameters for turtle interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    /// Rotation increment in degrees for every turn symbol.
    pub angle: f32,
    /// Segment length at branch level 0.
    pub length: f32,
    /// Segment radius at branch level 0.
    pub radius: f32,
    /// Radial subdivisions handed to the mesh builder.
    pub subdivisions: u32,
    /// Length multiplier per branch level, in `(0, 1]`.
    pub length_attenuation: f32,
    /// Radius multiplier per branch level, in `(0, 1]`.
    pub radius_attenuation: f32,
    /// Pause between events in [`PlantInterpreter::drive`], in seconds.
    pub step_delay_secs: f32,
    /// Maximum nesting depth for push operations.
    pub max_branch_depth: usize,
    /// Treat branches still open at the end of the sequence as an error.
    pub require_balanced: bool,
    /// Seed for the small random twist added to each leaf. `None` disables it.
    pub leaf_twist_seed: Option<u64>,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            angle: 25.2,
            length: 1.2,
            radius: 0.2,
            subdivisions: 5,
            length_attenuation: 0.95,
            radius_attenuation: 0.85,
            step_delay_secs: 0.0,
            max_branch_depth: 1024,
            require_balanced: false,
            leaf_twist_seed: None,
        }
    }
}

impl GeometryParams {
    pub fn validate(&self) -> Result<(), PlantError> {
        if !self.angle.is_finite() {
            return Err(PlantError::invalid_geometry("angle", "must be finite"));
        }
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(PlantError::invalid_geometry(
                "length",
                format!("must be positive, got {}", self.length),
            ));
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(PlantError::invalid_geometry(
                "radius",
                format!("must be non-negative, got {}", self.radius),
            ));
        }
        if self.subdivisions < 3 {
            return Err(PlantError::invalid_geometry(
                "subdivisions",
                format!("must be at least 3, got {}", self.subdivisions),
            ));
        }
        for (field, value) in [
            ("length_attenuation", self.length_attenuation),
            ("radius_attenuation", self.radius_attenuation),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(PlantError::invalid_geometry(
                    field,
                    format!("must be in (0, 1], got {value}"),
                ));
            }
        }
        self.step_delay()?;
        Ok(())
    }

    /// The pause between events as a [`Duration`].
    ///
    /// Fails for negative, non-finite or unrepresentably large values.
    pub fn step_delay(&self) -> Result<Duration, PlantError> {
        Duration::try_from_secs_f32(self.step_delay_secs).map_err(|e| {
            PlantError::invalid_geometry(
                "step_delay_secs",
                format!("must be a non-negative duration, got {}: {e}", self.step_delay_secs),
            )
        })
    }

    /// Segment length at `level`: compounds once per level, not per step.
    pub fn length_at(&self, level: usize) -> f32 {
        self.length * self.length_attenuation.powi(level as i32)
    }

    /// Segment radius at `level`.
    pub fn radius_at(&self, level: usize) -> f32 {
        self.radius * self.radius_attenuation.powi(level as i32)
    }

    pub fn leaf_scale_at(&self, level: usize) -> f32 {
        self.radius * LEAF_SCALE * LEAF_FALLOFF.powi(level as i32 + 1)
    }

    pub fn blossom_scale_at(&self, level: usize) -> f32 {
        self.radius * BLOSSOM_FALLOFF.powi(level as i32 + 1)
    }
}

/// Interprets L-System output as a stream of plant placements.
#[derive(Clone, Debug)]
pub struct PlantInterpreter {
    op_map: HashMap<char, PlantOp>,
    params: GeometryParams,
}

impl PlantInterpreter {
    /// Creates an interpreter with the standard symbol table.
    ///
    /// Fails with [`PlantError::InvalidGeometry`] if `params` is out of range.
    pub fn new(params: GeometryParams) -> Result<Self, PlantError> {
        params.validate()?;
        let mut interpreter = Self {
            op_map: HashMap::new(),
            params,
        };
        interpreter.populate_standard_symbols();
        Ok(interpreter)
    }

    /// Replaces the entire symbol-to-operation map in one step (builder pattern).
    ///
    /// Letters missing from `map` still move forward, other symbols are ignored.
    pub fn with_map(mut self, map: HashMap<char, PlantOp>) -> Self {
        self.op_map = map;
        self
    }

    /// Assigns a single [`PlantOp`] to a symbol.
    pub fn set_op(&mut self, sym: char, op: PlantOp) {
        self.op_map.insert(sym, op);
    }

    /// Registers the reserved plant alphabet.
    pub fn populate_standard_symbols(&mut self) {
        for (sym, op) in STANDARD_SYMBOLS {
            self.set_op(sym, op);
        }
    }

    pub fn params(&self) -> &GeometryParams {
        &self.params
    }

    /// The operation performed for `sym`.
    pub fn op_for(&self, sym: char) -> PlantOp {
        self.op_map
            .get(&sym)
            .copied()
            .unwrap_or_else(|| PlantOp::classify(sym))
    }

    /// Walks `sequence` lazily, yielding one event per segment, leaf or blossom.
    ///
    /// The turtle starts at the origin with zero rotation and grows along `+Y`.
    /// Iteration stops after the first error.
    ///
    /// # Push / Pop
    ///
    /// `[` stores a copy of the pose at the slot of the current branch level and
    /// enters the next level. `]` leaves the level and restores the stored pose.
    /// A `]` at level 0 yields [`PlantError::UnbalancedStack`].
    pub fn interpret<'a>(&'a self, sequence: &'a str) -> Events<'a> {
        Events {
            interpreter: self,
            symbols: sequence.chars().enumerate(),
            pose: TurtleState::default(),
            branch_stack: Vec::new(),
            segments: 0,
            leaves: 0,
            blossoms: 0,
            twist: self.params.leaf_twist_seed.map(LeafTwist::new),
            done: false,
        }
    }

    /// Sends every event of `sequence` to `sink`, pausing `step_delay_secs`
    /// between events. Returns the number of events placed.
    ///
    /// Stops at the first interpretation error or the first event the sink
    /// rejects.
    pub fn drive<S: PlacementSink + ?Sized>(
        &self,
        sequence: &str,
        sink: &mut S,
    ) -> Result<usize, PlantError> {
        let delay = Some(self.params.step_delay()?).filter(|d| !d.is_zero());
        let mut placed = 0;
        for event in self.interpret(sequence) {
            sink.place(event?)?;
            placed += 1;
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
        }
        Ok(placed)
    }

    /// Interprets `sequence` in full and collects the result.
    pub fn build_skeleton(&self, sequence: &str) -> Result<PlantSkeleton, PlantError> {
        let mut skeleton = PlantSkeleton::new();
        for event in self.interpret(sequence) {
            skeleton.place(event?)?;
        }
        Ok(skeleton)
    }
}

/// Accumulating pseudo-random twist for leaves.
#[derive(Clone, Debug)]
struct LeafTwist {
    rng: StdRng,
    acc: u64,
}

impl LeafTwist {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            acc: 0,
        }
    }

    fn draw(&mut self) -> Vec3 {
        let r = self.acc;
        self.acc += self.rng.gen_range(0..=720);
        Vec3::new((r % 48) as f32, r as f32, (r % 15) as f32)
    }
}

/// Lazy stream of [`PlacementEvent`]s. Created by [`PlantInterpreter::interpret`].
pub struct Events<'a> {
    interpreter: &'a PlantInterpreter,
    symbols: Enumerate<Chars<'a>>,
    pose: TurtleState,
    // Slot `n` holds the pose saved when entering level `n + 1`.
    branch_stack: Vec<TurtleState>,
    segments: u32,
    leaves: u32,
    blossoms: u32,
    twist: Option<LeafTwist>,
    done: bool,
}

impl Events<'_> {
    /// Current branch nesting depth.
    pub fn branch_level(&self) -> usize {
        self.branch_stack.len()
    }

    /// Current turtle pose.
    pub fn pose(&self) -> TurtleState {
        self.pose
    }

    fn fail(&mut self, err: PlantError) -> Option<Result<PlacementEvent, PlantError>> {
        self.done = true;
        Some(Err(err))
    }

    fn event(&self, serial: u32, symbol_index: usize, placement: Placement) -> PlacementEvent {
        let event = PlacementEvent {
            serial,
            symbol_index,
            level: self.branch_level(),
            pose: self.pose,
            placement,
        };
        trace!(placement = ?event.placement, serial, symbol_index, "placement");
        event
    }
}

impl Iterator for Events<'_> {
    type Item = Result<PlacementEvent, PlantError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let interpreter = self.interpreter;
        let params = &interpreter.params;

        while let Some((index, sym)) = self.symbols.next() {
            match interpreter.op_for(sym) {
                PlantOp::Rotate { axis, sign } => self.pose.rotate(axis, sign * params.angle),
                PlantOp::Flip => self.pose.rotate(Axis::X, 180.0),
                PlantOp::Push => {
                    if self.branch_stack.len() >= params.max_branch_depth {
                        return self.fail(PlantError::BranchDepthExceeded {
                            index,
                            max: params.max_branch_depth,
                        });
                    }
                    self.branch_stack.push(self.pose);
                }
                PlantOp::Pop => match self.branch_stack.pop() {
                    Some(saved) => self.pose = saved,
                    None => return self.fail(PlantError::UnbalancedStack { index }),
                },
                PlantOp::Leaf => {
                    self.leaves += 1;
                    let level = self.branch_level();
                    let twist = self.twist.as_mut().map_or(Vec3::ZERO, LeafTwist::draw);
                    let placement = Placement::Leaf(Decoration {
                        scale: params.leaf_scale_at(level),
                        twist,
                    });
                    return Some(Ok(self.event(self.leaves, index, placement)));
                }
                PlantOp::Blossom => {
                    self.blossoms += 1;
                    let placement = Placement::Blossom(Decoration {
                        scale: params.blossom_scale_at(self.branch_level()),
                        twist: Vec3::ZERO,
                    });
                    return Some(Ok(self.event(self.blossoms, index, placement)));
                }
                PlantOp::Move => {
                    self.segments += 1;
                    let level = self.branch_level();
                    let length = params.length_at(level);
                    let end = self.pose.advanced(length);
                    let placement = Placement::Segment(SegmentPlacement {
                        end,
                        length,
                        radius: params.radius_at(level),
                        subdivisions: params.subdivisions,
                    });
                    let event = self.event(self.segments, index, placement);
                    self.pose.position = end;
                    return Some(Ok(event));
                }
                PlantOp::Ignore => {}
            }
        }

        self.done = true;
        let depth = self.branch_level();
        if depth > 0 {
            if params.require_balanced {
                return Some(Err(PlantError::UnclosedBranches { depth }));
            }
            warn!(depth, "sequence ended with unclosed branches");
        }
        None
    }
}
