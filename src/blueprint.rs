use crate::error::PlantError;
use crate::turtle::TurtleState;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The kind of feature a [`PlacementEvent`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Segment,
    Leaf,
    Blossom,
}

/// One geometric or decorative feature produced by the turtle.
///
/// This is the full contract with the renderer: a mesh builder needs nothing
/// beyond the pose, the branch level and the kind-specific payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementEvent {
    /// Per-kind sequence number, starting at 1. Only meant for naming.
    pub serial: u32,

    /// Index (in chars) of the symbol that produced the event.
    pub symbol_index: usize,

    /// Branch nesting depth at which the event occurs.
    pub level: usize,

    /// Turtle pose when the symbol was read. For segments this is the start.
    pub pose: TurtleState,

    pub placement: Placement,
}

impl PlacementEvent {
    pub fn kind(&self) -> EventKind {
        match self.placement {
            Placement::Segment(_) => EventKind::Segment,
            Placement::Leaf(_) => EventKind::Leaf,
            Placement::Blossom(_) => EventKind::Blossom,
        }
    }
}

/// Kind-specific payload of a [`PlacementEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    Segment(SegmentPlacement),
    Leaf(Decoration),
    Blossom(Decoration),
}

/// A cylinder from the event pose's position to `end`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlacement {
    /// World-space position of the distal end.
    pub end: Vec3,
    /// Length after branch-level attenuation.
    pub length: f32,
    /// Radius after branch-level attenuation.
    pub radius: f32,
    /// Radial subdivisions, passed through to the mesh builder.
    pub subdivisions: u32,
}

/// A leaf or blossom attached at the event pose.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Uniform scale for the imported decoration model.
    pub scale: f32,
    /// Extra local rotation in degrees (leaves only, zero otherwise).
    pub twist: Vec3,
}

/// Receives placement events as the turtle produces them.
///
/// Returning an error stops interpretation.
pub trait PlacementSink {
    fn place(&mut self, event: PlacementEvent) -> Result<(), PlantError>;
}

impl PlacementSink for Vec<PlacementEvent> {
    fn place(&mut self, event: PlacementEvent) -> Result<(), PlantError> {
        self.push(event);
        Ok(())
    }
}

/// The engine-agnostic skeleton of a plant.
///
/// Collects every placement in emission order, split by kind.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlantSkeleton {
    pub segments: Vec<PlacementEvent>,
    pub leaves: Vec<PlacementEvent>,
    pub blossoms: Vec<PlacementEvent>,

    /// Deepest branch level any event was placed at.
    pub max_level: usize,
}

impl PlantSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.segments.len() + self.leaves.len() + self.blossoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    /// Axis-aligned bounds of every segment endpoint and decoration position.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let points = self
            .segments
            .iter()
            .flat_map(|e| {
                let end = match e.placement {
                    Placement::Segment(s) => s.end,
                    _ => e.pose.position,
                };
                [e.pose.position, end]
            })
            .chain(self.leaves.iter().map(|e| e.pose.position))
            .chain(self.blossoms.iter().map(|e| e.pose.position));

        points.fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        })
    }

    /// Sum of all segment lengths.
    pub fn total_length(&self) -> f32 {
        self.segments
            .iter()
            .filter_map(|e| match e.placement {
                Placement::Segment(s) => Some(s.length),
                _ => None,
            })
            .sum()
    }
}

impl PlacementSink for PlantSkeleton {
    fn place(&mut self, event: PlacementEvent) -> Result<(), PlantError> {
        self.max_level = self.max_level.max(event.level);
        match event.kind() {
            EventKind::Segment => self.segments.push(event),
            EventKind::Leaf => self.leaves.push(event),
            EventKind::Blossom => self.blossoms.push(event),
        }
        Ok(())
    }
}
