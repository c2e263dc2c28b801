//! # lsystem-flora
//!
//! Procedural plant skeletons from stochastic L-System grammars.
//!
//! Two engines do the work: a [`Grammar`] rewrites an axiom through a number of
//! generations using weighted production rules, and a [`PlantInterpreter`]
//! walks the resulting symbols with a 3-D turtle, producing an ordered stream
//! of [`PlacementEvent`]s (segments, leaves, blossoms) that any renderer can
//! turn into meshes.
//!
//! ```rust,ignore
//! use lsystem_flora::{GeometryParams, Grammar, PlantInterpreter, ProductionRule};
//!
//! let grammar = Grammar::new("F", vec![ProductionRule::new(100.0, 'F', "F[+F]F[-F]F")], 2)?;
//! let sequence = grammar.expand_seeded(7)?;
//! let skeleton = PlantInterpreter::new(GeometryParams::default())?.build_skeleton(&sequence)?;
//! println!("{} segments", skeleton.segments.len());
//! ```

pub mod blueprint;
pub mod config;
pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod presets;
pub mod turtle;

pub use blueprint::*;
pub use config::*;
pub use error::*;
pub use grammar::*;
pub use interpreter::*;
pub use presets::*;
pub use turtle::*;
