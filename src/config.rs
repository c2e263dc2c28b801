//! TOML plant descriptions.
//!
//! A [`PlantSpec`] bundles everything needed to grow one plant: the grammar
//! (axiom, rules, depth), the interpretation parameters and an optional seed.
//!
//! ```toml
//! axiom = "F"
//! depth = 4
//! seed = 7
//!
//! [[rules]]
//! weight = 70
//! predecessor = "F"
//! successor = "F[+FL][-FB]F"
//!
//! [[rules]]
//! weight = 30
//! predecessor = "F"
//! successor = "F[&F]"
//!
//! [geometry]
//! angle = 25.7
//! length_attenuation = 0.9
//! ```

use crate::error::PlantError;
use crate::grammar::{Grammar, ProductionRule};
use crate::interpreter::{GeometryParams, PlantInterpreter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A production rule as written in a configuration file.
///
/// The predecessor is kept as text so a malformed entry is reported as an
/// invalid rule instead of a parse error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub weight: f64,
    pub predecessor: String,
    #[serde(default)]
    pub successor: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl RuleConfig {
    pub fn new(weight: f64, predecessor: &str, successor: &str) -> Self {
        Self {
            weight,
            predecessor: predecessor.to_owned(),
            successor: successor.to_owned(),
            enabled: true,
        }
    }

    /// Validates the entry at position `index` into a [`ProductionRule`].
    pub fn to_rule(&self, index: usize) -> Result<ProductionRule, PlantError> {
        let rule = ProductionRule::parse(self.weight, &self.predecessor, self.successor.clone())
            .map_err(|e| match e {
                PlantError::InvalidRule { reason, .. } => PlantError::InvalidRule {
                    index: Some(index),
                    reason,
                },
                other => other,
            })?;
        Ok(if self.enabled { rule } else { rule.disabled() })
    }
}

/// Complete description of a plant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantSpec {
    pub axiom: String,
    pub depth: u32,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub geometry: GeometryParams,
    /// Seed for stochastic rule selection. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Upper bound on the symbols a generation may hold.
    #[serde(default)]
    pub max_symbols: Option<usize>,
}

impl PlantSpec {
    /// Reads and validates a spec file.
    pub fn load(path: &Path) -> Result<Self, PlantError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a spec from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, PlantError> {
        let spec: PlantSpec = toml::from_str(contents)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks rules and geometry without expanding anything.
    pub fn validate(&self) -> Result<(), PlantError> {
        self.grammar()?;
        self.geometry.validate()
    }

    pub fn rules(&self) -> Result<Vec<ProductionRule>, PlantError> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_rule(i))
            .collect()
    }

    pub fn grammar(&self) -> Result<Grammar, PlantError> {
        let grammar = Grammar::new(self.axiom.clone(), self.rules()?, self.depth)?;
        Ok(match self.max_symbols {
            Some(limit) => grammar.with_symbol_limit(limit),
            None => grammar,
        })
    }

    pub fn interpreter(&self) -> Result<PlantInterpreter, PlantError> {
        PlantInterpreter::new(self.geometry.clone())
    }

    /// Expands the grammar, seeded when the spec carries a seed.
    pub fn expand(&self) -> Result<String, PlantError> {
        let grammar = self.grammar()?;
        match self.seed {
            Some(seed) => grammar.expand_seeded(seed),
            None => grammar.expand(&mut rand::thread_rng()),
        }
    }
}
