//! Built-in plants from *The Algorithmic Beauty of Plants* and friends.

use crate::config::{PlantSpec, RuleConfig};
use crate::interpreter::GeometryParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Deterministic bush with leaves and blossoms.
    Bush,
    /// Two weighted rules (70/30) on `F`.
    StochasticShrub,
    /// Three-way stochastic weed grown from `S`.
    Weed,
    /// Bare branching skeleton without attenuation.
    Bare,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Bush,
        Preset::StochasticShrub,
        Preset::Weed,
        Preset::Bare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Bush => "bush",
            Preset::StochasticShrub => "stochastic-shrub",
            Preset::Weed => "weed",
            Preset::Bare => "bare",
        }
    }

    pub fn spec(self) -> PlantSpec {
        match self {
            Preset::Bush => PlantSpec {
                axiom: "F".into(),
                depth: 4,
                rules: vec![RuleConfig::new(100.0, "F", "F[&+F]F[->FL][&FB]")],
                geometry: geometry(28.0, 1.2, 0.2, 5, 0.95, 0.85),
                seed: None,
                max_symbols: None,
            },
            Preset::StochasticShrub => PlantSpec {
                axiom: "F".into(),
                depth: 3,
                rules: vec![
                    RuleConfig::new(70.0, "F", "F[+FL][-FB][&FL][^FB]F"),
                    RuleConfig::new(30.0, "F", "[-FL]F[F[-FB-&&>F][&>F]]"),
                ],
                geometry: geometry(25.7, 3.32, 0.5, 6, 0.9, 0.7),
                seed: None,
                max_symbols: None,
            },
            Preset::Weed => PlantSpec {
                axiom: "S".into(),
                depth: 6,
                rules: vec![
                    RuleConfig::new(33.0, "S", "S[>>&&FL][>>^^FL]S"),
                    RuleConfig::new(33.0, "S", "S[-FL]F[S[-F-FB-&&>S][&>F][+S]]"),
                    RuleConfig::new(34.0, "S", "S[+S[-FB][&>S]]"),
                ],
                geometry: geometry(26.5, 1.2, 0.2, 8, 0.94, 0.86),
                seed: None,
                max_symbols: None,
            },
            Preset::Bare => PlantSpec {
                axiom: "F".into(),
                depth: 4,
                rules: vec![RuleConfig::new(100.0, "F", "F[&+F]F[->F][&F]")],
                geometry: geometry(28.0, 1.2, 0.2, 5, 1.0, 1.0),
                seed: None,
                max_symbols: None,
            },
        }
    }
}

fn geometry(
    angle: f32,
    length: f32,
    radius: f32,
    subdivisions: u32,
    length_attenuation: f32,
    radius_attenuation: f32,
) -> GeometryParams {
    GeometryParams {
        angle,
        length,
        radius,
        subdivisions,
        length_attenuation,
        radius_attenuation,
        ..Default::default()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset `{s}` (expected one of: {})", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_valid() {
        for preset in Preset::ALL {
            let spec = preset.spec();
            spec.validate()
                .unwrap_or_else(|e| panic!("{preset} is invalid: {e}"));
            let grammar = spec.grammar().unwrap();
            assert!(grammar.warnings().is_empty(), "{preset} warns");
        }
    }

    #[test]
    fn names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>(), Ok(preset));
        }
        assert!("oak".parse::<Preset>().is_err());
    }

    #[test]
    fn bush_grows_balanced() {
        let spec = Preset::Bush.spec();
        let sequence = spec.grammar().unwrap().expand_seeded(0).unwrap();
        let skeleton = spec.interpreter().unwrap().build_skeleton(&sequence).unwrap();
        assert!(!skeleton.leaves.is_empty());
        assert!(!skeleton.blossoms.is_empty());
        assert!(skeleton.max_level >= 1);
    }
}
