//! Stochastic string rewriting.
//!
//! A [`Grammar`] holds an axiom, a list of [`ProductionRule`]s and a generation
//! count. Every generation rewrites each symbol of the current sequence
//! independently: symbols without an enabled rule pass through, symbols with a
//! single rule are replaced deterministically, and symbols with several rules
//! draw one successor per occurrence from the normalized rule weights.

use crate::error::PlantError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Expected total weight of the rules sharing a predecessor.
pub const WEIGHT_TOTAL: f64 = 100.0;

/// A weighted `predecessor -> successor` substitution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    /// Relative likelihood among the enabled rules sharing the predecessor.
    pub weight: f64,
    /// The symbol this rule replaces.
    pub predecessor: char,
    /// Replacement sequence. An empty successor deletes the symbol.
    pub successor: String,
    /// Disabled rules are ignored by the grammar.
    pub enabled: bool,
}

impl ProductionRule {
    pub fn new(weight: f64, predecessor: char, successor: impl Into<String>) -> Self {
        Self {
            weight,
            predecessor,
            successor: successor.into(),
            enabled: true,
        }
    }

    /// Builds a rule from a textual predecessor, which must be exactly one symbol.
    pub fn parse(
        weight: f64,
        predecessor: &str,
        successor: impl Into<String>,
    ) -> Result<Self, PlantError> {
        let mut chars = predecessor.chars();
        match (chars.next(), chars.next()) {
            (Some(sym), None) => {
                let rule = Self::new(weight, sym, successor);
                rule.validate(None)?;
                Ok(rule)
            }
            (None, _) => Err(PlantError::invalid_rule(None, "empty predecessor")),
            (Some(_), Some(_)) => Err(PlantError::invalid_rule(
                None,
                format!("predecessor `{predecessor}` is more than one symbol"),
            )),
        }
    }

    /// Marks the rule as disabled (builder pattern).
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Checks the weight is a finite, non-negative number.
    pub fn validate(&self, index: Option<usize>) -> Result<(), PlantError> {
        if !self.weight.is_finite() {
            return Err(PlantError::invalid_rule(
                index,
                format!("weight {} is not a finite number", self.weight),
            ));
        }
        if self.weight < 0.0 {
            return Err(PlantError::invalid_rule(
                index,
                format!("negative weight {}", self.weight),
            ));
        }
        Ok(())
    }
}

/// Advisory raised when the weights of a stochastic predecessor do not add up
/// to [`WEIGHT_TOTAL`]. Expansion still proceeds with normalized weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityWarning {
    pub predecessor: char,
    pub total: f64,
}

impl fmt::Display for ProbabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "weights for `{}` add up to {} instead of {}; using normalized weights",
            self.predecessor, self.total, WEIGHT_TOTAL
        )
    }
}

#[derive(Clone, Debug)]
struct Successor {
    text: String,
    symbols: usize,
}

impl Successor {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            symbols: text.chars().count(),
        }
    }
}

#[derive(Clone, Debug)]
enum Candidates {
    Fixed(Successor),
    Weighted {
        options: Vec<Successor>,
        dist: WeightedIndex<f64>,
    },
}

impl Candidates {
    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Successor {
        match self {
            Candidates::Fixed(s) => s,
            Candidates::Weighted { options, dist } => &options[dist.sample(rng)],
        }
    }
}

/// An axiom, its production rules and the number of generations to run.
///
/// Construction validates every rule up front, so a `Grammar` that exists can
/// always be expanded.
#[derive(Clone, Debug)]
pub struct Grammar {
    axiom: String,
    depth: u32,
    rules: Vec<ProductionRule>,
    table: HashMap<char, Candidates>,
    warnings: Vec<ProbabilityWarning>,
    symbol_limit: Option<usize>,
}

impl Grammar {
    /// Validates `rules` and builds the lookup table used during rewriting.
    ///
    /// Fails with [`PlantError::InvalidRule`] when a rule has a negative or
    /// non-finite weight, or when the enabled rules sharing a predecessor have
    /// a total weight of zero. Totals other than 100 only produce a
    /// [`ProbabilityWarning`], which is logged when the grammar is expanded.
    pub fn new(
        axiom: impl Into<String>,
        rules: Vec<ProductionRule>,
        depth: u32,
    ) -> Result<Self, PlantError> {
        let mut groups: Vec<(char, Vec<usize>)> = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            rule.validate(Some(index))?;
            if !rule.enabled {
                continue;
            }
            match groups.iter_mut().find(|(sym, _)| *sym == rule.predecessor) {
                Some((_, members)) => members.push(index),
                None => groups.push((rule.predecessor, vec![index])),
            }
        }

        let mut table = HashMap::with_capacity(groups.len());
        let mut warnings = Vec::new();
        for (predecessor, members) in groups {
            let candidates = if let [only] = members.as_slice() {
                Candidates::Fixed(Successor::new(&rules[*only].successor))
            } else {
                let total: f64 = members.iter().map(|&i| rules[i].weight).sum();
                if total <= 0.0 {
                    return Err(PlantError::invalid_rule(
                        Some(members[0]),
                        format!("rules for `{predecessor}` have a total weight of zero"),
                    ));
                }
                if (total - WEIGHT_TOTAL).abs() > 1e-9 {
                    warnings.push(ProbabilityWarning { predecessor, total });
                }
                let dist = WeightedIndex::new(members.iter().map(|&i| rules[i].weight))
                    .map_err(|e| PlantError::invalid_rule(Some(members[0]), e.to_string()))?;
                Candidates::Weighted {
                    options: members
                        .iter()
                        .map(|&i| Successor::new(&rules[i].successor))
                        .collect(),
                    dist,
                }
            };
            table.insert(predecessor, candidates);
        }

        Ok(Self {
            axiom: axiom.into(),
            depth,
            rules,
            table,
            warnings,
            symbol_limit: None,
        })
    }

    /// Caps the number of symbols any generation may hold (builder pattern).
    pub fn with_symbol_limit(mut self, limit: usize) -> Self {
        self.symbol_limit = Some(limit);
        self
    }

    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    /// Advisories collected while validating the rules.
    pub fn warnings(&self) -> &[ProbabilityWarning] {
        &self.warnings
    }

    /// Returns `true` when at least one predecessor has several enabled rules.
    pub fn is_stochastic(&self) -> bool {
        self.table
            .values()
            .any(|c| matches!(c, Candidates::Weighted { .. }))
    }

    /// Runs all generations and returns the final sequence.
    ///
    /// Depth 0 returns the axiom unchanged.
    pub fn expand<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, PlantError> {
        self.log_warnings();
        let mut current = self.axiom.clone();
        for generation in 1..=self.depth {
            current = self.rewrite_bounded(&current, rng, generation)?;
        }
        Ok(current)
    }

    /// Like [`expand`](Self::expand), with a fresh RNG seeded from `seed`.
    pub fn expand_seeded(&self, seed: u64) -> Result<String, PlantError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.expand(&mut rng)
    }

    /// Rewrites `input` once, ignoring the symbol limit.
    pub fn rewrite<R: Rng + ?Sized>(&self, input: &str, rng: &mut R) -> String {
        let mut out = String::with_capacity(input.len());
        for sym in input.chars() {
            match self.table.get(&sym) {
                Some(candidates) => out.push_str(&candidates.pick(rng).text),
                None => out.push(sym),
            }
        }
        out
    }

    /// Iterates over every generation, starting with the axiom as generation 0.
    pub fn generations<'a, R: Rng + ?Sized>(&'a self, rng: &'a mut R) -> Generations<'a, R> {
        Generations {
            grammar: self,
            rng,
            current: None,
            generation: 0,
            failed: false,
        }
    }

    fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!(%warning, "probability warning");
        }
    }

    fn rewrite_bounded<R: Rng + ?Sized>(
        &self,
        input: &str,
        rng: &mut R,
        generation: u32,
    ) -> Result<String, PlantError> {
        let Some(limit) = self.symbol_limit else {
            let out = self.rewrite(input, rng);
            debug!(generation, len = out.len(), "rewrote generation");
            return Ok(out);
        };

        let mut out = String::with_capacity(input.len().min(limit));
        let mut len = 0usize;
        for sym in input.chars() {
            match self.table.get(&sym) {
                Some(candidates) => {
                    let successor = candidates.pick(rng);
                    out.push_str(&successor.text);
                    len += successor.symbols;
                }
                None => {
                    out.push(sym);
                    len += 1;
                }
            }
            if len > limit {
                return Err(PlantError::SequenceTooLong {
                    generation,
                    len,
                    limit,
                });
            }
        }
        debug!(generation, len, "rewrote generation");
        Ok(out)
    }
}

/// Iterator over successive generations of a [`Grammar`].
///
/// Yields `(generation, sequence)` pairs from 0 up to the grammar's depth.
/// Stops after the first error.
pub struct Generations<'a, R: Rng + ?Sized> {
    grammar: &'a Grammar,
    rng: &'a mut R,
    current: Option<String>,
    generation: u32,
    failed: bool,
}

impl<R: Rng + ?Sized> Iterator for Generations<'_, R> {
    type Item = Result<(u32, String), PlantError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = match &self.current {
            None => {
                self.grammar.log_warnings();
                self.grammar.axiom.clone()
            }
            Some(_) if self.generation >= self.grammar.depth => return None,
            Some(prev) => {
                let generation = self.generation + 1;
                match self.grammar.rewrite_bounded(prev, &mut *self.rng, generation) {
                    Ok(s) => {
                        self.generation = generation;
                        s
                    }
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
            }
        };
        self.current = Some(next.clone());
        Some(Ok((self.generation, next)))
    }
}

/// Expands `axiom` through `depth` generations of `rules`.
pub fn expand<R: Rng + ?Sized>(
    axiom: &str,
    rules: Vec<ProductionRule>,
    depth: u32,
    rng: &mut R,
) -> Result<String, PlantError> {
    Grammar::new(axiom, rules, depth)?.expand(rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn branching() -> Vec<ProductionRule> {
        vec![ProductionRule::new(100.0, 'F', "F[+F]F[-F]F")]
    }

    #[test]
    fn depth_zero_returns_axiom() {
        let out = expand("F+X", branching(), 0, &mut rng()).unwrap();
        assert_eq!(out, "F+X");
    }

    #[test]
    fn classic_branching_rule() {
        let one = expand("F", branching(), 1, &mut rng()).unwrap();
        assert_eq!(one, "F[+F]F[-F]F");
        assert_eq!(one.chars().count(), 11);

        let two = expand("F", branching(), 2, &mut rng()).unwrap();
        assert_eq!(
            two,
            "F[+F]F[-F]F[+F[+F]F[-F]F]F[+F]F[-F]F[-F[+F]F[-F]F]F[+F]F[-F]F"
        );
    }

    #[test]
    fn several_rules_rewrite_simultaneously() {
        let rules = vec![
            ProductionRule::new(100.0, 'F', "ff"),
            ProductionRule::new(100.0, 'X', "xx"),
        ];
        assert_eq!(expand("F+X-FF", rules, 1, &mut rng()).unwrap(), "ff+xx-ffff");
    }

    #[test]
    fn rewriting_does_not_feed_back_within_a_generation() {
        // A -> B and B -> A swap every generation rather than collapsing.
        let rules = vec![
            ProductionRule::new(100.0, 'A', "B"),
            ProductionRule::new(100.0, 'B', "A"),
        ];
        assert_eq!(expand("AB", rules.clone(), 1, &mut rng()).unwrap(), "BA");
        assert_eq!(expand("AB", rules, 2, &mut rng()).unwrap(), "AB");
    }

    #[test]
    fn empty_successor_deletes() {
        let rules = vec![ProductionRule::new(100.0, 'X', "")];
        assert_eq!(expand("FXFX", rules, 3, &mut rng()).unwrap(), "FF");
    }

    #[test]
    fn empty_axiom_stays_empty() {
        assert_eq!(expand("", branching(), 5, &mut rng()).unwrap(), "");
    }

    #[test]
    fn deterministic_grammar_is_repeatable() {
        let g = Grammar::new("F", branching(), 3).unwrap();
        assert!(!g.is_stochastic());
        let a = g.expand_seeded(1).unwrap();
        let b = g.expand_seeded(99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let rules = vec![
            ProductionRule::new(100.0, 'F', "FF"),
            ProductionRule::new(-1.0, 'X', "F"),
        ];
        let err = Grammar::new("F", rules, 1).unwrap_err();
        assert!(matches!(err, PlantError::InvalidRule { index: Some(1), .. }));
    }

    #[test]
    fn predecessor_must_be_one_symbol() {
        assert!(ProductionRule::parse(100.0, "F", "FF").is_ok());
        assert!(matches!(
            ProductionRule::parse(100.0, "", "FF"),
            Err(PlantError::InvalidRule { .. })
        ));
        assert!(matches!(
            ProductionRule::parse(100.0, "FX", "FF"),
            Err(PlantError::InvalidRule { .. })
        ));
    }

    #[test]
    fn zero_total_weight_is_rejected() {
        let rules = vec![
            ProductionRule::new(0.0, 'F', "A"),
            ProductionRule::new(0.0, 'F', "B"),
        ];
        assert!(matches!(
            Grammar::new("F", rules, 1),
            Err(PlantError::InvalidRule { index: Some(0), .. })
        ));
    }

    #[test]
    fn odd_totals_warn_but_expand() {
        let rules = vec![
            ProductionRule::new(1.0, 'F', "A"),
            ProductionRule::new(3.0, 'F', "B"),
        ];
        let g = Grammar::new("F", rules, 1).unwrap();
        assert_eq!(
            g.warnings(),
            &[ProbabilityWarning {
                predecessor: 'F',
                total: 4.0
            }]
        );
        let out = g.expand_seeded(3).unwrap();
        assert!(out == "A" || out == "B");
    }

    #[test]
    fn single_rule_weight_is_irrelevant() {
        let rules = vec![ProductionRule::new(40.0, 'F', "FF")];
        let g = Grammar::new("F", rules, 2).unwrap();
        assert!(g.warnings().is_empty());
        assert_eq!(g.expand_seeded(0).unwrap(), "FFFF");
    }

    #[test]
    fn lone_zero_weight_rule_still_rewrites() {
        // A single enabled rule is deterministic, whatever its weight.
        let rules = vec![
            ProductionRule::new(0.0, 'F', "FF"),
            ProductionRule::new(50.0, 'X', "x").disabled(),
        ];
        let g = Grammar::new("FX", rules, 2).unwrap();
        assert!(!g.is_stochastic());
        assert!(g.warnings().is_empty());
        assert_eq!(g.expand_seeded(0).unwrap(), "FFFFX");
    }

    #[test]
    fn long_successor_for_absent_symbol_does_not_inflate_output() {
        let axiom = "F".repeat(200_000);
        let rules = vec![ProductionRule::new(100.0, 'Z', "z".repeat(200_000))];
        let g = Grammar::new(axiom.clone(), rules, 1).unwrap();
        assert_eq!(g.expand_seeded(0).unwrap(), axiom);

        let bounded = g.with_symbol_limit(250_000);
        assert_eq!(bounded.expand_seeded(0).unwrap().len(), 200_000);
    }

    #[test]
    fn disabled_rules_are_ignored() {
        let rules = vec![
            ProductionRule::new(50.0, 'F', "A"),
            ProductionRule::new(50.0, 'F', "B").disabled(),
        ];
        let g = Grammar::new("FFFF", rules, 1).unwrap();
        assert!(!g.is_stochastic());
        assert_eq!(g.expand_seeded(11).unwrap(), "AAAA");
    }

    #[test]
    fn zero_weight_candidate_is_never_drawn() {
        let rules = vec![
            ProductionRule::new(100.0, 'X', "a"),
            ProductionRule::new(0.0, 'X', "b"),
        ];
        let g = Grammar::new("X".repeat(2_000), rules, 1).unwrap();
        let out = g.expand_seeded(5).unwrap();
        assert!(!out.contains('b'));
        assert_eq!(out.len(), 2_000);
    }

    #[test]
    fn each_occurrence_draws_independently() {
        let rules = vec![
            ProductionRule::new(50.0, 'X', "a"),
            ProductionRule::new(50.0, 'X', "b"),
        ];
        let g = Grammar::new("XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX", rules, 1).unwrap();
        let out = g.expand_seeded(42).unwrap();
        assert!(out.contains('a') && out.contains('b'), "got {out}");
    }

    #[test]
    fn symbol_limit_stops_runaway_growth() {
        let g = Grammar::new("F", branching(), 6)
            .unwrap()
            .with_symbol_limit(1_000);
        match g.expand_seeded(0) {
            Err(PlantError::SequenceTooLong {
                generation, limit, ..
            }) => {
                assert_eq!(limit, 1_000);
                assert_eq!(generation, 4);
            }
            other => panic!("expected SequenceTooLong, got {other:?}"),
        }
    }

    #[test]
    fn generations_start_at_axiom() {
        let g = Grammar::new("F", branching(), 2).unwrap();
        let mut r = rng();
        let steps: Vec<_> = g.generations(&mut r).map(Result::unwrap).collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], (0, "F".to_string()));
        assert_eq!(steps[1].1, "F[+F]F[-F]F");
        assert_eq!(steps[2].1.chars().count(), 61);
    }
}
