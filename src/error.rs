use thiserror::Error;

/// Errors raised while validating a grammar, configuring the turtle, or
/// interpreting a symbol sequence.
#[derive(Debug, Error)]
pub enum PlantError {
    /// A production rule cannot be used. `index` is the rule's position in the
    /// list passed to the grammar (or `None` when it was built standalone).
    #[error("invalid rule{}: {reason}", fmt_rule_index(.index))]
    InvalidRule { index: Option<usize>, reason: String },

    /// A `]` was read while the turtle was already at branch level 0.
    #[error("unbalanced stack: pop without matching push at symbol {index}")]
    UnbalancedStack { index: usize },

    /// A `[` would nest deeper than the configured maximum.
    #[error("branch depth exceeded at symbol {index} (max {max})")]
    BranchDepthExceeded { index: usize, max: usize },

    /// The sequence ended with branches still open.
    #[error("sequence ended with {depth} unclosed branch(es)")]
    UnclosedBranches { depth: usize },

    #[error("invalid geometry parameter `{field}`: {reason}")]
    InvalidGeometry { field: &'static str, reason: String },

    /// A generation grew past the configured symbol limit.
    #[error("generation {generation} produced {len} symbols (limit {limit})")]
    SequenceTooLong {
        generation: u32,
        len: usize,
        limit: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

fn fmt_rule_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" #{i}"),
        None => String::new(),
    }
}

impl PlantError {
    pub(crate) fn invalid_rule(index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_geometry(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            field,
            reason: reason.into(),
        }
    }
}
