use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// A programmer error in the grammar itself: an unknown rule reference or an
/// unresolvable parameter index. Caught by [`crate::grammar::Grammar::build`]
/// before a match is ever attempted, matching the source's "InvalidGrammar is fatal to the
/// current parse" contract without risking a panic mid-evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    UnknownRule { rule: String, referenced_from: String },
    ParamIndexOutOfRange { rule: String, index: usize, declared_params: usize },
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::UnknownRule { rule, referenced_from } => write!(
                f,
                "rule '{}' is applied from '{}' but is not defined in the grammar",
                rule, referenced_from
            ),
            GrammarError::ParamIndexOutOfRange { rule, index, declared_params } => write!(
                f,
                "rule '{}' references param({}) but only {} parameter(s) are declared",
                rule, index, declared_params
            ),
        }
    }
}

impl std::error::Error for GrammarError {}

/// The diagnostic reported when a match fails: the rightmost position the
/// parse ever reached, and the set of expression descriptors that were
/// still expected there. Parse failure is an expected outcome, not an error
/// (see §7 of the design document) — this type deliberately does not
/// implement [`std::error::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub pos: usize,
    pub expected: BTreeSet<String>,
}

impl Display for MatchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to match at position {}, expected one of: ", self.pos)?;
        let mut first = true;
        for e in &self.expected {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl MatchFailure {
    pub fn new(pos: usize) -> Self {
        Self { pos, expected: BTreeSet::new() }
    }
}
