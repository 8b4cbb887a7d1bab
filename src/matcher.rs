//! The public entry points: hand a [`crate::grammar::Grammar`] and an
//! [`Input`] to [`match_grammar`] (or [`trace_grammar`] for a structured
//! trace alongside the result) and get back either the parsed [`Node`] or
//! a [`MatchFailure`] describing the rightmost point the parse reached.

use crate::error::MatchFailure;
use crate::expr::Expr;
use crate::grammar::Grammar;
use crate::node::Node;
use crate::state::EvalState;
use crate::stream::InputStream;
use crate::trace::{TraceBuilder, TraceEntry};
use crate::util::Log;
use crate::value::Value;
use std::rc::Rc;

/// The two shapes of input this crate's evaluation core accepts: plain
/// text (matched atom-by-codepoint) or an already-parsed dynamic value
/// (matched atom-by-element against a single-element stream, letting
/// `Arr`/`Str`/`Obj` patterns descend into it).
pub enum Input {
    Text(String),
    Structured(Value),
}

impl Input {
    fn into_stream(self) -> InputStream {
        match self {
            Input::Text(text) => InputStream::from_text(&text),
            Input::Structured(value) => InputStream::from_single(value),
        }
    }
}

pub enum MatchResult {
    Success(Node),
    Failure(MatchFailure),
}

/// Matches `input` against `start_rule` (or the grammar's configured
/// default start rule, when `None`), requiring the match to consume the
/// entire input.
pub fn match_grammar(
    grammar: &Grammar,
    input: Input,
    start_rule: Option<&str>,
    start_args: Vec<Rc<Expr>>,
) -> MatchResult {
    run(grammar, input, start_rule, start_args, false, Log::None).0
}

/// Same contract as [`match_grammar`], additionally emitting `eprintln!`
/// diagnostics at `log`'s verbosity as every rule is entered, succeeds, or
/// fails (debug builds only; a no-op in release builds regardless of
/// `log`).
pub fn match_grammar_logged(
    grammar: &Grammar,
    input: Input,
    start_rule: Option<&str>,
    start_args: Vec<Rc<Expr>>,
    log: Log<&'static str>,
) -> MatchResult {
    run(grammar, input, start_rule, start_args, false, log).0
}

/// Same contract as [`match_grammar`], but also returns the full attempt
/// tree recorded while matching (§4.5).
pub fn trace_grammar(
    grammar: &Grammar,
    input: Input,
    start_rule: Option<&str>,
    start_args: Vec<Rc<Expr>>,
) -> (MatchResult, Option<TraceEntry>) {
    run(grammar, input, start_rule, start_args, true, Log::None)
}

fn run(
    grammar: &Grammar,
    input: Input,
    start_rule: Option<&str>,
    start_args: Vec<Rc<Expr>>,
    with_trace: bool,
    log: Log<&'static str>,
) -> (MatchResult, Option<TraceEntry>) {
    let rule_name = match start_rule.map(str::to_string).or_else(|| grammar.start_rule.clone()) {
        Some(name) => name,
        None => return (MatchResult::Failure(MatchFailure::new(0)), None),
    };

    let mut state = EvalState::new(grammar, input.into_stream(), log);
    if with_trace {
        state.trace = Some(TraceBuilder::new());
    }

    let top_level: Rc<Expr> =
        Rc::new(Expr::Seq(vec![Rc::new(Expr::Apply(rule_name, start_args)), Rc::new(Expr::End)]));
    let ok = top_level.eval(&mut state);
    let trace = state.trace.take().and_then(|t| t.finish());

    let result = if ok {
        let root = state.bindings.pop().expect("a successful top-level Apply+End pushes exactly one node");
        MatchResult::Success(root)
    } else {
        MatchResult::Failure(MatchFailure { pos: state.failure_pos, expected: state.failure_expected })
    };
    (result, trace)
}
