//! The closed set of expression variants an evaluation core actually runs.
//! A compiled [`crate::grammar::Grammar`] is a dictionary of these trees;
//! matching is `Expr::eval` recursing over one, threading a single
//! [`EvalState`] through every call.
//!
//! The source modeled each variant as a distinct struct behind a shared
//! `Rc<dyn IProduction>` trait object, with per-struct `impl` blocks calling
//! back into a generic `eval`/`validate`/`first_set` surface. A closed `enum`
//! plays the same role here: the variant set is fixed by this crate's domain
//! (it does not need to stay open for downstream crates to extend, the way
//! a production-rule grammar compiler's node types do), so a `match` gives
//! exhaustiveness checking the trait object gave up front, at the cost of
//! one central dispatch point instead of one file per variant.

use crate::node::Node;
use crate::state::EvalState;
use crate::stream::{Atom, Interval, InputStream};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{L}$").unwrap());
static PUNCTUATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{P}$").unwrap());

/// The Unicode general-category groups `\p{...}`-style character classes
/// test against. Kept small and closed rather than exposing the full
/// `regex` category table, since the grammars this crate targets only ever
/// need to tell letters, digits, whitespace and punctuation apart (§4.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnicodeClass {
    Letter,
    Digit,
    Whitespace,
    Punctuation,
}

impl UnicodeClass {
    pub fn matches(&self, c: char) -> bool {
        match self {
            UnicodeClass::Letter => LETTER_RE.is_match(&c.to_string()),
            UnicodeClass::Digit => c.is_numeric(),
            UnicodeClass::Whitespace => c.is_whitespace(),
            UnicodeClass::Punctuation => PUNCTUATION_RE.is_match(&c.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            UnicodeClass::Letter => "letter",
            UnicodeClass::Digit => "digit",
            UnicodeClass::Whitespace => "space",
            UnicodeClass::Punctuation => "punctuation",
        }
    }
}

/// A single declared field of an `Obj` pattern: the own-property name to
/// look up and the sub-pattern its value must match.
#[derive(Clone, Debug)]
pub struct ObjProp {
    pub name: String,
    pub pattern: Rc<Expr>,
}

/// One node of a grammar's expression tree. `Apply` is the only variant
/// that can recurse through the rule dictionary rather than purely through
/// its own children, which is why packrat memoization and left-recursion
/// detection live entirely in [`crate::apply`] rather than here.
#[derive(Clone, Debug)]
pub enum Expr {
    Anything,
    End,
    Prim(Value),
    StringPrim(String),
    Range(Value, Value),
    UnicodeChar(UnicodeClass),
    Param(usize),
    Lex(Rc<Expr>),
    Alt(Vec<Rc<Expr>>),
    Seq(Vec<Rc<Expr>>),
    Iter(Rc<Expr>, usize, Option<usize>),
    Not(Rc<Expr>),
    Lookahead(Rc<Expr>),
    Arr(Rc<Expr>),
    Str(Rc<Expr>),
    Obj(Vec<ObjProp>, bool),
    Apply(String, Vec<Rc<Expr>>),
}

impl Expr {
    /// How many values this expression pushes onto the bindings stack on a
    /// successful match. Computed only after every `Param` has been
    /// resolved by [`Expr::substitute`] — `Apply`'s body is always
    /// substituted before its arity or its value is ever asked for, so a
    /// bare `Param` surviving to this call is a grammar-construction bug,
    /// not a runtime condition to recover from.
    pub fn static_arity(&self) -> usize {
        match self {
            Expr::Anything
            | Expr::Prim(_)
            | Expr::StringPrim(_)
            | Expr::Range(_, _)
            | Expr::UnicodeChar(_) => 1,
            Expr::End => 0,
            Expr::Param(_) => unreachable!("Param survived substitution"),
            Expr::Lex(e) => e.static_arity(),
            Expr::Alt(terms) => terms.first().map(|t| t.static_arity()).unwrap_or(0),
            Expr::Seq(factors) => factors.iter().map(|f| f.static_arity()).sum(),
            Expr::Iter(e, _, _) => e.static_arity(),
            Expr::Not(_) | Expr::Lookahead(_) => 0,
            Expr::Arr(_) | Expr::Str(_) => 1,
            // A lenient Obj binds the remainder of the object's own
            // properties it didn't declare (arity 1); an exact Obj declares
            // every own property the match requires and binds nothing extra
            // (§4.1, scenario S6).
            Expr::Obj(_, exact) => if *exact { 0 } else { 1 },
            Expr::Apply(_, _) => 1,
        }
    }

    /// Rewrites every `Param(i)` in this tree to `args[i]`, recursively.
    /// Called once per `Apply` activation so that the body `eval`s against
    /// already-resolved arguments instead of threading an argument
    /// environment through every variant's evaluation.
    pub fn substitute(self: &Rc<Expr>, args: &[Rc<Expr>]) -> Rc<Expr> {
        match self.as_ref() {
            Expr::Param(i) => Rc::clone(&args[*i]),
            Expr::Lex(e) => Rc::new(Expr::Lex(e.substitute(args))),
            Expr::Alt(terms) => Rc::new(Expr::Alt(terms.iter().map(|t| t.substitute(args)).collect())),
            Expr::Seq(factors) => {
                Rc::new(Expr::Seq(factors.iter().map(|f| f.substitute(args)).collect()))
            }
            Expr::Iter(e, min, max) => Rc::new(Expr::Iter(e.substitute(args), *min, *max)),
            Expr::Not(e) => Rc::new(Expr::Not(e.substitute(args))),
            Expr::Lookahead(e) => Rc::new(Expr::Lookahead(e.substitute(args))),
            Expr::Arr(e) => Rc::new(Expr::Arr(e.substitute(args))),
            Expr::Str(e) => Rc::new(Expr::Str(e.substitute(args))),
            Expr::Obj(props, exact) => Rc::new(Expr::Obj(
                props
                    .iter()
                    .map(|p| ObjProp { name: p.name.clone(), pattern: p.pattern.substitute(args) })
                    .collect(),
                *exact,
            )),
            Expr::Apply(name, call_args) => Rc::new(Expr::Apply(
                name.clone(),
                call_args.iter().map(|a| a.substitute(args)).collect(),
            )),
            _ => Rc::clone(self),
        }
    }

    /// A textual form unique up to alpha-irrelevant structure, used both as
    /// the packrat memo key suffix (combined with a rule name and position
    /// by [`crate::apply`]) and as the human-readable descriptor recorded
    /// against a failed match.
    pub fn canonical_string(&self) -> String {
        match self {
            Expr::Anything => "any".to_string(),
            Expr::End => "end".to_string(),
            Expr::Prim(v) => format!("{:?}", v),
            Expr::StringPrim(s) => format!("{:?}", s),
            Expr::Range(lo, hi) => format!("{:?}..{:?}", lo, hi),
            Expr::UnicodeChar(class) => format!("\\p{{{}}}", class.name()),
            Expr::Param(i) => format!("param({})", i),
            Expr::Lex(e) => format!("#({})", e.canonical_string()),
            Expr::Alt(terms) => {
                let joined: Vec<String> = terms.iter().map(|t| t.canonical_string()).collect();
                format!("({})", joined.join(" | "))
            }
            Expr::Seq(factors) => {
                let joined: Vec<String> = factors.iter().map(|f| f.canonical_string()).collect();
                format!("({})", joined.join(" "))
            }
            Expr::Iter(e, min, max) => format!(
                "{}{{{},{}}}",
                e.canonical_string(),
                min,
                max.map(|m| m.to_string()).unwrap_or_default()
            ),
            Expr::Not(e) => format!("!{}", e.canonical_string()),
            Expr::Lookahead(e) => format!("&{}", e.canonical_string()),
            Expr::Arr(e) => format!("[{}]", e.canonical_string()),
            Expr::Str(e) => format!("str({})", e.canonical_string()),
            Expr::Obj(props, exact) => {
                let joined: Vec<String> =
                    props.iter().map(|p| format!("{}: {}", p.name, p.pattern.canonical_string())).collect();
                format!("{{{}{}}}", joined.join(", "), if *exact { "!" } else { "" })
            }
            Expr::Apply(name, args) => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let joined: Vec<String> = args.iter().map(|a| a.canonical_string()).collect();
                    format!("{}<{}>", name, joined.join(", "))
                }
            }
        }
    }

    /// Attempts to match `self` at the current position. On success,
    /// exactly `self.static_arity()` values have been pushed onto
    /// `state.bindings` and the stream position has advanced past the
    /// match. On failure, both the position and the bindings stack are
    /// restored to what they were on entry (§3's core invariant), and the
    /// rightmost-failure tracker is updated.
    pub fn eval(self: &Rc<Expr>, state: &mut EvalState) -> bool {
        let start_pos = state.pos();
        let start_bindings = state.bindings.len();
        let tracing = state.trace.is_some();
        if tracing {
            let descriptor = self.canonical_string();
            state.trace.as_mut().unwrap().enter(start_pos, descriptor);
        }
        let ok = self.eval_inner(state);
        if !ok {
            state.set_pos(start_pos);
            state.bindings.truncate(start_bindings);
            state.record_failure(start_pos, self.canonical_string());
        }
        if tracing {
            let end_pos = if ok { Some(state.pos()) } else { None };
            state.trace.as_mut().unwrap().exit(ok, end_pos);
        }
        ok
    }

    fn eval_inner(self: &Rc<Expr>, state: &mut EvalState) -> bool {
        match self.as_ref() {
            Expr::Anything => eval_anything(state),
            Expr::End => state.at_end(),
            Expr::Prim(v) => eval_prim(state, v),
            Expr::StringPrim(s) => eval_string_prim(state, s),
            Expr::Range(lo, hi) => eval_range(state, lo, hi),
            Expr::UnicodeChar(class) => eval_unicode_char(state, class),
            Expr::Param(_) => unreachable!("Param survived substitution"),
            Expr::Lex(e) => eval_lex(state, e),
            Expr::Alt(terms) => eval_alt(state, terms),
            Expr::Seq(factors) => eval_seq(state, factors),
            Expr::Iter(e, min, max) => eval_iter(state, e, *min, *max),
            Expr::Not(e) => eval_not(state, e),
            Expr::Lookahead(e) => eval_lookahead(state, e),
            Expr::Arr(e) => eval_arr(state, e),
            Expr::Str(e) => eval_str(state, e),
            Expr::Obj(props, exact) => eval_obj(state, props, *exact),
            Expr::Apply(name, args) => crate::apply::apply(state, name, args),
        }
    }
}

fn eval_anything(state: &mut EvalState) -> bool {
    let start = state.pos();
    match state.next_atom() {
        Some(atom) => {
            state.bindings.push(Node::terminal(atom.as_value(), state.interval(start)));
            true
        }
        None => false,
    }
}

fn eval_prim(state: &mut EvalState, expected: &Value) -> bool {
    let start = state.pos();
    match state.peek() {
        Some(atom) if &atom.as_value() == expected => {
            state.next_atom();
            state.bindings.push(Node::terminal(expected.clone(), state.interval(start)));
            true
        }
        _ => false,
    }
}

/// Matches a literal run of characters, e.g. a keyword or operator. Only
/// meaningful over a text stream — a structured stream never yields
/// `Atom::Char`, so this simply fails there.
fn eval_string_prim(state: &mut EvalState, literal: &str) -> bool {
    let start = state.pos();
    for expected in literal.chars() {
        match state.peek() {
            Some(Atom::Char(c)) if c == expected => {
                state.next_atom();
            }
            _ => {
                state.set_pos(start);
                return false;
            }
        }
    }
    state.bindings.push(Node::terminal(Value::Str(literal.to_string()), state.interval(start)));
    true
}

fn eval_range(state: &mut EvalState, lo: &Value, hi: &Value) -> bool {
    let start = state.pos();
    let atom = match state.peek() {
        Some(atom) => atom,
        None => return false,
    };
    let value = atom.as_value();
    let in_range = matches!(value.partial_cmp_domain(lo), Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal))
        && matches!(value.partial_cmp_domain(hi), Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal));
    if !in_range {
        return false;
    }
    state.next_atom();
    state.bindings.push(Node::terminal(value, state.interval(start)));
    true
}

fn eval_unicode_char(state: &mut EvalState, class: &UnicodeClass) -> bool {
    let start = state.pos();
    match state.peek() {
        Some(Atom::Char(c)) if class.matches(c) => {
            state.next_atom();
            state.bindings.push(Node::terminal(Value::Str(c.to_string()), state.interval(start)));
            true
        }
        _ => false,
    }
}

/// Enters lexical context for the duration of `e`'s evaluation. Lexical
/// context overrides syntactic context (§3): no automatic whitespace
/// skipping happens anywhere beneath a `Lex`, even if it is nested inside
/// a syntactic rule.
fn eval_lex(state: &mut EvalState, e: &Rc<Expr>) -> bool {
    let saved = state.syntactic;
    state.syntactic = false;
    let ok = e.eval(state);
    state.syntactic = saved;
    ok
}

fn eval_alt(state: &mut EvalState, terms: &[Rc<Expr>]) -> bool {
    terms.iter().any(|term| term.eval(state))
}

/// Whitespace is skipped before each factor, not just the first, so that
/// `"foo" "bar"` inside a syntactic rule tolerates space on both sides of
/// the gap. `Expr::eval`'s own save/restore already makes this free to
/// attempt unconditionally: if the grammar has no whitespace rule
/// configured, [`crate::apply::skip_whitespace`] is a no-op.
fn eval_seq(state: &mut EvalState, factors: &[Rc<Expr>]) -> bool {
    for factor in factors {
        if state.syntactic {
            crate::apply::skip_whitespace(state);
        }
        if !factor.eval(state) {
            return false;
        }
    }
    true
}

/// Repeats `e` between `min` and `max` (exclusive upper bound `None` means
/// unbounded) times, splicing each repetition's bindings into per-column
/// `_iter` list nodes (§4.1) rather than flattening them. A repetition that
/// matches without consuming input is counted once and then stops the
/// loop, since the source of the bounded match would otherwise repeat
/// forever and starve a packrat memo table.
fn eval_iter(state: &mut EvalState, e: &Rc<Expr>, min: usize, max: Option<usize>) -> bool {
    let arity = e.static_arity();
    let start_pos = state.pos();
    let mut columns: Vec<Vec<Node>> = vec![Vec::new(); arity];
    let mut count = 0usize;
    loop {
        if max.map(|m| count >= m).unwrap_or(false) {
            break;
        }
        let before_pos = state.pos();
        let before_bindings = state.bindings.len();
        if !e.eval(state) {
            break;
        }
        let produced = state.bindings.split_off(before_bindings);
        for (column, node) in columns.iter_mut().zip(produced) {
            column.push(node);
        }
        count += 1;
        if state.pos() == before_pos {
            break;
        }
    }
    if count < min {
        state.set_pos(start_pos);
        return false;
    }
    let end_pos = state.pos();
    for column in columns {
        state.bindings.push(Node::iter_list(column, Interval::new(start_pos, end_pos)));
    }
    true
}

/// Negative lookahead: succeeds iff `e` fails, consuming nothing and
/// binding nothing either way. The probe's own failures are suppressed
/// from the rightmost-failure diagnostic (§4.1) since a `Not` that
/// "fails" expectedly on every other alternative would otherwise drown
/// out the real complaint.
fn eval_not(state: &mut EvalState, e: &Rc<Expr>) -> bool {
    let start_pos = state.pos();
    let start_bindings = state.bindings.len();
    state.begin_suppress_failures();
    let inner_ok = e.eval(state);
    state.end_suppress_failures();
    state.set_pos(start_pos);
    state.bindings.truncate(start_bindings);
    !inner_ok
}

/// Positive lookahead: succeeds iff `e` succeeds, but rewinds position and
/// bindings regardless, same as `Not`.
fn eval_lookahead(state: &mut EvalState, e: &Rc<Expr>) -> bool {
    let start_pos = state.pos();
    let start_bindings = state.bindings.len();
    let ok = e.eval(state);
    state.set_pos(start_pos);
    state.bindings.truncate(start_bindings);
    ok
}

fn eval_arr(state: &mut EvalState, e: &Rc<Expr>) -> bool {
    let start = state.pos();
    let items = match state.peek().map(|a| a.as_value()) {
        Some(Value::Array(items)) => items,
        _ => return false,
    };
    state.next_atom();
    state.push_stream(InputStream::from_values(items));
    let inner_start = state.bindings.len();
    let fully_matched = e.eval(state) && state.at_end();
    let children = state.bindings.split_off(inner_start);
    state.pop_stream();
    if !fully_matched {
        state.set_pos(start);
        return false;
    }
    state.bindings.push(Node::rule(Rc::from("_array"), children, state.interval(start)));
    true
}

fn eval_str(state: &mut EvalState, e: &Rc<Expr>) -> bool {
    let start = state.pos();
    let text = match state.peek().map(|a| a.as_value()) {
        Some(Value::Str(s)) => s,
        _ => return false,
    };
    state.next_atom();
    state.push_stream(InputStream::from_text(&text));
    let inner_start = state.bindings.len();
    let fully_matched = e.eval(state) && state.at_end();
    let children = state.bindings.split_off(inner_start);
    state.pop_stream();
    if !fully_matched {
        state.set_pos(start);
        return false;
    }
    state.bindings.push(Node::rule(Rc::from("_string"), children, state.interval(start)));
    true
}

/// Matches each declared own property of an object atom against its own
/// sub-pattern, in declaration order, each against a single-atom stream
/// holding just that property's value. `exact` additionally requires the
/// object to declare no properties beyond the ones named (§4.1's "closed"
/// object pattern) and binds nothing; a lenient (non-`exact`) match instead
/// binds the remainder of the object's own properties it didn't declare, as
/// a single `Value::Object` terminal (scenario S6).
fn eval_obj(state: &mut EvalState, props: &[ObjProp], exact: bool) -> bool {
    let start = state.pos();
    let value = match state.peek().map(|a| a.as_value()) {
        Some(v) if v.as_object().is_some() => v,
        _ => return false,
    };
    if exact && value.own_property_count() != Some(props.len()) {
        return false;
    }
    state.next_atom();
    for prop in props {
        let field_value = match value.get_own(&prop.name) {
            Some(v) => v.clone(),
            None => {
                state.set_pos(start);
                return false;
            }
        };
        state.push_stream(InputStream::from_single(field_value));
        let inner_start = state.bindings.len();
        let matched = prop.pattern.eval(state) && state.at_end();
        state.bindings.truncate(inner_start);
        state.pop_stream();
        if !matched {
            state.set_pos(start);
            return false;
        }
    }
    if !exact {
        let declared: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        let remainder = value
            .as_object()
            .expect("checked above")
            .iter()
            .filter(|(name, _)| !declared.contains(&name.as_str()))
            .cloned()
            .collect();
        state.bindings.push(Node::terminal(Value::Object(remainder), state.interval(start)));
    }
    true
}
