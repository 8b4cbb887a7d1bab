//! Rule application: packrat memoization and Warth-style seed growing for
//! left recursion (§4.3). Every other [`crate::expr::Expr`] variant is
//! self-contained; `Apply` is the one variant that has to remember what it
//! has already computed at a position and, when it finds itself calling
//! back into its own still-running activation, grow a seed result instead
//! of recursing forever.

use crate::expr::Expr;
use crate::grammar::{Grammar, RuleDef};
use crate::node::Node;
use crate::state::{EvalState, HeadInfo, LrRecord, MemoRec, MemoSlot};
use std::cell::RefCell;
use std::rc::Rc;

/// Evaluates an application of `rule_name` to `args` at the current
/// position. Returns the same `bool` contract as [`Expr::eval`]: on
/// success, exactly one [`Node`] (the rule's own node, wrapping whatever
/// its body bound) is pushed onto `state.bindings`.
pub fn apply(state: &mut EvalState, rule_name: &str, args: &[Rc<Expr>]) -> bool {
    let rule = match state.grammar.rule(rule_name) {
        Some(r) => r.clone(),
        None => return false,
    };
    let body = rule.body.substitute(args);
    let key = Expr::Apply(rule_name.to_string(), args.to_vec()).canonical_string();
    let pos = state.pos();

    let existing = match state.pos_info_mut(pos).slots.get(&key) {
        Some(MemoSlot::Done(memo)) => Some(Replay::Done(memo.clone())),
        Some(MemoSlot::InProgress(lr)) => Some(Replay::InProgress(Rc::clone(lr))),
        None => None,
    };

    match existing {
        Some(Replay::Done(memo)) => replay(state, memo),
        Some(Replay::InProgress(lr_rc)) => replay_recursive(state, &key, pos, lr_rc),
        None => fresh_application(state, rule_name, &rule, &body, &key, pos),
    }
}

enum Replay {
    Done(MemoRec),
    InProgress(Rc<RefCell<LrRecord>>),
}

fn replay(state: &mut EvalState, memo: MemoRec) -> bool {
    match memo.value {
        Some(node) => {
            state.set_pos(memo.end_pos);
            state.bindings.push(node);
            true
        }
        None => false,
    }
}

/// A reentrant application of a rule already on the application stack:
/// this is left recursion. Marks every stack frame between the current one
/// and the original activation as involved (Warth et al.'s `setupLR`), and
/// returns whatever seed has been grown so far — `None` on the very first
/// detection, when no seed exists yet.
fn replay_recursive(
    state: &mut EvalState,
    key: &str,
    pos: usize,
    lr_rc: Rc<RefCell<LrRecord>>,
) -> bool {
    let head = {
        let mut lr = lr_rc.borrow_mut();
        if lr.head.is_none() {
            lr.head = Some(Rc::new(RefCell::new(HeadInfo::default())));
        }
        Rc::clone(lr.head.as_ref().unwrap())
    };
    state.setup_lr(key, pos, &head);
    let (seed, seed_end_pos) = {
        let lr = lr_rc.borrow();
        (lr.seed.clone(), lr.seed_end_pos)
    };
    match seed {
        Some(node) => {
            state.set_pos(seed_end_pos);
            state.bindings.push(node);
            true
        }
        None => false,
    }
}

fn fresh_application(
    state: &mut EvalState,
    rule_name: &str,
    rule: &RuleDef,
    body: &Rc<Expr>,
    key: &str,
    pos: usize,
) -> bool {
    let lr_rc = Rc::new(RefCell::new(LrRecord { seed: None, seed_end_pos: pos, head: None }));
    state.pos_info_mut(pos).slots.insert(key.to_string(), MemoSlot::InProgress(Rc::clone(&lr_rc)));
    state.push_application(key.to_string(), pos, Rc::clone(&lr_rc));
    let first_result = run_body(state, rule_name, rule, body, pos);
    let first_end_pos = state.pos();
    state.pop_application();

    let head = lr_rc.borrow().head.clone();
    match head {
        Some(head) if head.borrow().involved.contains(key) => {
            // Merely involved in someone else's left recursion, not its head:
            // §4.3's third case says not to memoize. Drop the in-progress
            // slot entirely so the next reentry at this position (during the
            // head's next growth pass) reruns the body instead of replaying
            // whatever this pass happened to return.
            state.pos_info_mut(pos).slots.remove(key);
            finish(state, first_result, pos, first_end_pos)
        }
        Some(_) => {
            lr_rc.borrow_mut().seed = first_result;
            lr_rc.borrow_mut().seed_end_pos = first_end_pos;
            let (final_value, final_end_pos) = grow_seed(state, rule_name, rule, body, key, pos, &lr_rc);
            state.pos_info_mut(pos).slots.insert(
                key.to_string(),
                MemoSlot::Done(MemoRec { value: final_value.clone(), end_pos: final_end_pos }),
            );
            finish(state, final_value, pos, final_end_pos)
        }
        None => {
            state.pos_info_mut(pos).slots.insert(
                key.to_string(),
                MemoSlot::Done(MemoRec { value: first_result.clone(), end_pos: first_end_pos }),
            );
            finish(state, first_result, pos, first_end_pos)
        }
    }
}

fn finish(state: &mut EvalState, value: Option<Node>, start_pos: usize, end_pos: usize) -> bool {
    match value {
        Some(node) => {
            state.set_pos(end_pos);
            state.bindings.push(node);
            true
        }
        None => {
            state.set_pos(start_pos);
            false
        }
    }
}

/// Re-runs `body` from `start_pos` as long as each attempt advances
/// further than the last committed one, committing the improved result
/// each time (§4.3's `growSeedResult`). Stops on the first attempt that
/// fails to advance and returns the last committed seed — this is always
/// at least the placeholder failure recorded before growth began.
fn grow_seed(
    state: &mut EvalState,
    rule_name: &str,
    rule: &RuleDef,
    body: &Rc<Expr>,
    key: &str,
    start_pos: usize,
    lr_rc: &Rc<RefCell<LrRecord>>,
) -> (Option<Node>, usize) {
    loop {
        state.set_pos(start_pos);
        state.pos_info_mut(start_pos).slots.insert(key.to_string(), MemoSlot::InProgress(Rc::clone(lr_rc)));
        state.push_application(key.to_string(), start_pos, Rc::clone(lr_rc));
        let attempt = run_body(state, rule_name, rule, body, start_pos);
        state.pop_application();
        let attempt_end = state.pos();
        let prev_end = lr_rc.borrow().seed_end_pos;

        if attempt.is_some() && attempt_end > prev_end {
            lr_rc.borrow_mut().seed = attempt;
            lr_rc.borrow_mut().seed_end_pos = attempt_end;
            continue;
        }
        if let Some(trace) = state.trace.as_mut() {
            trace.drop_last_child();
        }
        break;
    }
    let lr = lr_rc.borrow();
    (lr.seed.clone(), lr.seed_end_pos)
}

/// Evaluates a rule's (already-substituted) body once, entering syntactic
/// context if the rule's name calls for it, and wrapping the result in the
/// rule's own [`Node`]. When the rule carries a description, every failure
/// underneath it is suppressed from the rightmost-failure diagnostic and
/// replaced with a single failure naming the rule itself (§4.3).
fn run_body(state: &mut EvalState, rule_name: &str, rule: &RuleDef, body: &Rc<Expr>, start_pos: usize) -> Option<Node> {
    state.log.log_entry(rule_name, start_pos);
    let saved_syntactic = state.syntactic;
    if Grammar::is_syntactic_name(rule_name) {
        state.syntactic = true;
    }
    let bindings_start = state.bindings.len();
    let ok = match &rule.description {
        Some(description) => {
            state.begin_suppress_failures();
            let ok = body.eval(state);
            state.end_suppress_failures();
            if !ok {
                state.record_failure(start_pos, description.clone());
            }
            ok
        }
        None => body.eval(state),
    };
    let children = state.bindings.split_off(bindings_start);
    state.syntactic = saved_syntactic;
    if ok {
        state.log.log_success(rule_name, start_pos, state.pos());
    } else {
        state.log.log_failure(rule_name, start_pos);
    }
    ok.then(|| Node::rule(Rc::from(rule_name), children, state.interval(start_pos)))
}

/// Skips the grammar's designated whitespace rule zero or more times.
/// A no-op when no whitespace rule is configured, and safe to call from
/// inside the whitespace rule's own expansion since that rule is applied
/// through the ordinary [`apply`] path and so is itself packrat-memoized.
pub fn skip_whitespace(state: &mut EvalState) {
    let rule_name = match &state.grammar.whitespace_rule {
        Some(name) => name.clone(),
        None => return,
    };
    loop {
        let before_pos = state.pos();
        let before_bindings = state.bindings.len();
        let matched = apply(state, &rule_name, &[]);
        state.bindings.truncate(before_bindings);
        if !matched || state.pos() == before_pos {
            state.set_pos(before_pos);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;
    use crate::matcher::{match_grammar, Input, MatchResult};
    use crate::value::Value;

    fn digit() -> Rc<Expr> {
        Rc::new(Expr::Range(Value::Str("0".to_string()), Value::Str("9".to_string())))
    }

    #[test]
    fn left_recursive_application_converges_to_the_longest_match() {
        // Chain = Chain "," [0-9] / [0-9]
        let body = Rc::new(Expr::Alt(vec![
            Rc::new(Expr::Seq(vec![
                Rc::new(Expr::Apply("Chain".to_string(), vec![])),
                Rc::new(Expr::StringPrim(",".to_string())),
                digit(),
            ])),
            digit(),
        ]));
        let grammar =
            GrammarBuilder::new().add_rule("Chain", RuleDef::new(body)).start_rule("Chain").build().unwrap();

        match match_grammar(&grammar, Input::Text("1,2,3,4".to_string()), None, vec![]) {
            MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 7)),
            MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
        }
    }

    #[test]
    fn a_rule_with_no_left_recursive_reentry_runs_exactly_once_per_position() {
        let body = digit();
        let grammar =
            GrammarBuilder::new().add_rule("Digit", RuleDef::new(body)).start_rule("Digit").build().unwrap();

        match match_grammar(&grammar, Input::Text("5".to_string()), None, vec![]) {
            MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 1)),
            MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
        }
    }
}
