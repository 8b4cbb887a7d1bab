use seedrat_peg::{
    match_grammar, match_grammar_logged, trace_grammar, Expr, Grammar, GrammarBuilder, GrammarError,
    Input, Log, MatchResult, RuleDef, Value,
};
use std::rc::Rc;

fn digits_grammar() -> Grammar {
    // Num = [0-9]+
    let num_body = Rc::new(Expr::Iter(
        Rc::new(Expr::Range(Value::Str("0".to_string()), Value::Str("9".to_string()))),
        1,
        None,
    ));
    GrammarBuilder::new().add_rule("Num", RuleDef::new(num_body)).start_rule("Num").build().unwrap()
}

#[test]
fn matches_a_run_of_digits_and_consumes_all_of_it() {
    let grammar = digits_grammar();
    match match_grammar(&grammar, Input::Text("42017".to_string()), None, vec![]) {
        MatchResult::Success(root) => {
            assert_eq!((root.interval.start, root.interval.end), (0, 5));
        }
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn trailing_garbage_fails_the_top_level_end_requirement() {
    let grammar = digits_grammar();
    match match_grammar(&grammar, Input::Text("42a".to_string()), None, vec![]) {
        MatchResult::Success(root) => panic!("should not have matched the whole input: {root:?}"),
        MatchResult::Failure(failure) => assert_eq!(failure.pos, 2),
    }
}

fn left_recursive_sum_grammar() -> Grammar {
    // Sum = Sum "+" Num / Num
    // Num = [0-9]+
    let sum_body = Rc::new(Expr::Alt(vec![
        Rc::new(Expr::Seq(vec![
            Rc::new(Expr::Apply("Sum".to_string(), vec![])),
            Rc::new(Expr::StringPrim("+".to_string())),
            Rc::new(Expr::Apply("Num".to_string(), vec![])),
        ])),
        Rc::new(Expr::Apply("Num".to_string(), vec![])),
    ]));
    let num_body = Rc::new(Expr::Iter(
        Rc::new(Expr::Range(Value::Str("0".to_string()), Value::Str("9".to_string()))),
        1,
        None,
    ));
    GrammarBuilder::new()
        .add_rule("Sum", RuleDef::new(sum_body))
        .add_rule("Num", RuleDef::new(num_body))
        .start_rule("Sum")
        .build()
        .unwrap()
}

#[test]
fn direct_left_recursion_grows_a_left_associative_chain() {
    let grammar = left_recursive_sum_grammar();
    match match_grammar(&grammar, Input::Text("1+2+3".to_string()), None, vec![]) {
        MatchResult::Success(root) => {
            assert_eq!((root.interval.start, root.interval.end), (0, 5));
            // The outermost Sum wraps a Sum ("1+2") and a trailing Num ("3"),
            // not a Num wrapping a trailing Sum -- that's the left-associativity
            // the seed-growing loop is responsible for.
            let inner_sums = root.list_rule("Sum");
            assert!(inner_sums.len() >= 2, "expected nested Sum nodes from left recursion");
        }
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn a_bare_number_short_circuits_without_growing_any_seed() {
    let grammar = left_recursive_sum_grammar();
    match match_grammar(&grammar, Input::Text("7".to_string()), None, vec![]) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 1)),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

fn indirect_left_recursion_grammar() -> Grammar {
    // A = B "x" / "y"
    // B = A
    let a_body = Rc::new(Expr::Alt(vec![
        Rc::new(Expr::Seq(vec![
            Rc::new(Expr::Apply("B".to_string(), vec![])),
            Rc::new(Expr::StringPrim("x".to_string())),
        ])),
        Rc::new(Expr::StringPrim("y".to_string())),
    ]));
    let b_body = Rc::new(Expr::Apply("A".to_string(), vec![]));
    GrammarBuilder::new()
        .add_rule("A", RuleDef::new(a_body))
        .add_rule("B", RuleDef::new(b_body))
        .start_rule("A")
        .build()
        .unwrap()
}

#[test]
fn indirect_left_recursion_between_two_rules_still_converges() {
    let grammar = indirect_left_recursion_grammar();
    match match_grammar(&grammar, Input::Text("yxx".to_string()), None, vec![]) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 3)),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn not_rejects_a_keyword_immediately_followed_by_an_identifier_char() {
    // Word = !("if" Letter) "if"
    let letter = Rc::new(Expr::UnicodeChar(seedrat_peg::UnicodeClass::Letter));
    let word_body = Rc::new(Expr::Seq(vec![
        Rc::new(Expr::Not(Rc::new(Expr::Seq(vec![Rc::new(Expr::StringPrim("if".to_string())), letter])))),
        Rc::new(Expr::StringPrim("if".to_string())),
    ]));
    let grammar =
        GrammarBuilder::new().add_rule("Word", RuleDef::new(word_body)).start_rule("Word").build().unwrap();

    match match_grammar(&grammar, Input::Text("if".to_string()), None, vec![]) {
        MatchResult::Success(_) => {}
        MatchResult::Failure(failure) => panic!("bare 'if' should match, got {failure}"),
    }
    match match_grammar(&grammar, Input::Text("iffy".to_string()), None, vec![]) {
        MatchResult::Success(root) => panic!("'iffy' should not match as a bare keyword: {root:?}"),
        MatchResult::Failure(_) => {}
    }
}

#[test]
fn iter_minimum_count_is_enforced() {
    // Pair = .{2,}
    let body = Rc::new(Expr::Iter(Rc::new(Expr::Anything), 2, None));
    let grammar = GrammarBuilder::new().add_rule("Pair", RuleDef::new(body)).start_rule("Pair").build().unwrap();

    match match_grammar(&grammar, Input::Text("a".to_string()), None, vec![]) {
        MatchResult::Success(root) => panic!("a single atom should not satisfy a minimum of 2: {root:?}"),
        MatchResult::Failure(failure) => assert_eq!(failure.pos, 0),
    }
    match match_grammar(&grammar, Input::Text("ab".to_string()), None, vec![]) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 2)),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn structured_input_descends_through_arr_and_obj_patterns() {
    // Entry = { "name": Str(Letter+), "tags": [Str(Letter+)*] }! (exact)
    let name_pattern = Rc::new(Expr::Str(Rc::new(Expr::Iter(
        Rc::new(Expr::UnicodeChar(seedrat_peg::UnicodeClass::Letter)),
        1,
        None,
    ))));
    let tag_pattern = Rc::new(Expr::Str(Rc::new(Expr::Iter(
        Rc::new(Expr::UnicodeChar(seedrat_peg::UnicodeClass::Letter)),
        1,
        None,
    ))));
    let entry_body = Rc::new(Expr::Obj(
        vec![
            seedrat_peg::ObjProp { name: "name".to_string(), pattern: name_pattern },
            seedrat_peg::ObjProp {
                name: "tags".to_string(),
                pattern: Rc::new(Expr::Arr(Rc::new(Expr::Iter(tag_pattern, 0, None)))),
            },
        ],
        true,
    ));
    let grammar =
        GrammarBuilder::new().add_rule("Entry", RuleDef::new(entry_body)).start_rule("Entry").build().unwrap();

    let matching = Value::Object(vec![
        ("name".to_string(), Value::Str("alice".to_string())),
        (
            "tags".to_string(),
            Value::Array(vec![Value::Str("admin".to_string()), Value::Str("staff".to_string())]),
        ),
    ]);
    match match_grammar(&grammar, Input::Structured(matching), None, vec![]) {
        MatchResult::Success(root) => assert_eq!(&*root.rule_name, "Entry"),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }

    let wrong_shape_tags = Value::Object(vec![
        ("name".to_string(), Value::Str("alice".to_string())),
        ("tags".to_string(), Value::Str("not an array".to_string())),
    ]);
    match match_grammar(&grammar, Input::Structured(wrong_shape_tags), None, vec![]) {
        MatchResult::Success(root) => panic!("tags holding a string, not an array, should fail: {root:?}"),
        MatchResult::Failure(_) => {}
    }
}

#[test]
fn lenient_obj_binds_the_remainder_of_undeclared_own_properties() {
    // Rec = { name: Str(Letter+), ... }  (lenient)
    let name_pattern = Rc::new(Expr::Str(Rc::new(Expr::Iter(
        Rc::new(Expr::UnicodeChar(seedrat_peg::UnicodeClass::Letter)),
        1,
        None,
    ))));
    let rec_body = Rc::new(Expr::Obj(
        vec![seedrat_peg::ObjProp { name: "name".to_string(), pattern: name_pattern }],
        false,
    ));
    let grammar =
        GrammarBuilder::new().add_rule("Rec", RuleDef::new(rec_body)).start_rule("Rec").build().unwrap();

    let value = Value::Object(vec![
        ("name".to_string(), Value::Str("a".to_string())),
        ("extra".to_string(), Value::Number(7.0)),
    ]);
    match match_grammar(&grammar, Input::Structured(value), None, vec![]) {
        MatchResult::Success(root) => {
            assert_eq!(root.children.len(), 1, "lenient Obj should bind exactly the remainder");
            let remainder = root.children[0].value.as_ref().expect("remainder is a terminal");
            assert_eq!(remainder, &Value::Object(vec![("extra".to_string(), Value::Number(7.0))]));
        }
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn exact_obj_rejects_undeclared_own_properties() {
    // Rec = { name: Str(Letter+) }!  (exact)
    let name_pattern = Rc::new(Expr::Str(Rc::new(Expr::Iter(
        Rc::new(Expr::UnicodeChar(seedrat_peg::UnicodeClass::Letter)),
        1,
        None,
    ))));
    let rec_body = Rc::new(Expr::Obj(
        vec![seedrat_peg::ObjProp { name: "name".to_string(), pattern: name_pattern }],
        true,
    ));
    let grammar =
        GrammarBuilder::new().add_rule("Rec", RuleDef::new(rec_body)).start_rule("Rec").build().unwrap();

    let value = Value::Object(vec![
        ("name".to_string(), Value::Str("a".to_string())),
        ("extra".to_string(), Value::Number(7.0)),
    ]);
    match match_grammar(&grammar, Input::Structured(value), None, vec![]) {
        MatchResult::Success(root) => panic!("exact Obj should reject the extra property: {root:?}"),
        MatchResult::Failure(_) => {}
    }
}

#[test]
fn syntactic_rules_skip_whitespace_between_seq_factors() {
    // ws = " "*
    // Pair = "a" "b"   (syntactic: uppercase name, skips ws around each factor)
    let ws_body = Rc::new(Expr::Iter(Rc::new(Expr::StringPrim(" ".to_string())), 0, None));
    let pair_body = Rc::new(Expr::Seq(vec![
        Rc::new(Expr::StringPrim("a".to_string())),
        Rc::new(Expr::StringPrim("b".to_string())),
    ]));
    let grammar = GrammarBuilder::new()
        .add_rule("ws", RuleDef::new(ws_body))
        .add_rule("Pair", RuleDef::new(pair_body))
        .whitespace_rule("ws")
        .start_rule("Pair")
        .build()
        .unwrap();

    match match_grammar(&grammar, Input::Text("a   b".to_string()), None, vec![]) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 5)),
        MatchResult::Failure(failure) => panic!("expected whitespace-tolerant match, got {failure}"),
    }
}

#[test]
fn lex_suppresses_whitespace_skipping_even_inside_a_syntactic_rule() {
    let ws_body = Rc::new(Expr::Iter(Rc::new(Expr::StringPrim(" ".to_string())), 0, None));
    // Pair = #("a" "b")  -- Lex overrides the syntactic whitespace skipping.
    let pair_body = Rc::new(Expr::Lex(Rc::new(Expr::Seq(vec![
        Rc::new(Expr::StringPrim("a".to_string())),
        Rc::new(Expr::StringPrim("b".to_string())),
    ]))));
    let grammar = GrammarBuilder::new()
        .add_rule("ws", RuleDef::new(ws_body))
        .add_rule("Pair", RuleDef::new(pair_body))
        .whitespace_rule("ws")
        .start_rule("Pair")
        .build()
        .unwrap();

    match match_grammar(&grammar, Input::Text("a b".to_string()), None, vec![]) {
        MatchResult::Success(root) => panic!("Lex should have blocked whitespace skipping: {root:?}"),
        MatchResult::Failure(_) => {}
    }
    match match_grammar(&grammar, Input::Text("ab".to_string()), None, vec![]) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 2)),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn building_a_grammar_with_an_undefined_rule_reference_is_rejected() {
    let body = Rc::new(Expr::Apply("DoesNotExist".to_string(), vec![]));
    let result = GrammarBuilder::new().add_rule("Start", RuleDef::new(body)).start_rule("Start").build();
    match result {
        Err(GrammarError::UnknownRule { rule, .. }) => assert_eq!(rule, "DoesNotExist"),
        other => panic!("expected UnknownRule, got {other:?}"),
    }
}

#[test]
fn building_a_grammar_with_a_param_index_out_of_range_is_rejected() {
    let body = Rc::new(Expr::Param(3));
    let result = GrammarBuilder::new()
        .add_rule("Start", RuleDef::with_params(body, 1))
        .start_rule("Start")
        .build();
    match result {
        Err(GrammarError::ParamIndexOutOfRange { index, declared_params, .. }) => {
            assert_eq!(index, 3);
            assert_eq!(declared_params, 1);
        }
        other => panic!("expected ParamIndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn packrat_memoization_is_idempotent_across_alt_backtracking() {
    // Probe = (Num "!" / Num) -- both Alt branches attempt Num at the same
    // position; the second attempt must replay the first's memoized result
    // rather than re-running Num's body.
    let num_body = Rc::new(Expr::Iter(
        Rc::new(Expr::Range(Value::Str("0".to_string()), Value::Str("9".to_string()))),
        1,
        None,
    ));
    let probe_body = Rc::new(Expr::Alt(vec![
        Rc::new(Expr::Seq(vec![
            Rc::new(Expr::Apply("Num".to_string(), vec![])),
            Rc::new(Expr::StringPrim("!".to_string())),
        ])),
        Rc::new(Expr::Apply("Num".to_string(), vec![])),
    ]));
    let grammar = GrammarBuilder::new()
        .add_rule("Num", RuleDef::new(num_body))
        .add_rule("Probe", RuleDef::new(probe_body))
        .start_rule("Probe")
        .build()
        .unwrap();

    match match_grammar(&grammar, Input::Text("123".to_string()), None, vec![]) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 3)),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}

#[test]
fn trace_grammar_records_a_non_empty_attempt_tree() {
    let grammar = digits_grammar();
    let (result, trace) = trace_grammar(&grammar, Input::Text("9".to_string()), None, vec![]);
    assert!(matches!(result, MatchResult::Success(_)));
    let root = trace.expect("a trace was requested and should be populated");
    assert!(root.success);
    assert!(!root.children.is_empty(), "the top-level Seq should have recorded its Apply/End children");
}

#[test]
fn match_grammar_logged_runs_to_the_same_result_as_match_grammar() {
    let grammar = digits_grammar();
    match match_grammar_logged(&grammar, Input::Text("9".to_string()), None, vec![], Log::Verbose("trace")) {
        MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 1)),
        MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
    }
}
