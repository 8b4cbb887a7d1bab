//! A packrat evaluation core for parsing expression grammars, with support
//! for left-recursive rules via Warth et al.'s seed-growing algorithm.
//!
//! A grammar is a dictionary of named rules built with [`GrammarBuilder`],
//! each rule's body an [`Expr`] tree. [`match_grammar`] runs a grammar
//! against an [`Input`] (text or an already-parsed structured [`Value`])
//! and returns either the resulting parse [`Node`] or a [`error::MatchFailure`]
//! describing the rightmost position the parse reached and what it expected
//! there. [`trace_grammar`] runs the same match while additionally
//! recording every expression attempted, for callers that want to inspect
//! *how* a grammar arrived at its answer rather than only the answer
//! itself.
//!
//! Unlike a typical recursive-descent parser generator, a rule here is
//! free to call itself (directly or through other rules) at the same
//! position it started from — the left recursion a plain packrat parser
//! would either reject at grammar-build time or loop forever on. This
//! crate resolves it instead: the first recursive reentry returns a
//! failure placeholder, the outer call's result becomes a "seed", and the
//! rule is re-evaluated from scratch as long as each pass consumes more
//! input than the last.
//!
//! ```
//! use seedrat_peg::{match_grammar, Expr, GrammarBuilder, Input, MatchResult, RuleDef, Value};
//! use std::rc::Rc;
//!
//! // Sum = Sum "+" Num / Num
//! // Num = [0-9]+
//! let sum_body = Rc::new(Expr::Alt(vec![
//!     Rc::new(Expr::Seq(vec![
//!         Rc::new(Expr::Apply("Sum".to_string(), vec![])),
//!         Rc::new(Expr::StringPrim("+".to_string())),
//!         Rc::new(Expr::Apply("Num".to_string(), vec![])),
//!     ])),
//!     Rc::new(Expr::Apply("Num".to_string(), vec![])),
//! ]));
//! let num_body = Rc::new(Expr::Iter(
//!     Rc::new(Expr::Range(Value::Str("0".to_string()), Value::Str("9".to_string()))),
//!     1,
//!     None,
//! ));
//!
//! let grammar = GrammarBuilder::new()
//!     .add_rule("Sum", RuleDef::new(sum_body))
//!     .add_rule("Num", RuleDef::new(num_body))
//!     .start_rule("Sum")
//!     .build()
//!     .expect("grammar only references rules it defines");
//!
//! match match_grammar(&grammar, Input::Text("1+2+3".to_string()), None, vec![]) {
//!     MatchResult::Success(root) => assert_eq!((root.interval.start, root.interval.end), (0, 5)),
//!     MatchResult::Failure(failure) => panic!("expected a match, got {failure}"),
//! }
//! ```

pub mod error;
pub mod expr;
pub mod grammar;
pub mod matcher;
pub mod node;
pub mod stream;
pub mod trace;
pub mod util;
pub mod value;

mod apply;
mod state;

pub use error::{GrammarError, MatchFailure};
pub use expr::{Expr, ObjProp, UnicodeClass};
pub use grammar::{Grammar, GrammarBuilder, RuleDef};
pub use matcher::{match_grammar, match_grammar_logged, trace_grammar, Input, MatchResult};
pub use node::Node;
pub use stream::{Atom, InputStream, Interval};
pub use trace::{TraceBuilder, TraceEntry};
pub use util::Log;
pub use value::Value;
