use crate::error::GrammarError;
use crate::expr::Expr;
use std::collections::HashMap;
use std::rc::Rc;

/// A single rule: its body expression, plus an optional human-readable
/// description. When present, the description is the label used to
/// collapse every internal failure of the rule's body into one synthetic
/// failure (§4.3) — the same mechanism a compiled grammar source attaches
/// to rules declared with a doc string, e.g. `ident (an identifier) = ...`.
#[derive(Clone, Debug)]
pub struct RuleDef {
    pub body: Rc<Expr>,
    pub description: Option<String>,
    pub param_count: usize,
}

impl RuleDef {
    pub fn new(body: Rc<Expr>) -> Self {
        Self { body, description: None, param_count: 0 }
    }

    pub fn with_params(body: Rc<Expr>, param_count: usize) -> Self {
        Self { body, description: None, param_count }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A compiled grammar: a rule dictionary, the designated whitespace rule
/// (if any), and the default start rule. Grammar source parsing is out of
/// scope for this crate (§1) — callers build a `Grammar` directly via
/// [`GrammarBuilder`] from already-desugared [`Expr`] trees.
#[derive(Debug)]
pub struct Grammar {
    pub rules: HashMap<String, RuleDef>,
    pub whitespace_rule: Option<String>,
    pub start_rule: Option<String>,
}

impl Grammar {
    pub fn rule(&self, name: &str) -> Option<&RuleDef> {
        self.rules.get(name)
    }

    /// A rule is syntactic iff its name begins with an uppercase ASCII
    /// letter (§3's "syntactic rules" definition).
    pub fn is_syntactic_name(name: &str) -> bool {
        name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
    }
}

/// Builds and validates a [`Grammar`]. Unlike the teacher library's
/// `DefaultParser`/`LexerlessParser` validation pass, this builder never
/// rejects left recursion — detecting and resolving it is this crate's
/// entire purpose (§4.7). It still fails fast on the genuine programmer
/// errors: an `Apply` naming a rule that was never added, or a `Param`
/// index with no declared parameter of that index on its own rule.
#[derive(Default)]
pub struct GrammarBuilder {
    rules: HashMap<String, RuleDef>,
    whitespace_rule: Option<String>,
    start_rule: Option<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(mut self, name: impl Into<String>, def: RuleDef) -> Self {
        self.rules.insert(name.into(), def);
        self
    }

    pub fn whitespace_rule(mut self, name: impl Into<String>) -> Self {
        self.whitespace_rule = Some(name.into());
        self
    }

    pub fn start_rule(mut self, name: impl Into<String>) -> Self {
        self.start_rule = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        for (name, def) in &self.rules {
            validate_expr(&def.body, name, def.param_count, &self.rules)?;
        }
        if let Some(ws) = &self.whitespace_rule {
            if !self.rules.contains_key(ws) {
                return Err(GrammarError::UnknownRule {
                    rule: ws.clone(),
                    referenced_from: "<whitespace_rule>".to_string(),
                });
            }
        }
        if let Some(start) = &self.start_rule {
            if !self.rules.contains_key(start) {
                return Err(GrammarError::UnknownRule {
                    rule: start.clone(),
                    referenced_from: "<start_rule>".to_string(),
                });
            }
        }
        Ok(Grammar {
            rules: self.rules,
            whitespace_rule: self.whitespace_rule,
            start_rule: self.start_rule,
        })
    }
}

fn validate_expr(
    expr: &Expr,
    owner: &str,
    param_count: usize,
    rules: &HashMap<String, RuleDef>,
) -> Result<(), GrammarError> {
    match expr {
        Expr::Anything
        | Expr::End
        | Expr::Prim(_)
        | Expr::StringPrim(_)
        | Expr::Range(_, _)
        | Expr::UnicodeChar(_) => Ok(()),
        Expr::Param(i) => {
            if *i >= param_count {
                Err(GrammarError::ParamIndexOutOfRange {
                    rule: owner.to_string(),
                    index: *i,
                    declared_params: param_count,
                })
            } else {
                Ok(())
            }
        }
        Expr::Lex(e) | Expr::Not(e) | Expr::Lookahead(e) | Expr::Arr(e) | Expr::Str(e) => {
            validate_expr(e, owner, param_count, rules)
        }
        Expr::Iter(e, _, _) => validate_expr(e, owner, param_count, rules),
        Expr::Alt(ts) => ts.iter().try_for_each(|t| validate_expr(t, owner, param_count, rules)),
        Expr::Seq(fs) => fs.iter().try_for_each(|f| validate_expr(f, owner, param_count, rules)),
        Expr::Obj(props, _) => {
            props.iter().try_for_each(|p| validate_expr(&p.pattern, owner, param_count, rules))
        }
        Expr::Apply(rule_name, args) => {
            if !rules.contains_key(rule_name.as_str()) {
                return Err(GrammarError::UnknownRule {
                    rule: rule_name.to_string(),
                    referenced_from: owner.to_string(),
                });
            }
            args.iter().try_for_each(|a| validate_expr(a, owner, param_count, rules))
        }
    }
}
