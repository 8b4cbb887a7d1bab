use crate::stream::Interval;
use crate::value::Value;
use ptree::TreeItem;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Marker name used for the list node `Iter` splices onto the bindings
/// stack (§4.1): one `_iter` node per original binding column, holding the
/// full run of matches for that column.
pub const ITER_NODE: &str = "_iter";

/// A parse-tree node. The source distinguishes `Node` (rule-labeled,
/// children, no value) from `TerminalNode` (a value, no children); this
/// crate collapses both into one struct — `value.is_some()` exactly when
/// the node is a terminal leaf — because every construction site already
/// knows which shape it is building and a shared type lets `_iter` splices
/// and rule nodes share the same `Vec<Node>` child storage.
#[derive(Clone)]
pub struct Node {
    pub rule_name: Rc<str>,
    pub value: Option<Value>,
    pub children: Vec<Node>,
    pub interval: Interval,
}

impl Node {
    pub fn rule(rule_name: Rc<str>, children: Vec<Node>, interval: Interval) -> Self {
        Self { rule_name, value: None, children, interval }
    }

    pub fn terminal(value: Value, interval: Interval) -> Self {
        Self { rule_name: Rc::from("_terminal"), value: Some(value), children: Vec::new(), interval }
    }

    pub fn iter_list(children: Vec<Node>, interval: Interval) -> Self {
        Self { rule_name: Rc::from(ITER_NODE), value: None, children, interval }
    }

    pub fn is_terminal(&self) -> bool {
        self.value.is_some()
    }

    /// Depth-first search for the first node carrying this rule name.
    pub fn find_rule(&self, rule_name: &str) -> Option<&Node> {
        if &*self.rule_name == rule_name {
            Some(self)
        } else {
            self.children.iter().find_map(|c| c.find_rule(rule_name))
        }
    }

    /// All nodes (at any depth) carrying this rule name, in document order.
    pub fn list_rule<'a>(&'a self, rule_name: &str) -> Vec<&'a Node> {
        let mut out = Vec::new();
        self.walk(&mut out, rule_name);
        out
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a Node>, rule_name: &str) {
        if &*self.rule_name == rule_name {
            out.push(self);
        }
        for c in &self.children {
            c.walk(out, rule_name);
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("rule_name", &self.rule_name);
        if let Some(v) = &self.value {
            s.field("value", v);
        }
        s.field("start", &self.interval.start).field("end", &self.interval.end);
        if !self.children.is_empty() {
            s.field("children", &self.children);
        }
        s.finish()
    }
}

impl TreeItem for Node {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match &self.value {
            Some(v) => write!(f, "{:?} # {}-{}", v, self.interval.start, self.interval.end),
            None => write!(f, "{} # {}-{}", self.rule_name, self.interval.start, self.interval.end),
        }
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(&self.children)
    }
}

impl Node {
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}
