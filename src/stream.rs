use crate::value::Value;
use std::rc::Rc;

/// One element of an [`InputStream`]: a code point when the stream was
/// built over text, or an arbitrary [`Value`] when built over a structured
/// (array/object) input. `Arr`/`Str`/`Obj` dispatch on this tag (§4.1).
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Char(char),
    Value(Value),
}

impl Atom {
    pub fn as_value(&self) -> Value {
        match self {
            Atom::Char(c) => Value::Str(c.to_string()),
            Atom::Value(v) => v.clone(),
        }
    }
}

/// A half-open `[start, end)` span over an [`InputStream`], used as every
/// [`Node`](crate::node::Node)'s source interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn point(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }
}

/// A positioned cursor over a sequence of atoms, with random access by
/// index. `pos` only ever moves forward within a single successful match;
/// callers restore it on failure (§3's invariant).
#[derive(Clone)]
pub struct InputStream {
    atoms: Rc<Vec<Atom>>,
    pos: usize,
}

impl InputStream {
    pub fn from_text(text: &str) -> Self {
        Self { atoms: Rc::new(text.chars().map(Atom::Char).collect()), pos: 0 }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self { atoms: Rc::new(values.into_iter().map(Atom::Value).collect()), pos: 0 }
    }

    pub fn from_single(value: Value) -> Self {
        Self::from_values(vec![value])
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.atoms.len());
        self.pos = pos;
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.atoms.len()
    }

    pub fn peek(&self) -> Option<&Atom> {
        self.atoms.get(self.pos)
    }

    /// Consumes and returns the atom at the cursor, advancing it by one.
    pub fn next(&mut self) -> Option<Atom> {
        let atom = self.atoms.get(self.pos).cloned();
        if atom.is_some() {
            self.pos += 1;
        }
        atom
    }

    pub fn interval(&self, start: usize) -> Interval {
        Interval::new(start, self.pos)
    }
}
