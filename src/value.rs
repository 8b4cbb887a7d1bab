use std::fmt::{Debug, Formatter};

/// The dynamic payload carried by a non-text atom, and by every terminal
/// [`Node`](crate::node::Node).
///
/// This is the Rust rendering of the design note in §9: "model dynamic-shape
/// input atoms as a tagged `Value = String | Array[Value] | Object(map) |
/// Atom(primitive)`". `Object` keeps insertion order so that the "own
/// properties" enumeration `Obj` relies on (§4.1) is deterministic without
/// needing a separate ordered-map dependency.
#[derive(Clone, PartialEq)]
pub enum Value {
    Undefined,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(props) => {
                let mut m = f.debug_map();
                for (k, v) in props {
                    m.entry(k, v);
                }
                m.finish()
            }
        }
    }
}

impl Value {
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(props) => Some(props),
            _ => None,
        }
    }

    /// Looks up an own property by name; mirrors `hasOwnProperty` + member
    /// access from §4.1's `Obj` description in one call.
    pub fn get_own(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(props) => props.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn own_property_count(&self) -> Option<usize> {
        match self {
            Value::Object(props) => Some(props.len()),
            _ => None,
        }
    }

    /// The partial order `Range` relies on: only numbers and strings (taken
    /// as single characters) are ordered domains for this crate's purposes.
    pub fn partial_cmp_domain(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}
