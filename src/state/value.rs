use std::fmt;
use std::sync::Arc;

/// Observable value held by a slot or produced by a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Status-like text.
    Text(Arc<str>),
    /// Counter-like integer.
    Int(i64),
}

impl Value {
    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Int(_) => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        let text = Value::from("ready");
        assert_eq!(text.as_text(), Some("ready"));
        assert_eq!(text.as_int(), None);

        let n = Value::from(7_i64);
        assert_eq!(n.as_int(), Some(7));
        assert_eq!(n.to_string(), "7");
    }
}
