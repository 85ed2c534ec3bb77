//! Runtime value types for Curlybars templates.

use std::fmt;
use std::rc::Rc;

use crate::helper::Helper;
use crate::presenter::Presenter;
use crate::safe_string::SafeString;

/// What a presenter method, a literal or a helper hands back to the renderer.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    SafeString(SafeString),
    Array(Vec<Value>),
    Presenter(Rc<dyn Presenter>),
    Helper(Rc<dyn Helper>),
}

impl Value {
    pub fn presenter(presenter: impl Presenter + 'static) -> Self {
        Value::Presenter(Rc::new(presenter))
    }

    pub fn helper(helper: impl Helper + 'static) -> Self {
        Value::Helper(Rc::new(helper))
    }

    /// Falsy values: nil, false, 0, 0.0, "", [].
    /// Presenters and helpers are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::SafeString(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Presenter(_) | Value::Helper(_) => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_presenter(&self) -> Option<&Rc<dyn Presenter>> {
        match self {
            Value::Presenter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::SafeString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Integer(_) => "integer".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) | Value::SafeString(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Presenter(p) => p.presenter_type().name().to_string(),
            Value::Helper(_) => "helper".to_string(),
        }
    }
}

/// The string form used when a value is written to the output.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::String(s) => f.write_str(s),
            Value::SafeString(s) => f.write_str(s.as_str()),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Presenter(p) => write!(f, "#<{}>", p.presenter_type().name()),
            Value::Helper(_) => f.write_str("#<helper>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::SafeString(s) => f.debug_tuple("SafeString").field(&s.as_str()).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Presenter(p) => f
                .debug_tuple("Presenter")
                .field(&p.presenter_type().name())
                .finish(),
            Value::Helper(h) => f
                .debug_tuple("Helper")
                .field(&h.source_location())
                .finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::SafeString(a), Value::SafeString(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Presenter(a), Value::Presenter(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (Value::Helper(a), Value::Helper(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<SafeString> for Value {
    fn from(value: SafeString) -> Self {
        Value::SafeString(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

impl<P: Presenter + 'static> From<Rc<P>> for Value {
    fn from(presenter: Rc<P>) -> Self {
        Value::Presenter(presenter)
    }
}
