//! Dynamic argument values.
//!
//! Intercepted command invocations carry positional arguments whose types are
//! only known at run time. Data-binding layers typically deliver every
//! argument as text, so [`Value`] keeps text distinct from numbers and the
//! dispatcher converts text into the kind a handler declared.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single positional argument or property value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Also produced when an argument cannot be converted.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// Single-precision float.
    Float(f32),
    /// Text.
    Text(String),
    /// Opaque host object, compared by identity.
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wrap an arbitrary host object.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// The kind of this value, or `None` for [`Value::Null`].
    #[must_use]
    pub fn kind(&self) -> Option<ParamKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ParamKind::Bool),
            Self::Int(_) => Some(ParamKind::Int),
            Self::Float(_) => Some(ParamKind::Float),
            Self::Text(_) => Some(ParamKind::Text),
            Self::Object(_) => Some(ParamKind::Any),
        }
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The float payload, if any.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Downcast an [`Value::Object`] payload.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// Declared kind of a command parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Text parameter. Text arguments pass through untouched.
    Text,
    /// 32-bit integer parameter. Text arguments are parsed.
    Int,
    /// Single-precision float parameter. Text arguments are parsed.
    Float,
    /// Boolean parameter. Text arguments become [`Value::Null`].
    Bool,
    /// Any value. Text arguments become [`Value::Null`].
    Any,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Typed extraction from a [`Value`], used by typed command handlers.
pub trait FromValue: Sized {
    /// The parameter kind a handler taking `Self` declares.
    const KIND: ParamKind;

    /// Extract `Self`, or `None` if the value has a different shape.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for i32 {
    const KIND: ParamKind = ParamKind::Int;
    fn from_value(value: Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for f32 {
    const KIND: ParamKind = ParamKind::Float;
    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for bool {
    const KIND: ParamKind = ParamKind::Bool;
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    const KIND: ParamKind = ParamKind::Text;
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for Value {
    const KIND: ParamKind = ParamKind::Any;
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn kind_of_each_variant() {
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::from(true).kind(), Some(ParamKind::Bool));
        assert_eq!(Value::from(3).kind(), Some(ParamKind::Int));
        assert_eq!(Value::from(1.5_f32).kind(), Some(ParamKind::Float));
        assert_eq!(Value::from("x").kind(), Some(ParamKind::Text));
        assert_eq!(Value::object(7_u8).kind(), Some(ParamKind::Any));
    }

    #[test]
    fn option_conversion_maps_none_to_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some(4)), Value::Int(4));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::object(String::from("same"));
        let b = Value::object(String::from("same"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn downcast_object_payload() {
        let v = Value::object(42_u64);
        assert_eq!(v.downcast_ref::<u64>(), Some(&42));
        assert!(v.downcast_ref::<i32>().is_none());
        assert!(Value::Int(1).downcast_ref::<i32>().is_none());
    }

    #[test]
    fn debug_hides_object_payload() {
        assert_eq!(format!("{:?}", Value::object(1)), "Object(..)");
        assert_eq!(format!("{:?}", Value::from("a")), "Text(\"a\")");
    }

    #[test]
    fn from_value_is_exact() {
        assert_eq!(i32::from_value(Value::Int(5)), Some(5));
        assert_eq!(i32::from_value(Value::Text("5".into())), None);
        assert_eq!(f32::from_value(Value::Int(5)), None);
        assert_eq!(String::from_value(Value::from("hi")), Some("hi".to_owned()));
        assert_matches!(Value::from_value(Value::Null), Some(Value::Null));
    }

    #[test]
    fn param_kind_display() {
        assert_eq!(ParamKind::Int.to_string(), "int");
        assert_eq!(ParamKind::Text.to_string(), "text");
    }

    proptest! {
        #[test]
        fn int_survives_value_and_back(n in any::<i32>()) {
            let value = Value::from(n);
            prop_assert_eq!(value.kind(), Some(ParamKind::Int));
            prop_assert_eq!(i32::from_value(value), Some(n));
        }

        #[test]
        fn text_survives_value_and_back(s in ".{0,24}") {
            let value = Value::from(s.as_str());
            prop_assert_eq!(value.as_text(), Some(s.as_str()));
            prop_assert_eq!(String::from_value(value), Some(s));
        }

        #[test]
        fn typed_extraction_rejects_other_shapes(n in any::<i32>(), b in any::<bool>()) {
            prop_assert_eq!(bool::from_value(Value::Int(n)), None);
            prop_assert_eq!(i32::from_value(Value::Bool(b)), None);
            prop_assert_eq!(String::from_value(Value::Int(n)), None);
        }
    }
}
