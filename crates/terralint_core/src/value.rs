//! Evaluated values.
//!
//! The evaluator produces plain data values with two extra states Terraform
//! semantics require: `Unknown` (the value depends on something not resolved
//! in a static analysis run) and a `Sensitive` mark that wraps an otherwise
//! ordinary value. A sensitive value is still known; only `Unknown`
//! suppresses evaluation of repetition meta-arguments.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unknown,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Sensitive(Box<Value>),
}

impl Value {
    /// Whether the value and everything nested inside it is known.
    pub fn is_known(&self) -> bool {
        match self {
            Value::Unknown => false,
            Value::Array(items) => items.iter().all(Value::is_known),
            Value::Object(entries) => entries.values().all(Value::is_known),
            Value::Sensitive(inner) => inner.is_known(),
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Sensitive(inner) => inner.is_null(),
            _ => false,
        }
    }

    /// Whether the value or anything nested inside it is null.
    pub fn contains_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Array(items) => items.iter().any(Value::contains_null),
            Value::Object(entries) => entries.values().any(Value::contains_null),
            Value::Sensitive(inner) => inner.contains_null(),
            _ => false,
        }
    }

    /// Strips a sensitive mark, returning the inner value and whether the
    /// mark was present.
    pub fn unmark(&self) -> (&Value, bool) {
        match self {
            Value::Sensitive(inner) => (inner.unmark().0, true),
            other => (other, false),
        }
    }

    pub fn mark_sensitive(self) -> Value {
        match self {
            already @ Value::Sensitive(_) => already,
            other => Value::Sensitive(Box::new(other)),
        }
    }

    /// Whether `for_each` can iterate this value.
    pub fn can_iterate(&self) -> bool {
        matches!(self.unmark().0, Value::Array(_) | Value::Object(_))
    }

    /// Number of elements for iterable values.
    pub fn iter_len(&self) -> Option<usize> {
        match self.unmark().0 {
            Value::Array(items) => Some(items.len()),
            Value::Object(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// String form used by template interpolation. Collections, null and
    /// unknown values have no string form.
    pub fn interpolation_string(&self) -> Option<String> {
        match self.unmark().0 {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Unknown => "unknown",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "list",
            Value::Object(_) => "map",
            Value::Sensitive(inner) => inner.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unknown => write!(f, "(unknown)"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                write!(f, "}}")
            }
            Value::Sensitive(_) => write!(f, "(sensitive)"),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Conversion from an evaluated value into the type a rule asked for.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, EvalError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        let (value, _) = value.unmark();
        value.interpolation_string().ok_or_else(|| {
            EvalError::type_conversion(format!("cannot convert {} to string", value.type_name()))
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value.unmark().0 {
            Value::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
            Value::Number(n) => Err(EvalError::type_conversion(format!(
                "cannot convert {n} to an integer"
            ))),
            Value::String(s) => s
                .parse()
                .map_err(|_| EvalError::type_conversion(format!("cannot convert {s:?} to number"))),
            other => Err(EvalError::type_conversion(format!(
                "cannot convert {} to number",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value.unmark().0 {
            Value::Number(n) => Ok(*n),
            Value::String(s) => s
                .parse()
                .map_err(|_| EvalError::type_conversion(format!("cannot convert {s:?} to number"))),
            other => Err(EvalError::type_conversion(format!(
                "cannot convert {} to number",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value.unmark().0 {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            other => Err(EvalError::type_conversion(format!(
                "cannot convert {} to bool",
                other.type_name()
            ))),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Sensitive(inner) => Vec::<T>::from_value(*inner),
            other => Err(EvalError::type_mismatch(format!(
                "cannot convert {} to list",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sensitive_is_still_known() {
        let value = Value::Number(2.0).mark_sensitive();
        assert!(value.is_known());
        assert!(!value.is_null());
        let (inner, marked) = value.unmark();
        assert_eq!(inner, &Value::Number(2.0));
        assert!(marked);
    }

    #[test]
    fn test_unknown_propagates_through_collections() {
        let value = Value::Array(vec![Value::String("a".into()), Value::Unknown]);
        assert!(!value.is_known());
    }

    #[test]
    fn test_iteration() {
        assert!(Value::Array(vec![]).can_iterate());
        assert!(Value::Object(BTreeMap::new()).can_iterate());
        assert!(!Value::String("nope".into()).can_iterate());
        assert_eq!(Value::Array(vec![Value::Null]).iter_len(), Some(1));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(3.5), "3.5");
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(String::from_value(Value::String("x".into())).unwrap(), "x");
        assert_eq!(String::from_value(Value::Number(2.0)).unwrap(), "2");
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(i64::from_value(Value::Number(4.0)).unwrap(), 4);
        assert_eq!(i64::from_value(Value::String("12".into())).unwrap(), 12);
        assert!(i64::from_value(Value::Number(1.5)).is_err());
    }

    #[test]
    fn test_string_list_conversion() {
        let list = Value::Array(vec![Value::String("a".into()), Value::Number(1.0)]);
        assert_eq!(Vec::<String>::from_value(list).unwrap(), vec!["a", "1"]);
    }
}
