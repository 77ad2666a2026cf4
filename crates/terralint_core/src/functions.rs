//! A small table of Terraform builtin functions.
//!
//! Only the functions rules commonly meet in expressions are implemented;
//! calling anything else is an evaluation error. Arguments arrive fully
//! known: the evaluator short-circuits unknown arguments to an unknown
//! result before dispatching here.

use terralint_loader::SourceRange;

use crate::error::EvalError;
use crate::value::{FromValue, Value};

pub fn call(name: &str, args: Vec<Value>, range: &SourceRange) -> Result<Value, EvalError> {
    match name {
        "lower" => string_fn(name, args, range, |s| s.to_lowercase()),
        "upper" => string_fn(name, args, range, |s| s.to_uppercase()),
        "length" => length(args, range),
        "join" => join(args, range),
        "format" => format_fn(args, range),
        "coalesce" => coalesce(args, range),
        other => Err(EvalError::evaluation(format!(
            "call to unknown function {other:?} in {range}"
        ))),
    }
}

fn string_fn(
    name: &str,
    args: Vec<Value>,
    range: &SourceRange,
    f: impl Fn(&str) -> String,
) -> Result<Value, EvalError> {
    let [arg] = take_args(name, args, range)?;
    let s = String::from_value(arg)?;
    Ok(Value::String(f(&s)))
}

fn length(args: Vec<Value>, range: &SourceRange) -> Result<Value, EvalError> {
    let [arg] = take_args("length", args, range)?;
    let len = match arg.unmark().0 {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(entries) => entries.len(),
        other => {
            return Err(EvalError::evaluation(format!(
                "length() expects a string or collection, got {other} in {range}"
            )))
        }
    };
    Ok(Value::Number(len as f64))
}

fn join(args: Vec<Value>, range: &SourceRange) -> Result<Value, EvalError> {
    let [separator, list] = take_args("join", args, range)?;
    let separator = String::from_value(separator)?;
    let parts = Vec::<String>::from_value(list)?;
    Ok(Value::String(parts.join(&separator)))
}

/// Supports the `%s`, `%d` and `%%` verbs, which covers the format strings
/// seen in practice in repetition and naming expressions.
fn format_fn(args: Vec<Value>, range: &SourceRange) -> Result<Value, EvalError> {
    let mut args = args.into_iter();
    let Some(template) = args.next() else {
        return Err(EvalError::evaluation(format!(
            "format() requires a format string in {range}"
        )));
    };
    let template = String::from_value(template)?;

    let mut out = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => {
                let arg = args.next().ok_or_else(|| {
                    EvalError::evaluation(format!("format() has too few arguments in {range}"))
                })?;
                out.push_str(&String::from_value(arg)?);
            }
            Some('d') => {
                let arg = args.next().ok_or_else(|| {
                    EvalError::evaluation(format!("format() has too few arguments in {range}"))
                })?;
                out.push_str(&i64::from_value(arg)?.to_string());
            }
            verb => {
                return Err(EvalError::evaluation(format!(
                    "format() does not support verb %{} in {range}",
                    verb.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(Value::String(out))
}

fn coalesce(args: Vec<Value>, range: &SourceRange) -> Result<Value, EvalError> {
    args.into_iter()
        .find(|arg| !arg.is_null())
        .ok_or_else(|| {
            EvalError::evaluation(format!("coalesce() found no non-null argument in {range}"))
        })
}

fn take_args<const N: usize>(
    name: &str,
    args: Vec<Value>,
    range: &SourceRange,
) -> Result<[Value; N], EvalError> {
    let got = args.len();
    args.try_into().map_err(|_| {
        EvalError::evaluation(format!(
            "{name}() expects {N} argument(s), got {got} in {range}"
        ))
    })
}
