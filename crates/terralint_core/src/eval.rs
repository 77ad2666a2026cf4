//! Expression evaluation with Terraform-style semantics.
//!
//! Evaluation works against a partial runtime context: input variables that
//! were never given a value evaluate to [`Value::Unknown`], and unknown
//! values propagate through operators, templates and function calls instead
//! of failing. References outside the evaluator's scope (resources, data
//! sources, `count.index`, ...) classify the whole expression as
//! unevaluable, which is a warning-level condition callers are expected to
//! skip over.

use std::collections::HashMap;

use hcl_edit::expr::{
    BinaryOperator, Expression, ObjectKey, Traversal, TraversalOperator, UnaryOperator,
};
use hcl_edit::template::Element;
use hcl_edit::Decorated;
use tracing::trace;

use terralint_loader::module::Expr;
use terralint_loader::SourceRange;

use crate::error::EvalError;
use crate::functions;
use crate::value::{FromValue, Value};

/// The variable-value table and workspace metadata one module instance
/// evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct EvalScope<'a> {
    pub variables: &'a HashMap<String, Value>,
    pub workspace: &'a str,
}

/// A reference found in an expression, classified by its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefAddr {
    /// `var.<name>`
    InputVariable(String),
    /// `terraform.<attr>`
    TerraformAttr(String),
    /// Anything else (`module.*`, `data.*`, `count.index`, resource refs, ...)
    Other(String),
}

/// Collects every reference in the expression, in traversal order.
pub fn references(expr: &Expression) -> Vec<RefAddr> {
    let mut refs = Vec::new();
    collect_references(expr, &mut refs);
    refs
}

fn collect_references(expr: &Expression, refs: &mut Vec<RefAddr>) {
    match expr {
        Expression::Array(items) => {
            for item in items.iter() {
                collect_references(item, refs);
            }
        }
        Expression::Object(object) => {
            for (key, value) in object.into_iter() {
                if let ObjectKey::Expression(key_expr) = key {
                    collect_references(key_expr, refs);
                }
                collect_references(value.expr(), refs);
            }
        }
        Expression::StringTemplate(template) => {
            for element in template.into_iter() {
                if let Element::Interpolation(interpolation) = element {
                    collect_references(&interpolation.expr, refs);
                }
            }
        }
        Expression::HeredocTemplate(heredoc) => {
            for element in heredoc.template.iter() {
                if let Element::Interpolation(interpolation) = element {
                    collect_references(&interpolation.expr, refs);
                }
            }
        }
        Expression::Parenthesis(paren) => collect_references(paren.inner(), refs),
        Expression::Variable(ident) => {
            refs.push(RefAddr::Other(ident.as_str().to_string()));
        }
        Expression::Conditional(conditional) => {
            collect_references(&conditional.cond_expr, refs);
            collect_references(&conditional.true_expr, refs);
            collect_references(&conditional.false_expr, refs);
        }
        Expression::FuncCall(func_call) => {
            for arg in func_call.args.iter() {
                collect_references(arg, refs);
            }
        }
        Expression::Traversal(traversal) => {
            collect_traversal_reference(traversal, refs);
            for operator in traversal.operators.iter() {
                if let TraversalOperator::Index(index_expr) = operator.value() {
                    collect_references(index_expr, refs);
                }
            }
        }
        Expression::UnaryOp(unary) => collect_references(&unary.expr, refs),
        Expression::BinaryOp(binary) => {
            collect_references(&binary.lhs_expr, refs);
            collect_references(&binary.rhs_expr, refs);
        }
        Expression::ForExpr(for_expr) => {
            collect_references(&for_expr.intro.collection_expr, refs);
            if let Some(key_expr) = &for_expr.key_expr {
                collect_references(key_expr, refs);
            }
            collect_references(&for_expr.value_expr, refs);
            if let Some(cond) = &for_expr.cond {
                collect_references(&cond.expr, refs);
            }
        }
        _ => {}
    }
}

fn collect_traversal_reference(traversal: &Traversal, refs: &mut Vec<RefAddr>) {
    let Expression::Variable(root) = &traversal.expr else {
        collect_references(&traversal.expr, refs);
        return;
    };
    let attr = traversal.operators.first().and_then(|op| match op.value() {
        TraversalOperator::GetAttr(ident) => Some(ident.as_str().to_string()),
        _ => None,
    });

    let addr = match (root.as_str(), attr) {
        ("var", Some(name)) => RefAddr::InputVariable(name),
        ("terraform", Some(name)) => RefAddr::TerraformAttr(name),
        (other, _) => RefAddr::Other(other.to_string()),
    };
    refs.push(addr);
}

/// Whether every reference in the expression can be resolved by this
/// evaluator.
pub fn is_evaluable(expr: &Expression) -> bool {
    references(expr)
        .iter()
        .all(|r| matches!(r, RefAddr::InputVariable(_) | RefAddr::TerraformAttr(_)))
}

/// Names of the module input variables referenced by the expression, in
/// order of appearance and without duplicates.
pub fn list_var_refs(expr: &Expression) -> Vec<String> {
    let mut names = Vec::new();
    for reference in references(expr) {
        if let RefAddr::InputVariable(name) = reference {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Evaluates an expression, letting unknown and null values through as
/// values. Unevaluable references are a warning-level error.
pub fn evaluate_raw(expr: &Expr, scope: &EvalScope) -> Result<Value, EvalError> {
    if !is_evaluable(&expr.expr) {
        let err = EvalError::unevaluable(format!(
            "unevaluable expression found in {}",
            expr.range
        ));
        trace!("{err}; skipping");
        return Err(err);
    }
    evaluate(&expr.expr, scope, &expr.range)
}

/// Evaluates an expression and converts it to the requested type.
///
/// Unlike [`evaluate_raw`], unknown and null results are returned as
/// warning-level errors so the caller always gets a concrete value on
/// success.
pub fn evaluate_expr<T: FromValue>(expr: &Expr, scope: &EvalScope) -> Result<T, EvalError> {
    let value = evaluate_raw(expr, scope)?;

    if !value.is_known() {
        let err = EvalError::unknown_value(format!("unknown value found in {}", expr.range));
        trace!("{err}; only provided variables are evaluated");
        return Err(err);
    }
    if value.contains_null() {
        let err = EvalError::null_value(format!("null value found in {}", expr.range));
        trace!("{err}; expressions with null values are ignored");
        return Err(err);
    }

    T::from_value(value)
}

/// Recursive evaluation of a single expression.
pub fn evaluate(
    expr: &Expression,
    scope: &EvalScope,
    range: &SourceRange,
) -> Result<Value, EvalError> {
    let value = match expr {
        Expression::Null(_) => Value::Null,
        Expression::Bool(b) => Value::Bool(*b.value()),
        Expression::Number(n) => {
            let n = n.value();
            match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::Number(i as f64),
                (_, Some(f)) => Value::Number(f),
                (None, None) => {
                    return Err(EvalError::evaluation(format!(
                        "unrepresentable number in {range}"
                    )))
                }
            }
        }
        Expression::String(s) => Value::String(s.value().clone()),
        Expression::Array(items) => {
            let mut out = Vec::new();
            for item in items.iter() {
                out.push(evaluate(item, scope, range)?);
            }
            Value::Array(out)
        }
        Expression::Object(object) => {
            let mut out = std::collections::BTreeMap::new();
            for (key, value) in object.into_iter() {
                let key = match key {
                    ObjectKey::Ident(ident) => ident.as_str().to_string(),
                    ObjectKey::Expression(key_expr) => {
                        match evaluate(key_expr, scope, range)? {
                            Value::String(s) => s,
                            Value::Unknown => return Ok(Value::Unknown),
                            other => {
                                return Err(EvalError::evaluation(format!(
                                    "object key must be a string, got {other} in {range}"
                                )))
                            }
                        }
                    }
                };
                out.insert(key, evaluate(value.expr(), scope, range)?);
            }
            Value::Object(out)
        }
        Expression::StringTemplate(template) => {
            evaluate_template(template.into_iter(), scope, range)?
        }
        Expression::HeredocTemplate(heredoc) => {
            evaluate_template(heredoc.template.iter(), scope, range)?
        }
        Expression::Parenthesis(paren) => evaluate(paren.inner(), scope, range)?,
        Expression::Variable(ident) => {
            return Err(EvalError::unevaluable(format!(
                "bare identifier {:?} in {range}",
                ident.as_str()
            )))
        }
        Expression::Conditional(conditional) => {
            let cond = evaluate(&conditional.cond_expr, scope, range)?;
            if !cond.is_known() {
                return Ok(Value::Unknown);
            }
            match cond.unmark().0 {
                Value::Bool(true) => evaluate(&conditional.true_expr, scope, range)?,
                Value::Bool(false) => evaluate(&conditional.false_expr, scope, range)?,
                other => {
                    return Err(EvalError::evaluation(format!(
                        "condition must be a bool, got {other} in {range}"
                    )))
                }
            }
        }
        Expression::FuncCall(func_call) => {
            if !func_call.name.namespace.is_empty() {
                return Err(EvalError::unevaluable(format!(
                    "namespaced function call in {range}"
                )));
            }
            let mut args = Vec::new();
            for arg in func_call.args.iter() {
                args.push(evaluate(arg, scope, range)?);
            }
            if args.iter().any(|a| !a.is_known()) {
                return Ok(Value::Unknown);
            }
            functions::call(func_call.name.name.as_str(), args, range)?
        }
        Expression::Traversal(traversal) => evaluate_traversal(traversal, scope, range)?,
        Expression::UnaryOp(unary) => {
            let operand = evaluate(&unary.expr, scope, range)?;
            if !operand.is_known() {
                return Ok(Value::Unknown);
            }
            match (unary.operator.value(), operand.unmark().0) {
                (UnaryOperator::Neg, Value::Number(n)) => Value::Number(-n),
                (UnaryOperator::Not, Value::Bool(b)) => Value::Bool(!b),
                (_, other) => {
                    return Err(EvalError::evaluation(format!(
                        "invalid operand {other} for unary operator in {range}"
                    )))
                }
            }
        }
        Expression::BinaryOp(binary) => {
            let lhs = evaluate(&binary.lhs_expr, scope, range)?;
            let rhs = evaluate(&binary.rhs_expr, scope, range)?;
            evaluate_binary_op(lhs, *binary.operator.value(), rhs, range)?
        }
        Expression::ForExpr(_) => {
            return Err(EvalError::unevaluable(format!(
                "for expression in {range}"
            )))
        }
    };

    Ok(value)
}

fn evaluate_template<'a>(
    elements: impl Iterator<Item = &'a Element>,
    scope: &EvalScope,
    range: &SourceRange,
) -> Result<Value, EvalError> {
    let mut out = String::new();
    for element in elements {
        match element {
            Element::Literal(literal) => out.push_str(literal.value()),
            Element::Interpolation(interpolation) => {
                let value = evaluate(&interpolation.expr, scope, range)?;
                if !value.is_known() {
                    return Ok(Value::Unknown);
                }
                match value.interpolation_string() {
                    Some(s) => out.push_str(&s),
                    None => {
                        return Err(EvalError::evaluation(format!(
                            "cannot interpolate {value} into a string in {range}"
                        )))
                    }
                }
            }
            Element::Directive(_) => {
                return Err(EvalError::unevaluable(format!(
                    "template directive in {range}"
                )))
            }
        }
    }
    Ok(Value::String(out))
}

fn evaluate_traversal(
    traversal: &Traversal,
    scope: &EvalScope,
    range: &SourceRange,
) -> Result<Value, EvalError> {
    // A non-identifier root is an ordinary collection expression being
    // indexed in place, e.g. `["a", "b"][1]`.
    let Expression::Variable(root) = &traversal.expr else {
        let value = evaluate(&traversal.expr, scope, range)?;
        return apply_operators(value, &traversal.operators[..], scope, range);
    };

    let (value, rest) = match root.as_str() {
        "var" => {
            let Some(TraversalOperator::GetAttr(name)) =
                traversal.operators.first().map(|op| op.value())
            else {
                return Err(EvalError::evaluation(format!(
                    "invalid variable reference in {range}"
                )));
            };
            let value = scope.variables.get(name.as_str()).cloned().ok_or_else(|| {
                EvalError::evaluation(format!(
                    "undeclared variable {:?} referenced in {range}",
                    name.as_str()
                ))
            })?;
            (value, &traversal.operators[1..])
        }
        "terraform" => {
            let Some(TraversalOperator::GetAttr(name)) =
                traversal.operators.first().map(|op| op.value())
            else {
                return Err(EvalError::evaluation(format!(
                    "invalid terraform reference in {range}"
                )));
            };
            if name.as_str() != "workspace" {
                return Err(EvalError::evaluation(format!(
                    "unsupported terraform attribute {:?} in {range}",
                    name.as_str()
                )));
            }
            (
                Value::String(scope.workspace.to_string()),
                &traversal.operators[1..],
            )
        }
        other => {
            return Err(EvalError::unevaluable(format!(
                "reference to {other:?} is not evaluable in {range}"
            )))
        }
    };

    apply_operators(value, rest, scope, range)
}

fn apply_operators(
    mut value: Value,
    operators: &[Decorated<TraversalOperator>],
    scope: &EvalScope,
    range: &SourceRange,
) -> Result<Value, EvalError> {
    for operator in operators {
        if !value.is_known() {
            return Ok(Value::Unknown);
        }
        value = apply_operator(value, operator.value(), scope, range)?;
    }
    Ok(value)
}

fn apply_operator(
    value: Value,
    operator: &TraversalOperator,
    scope: &EvalScope,
    range: &SourceRange,
) -> Result<Value, EvalError> {
    let (inner, marked) = value.unmark();
    let inner = inner.clone();

    let result = match operator {
        TraversalOperator::GetAttr(name) => match inner {
            Value::Object(mut entries) => entries.remove(name.as_str()).ok_or_else(|| {
                EvalError::evaluation(format!(
                    "object has no attribute {:?} in {range}",
                    name.as_str()
                ))
            })?,
            other => {
                return Err(EvalError::evaluation(format!(
                    "cannot access attribute {:?} on {other} in {range}",
                    name.as_str()
                )))
            }
        },
        TraversalOperator::Index(index_expr) => {
            let index = evaluate(index_expr, scope, range)?;
            if !index.is_known() {
                return Ok(Value::Unknown);
            }
            index_value(inner, index.unmark().0, range)?
        }
        TraversalOperator::LegacyIndex(index) => {
            index_value(inner, &Value::Number(*index.value() as f64), range)?
        }
        _ => {
            return Err(EvalError::unevaluable(format!(
                "splat expression in {range}"
            )))
        }
    };

    Ok(if marked { result.mark_sensitive() } else { result })
}

fn index_value(value: Value, index: &Value, range: &SourceRange) -> Result<Value, EvalError> {
    match (value, index) {
        (Value::Array(mut items), Value::Number(n)) => {
            let idx = *n as usize;
            if idx < items.len() {
                Ok(items.swap_remove(idx))
            } else {
                Err(EvalError::evaluation(format!(
                    "index {idx} out of bounds in {range}"
                )))
            }
        }
        (Value::Object(mut entries), Value::String(key)) => {
            entries.remove(key).ok_or_else(|| {
                EvalError::evaluation(format!("object has no key {key:?} in {range}"))
            })
        }
        (other, index) => Err(EvalError::evaluation(format!(
            "cannot index {other} with {index} in {range}"
        ))),
    }
}

fn evaluate_binary_op(
    lhs: Value,
    operator: BinaryOperator,
    rhs: Value,
    range: &SourceRange,
) -> Result<Value, EvalError> {
    if !lhs.is_known() || !rhs.is_known() {
        return Ok(Value::Unknown);
    }
    if lhs.is_null() || rhs.is_null() {
        return Err(EvalError::evaluation(format!(
            "null value in binary operation in {range}"
        )));
    }

    let lhs = lhs.unmark().0.clone();
    let rhs = rhs.unmark().0.clone();

    let number = |v: &Value| -> Result<f64, EvalError> {
        match v {
            Value::Number(n) => Ok(*n),
            other => Err(EvalError::evaluation(format!(
                "operator requires numbers, got {other} in {range}"
            ))),
        }
    };
    let boolean = |v: &Value| -> Result<bool, EvalError> {
        match v {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::evaluation(format!(
                "operator requires bools, got {other} in {range}"
            ))),
        }
    };

    let value = match operator {
        BinaryOperator::Eq => Value::Bool(lhs == rhs),
        BinaryOperator::NotEq => Value::Bool(lhs != rhs),
        BinaryOperator::Less => Value::Bool(number(&lhs)? < number(&rhs)?),
        BinaryOperator::LessEq => Value::Bool(number(&lhs)? <= number(&rhs)?),
        BinaryOperator::Greater => Value::Bool(number(&lhs)? > number(&rhs)?),
        BinaryOperator::GreaterEq => Value::Bool(number(&lhs)? >= number(&rhs)?),
        BinaryOperator::Plus => Value::Number(number(&lhs)? + number(&rhs)?),
        BinaryOperator::Minus => Value::Number(number(&lhs)? - number(&rhs)?),
        BinaryOperator::Mul => Value::Number(number(&lhs)? * number(&rhs)?),
        BinaryOperator::Div => {
            let divisor = number(&rhs)?;
            if divisor == 0.0 {
                return Err(EvalError::evaluation(format!("division by zero in {range}")));
            }
            Value::Number(number(&lhs)? / divisor)
        }
        BinaryOperator::Mod => Value::Number(number(&lhs)? % number(&rhs)?),
        BinaryOperator::And => Value::Bool(boolean(&lhs)? && boolean(&rhs)?),
        BinaryOperator::Or => Value::Bool(boolean(&lhs)? || boolean(&rhs)?),
    };
    Ok(value)
}

/// Liveness of a block carrying `count`/`for_each` repetition
/// meta-arguments. Returns false when the block will never be evaluated at
/// apply time, or when its repetition cannot be determined statically.
pub fn block_live(
    count: Option<&Expr>,
    for_each: Option<&Expr>,
    scope: &EvalScope,
) -> Result<bool, EvalError> {
    if let Some(count) = count {
        return count_live(count, scope);
    }
    if let Some(for_each) = for_each {
        return for_each_live(for_each, scope);
    }
    // No repetition meta-argument: always evaluated.
    Ok(true)
}

/// `count = 0` is not evaluated; an unknown count is treated as not live
/// rather than failing. A null count is tolerated as if it were undefined,
/// even though Terraform itself rejects it.
fn count_live(expr: &Expr, scope: &EvalScope) -> Result<bool, EvalError> {
    let value = match evaluate_raw(expr, scope) {
        Ok(value) => value,
        Err(err) => return meta_arg_on_error(err),
    };

    if value.is_null() {
        return Ok(true);
    }
    if !value.is_known() {
        return Ok(false);
    }

    // A known-but-sensitive count still decides liveness.
    let count = i64::from_value(value)?;
    Ok(count != 0)
}

/// An empty `for_each` is not evaluated; a scalar collection is a hard
/// error rather than a skip.
fn for_each_live(expr: &Expr, scope: &EvalScope) -> Result<bool, EvalError> {
    let value = match evaluate_raw(expr, scope) {
        Ok(value) => value,
        Err(err) => return meta_arg_on_error(err),
    };

    if value.is_null() {
        return Ok(true);
    }
    if !value.is_known() {
        return Ok(false);
    }
    if !value.can_iterate() {
        return Err(EvalError::evaluation(format!(
            "the `for_each` value is not iterable in {}",
            expr.range
        )));
    }
    Ok(value.iter_len() != Some(0))
}

fn meta_arg_on_error(err: EvalError) -> Result<bool, EvalError> {
    use crate::error::ErrorKind;
    match err.kind {
        // A null meta-argument reads as "not set".
        ErrorKind::NullValue => Ok(true),
        // Unknown or unevaluable repetition is non-deterministic: skip.
        ErrorKind::UnknownValue | ErrorKind::Unevaluable => Ok(false),
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use terralint_loader::LineIndex;

    fn parse_expr(source: &str) -> Expr {
        let body_src = format!("value = {source}\n");
        let body = hcl_edit::parser::parse_body(&body_src).unwrap();
        let attr = body.get_attribute("value").unwrap();
        let index = LineIndex::new(&body_src);
        Expr {
            expr: attr.value.clone(),
            range: index.range("test.tf", 0..body_src.len()),
        }
    }

    fn scope_with(vars: &[(&str, Value)]) -> HashMap<String, Value> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn eval(source: &str, vars: &[(&str, Value)]) -> Result<Value, EvalError> {
        let variables = scope_with(vars);
        let scope = EvalScope {
            variables: &variables,
            workspace: "default",
        };
        evaluate_raw(&parse_expr(source), &scope)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("\"hello\"", &[]).unwrap(), Value::String("hello".into()));
        assert_eq!(eval("42", &[]).unwrap(), Value::Number(42.0));
        assert_eq!(eval("true", &[]).unwrap(), Value::Bool(true));
        assert_eq!(eval("null", &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_variable_reference() {
        let value = eval("var.name", &[("name", Value::String("web".into()))]).unwrap();
        assert_eq!(value, Value::String("web".into()));
    }

    #[test]
    fn test_undeclared_variable_is_error() {
        let err = eval("var.missing", &[]).unwrap_err();
        assert!(!err.is_warning());
    }

    #[test]
    fn test_unset_variable_is_unknown() {
        let value = eval("var.name", &[("name", Value::Unknown)]).unwrap();
        assert_eq!(value, Value::Unknown);
    }

    #[test]
    fn test_template_interpolation() {
        let value = eval(
            "\"svc-${var.env}\"",
            &[("env", Value::String("prod".into()))],
        )
        .unwrap();
        assert_eq!(value, Value::String("svc-prod".into()));
    }

    #[test]
    fn test_template_with_unknown_is_unknown() {
        let value = eval("\"svc-${var.env}\"", &[("env", Value::Unknown)]).unwrap();
        assert_eq!(value, Value::Unknown);
    }

    #[test]
    fn test_heredoc_template() {
        let value = eval(
            "<<EOT\nsvc-${var.env}\nEOT",
            &[("env", Value::String("prod".into()))],
        )
        .unwrap();
        assert_eq!(value, Value::String("svc-prod\n".into()));
    }

    #[test]
    fn test_workspace_reference() {
        let value = eval("terraform.workspace", &[]).unwrap();
        assert_eq!(value, Value::String("default".into()));
    }

    #[test]
    fn test_count_index_is_unevaluable() {
        let err = eval("\"svc-${count.index}\"", &[]).unwrap_err();
        assert!(err.is_warning());
        assert_eq!(err.kind, crate::error::ErrorKind::Unevaluable);
    }

    #[test]
    fn test_conditional() {
        let value = eval(
            "var.flag ? \"a\" : \"b\"",
            &[("flag", Value::Bool(false))],
        )
        .unwrap();
        assert_eq!(value, Value::String("b".into()));
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        assert_eq!(eval("1 + 2 * 3", &[]).unwrap(), Value::Number(7.0));
        assert_eq!(eval("2 > 1", &[]).unwrap(), Value::Bool(true));
        assert!(eval("1 / 0", &[]).is_err());
    }

    #[test]
    fn test_unknown_propagates_through_operators() {
        let value = eval("var.n + 1", &[("n", Value::Unknown)]).unwrap();
        assert_eq!(value, Value::Unknown);
    }

    #[test]
    fn test_collections_and_indexing() {
        let value = eval("[\"a\", \"b\"][1]", &[]).unwrap();
        assert_eq!(value, Value::String("b".into()));

        let value = eval(
            "var.tags[\"team\"]",
            &[(
                "tags",
                Value::Object(
                    [("team".to_string(), Value::String("infra".into()))]
                        .into_iter()
                        .collect(),
                ),
            )],
        )
        .unwrap();
        assert_eq!(value, Value::String("infra".into()));
    }

    #[test]
    fn test_function_call() {
        let value = eval("lower(\"ABC\")", &[]).unwrap();
        assert_eq!(value, Value::String("abc".into()));
    }

    #[test]
    fn test_sensitive_value_survives_traversal() {
        let list = Value::Array(vec![Value::String("secret".into())]).mark_sensitive();
        let value = eval("var.secrets[0]", &[("secrets", list)]).unwrap();
        assert_eq!(value.unmark(), (&Value::String("secret".into()), true));
    }

    #[test]
    fn test_list_var_refs_dedupes() {
        let expr = parse_expr("\"${var.a}-${var.b}-${var.a}\"");
        assert_eq!(list_var_refs(&expr.expr), vec!["a", "b"]);
    }

    #[test]
    fn test_strict_evaluation_rejects_unknown_and_null() {
        let variables = scope_with(&[("x", Value::Unknown)]);
        let scope = EvalScope {
            variables: &variables,
            workspace: "default",
        };
        let err = evaluate_expr::<String>(&parse_expr("var.x"), &scope).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::UnknownValue);

        let err = evaluate_expr::<String>(&parse_expr("null"), &scope).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NullValue);
    }

    mod liveness {
        use super::*;

        fn live(count: Option<&str>, for_each: Option<&str>, vars: &[(&str, Value)]) -> Result<bool, EvalError> {
            let variables = scope_with(vars);
            let scope = EvalScope {
                variables: &variables,
                workspace: "default",
            };
            let count = count.map(parse_expr);
            let for_each = for_each.map(parse_expr);
            block_live(count.as_ref(), for_each.as_ref(), &scope)
        }

        #[test]
        fn test_no_meta_arguments_is_live() {
            assert!(live(None, None, &[]).unwrap());
        }

        #[test]
        fn test_count_zero_is_not_live() {
            assert!(!live(Some("0"), None, &[]).unwrap());
            assert!(live(Some("2"), None, &[]).unwrap());
        }

        #[test]
        fn test_count_null_is_live() {
            assert!(live(Some("null"), None, &[]).unwrap());
        }

        #[test]
        fn test_count_unknown_is_not_live() {
            assert!(!live(Some("var.n"), None, &[("n", Value::Unknown)]).unwrap());
        }

        #[test]
        fn test_count_unevaluable_is_not_live() {
            assert!(!live(Some("local.n"), None, &[]).unwrap());
        }

        #[test]
        fn test_count_sensitive_but_known_still_decides() {
            let sensitive_zero = Value::Number(0.0).mark_sensitive();
            assert!(!live(Some("var.n"), None, &[("n", sensitive_zero)]).unwrap());
            let sensitive_two = Value::Number(2.0).mark_sensitive();
            assert!(live(Some("var.n"), None, &[("n", sensitive_two)]).unwrap());
        }

        #[test]
        fn test_for_each_empty_is_not_live() {
            assert!(!live(None, Some("{}"), &[]).unwrap());
            assert!(live(None, Some("{ a = 1 }"), &[]).unwrap());
        }

        #[test]
        fn test_for_each_scalar_is_hard_error() {
            let err = live(None, Some("\"oops\""), &[]).unwrap_err();
            assert!(!err.is_warning());
        }

        #[test]
        fn test_for_each_unknown_is_not_live() {
            assert!(!live(None, Some("var.set"), &[("set", Value::Unknown)]).unwrap());
        }
    }
}
