//! The engine-side handle rule code checks against.

use terralint_core::{EvalError, Issue, Rule, Runner, Value};
use terralint_loader::module::{ConfigBlock, Expr};
use terralint_loader::SourceRange;

/// Object-safe view of the walking and evaluation operations [`Runner`]
/// exposes. Ruleset code on the far side of the boundary is written against
/// this trait, so it sees the identical contract built-in rules use without
/// depending on the engine's concrete type.
pub trait Server {
    fn is_root(&self) -> bool;

    /// Evaluates an expression, letting unknown and null values through.
    fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError>;

    /// Evaluates an expression to a concrete string. Unknown, null and
    /// unevaluable results come back as warning-level errors.
    fn evaluate_string(&self, expr: &Expr) -> Result<String, EvalError>;

    fn walk_expressions(
        &mut self,
        f: &mut dyn FnMut(&mut dyn Server, &Expr) -> Result<(), EvalError>,
    ) -> Result<(), EvalError>;

    fn walk_resource_blocks(
        &mut self,
        resource_type: &str,
        f: &mut dyn FnMut(&mut dyn Server, &ConfigBlock) -> Result<(), EvalError>,
    ) -> Result<(), EvalError>;

    fn with_expression_context(
        &mut self,
        expr: Expr,
        f: &mut dyn FnMut(&mut dyn Server) -> Result<(), EvalError>,
    ) -> Result<(), EvalError>;

    fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: &str,
        range: SourceRange,
    ) -> Result<(), EvalError>;

    /// Issues recorded against the given file so far.
    fn lookup_issues(&self, filename: &str) -> Vec<&Issue>;

    /// Dispatches one rule against this module instance.
    fn run_rule(&mut self, rule: &dyn Rule) -> Result<(), EvalError>;
}

impl Server for Runner {
    fn is_root(&self) -> bool {
        Runner::is_root(self)
    }

    fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError> {
        self.evaluate_raw(expr)
    }

    fn evaluate_string(&self, expr: &Expr) -> Result<String, EvalError> {
        self.evaluate_expr(expr)
    }

    fn walk_expressions(
        &mut self,
        f: &mut dyn FnMut(&mut dyn Server, &Expr) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        Runner::walk_expressions(self, &mut |runner, expr| f(runner, expr))
    }

    fn walk_resource_blocks(
        &mut self,
        resource_type: &str,
        f: &mut dyn FnMut(&mut dyn Server, &ConfigBlock) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        Runner::walk_resource_blocks(self, resource_type, &mut |runner, block| f(runner, block))
    }

    fn with_expression_context(
        &mut self,
        expr: Expr,
        f: &mut dyn FnMut(&mut dyn Server) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        Runner::with_expression_context(self, expr, |runner| f(runner))
    }

    fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: &str,
        range: SourceRange,
    ) -> Result<(), EvalError> {
        Runner::emit_issue(self, rule, message, range)
    }

    fn lookup_issues(&self, filename: &str) -> Vec<&Issue> {
        Runner::lookup_issues(self, filename)
    }

    fn run_rule(&mut self, rule: &dyn Rule) -> Result<(), EvalError> {
        rule.check(self)
    }
}
