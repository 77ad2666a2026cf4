//! The per-module rule execution context.
//!
//! One [`Runner`] wraps one module instance: the root configuration or one
//! `module` call discovered from it. Rules walk expressions and blocks
//! through the runner, evaluate them against the module's variable scope,
//! and report findings with [`Runner::emit_issue`].
//!
//! Emission is where provenance happens. An issue found inside a child
//! module is not reported at the child's source range, which the user may
//! never have opened, but projected onto the root-module expressions its
//! value was derived from.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use terralint_loader::module::{Attribute, ConfigBlock, Expr};
use terralint_loader::{Annotation, ModuleConfig, SourceRange};

use crate::annotation::is_affected;
use crate::error::EvalError;
use crate::eval::{self, EvalScope};
use crate::issue::{Issue, RuleInfo};
use crate::module_variable::{VarId, VariableGraph};
use crate::rule::Rule;
use crate::value::FromValue;

pub struct Runner {
    config: Arc<ModuleConfig>,
    variables: HashMap<String, crate::value::Value>,
    workspace: String,
    annotations: Arc<BTreeMap<String, Vec<Annotation>>>,
    graph: Arc<VariableGraph>,
    /// Graph nodes for this module's input variables. Empty for the root
    /// runner.
    var_ids: HashMap<String, VarId>,
    /// Expression a rule is currently inspecting, used to attribute issues
    /// emitted from inside child modules.
    current_expr: Option<Expr>,
    issues: Vec<Issue>,
}

impl Runner {
    pub(crate) fn new(
        config: Arc<ModuleConfig>,
        variables: HashMap<String, crate::value::Value>,
        workspace: String,
        annotations: Arc<BTreeMap<String, Vec<Annotation>>>,
        graph: Arc<VariableGraph>,
        var_ids: HashMap<String, VarId>,
    ) -> Self {
        Self {
            config,
            variables,
            workspace,
            annotations,
            graph,
            var_ids,
            current_expr: None,
            issues: Vec::new(),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn is_root(&self) -> bool {
        self.config.is_root()
    }

    fn scope(&self) -> EvalScope<'_> {
        EvalScope {
            variables: &self.variables,
            workspace: &self.workspace,
        }
    }

    /// Evaluates an expression to a concrete value of the requested type.
    /// Unknown, null and unevaluable results come back as warning-level
    /// errors the caller is expected to skip.
    pub fn evaluate_expr<T: FromValue>(&self, expr: &Expr) -> Result<T, EvalError> {
        eval::evaluate_expr(expr, &self.scope())
    }

    /// Evaluates an expression, letting unknown and null values through.
    pub fn evaluate_raw(&self, expr: &Expr) -> Result<crate::value::Value, EvalError> {
        eval::evaluate_raw(expr, &self.scope())
    }

    /// Runs `f` when `result` is a value, swallows warning-level evaluation
    /// failures, and propagates hard errors.
    pub fn ensure_no_error<T>(
        result: Result<T, EvalError>,
        f: impl FnOnce(T) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        match result {
            Ok(value) => f(value),
            Err(err) if err.is_warning() => {
                debug!("{err}; skipping");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Runs `f` with the given expression recorded as the current issue
    /// attribution context.
    pub fn with_expression_context(
        &mut self,
        expr: Expr,
        f: impl FnOnce(&mut Runner) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let previous = self.current_expr.replace(expr);
        let result = f(self);
        self.current_expr = previous;
        result
    }

    /// Whether a block with `count`/`for_each` meta-arguments will be
    /// evaluated at apply time.
    pub fn block_live(&self, block: &ConfigBlock) -> Result<bool, EvalError> {
        let count = block.attribute("count").map(|a| &a.expr);
        let for_each = block.attribute("for_each").map(|a| &a.expr);
        eval::block_live(count, for_each, &self.scope())
    }

    /// Visits every expression in the module, skipping blocks that are not
    /// live. Order: resources, data sources, module calls, providers,
    /// locals, outputs.
    pub fn walk_expressions(
        &mut self,
        f: &mut dyn FnMut(&mut Runner, &Expr) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let config = Arc::clone(&self.config);

        for resource in &config.module.resources {
            self.walk_live_block(resource, f)?;
        }
        for data_source in &config.module.data_sources {
            self.walk_live_block(data_source, f)?;
        }
        for call in config.module.module_calls.values() {
            self.walk_live_block(&call.block, f)?;
        }
        for provider in &config.module.providers {
            self.walk_block(provider, f)?;
        }
        for local in &config.module.locals {
            self.walk_attribute(local, f)?;
        }
        for output in &config.module.outputs {
            self.walk_attribute(output, f)?;
        }
        Ok(())
    }

    /// Visits every live `resource` block of the given type.
    pub fn walk_resource_blocks(
        &mut self,
        resource_type: &str,
        f: &mut dyn FnMut(&mut Runner, &ConfigBlock) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let config = Arc::clone(&self.config);
        for resource in &config.module.resources {
            if resource.labels.first().map(String::as_str) != Some(resource_type) {
                continue;
            }
            if !self.block_live(resource)? {
                debug!("resource at {} is not live; skipping", resource.def_range);
                continue;
            }
            f(self, resource)?;
        }
        Ok(())
    }

    fn walk_live_block(
        &mut self,
        block: &ConfigBlock,
        f: &mut dyn FnMut(&mut Runner, &Expr) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        if !self.block_live(block)? {
            debug!("block at {} is not live; skipping", block.def_range);
            return Ok(());
        }
        self.walk_block(block, f)
    }

    fn walk_block(
        &mut self,
        block: &ConfigBlock,
        f: &mut dyn FnMut(&mut Runner, &Expr) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        for attribute in &block.attributes {
            self.walk_attribute(attribute, f)?;
        }
        for nested in &block.blocks {
            self.walk_block(nested, f)?;
        }
        Ok(())
    }

    fn walk_attribute(
        &mut self,
        attribute: &Attribute,
        f: &mut dyn FnMut(&mut Runner, &Expr) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let expr = attribute.expr.clone();
        self.with_expression_context(expr.clone(), |runner| f(runner, &expr))
    }

    /// Reports a finding.
    ///
    /// On the root runner the issue is recorded at `range` as-is. On a child
    /// runner the finding is projected through the variable graph: one issue
    /// per distinct root-module binding the current expression's variables
    /// were derived from, with the caller chain attached. Findings inside a
    /// child module that involve no module input are dropped, since no
    /// root-module expression is responsible for them.
    pub fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: impl Into<String>,
        range: SourceRange,
    ) -> Result<(), EvalError> {
        let rule_info = RuleInfo {
            name: rule.name().to_string(),
            severity: rule.severity(),
            link: rule.link().to_string(),
        };
        let message = message.into();

        if self.is_root() {
            self.push_issue(Issue {
                rule: rule_info,
                message,
                range,
                callers: Vec::new(),
            });
            return Ok(());
        }

        let Some(current) = self.current_expr.clone() else {
            debug!(
                "issue `{}` in {} has no attribution context; dropped",
                rule_info.name,
                self.config.display_path()
            );
            return Ok(());
        };

        let mut emitted_roots = Vec::new();
        for var_name in eval::list_var_refs(&current.expr) {
            let Some(&var_id) = self.var_ids.get(&var_name) else {
                continue;
            };
            for path in self.graph.roots(var_id) {
                if emitted_roots.contains(&path.root) {
                    continue;
                }
                emitted_roots.push(path.root);

                let mut callers = path.callers;
                callers.push(range.clone());
                let primary = callers[0].clone();
                self.push_issue(Issue {
                    rule: rule_info.clone(),
                    message: message.clone(),
                    range: primary,
                    callers,
                });
            }
        }

        if emitted_roots.is_empty() {
            debug!(
                "issue `{}` in {} does not involve a module input; dropped",
                rule_info.name,
                self.config.display_path()
            );
        }
        Ok(())
    }

    fn push_issue(&mut self, issue: Issue) {
        let suppressed = self
            .annotations
            .get(&issue.range.filename)
            .into_iter()
            .flatten()
            .find(|annotation| is_affected(annotation, &issue));
        if let Some(annotation) = suppressed {
            debug!(
                "issue `{}` at {} suppressed by annotation at {}",
                issue.rule.name, issue.range, annotation.range
            );
            return;
        }
        self.issues.push(issue);
    }

    /// Issues recorded against the given file, in emission order.
    pub fn lookup_issues(&self, filename: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.range.filename == filename)
            .collect()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}
