//! Building the runner tree.
//!
//! The loader produces a static module-call tree; this module turns it into
//! one [`Runner`] per module instance, evaluating module-call arguments in
//! the caller's scope to seed each child's variable table, and recording
//! variable provenance into a [`VariableGraph`] as it goes. The graph is
//! frozen once the whole tree is visited, then shared by every runner.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use terralint_loader::{LoadResult, ModuleConfig};

use crate::config::Config;
use crate::error::EvalError;
use crate::eval::{self, EvalScope};
use crate::module_variable::{VarId, VariableGraph};
use crate::runner::Runner;
use crate::value::Value;

/// Builds runners for the root module and every live, non-ignored child
/// module, in depth-first pre-order. The root runner is always first.
pub fn build_runners(
    load: &LoadResult,
    config: &Config,
    workspace: &str,
    cli_variables: &BTreeMap<String, Value>,
) -> Result<Vec<Runner>, EvalError> {
    let annotations = Arc::new(load.annotations.clone());

    let mut root_variables = HashMap::new();
    for decl in load.root.module.variables.values() {
        let value = match &decl.default {
            Some(default) => evaluate_default(default, workspace),
            None => Value::Unknown,
        };
        root_variables.insert(decl.name.clone(), value);
    }
    for (name, value) in config.variable_values() {
        root_variables.insert(name, value);
    }
    for (name, value) in cli_variables {
        root_variables.insert(name.clone(), value.clone());
    }
    for decl in load.root.module.variables.values() {
        if decl.sensitive {
            if let Some(value) = root_variables.remove(&decl.name) {
                root_variables.insert(decl.name.clone(), value.mark_sensitive());
            }
        }
    }

    let mut builder = Builder {
        graph: VariableGraph::new(),
        workspace,
        follow_modules: config.module,
        ignore_module: &config.ignore_module,
        pending: Vec::new(),
    };
    builder.visit(Arc::clone(&load.root), root_variables, HashMap::new())?;

    let Builder { graph, pending, .. } = builder;
    let graph = Arc::new(graph);

    Ok(pending
        .into_iter()
        .map(|entry| {
            Runner::new(
                entry.config,
                entry.variables,
                workspace.to_string(),
                Arc::clone(&annotations),
                Arc::clone(&graph),
                entry.var_ids,
            )
        })
        .collect())
}

struct PendingRunner {
    config: Arc<ModuleConfig>,
    variables: HashMap<String, Value>,
    var_ids: HashMap<String, VarId>,
}

struct Builder<'a> {
    graph: VariableGraph,
    workspace: &'a str,
    follow_modules: bool,
    ignore_module: &'a [String],
    pending: Vec<PendingRunner>,
}

impl Builder<'_> {
    fn visit(
        &mut self,
        config: Arc<ModuleConfig>,
        variables: HashMap<String, Value>,
        var_ids: HashMap<String, VarId>,
    ) -> Result<(), EvalError> {
        self.pending.push(PendingRunner {
            config: Arc::clone(&config),
            variables: variables.clone(),
            var_ids: var_ids.clone(),
        });

        if !self.follow_modules {
            return Ok(());
        }

        let scope = EvalScope {
            variables: &variables,
            workspace: self.workspace,
        };

        for call in config.module.module_calls.values() {
            if self.ignore_module.iter().any(|m| m == &call.source) {
                debug!("module {:?} is ignored by config; skipping", call.source);
                continue;
            }
            let Some(child) = config.children.get(&call.name) else {
                // Remote sources are not loaded.
                continue;
            };

            let count = call.block.attribute("count").map(|a| &a.expr);
            let for_each = call.block.attribute("for_each").map(|a| &a.expr);
            if !eval::block_live(count, for_each, &scope)? {
                debug!(
                    "module call {:?} at {} is not live; skipping",
                    call.name, call.block.def_range
                );
                continue;
            }

            let mut child_variables = HashMap::new();
            let mut child_var_ids = HashMap::new();

            for input in call.inputs() {
                let value = match eval::evaluate_raw(&input.expr, &scope) {
                    Ok(value) => value,
                    Err(err) if err.is_warning() => {
                        debug!("{err}; module input {:?} treated as unknown", input.name);
                        Value::Unknown
                    }
                    Err(err) => return Err(err),
                };
                child_variables.insert(input.name.clone(), value);

                let parents: Vec<VarId> = eval::list_var_refs(&input.expr.expr)
                    .into_iter()
                    .filter_map(|name| var_ids.get(&name).copied())
                    .collect();
                let id = if parents.is_empty() {
                    self.graph.push_root(input.expr.range.clone())
                } else {
                    self.graph.push_derived(input.expr.range.clone(), parents)
                };
                child_var_ids.insert(input.name.clone(), id);
            }

            for decl in child.module.variables.values() {
                let value = match child_variables.remove(&decl.name) {
                    Some(value) => value,
                    None => match &decl.default {
                        Some(default) => evaluate_default(default, self.workspace),
                        None => Value::Unknown,
                    },
                };
                let value = if decl.sensitive {
                    value.mark_sensitive()
                } else {
                    value
                };
                child_variables.insert(decl.name.clone(), value);
            }

            self.visit(Arc::clone(child), child_variables, child_var_ids)?;
        }
        Ok(())
    }
}

/// Variable defaults are constant expressions; anything else degrades to
/// unknown.
fn evaluate_default(default: &terralint_loader::module::Expr, workspace: &str) -> Value {
    let empty = HashMap::new();
    let scope = EvalScope {
        variables: &empty,
        workspace,
    };
    match eval::evaluate_raw(default, &scope) {
        Ok(value) => value,
        Err(err) => {
            debug!("{err}; default treated as unknown");
            Value::Unknown
        }
    }
}
