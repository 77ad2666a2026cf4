//! Neutral configuration model.
//!
//! The parser produces `hcl-edit` bodies with byte spans. This module lifts
//! them into a file-aware tree the evaluator can walk without knowing which
//! file a block came from: every expression and block carries its resolved
//! [`SourceRange`].

use std::collections::BTreeMap;
use std::sync::Arc;

use hcl_edit::expr::Expression;
use hcl_edit::structure::{Block, BlockLabel, Body, Structure};
use hcl_edit::Span;
use tracing::debug;

use crate::source::{LineIndex, SourceRange};

/// Block attribute names that configure a module call itself rather than
/// feeding an input variable.
const MODULE_CALL_META_ARGS: &[&str] =
    &["source", "version", "count", "for_each", "providers", "depends_on"];

/// An expression together with its resolved source range.
#[derive(Debug, Clone)]
pub struct Expr {
    pub expr: Expression,
    pub range: SourceRange,
}

/// A single `name = expression` binding.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: Expr,
    pub name_range: SourceRange,
}

/// A structural block (resource, data source, provider, nested block).
#[derive(Debug, Clone)]
pub struct ConfigBlock {
    pub block_type: String,
    pub labels: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<ConfigBlock>,
    pub def_range: SourceRange,
}

impl ConfigBlock {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A `module "name" { ... }` call site.
#[derive(Debug, Clone)]
pub struct ModuleCall {
    pub name: String,
    pub source: String,
    pub source_range: SourceRange,
    pub block: ConfigBlock,
}

impl ModuleCall {
    /// Attributes that bind input variables of the called module, in
    /// declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &Attribute> {
        self.block
            .attributes
            .iter()
            .filter(|a| !MODULE_CALL_META_ARGS.contains(&a.name.as_str()))
    }
}

/// A `variable "name" { ... }` declaration.
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    pub default: Option<Expr>,
    pub sensitive: bool,
    pub decl_range: SourceRange,
}

/// All parsed blocks of one module directory, merged across its files.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub resources: Vec<ConfigBlock>,
    pub data_sources: Vec<ConfigBlock>,
    pub providers: Vec<ConfigBlock>,
    pub module_calls: BTreeMap<String, ModuleCall>,
    pub variables: BTreeMap<String, VariableDecl>,
    pub locals: Vec<Attribute>,
    pub outputs: Vec<Attribute>,
}

impl Module {
    /// Merges the structures of one parsed file into the module.
    pub fn add_file(&mut self, filename: &str, index: &LineIndex, body: &Body) {
        for structure in body.iter() {
            match structure {
                Structure::Block(block) => self.add_block(filename, index, block),
                Structure::Attribute(attr) => {
                    // Top-level attributes are not valid Terraform, but the
                    // evaluator has no use for rejecting them here.
                    debug!("ignoring top-level attribute `{}` in {}", attr.key, filename);
                }
            }
        }
    }

    fn add_block(&mut self, filename: &str, index: &LineIndex, block: &Block) {
        let converted = convert_block(filename, index, block);
        match converted.block_type.as_str() {
            "resource" => self.resources.push(converted),
            "data" => self.data_sources.push(converted),
            "provider" => self.providers.push(converted),
            "module" => {
                let Some(name) = converted.labels.first().cloned() else {
                    debug!("module block without a label in {}", filename);
                    return;
                };
                let Some(source) = converted.attribute("source") else {
                    debug!("module {:?} without a source in {}", name, filename);
                    return;
                };
                let (source_addr, source_range) = match &source.expr.expr {
                    Expression::String(s) => (s.value().clone(), source.expr.range.clone()),
                    _ => {
                        debug!("module {:?} has a non-literal source in {}", name, filename);
                        return;
                    }
                };
                self.module_calls.insert(
                    name.clone(),
                    ModuleCall {
                        name,
                        source: source_addr,
                        source_range,
                        block: converted,
                    },
                );
            }
            "variable" => {
                let Some(name) = converted.labels.first().cloned() else {
                    return;
                };
                let default = converted.attribute("default").map(|a| a.expr.clone());
                let sensitive = matches!(
                    converted.attribute("sensitive").map(|a| &a.expr.expr),
                    Some(Expression::Bool(b)) if *b.value()
                );
                let decl_range = converted.def_range.clone();
                self.variables.insert(
                    name.clone(),
                    VariableDecl {
                        name,
                        default,
                        sensitive,
                        decl_range,
                    },
                );
            }
            "locals" => {
                self.locals.extend(converted.attributes);
            }
            "output" => {
                if let Some(value) = converted.attribute("value") {
                    self.outputs.push(value.clone());
                }
            }
            other => {
                debug!("ignoring `{}` block in {}", other, filename);
            }
        }
    }
}

/// One node of the static module-call tree. Owned by the loader and
/// immutable after construction.
#[derive(Debug)]
pub struct ModuleConfig {
    /// Sequence of module-call names from the root; empty for the root.
    pub path: Vec<String>,
    pub module: Module,
    pub children: BTreeMap<String, Arc<ModuleConfig>>,
}

impl ModuleConfig {
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Dotted path for log and display purposes, e.g. `module.app.module.db`.
    pub fn display_path(&self) -> String {
        if self.is_root() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|n| format!("module.{n}"))
                .collect::<Vec<_>>()
                .join(".")
        }
    }
}

pub(crate) fn convert_block(filename: &str, index: &LineIndex, block: &Block) -> ConfigBlock {
    let def_range = span_range(filename, index, block.span());

    let labels = block
        .labels
        .iter()
        .map(|label| match label {
            BlockLabel::String(s) => s.value().clone(),
            BlockLabel::Ident(i) => i.value().as_str().to_string(),
        })
        .collect();

    let mut attributes = Vec::new();
    let mut blocks = Vec::new();
    for structure in block.body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                attributes.push(Attribute {
                    name: attr.key.as_str().to_string(),
                    expr: Expr {
                        expr: attr.value.clone(),
                        range: span_range(filename, index, attr.value.span()),
                    },
                    name_range: span_range(filename, index, attr.key.span()),
                });
            }
            Structure::Block(nested) => {
                blocks.push(convert_block(filename, index, nested));
            }
        }
    }

    ConfigBlock {
        block_type: block.ident.as_str().to_string(),
        labels,
        attributes,
        blocks,
        def_range,
    }
}

fn span_range(
    filename: &str,
    index: &LineIndex,
    span: Option<std::ops::Range<usize>>,
) -> SourceRange {
    match span {
        Some(span) => index.range(filename, span),
        None => SourceRange::new(filename, Default::default(), Default::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_module(content: &str) -> Module {
        let body = hcl_edit::parser::parse_body(content).unwrap();
        let index = LineIndex::new(content);
        let mut module = Module::default();
        module.add_file("main.tf", &index, &body);
        module
    }

    #[test]
    fn test_resource_block_conversion() {
        let module = parse_module(
            r#"
resource "aws_instance" "web" {
  instance_type = "t2.micro"

  ebs_block_device {
    volume_size = 10
  }
}
"#,
        );
        assert_eq!(module.resources.len(), 1);
        let resource = &module.resources[0];
        assert_eq!(resource.labels, vec!["aws_instance", "web"]);
        assert_eq!(resource.attributes.len(), 1);
        assert_eq!(resource.blocks.len(), 1);
        assert_eq!(resource.blocks[0].block_type, "ebs_block_device");
        assert_eq!(resource.attribute("instance_type").unwrap().expr.range.start.line, 3);
    }

    #[test]
    fn test_module_call_inputs_exclude_meta_arguments() {
        let module = parse_module(
            r#"
module "app" {
  source   = "./app"
  count    = 2
  name     = "web"
  replicas = 3
}
"#,
        );
        let call = module.module_calls.get("app").unwrap();
        assert_eq!(call.source, "./app");
        let inputs: Vec<_> = call.inputs().map(|a| a.name.clone()).collect();
        assert_eq!(inputs, vec!["name", "replicas"]);
    }

    #[test]
    fn test_variable_declaration() {
        let module = parse_module(
            r#"
variable "environment" {
  default   = "staging"
  sensitive = false
}

variable "token" {
  sensitive = true
}
"#,
        );
        let environment = module.variables.get("environment").unwrap();
        assert!(environment.default.is_some());
        assert!(!environment.sensitive);
        assert!(module.variables.get("token").unwrap().sensitive);
    }

    #[test]
    fn test_locals_and_outputs() {
        let module = parse_module(
            r#"
locals {
  region = "us-east-1"
  az     = "us-east-1a"
}

output "region" {
  value = local.region
}
"#,
        );
        assert_eq!(module.locals.len(), 2);
        assert_eq!(module.outputs.len(), 1);
    }

    #[test]
    fn test_display_path() {
        let config = ModuleConfig {
            path: vec!["app".into(), "db".into()],
            module: Module::default(),
            children: BTreeMap::new(),
        };
        assert_eq!(config.display_path(), "module.app.module.db");
    }
}
