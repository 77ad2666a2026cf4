//! Configuration-language boundary for terralint.
//!
//! Parses Terraform-style HCL into an immutable module tree, maps byte spans
//! onto line/column source ranges, and extracts suppression annotations from
//! comment tokens. The evaluation engine in `terralint_core` consumes the
//! types exported here and never touches raw HCL itself.

pub mod annotation;
pub mod error;
pub mod loader;
pub mod module;
pub mod source;

pub use annotation::{Annotation, AnnotationKind, CommentToken};
pub use error::LoaderError;
pub use loader::{load_config, LoadResult, LoaderOptions};
pub use module::{Attribute, ConfigBlock, Expr, Module, ModuleCall, ModuleConfig, VariableDecl};
pub use source::{LineIndex, SourcePos, SourceRange};

// Re-exported so downstream crates match on expression variants without
// depending on hcl-edit directly.
pub use hcl_edit::expr::Expression;
