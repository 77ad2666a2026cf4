//! Configuration tree loading.
//!
//! Loads every `*.tf` file of a working directory into a [`Module`], then
//! follows local module calls (`source = "./..."`) recursively to build the
//! static module-call tree. Registry and remote sources are not fetched and
//! are skipped. The loader rejects module-call cycles outright so the
//! evaluator can assume an acyclic tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::annotation::{extract_annotations, scan_comments, Annotation};
use crate::error::LoaderError;
use crate::module::{Module, ModuleConfig};
use crate::source::LineIndex;

/// Loader policy supplied by the caller.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Whether module calls are followed into child modules.
    pub inspect_modules: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            inspect_modules: true,
        }
    }
}

/// The loaded module tree plus per-file raw sources and annotations.
#[derive(Debug)]
pub struct LoadResult {
    pub root: Arc<ModuleConfig>,
    /// Raw file contents, keyed by the filename used in source ranges.
    pub sources: BTreeMap<String, String>,
    /// Suppression annotations, keyed by filename.
    pub annotations: BTreeMap<String, Vec<Annotation>>,
}

/// Loads the configuration rooted at `dir`.
pub fn load_config(dir: &Path, options: &LoaderOptions) -> Result<LoadResult, LoaderError> {
    let mut sources = BTreeMap::new();
    let mut annotations = BTreeMap::new();
    let mut visited = Vec::new();

    let root = load_module(
        dir,
        PathBuf::new(),
        Vec::new(),
        options,
        &mut sources,
        &mut annotations,
        &mut visited,
    )?;

    Ok(LoadResult {
        root: Arc::new(root),
        sources,
        annotations,
    })
}

#[allow(clippy::too_many_arguments)]
fn load_module(
    base: &Path,
    rel: PathBuf,
    module_path: Vec<String>,
    options: &LoaderOptions,
    sources: &mut BTreeMap<String, String>,
    annotations: &mut BTreeMap<String, Vec<Annotation>>,
    visited: &mut Vec<PathBuf>,
) -> Result<ModuleConfig, LoaderError> {
    let dir = base.join(&rel);
    let canonical = dir.canonicalize().map_err(|e| LoaderError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    if visited.contains(&canonical) {
        let mut chain: Vec<String> = visited
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        chain.push(canonical.display().to_string());
        return Err(LoaderError::ModuleCycle {
            chain: chain.join(" -> "),
        });
    }
    visited.push(canonical);

    let mut module = Module::default();
    for file in config_files(&dir)? {
        let filename = normalize(&rel.join(file.file_name().unwrap_or_default()));
        let content = std::fs::read_to_string(&file).map_err(|e| LoaderError::Io {
            path: filename.clone(),
            source: e,
        })?;

        let body = hcl_edit::parser::parse_body(&content).map_err(|e| LoaderError::Parse {
            path: filename.clone(),
            message: e.to_string(),
        })?;

        let index = LineIndex::new(&content);
        module.add_file(&filename, &index, &body);

        let tokens = scan_comments(&filename, &content, &index);
        annotations.insert(filename.clone(), extract_annotations(&tokens)?);
        sources.insert(filename, content);
    }

    let mut children = BTreeMap::new();
    if options.inspect_modules {
        for (name, call) in &module.module_calls {
            if !is_local_source(&call.source) {
                debug!("skipping non-local module source {:?}", call.source);
                continue;
            }
            let child_rel = normalize_path(&rel.join(&call.source));
            if !base.join(&child_rel).is_dir() {
                return Err(LoaderError::ModuleNotFound {
                    source_addr: call.source.clone(),
                    range: call.source_range.clone(),
                });
            }
            let mut child_path = module_path.clone();
            child_path.push(name.clone());
            let child = load_module(
                base,
                child_rel,
                child_path,
                options,
                sources,
                annotations,
                visited,
            )?;
            children.insert(name.clone(), Arc::new(child));
        }
    }

    visited.pop();

    Ok(ModuleConfig {
        path: module_path,
        module,
        children,
    })
}

/// Returns the `*.tf` files of `dir` in lexical order.
fn config_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoaderError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();
    Ok(files)
}

fn is_local_source(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../")
}

/// Collapses `.` and `..` components without touching the filesystem, so
/// filenames stay relative to the inspected directory.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn normalize(path: &Path) -> String {
    normalize_path(path).to_string_lossy().replace('\\', "/")
}
