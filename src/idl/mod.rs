//! # IDL Compiler Adapter
//!
//! Two halves:
//!
//! - [`compile`] drives the external compiler (`protoc` with the prost and
//!   tonic plugins by default) to produce language bindings under the
//!   project's bindings directory.
//! - [`parse`] reads the IDL with an embedded lexer and recursive-descent
//!   parser and returns [`ServiceDescriptor`]s with every request/response
//!   type resolved across imports.
//!
//! The two never share state; a run compiles first and parses second, so a
//! file the compiler rejects never reaches the parser.

pub mod compiler;
pub mod descriptor;
pub mod lexer;
pub mod loader;
pub mod parser;

use std::path::{Path, PathBuf};

pub use descriptor::{RpcMethod, ServiceDescriptor, TypeRef};

use crate::error::Result;
use crate::layout::ProjectLayout;
use crate::options::Options;

/// Include paths for `idl_file`: the configured ones, followed by the IDL
/// file's own directory when no configured path already contains it.
pub fn effective_include_paths(include_paths: &[PathBuf], idl_file: &Path) -> Vec<PathBuf> {
    let mut paths = include_paths.to_vec();
    let parent = match idl_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let canonical_idl = idl_file.canonicalize().unwrap_or_else(|_| idl_file.to_path_buf());
    let covered = paths.iter().any(|inc| {
        let inc = inc.canonicalize().unwrap_or_else(|_| inc.clone());
        canonical_idl.starts_with(&inc)
    });
    if !covered {
        paths.push(parent);
    }
    paths
}

/// Compile `idl_file` into the bindings directory of the project in `opts`.
pub fn compile(opts: &Options, idl_file: &Path) -> Result<()> {
    let layout = ProjectLayout::new(opts);
    let includes = effective_include_paths(opts.include_paths(), idl_file);
    compiler::compile(
        opts.compiler(),
        &includes,
        opts.plugins(),
        idl_file,
        &layout.bindings_dir(),
    )
}

/// Parse `idl_file` (and its imports) into service descriptors.
pub fn parse(idl_file: &Path, include_paths: &[PathBuf]) -> Result<Vec<ServiceDescriptor>> {
    let includes = effective_include_paths(include_paths, idl_file);
    loader::load_services(idl_file, &includes)
}
