//! Generation options threaded through every component.
//!
//! An [`Options`] value is built once per command by chaining `with_*`
//! setters over [`Options::default()`] and is read-only afterwards: fields
//! are private and only exposed through accessors. Components take
//! `&Options` (or a [`crate::layout::ProjectLayout`] built from it) as an
//! explicit parameter instead of reading shared state.
//!
//! ```rust
//! use svcforge::options::{Mode, Options};
//!
//! let opts = Options::default()
//!     .with_output("my-service")
//!     .with_mode(Mode::Update)
//!     .with_include_path("proto")
//!     .with_override(false);
//! assert_eq!(opts.compiler(), std::path::Path::new("protoc"));
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How a synthesis run treats services that already have an
/// implementation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Scaffold new services; an existing implementation file is a conflict.
    #[default]
    Add,
    /// Weave new methods into existing services; never a conflict.
    Update,
}

/// Immutable settings for one command invocation.
#[derive(Debug, Clone)]
pub struct Options {
    output: PathBuf,
    mode: Mode,
    override_existing: bool,
    ignore_exists: bool,
    module: Option<String>,
    compiler: PathBuf,
    include_paths: Vec<PathBuf>,
    plugins: Vec<String>,
    naming_overrides: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output: PathBuf::from("."),
            mode: Mode::Add,
            override_existing: false,
            ignore_exists: false,
            module: None,
            compiler: PathBuf::from("protoc"),
            include_paths: Vec::new(),
            plugins: vec!["prost".to_string(), "tonic".to_string()],
            naming_overrides: BTreeMap::new(),
        }
    }
}

impl Options {
    /// Project root that every layout path is derived from.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Remove and regenerate existing files and directories instead of failing.
    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Skip "already exists" conflicts instead of failing.
    pub fn with_ignore_exists(mut self, ignore_exists: bool) -> Self {
        self.ignore_exists = ignore_exists;
        self
    }

    /// Crate name of the generated project.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// Append an include directory; earlier directories win on lookup.
    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.include_paths.contains(&path) {
            self.include_paths.push(path);
        }
        self
    }

    pub fn with_include_paths<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths.into_iter().fold(self, |opts, p| opts.with_include_path(p))
    }

    /// Replace the compiler plugin list (`prost` → `--prost_out=...`).
    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    /// Use `dir` as the directory name for `service` instead of its
    /// snake_case form.
    pub fn with_naming_override(
        mut self,
        service: impl Into<String>,
        dir: impl Into<String>,
    ) -> Self {
        self.naming_overrides.insert(service.into(), dir.into());
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn override_existing(&self) -> bool {
        self.override_existing
    }

    pub fn ignore_exists(&self) -> bool {
        self.ignore_exists
    }

    /// Crate name of the generated project; falls back to the snake_case
    /// name of the output directory.
    pub fn module(&self) -> String {
        if let Some(module) = &self.module {
            return module.clone();
        }
        let dir_name = self
            .output
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .or_else(|| {
                self.output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let module = crate::naming::to_snake_case(&dir_name);
        if module.is_empty() {
            "service".to_string()
        } else {
            module
        }
    }

    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn naming_overrides(&self) -> &BTreeMap<String, String> {
        &self.naming_overrides
    }
}
