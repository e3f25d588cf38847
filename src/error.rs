//! Error types for the generator pipeline.
//!
//! Every component returns [`Result`] over [`GenError`]. The variants follow
//! the failure classes the pipeline distinguishes: external compiler
//! failures, IDL parse failures, filesystem conflicts, marker-splice
//! anomalies and plain I/O errors. Only the CLI turns them into a terminal
//! failure.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = GenError> = std::result::Result<T, E>;

/// Location of a parse failure inside an IDL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File being parsed when the failure happened
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Errors produced by the layout engine, IDL adapter, synthesizer and
/// stub injector.
#[derive(Debug, Error)]
pub enum GenError {
    /// The IDL compiler executable could not be started.
    #[error("IDL compiler `{program}` could not be started: {source}")]
    CompilerNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The IDL compiler ran and exited unsuccessfully.
    #[error("IDL compiler `{program}` failed on {} (exit code {}):\n{output}", .idl.display(), .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CompilerFailed {
        program: String,
        idl: PathBuf,
        code: Option<i32>,
        output: String,
    },

    /// Malformed or unresolvable IDL.
    #[error("{location}: in {construct}: {message}")]
    Parse {
        location: SourceLocation,
        construct: String,
        message: String,
    },

    /// A target path exists and neither override nor ignore-exists is set.
    #[error("{} already exists (use --force to regenerate or --ignore-exists to skip)", .path.display())]
    AlreadyExists { path: PathBuf },

    /// A marker token was not found in the file being spliced.
    #[error("marker `{marker}` not found in {}; restore the marker line to let svcforge insert {category} lines", .path.display())]
    MarkerMissing {
        path: PathBuf,
        category: &'static str,
        marker: &'static str,
    },

    /// A marker token occurs more than once in the file being spliced.
    #[error("marker `{marker}` occurs {count} times in {}; keep exactly one", .path.display())]
    MarkerDuplicated {
        path: PathBuf,
        marker: &'static str,
        count: usize,
    },

    /// The output directory does not look like a generated project.
    #[error("{} is not a svcforge project (missing {}); run `svcforge new` first", .root.display(), .missing.display())]
    ProjectNotFound { root: PathBuf, missing: PathBuf },

    /// The IDL file declares no services.
    #[error("{} declares no services", .idl.display())]
    NoServices { idl: PathBuf },

    /// A filesystem operation failed.
    #[error("failed to {context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template failed to render.
    #[error("failed to render {template}: {source}")]
    Template {
        template: &'static str,
        #[source]
        source: askama::Error,
    },

    /// A service cannot be placed in the directory its name or naming
    /// override maps to.
    #[error("cannot use `{dir}` as the directory of service `{service}`: {reason}")]
    InvalidServiceDir {
        service: String,
        dir: String,
        reason: String,
    },

    /// The project settings file could not be parsed.
    #[error("invalid settings in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl GenError {
    /// Wrap an I/O error with the operation and path it belongs to.
    pub fn io(context: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        GenError::Io {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a parse error at a location.
    pub fn parse(
        location: SourceLocation,
        construct: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        GenError::Parse {
            location,
            construct: construct.into(),
            message: message.into(),
        }
    }

    /// Whether this error is an "already exists" conflict rather than a
    /// generic I/O failure.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, GenError::AlreadyExists { .. })
    }
}

/// Extension for attaching operation context to `std::io::Result`.
pub(crate) trait IoResultExt<T> {
    fn with_path(self, context: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, context: &'static str, path: &Path) -> Result<T> {
        self.map_err(|e| GenError::io(context, path, e))
    }
}
