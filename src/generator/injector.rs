//! # Stub Injector
//!
//! Splices single lines into the entry-point file directly above marker
//! comments. A line that is already present anywhere in the file (compared
//! after trimming surrounding whitespace) is never inserted twice, so
//! running the same injection any number of times leaves the file as it was
//! after the first run.
//!
//! [`splice`] is the pure transition over file contents; [`insert`] and
//! [`insert_lines`] wrap it with a whole-file read and write.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{GenError, IoResultExt, Result};

/// Marker comments the entry-point template carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubMarker {
    /// `use` lines for hand-written implementation types
    TypeImports,
    /// `use` lines for generated server types
    PackageImports,
    /// `.add_service(...)` calls
    Registrations,
}

impl StubMarker {
    pub const ALL: [StubMarker; 3] = [
        StubMarker::TypeImports,
        StubMarker::PackageImports,
        StubMarker::Registrations,
    ];

    pub fn token(self) -> &'static str {
        match self {
            StubMarker::TypeImports => "// @svcforge:type-imports",
            StubMarker::PackageImports => "// @svcforge:package-imports",
            StubMarker::Registrations => "// @svcforge:registrations",
        }
    }

    /// Human-readable name of the lines inserted at this marker.
    pub fn category(self) -> &'static str {
        match self {
            StubMarker::TypeImports => "type import",
            StubMarker::PackageImports => "package import",
            StubMarker::Registrations => "service registration",
        }
    }
}

/// Result of splicing one line into file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splice {
    /// The line was already present; contents are unchanged.
    Unchanged,
    /// New file contents with the line inserted above the marker.
    Inserted(String),
}

/// Why a splice could not find a unique insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAnomaly {
    Missing,
    Duplicated(usize),
}

/// Whether [`insert`] changed the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Insert `line` into `content` directly above the line holding `marker`,
/// with the marker line's indentation.
pub fn splice(
    content: &str,
    marker: StubMarker,
    line: &str,
) -> std::result::Result<Splice, MarkerAnomaly> {
    let wanted = line.trim();
    if content.lines().any(|l| l.trim() == wanted) {
        return Ok(Splice::Unchanged);
    }

    let token = marker.token();
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let hits: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim() == token)
        .map(|(i, _)| i)
        .collect();
    let at = match hits.as_slice() {
        [] => return Err(MarkerAnomaly::Missing),
        [at] => *at,
        many => return Err(MarkerAnomaly::Duplicated(many.len())),
    };

    let marker_line = lines[at];
    let indent_len = marker_line.len() - marker_line.trim_start().len();
    let indent = &marker_line[..indent_len];
    let eol = if marker_line.ends_with("\r\n") { "\r\n" } else { "\n" };

    let mut out = String::with_capacity(content.len() + indent.len() + wanted.len() + eol.len());
    for l in &lines[..at] {
        out.push_str(l);
    }
    out.push_str(indent);
    out.push_str(wanted);
    out.push_str(eol);
    for l in &lines[at..] {
        out.push_str(l);
    }
    Ok(Splice::Inserted(out))
}

fn anomaly_error(path: &Path, marker: StubMarker, anomaly: MarkerAnomaly) -> GenError {
    match anomaly {
        MarkerAnomaly::Missing => GenError::MarkerMissing {
            path: path.to_path_buf(),
            category: marker.category(),
            marker: marker.token(),
        },
        MarkerAnomaly::Duplicated(count) => GenError::MarkerDuplicated {
            path: path.to_path_buf(),
            marker: marker.token(),
            count,
        },
    }
}

/// Splice one line into the file at `path`.
pub fn insert(path: &Path, marker: StubMarker, line: &str) -> Result<InsertOutcome> {
    let inserted = insert_lines(path, &[(marker, line.to_string())])?;
    Ok(if inserted.is_empty() {
        InsertOutcome::AlreadyPresent
    } else {
        InsertOutcome::Inserted
    })
}

/// Splice several lines into the file at `path` with one read and at most
/// one write, returning the lines that were actually inserted.
///
/// If any marker is missing or duplicated the file is left untouched.
pub fn insert_lines(path: &Path, lines: &[(StubMarker, String)]) -> Result<Vec<String>> {
    let mut content = fs::read_to_string(path).with_path("read", path)?;
    let mut inserted = Vec::new();
    for (marker, line) in lines {
        match splice(&content, *marker, line) {
            Ok(Splice::Inserted(next)) => {
                info!(
                    file = %path.display(),
                    category = marker.category(),
                    line = line.trim(),
                    "spliced line"
                );
                content = next;
                inserted.push(line.trim().to_string());
            }
            Ok(Splice::Unchanged) => {
                debug!(file = %path.display(), line = line.trim(), "line already present");
            }
            Err(anomaly) => return Err(anomaly_error(path, *marker, anomaly)),
        }
    }
    if !inserted.is_empty() {
        fs::write(path, content).with_path("write", path)?;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = "use x;\n// @svcforge:type-imports\n\nfn main() {\n    Server::builder()\n        // @svcforge:registrations\n        .serve();\n}\n";

    #[test]
    fn test_inserts_above_marker_with_marker_indent() {
        let reg = ".add_service(AServer::new(AImpl::default()))";
        let Splice::Inserted(out) = splice(MAIN, StubMarker::Registrations, reg).unwrap() else {
            panic!("expected insertion");
        };
        assert!(out.contains(
            "        .add_service(AServer::new(AImpl::default()))\n        // @svcforge:registrations\n"
        ));
    }

    #[test]
    fn test_splice_is_idempotent() {
        let line = "use services::a::AImpl;";
        let Splice::Inserted(once) = splice(MAIN, StubMarker::TypeImports, line).unwrap() else {
            panic!("expected insertion");
        };
        assert_eq!(splice(&once, StubMarker::TypeImports, line).unwrap(), Splice::Unchanged);
    }

    #[test]
    fn test_present_line_with_different_indent_is_not_duplicated() {
        let content = "    use services::a::AImpl;  \n// @svcforge:type-imports\n";
        assert_eq!(
            splice(content, StubMarker::TypeImports, "use services::a::AImpl;").unwrap(),
            Splice::Unchanged
        );
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let Splice::Inserted(one) = splice(MAIN, StubMarker::TypeImports, "use a;").unwrap() else {
            panic!("expected insertion");
        };
        let Splice::Inserted(two) = splice(&one, StubMarker::TypeImports, "use b;").unwrap() else {
            panic!("expected insertion");
        };
        assert!(two.contains("use a;\nuse b;\n// @svcforge:type-imports\n"));
    }

    #[test]
    fn test_missing_and_duplicated_markers() {
        assert_eq!(
            splice("fn main() {}\n", StubMarker::Registrations, ".x()"),
            Err(MarkerAnomaly::Missing)
        );
        let twice = "// @svcforge:type-imports\n// @svcforge:type-imports\n";
        assert_eq!(
            splice(twice, StubMarker::TypeImports, "use a;"),
            Err(MarkerAnomaly::Duplicated(2))
        );
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let content = "a\r\n// @svcforge:type-imports\r\nb\r\n";
        let Splice::Inserted(out) = splice(content, StubMarker::TypeImports, "use a;").unwrap()
        else {
            panic!("expected insertion");
        };
        assert_eq!(out, "a\r\nuse a;\r\n// @svcforge:type-imports\r\nb\r\n");
    }

    #[test]
    fn test_insert_lines_leaves_file_untouched_on_missing_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        let content = "// @svcforge:type-imports\nfn main() {}\n";
        fs::write(&path, content).unwrap();

        let err = insert_lines(
            &path,
            &[
                (StubMarker::TypeImports, "use a;".into()),
                (StubMarker::Registrations, ".add_service(x)".into()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, GenError::MarkerMissing { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_insert_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        fs::write(&path, MAIN).unwrap();
        assert_eq!(
            insert(&path, StubMarker::TypeImports, "use a;").unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            insert(&path, StubMarker::TypeImports, "use a;").unwrap(),
            InsertOutcome::AlreadyPresent
        );
    }
}
