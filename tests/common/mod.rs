#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const HEALTH_V1: &str = r#"syntax = "proto3";

package health;

// Liveness checks for the service mesh.
service HealthCheckService {
  rpc HealthCheck(HealthCheckRequest) returns (HealthCheckResponse);
}

message HealthCheckRequest {
  string service = 1;
}

message HealthCheckResponse {
  enum ServingStatus {
    UNKNOWN = 0;
    SERVING = 1;
  }
  ServingStatus status = 1;
}
"#;

    /// `HEALTH_V1` plus a server-streaming `Watch` method.
    pub const HEALTH_V2: &str = r#"syntax = "proto3";

package health;

// Liveness checks for the service mesh.
service HealthCheckService {
  rpc HealthCheck(HealthCheckRequest) returns (HealthCheckResponse);
  rpc Watch(HealthCheckRequest) returns (stream HealthCheckResponse);
}

message HealthCheckRequest {
  string service = 1;
}

message HealthCheckResponse {
  enum ServingStatus {
    UNKNOWN = 0;
    SERVING = 1;
  }
  ServingStatus status = 1;
}
"#;

    pub const NO_SERVICES: &str = r#"syntax = "proto3";
package health;
message Lonely { string id = 1; }
"#;

    /// Write an IDL file under `dir/api/` and return its path.
    pub fn write_idl(dir: &Path, name: &str, content: &str) -> PathBuf {
        let api = dir.join("api");
        fs::create_dir_all(&api).unwrap();
        let path = api.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

pub mod fake_protoc {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn install(dir: &Path, body: &str) -> PathBuf {
        let bin = dir.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let stub = bin.join("protoc");
        fs::write(&stub, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&stub).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&stub, perms).unwrap();
        stub
    }

    /// A compiler that logs its arguments to `bin/protoc.log` and writes
    /// fixed `health` bindings for the prost and tonic plugins.
    pub fn succeeding(dir: &Path) -> PathBuf {
        install(
            dir,
            r#"echo "$@" >> "$(dirname "$0")/protoc.log"
for arg in "$@"; do
  case "$arg" in
    --prost_out=*) echo "// prost bindings" > "${arg#--prost_out=}/health.rs" ;;
    --tonic_out=*) echo "// tonic bindings" > "${arg#--tonic_out=}/health.tonic.rs" ;;
  esac
done
exit 0"#,
        )
    }

    /// A compiler that rejects every input.
    pub fn failing(dir: &Path) -> PathBuf {
        install(
            dir,
            r#"echo "health.proto:4:1: Expected top-level statement (e.g. \"message\")." >&2
exit 1"#,
        )
    }

    /// Arguments of every recorded invocation, one line per run.
    pub fn invocations(stub: &Path) -> Vec<String> {
        let log = stub.with_file_name("protoc.log");
        fs::read_to_string(log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

pub mod snapshot {
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::{Path, PathBuf};
    use walkdir::WalkDir;

    /// Relative path → bytes of every file under `root`.
    pub type Tree = BTreeMap<PathBuf, Vec<u8>>;

    pub fn tree(root: &Path) -> Tree {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect()
    }

    /// Files added or modified between two snapshots.
    pub fn changed(before: &Tree, after: &Tree) -> BTreeSet<PathBuf> {
        after
            .iter()
            .filter(|(path, bytes)| before.get(*path) != Some(*bytes))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

pub mod project {
    use std::path::{Path, PathBuf};
    use svcforge::{init_project, Mode, Options};

    /// Initialize a project at `dir/app` and return options for generating
    /// into it with `protoc` as the compiler.
    pub fn new_project(dir: &Path, protoc: &Path) -> (Options, PathBuf) {
        let root = dir.join("app");
        init_project(&Options::default().with_output(&root)).unwrap();
        let opts = Options::default()
            .with_output(&root)
            .with_mode(Mode::Add)
            .with_compiler(protoc);
        (opts, root)
    }
}
