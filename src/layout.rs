//! # Layout Engine
//!
//! Pure path derivation for a generated project. Every path is a function of
//! the project root, the naming rules in [`crate::naming`] and (optionally) a
//! naming override from [`Options`]; calling an accessor twice with the same
//! input always returns the same path.
//!
//! ```text
//! <root>/
//! ├── Cargo.toml
//! ├── svcforge.toml
//! ├── config/
//! │   └── config.yaml
//! ├── proto/
//! │   └── <snake_service>/<file>.proto
//! └── src/
//!     ├── main.rs                       # entry point with splice markers
//!     ├── pb/                           # compiler output + mod.rs index
//!     └── services/
//!         ├── mod.rs                    # index of service modules
//!         └── <snake_service>/
//!             ├── mod.rs                # wiring, regenerated every run
//!             ├── service.rs            # hand-owned implementation type
//!             └── <snake_method>.rs     # hand-owned handler, one per RPC
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{GenError, IoResultExt, Result};
use crate::naming::{is_module_name, to_snake_case};
use crate::options::Options;

/// Directory holding IDL copies, one subdirectory per service.
pub const IDL_DIR: &str = "proto";
/// Directory holding the project's Rust sources.
pub const SRC_DIR: &str = "src";
/// Compiler output directory, under `src/`.
pub const BINDINGS_DIR: &str = "pb";
/// Service implementation root, under `src/`.
pub const SERVICES_DIR: &str = "services";
/// Directory holding runtime configuration.
pub const CONFIG_DIR: &str = "config";
/// Runtime configuration file name.
pub const CONFIG_FILE: &str = "config.yaml";
/// Entry-point file name, under `src/`.
pub const ENTRY_FILE: &str = "main.rs";
/// Module index file name.
pub const MOD_FILE: &str = "mod.rs";
/// Hand-owned implementation file name inside a service directory.
pub const IMPL_FILE: &str = "service.rs";
/// Project manifest file name.
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Derived paths for one project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    override_existing: bool,
    ignore_exists: bool,
    naming_overrides: BTreeMap<String, String>,
}

impl ProjectLayout {
    pub fn new(opts: &Options) -> Self {
        Self {
            root: opts.output().to_path_buf(),
            override_existing: opts.override_existing(),
            ignore_exists: opts.ignore_exists(),
            naming_overrides: opts.naming_overrides().clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical directory name for a service.
    ///
    /// `HealthCheckService`, `health-check-service` and
    /// `health_check_service` all map to `health_check_service`, unless a
    /// naming override is configured for the exact service name.
    pub fn service_dir_name(&self, service: &str) -> String {
        match self.naming_overrides.get(service) {
            Some(dir) => dir.clone(),
            None => to_snake_case(service),
        }
    }

    /// Reject naming overrides that are not usable as module names.
    pub fn validate_naming_overrides(&self) -> Result<()> {
        for (service, dir) in &self.naming_overrides {
            if !is_module_name(dir) {
                return Err(GenError::InvalidServiceDir {
                    service: service.clone(),
                    dir: dir.clone(),
                    reason: "naming overrides must be lowercase snake_case identifiers".into(),
                });
            }
        }
        Ok(())
    }

    pub fn idl_root(&self) -> PathBuf {
        self.root.join(IDL_DIR)
    }

    /// `proto/<snake_service>`
    pub fn service_idl_dir(&self, service: &str) -> PathBuf {
        self.idl_root().join(self.service_dir_name(service))
    }

    /// `proto/<snake_service>/<file name>`
    pub fn service_idl_file(&self, service: &str, idl_file: &Path) -> PathBuf {
        let file_name = idl_file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("service.proto"));
        self.service_idl_dir(service).join(file_name)
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join(SRC_DIR)
    }

    pub fn bindings_dir(&self) -> PathBuf {
        self.src_dir().join(BINDINGS_DIR)
    }

    pub fn bindings_index(&self) -> PathBuf {
        self.bindings_dir().join(MOD_FILE)
    }

    pub fn services_root(&self) -> PathBuf {
        self.src_dir().join(SERVICES_DIR)
    }

    pub fn services_index(&self) -> PathBuf {
        self.services_root().join(MOD_FILE)
    }

    /// `src/services/<snake_service>`
    pub fn service_dir(&self, service: &str) -> PathBuf {
        self.services_root().join(self.service_dir_name(service))
    }

    /// `src/services/<snake_service>/service.rs`
    pub fn implementation_file(&self, service: &str) -> PathBuf {
        self.service_dir(service).join(IMPL_FILE)
    }

    /// `src/services/<snake_service>/mod.rs`
    pub fn wiring_file(&self, service: &str) -> PathBuf {
        self.service_dir(service).join(MOD_FILE)
    }

    /// `src/services/<snake_service>/<snake_method>.rs`
    pub fn method_file(&self, service: &str, method: &str) -> PathBuf {
        self.service_dir(service)
            .join(format!("{}.rs", to_snake_case(method)))
    }

    pub fn config_root(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_root().join(CONFIG_FILE)
    }

    pub fn entry_file(&self) -> PathBuf {
        self.src_dir().join(ENTRY_FILE)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(crate::project_config::SETTINGS_FILE)
    }

    /// Directories created by [`save`](Self::save), parents first.
    pub fn skeleton(&self) -> Vec<PathBuf> {
        vec![
            self.root.clone(),
            self.idl_root(),
            self.src_dir(),
            self.bindings_dir(),
            self.services_root(),
            self.config_root(),
        ]
    }

    /// Create the project directory skeleton.
    ///
    /// For each skeleton directory that already exists: with override set it
    /// is removed and recreated, with ignore-exists set it is kept, and
    /// otherwise the call fails with [`GenError::AlreadyExists`]. Any OS
    /// error aborts before later directories are touched.
    pub fn save(&self) -> Result<()> {
        for dir in self.skeleton() {
            if dir.exists() {
                if self.override_existing {
                    warn!(path = %dir.display(), "removing existing directory");
                    fs::remove_dir_all(&dir).with_path("remove directory", &dir)?;
                } else if self.ignore_exists {
                    debug!(path = %dir.display(), "directory exists, keeping it");
                    continue;
                } else {
                    return Err(GenError::AlreadyExists { path: dir });
                }
            }
            fs::create_dir_all(&dir).with_path("create directory", &dir)?;
            info!(path = %dir.display(), "created directory");
        }
        Ok(())
    }

    /// Idempotently create the IDL and implementation directories for a service.
    pub fn ensure_service_dirs(&self, service: &str) -> Result<()> {
        for dir in [self.service_idl_dir(service), self.service_dir(service)] {
            fs::create_dir_all(&dir).with_path("create directory", &dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(root: &Path) -> ProjectLayout {
        ProjectLayout::new(&Options::default().with_output(root))
    }

    #[test]
    fn test_paths_are_derived_from_root() {
        let l = layout(Path::new("/srv/app"));
        assert_eq!(l.idl_root(), PathBuf::from("/srv/app/proto"));
        assert_eq!(
            l.service_idl_file("HealthCheckService", Path::new("/tmp/x/health.proto")),
            PathBuf::from("/srv/app/proto/health_check_service/health.proto")
        );
        assert_eq!(
            l.implementation_file("HealthCheckService"),
            PathBuf::from("/srv/app/src/services/health_check_service/service.rs")
        );
        assert_eq!(
            l.method_file("HealthCheckService", "HealthCheck"),
            PathBuf::from("/srv/app/src/services/health_check_service/health_check.rs")
        );
        assert_eq!(
            l.wiring_file("HealthCheckService"),
            PathBuf::from("/srv/app/src/services/health_check_service/mod.rs")
        );
        assert_eq!(l.config_file(), PathBuf::from("/srv/app/config/config.yaml"));
        assert_eq!(l.entry_file(), PathBuf::from("/srv/app/src/main.rs"));
        assert_eq!(l.bindings_index(), PathBuf::from("/srv/app/src/pb/mod.rs"));
    }

    #[test]
    fn test_derivation_is_deterministic_and_normalized() {
        let l = layout(Path::new("/srv/app"));
        assert_eq!(l.service_dir("HealthCheckService"), l.service_dir("HealthCheckService"));
        assert_eq!(
            l.service_dir("health-check-service"),
            l.service_dir("HealthCheckService")
        );
        assert_eq!(
            l.service_dir_name("health check service"),
            "health_check_service"
        );
    }

    #[test]
    fn test_naming_override() {
        let opts = Options::default()
            .with_output("/srv/app")
            .with_naming_override("HealthCheckService", "health");
        let l = ProjectLayout::new(&opts);
        assert_eq!(
            l.implementation_file("HealthCheckService"),
            PathBuf::from("/srv/app/src/services/health/service.rs")
        );
        assert_eq!(l.service_dir_name("OtherService"), "other_service");
    }

    #[test]
    fn test_save_creates_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        let l = layout(&root);
        l.save().unwrap();
        for d in l.skeleton() {
            assert!(d.is_dir(), "{d:?} missing");
        }
    }

    #[test]
    fn test_save_fails_when_root_exists() {
        let dir = tempfile::tempdir().unwrap();
        let l = layout(dir.path());
        let err = l.save().unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_save_with_ignore_exists_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.txt");
        fs::write(&keep, "x").unwrap();
        let l = ProjectLayout::new(
            &Options::default()
                .with_output(dir.path())
                .with_ignore_exists(true),
        );
        l.save().unwrap();
        assert!(keep.exists());
        assert!(l.services_root().is_dir());
    }

    #[test]
    fn test_save_with_override_recreates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        fs::create_dir_all(&root).unwrap();
        let stale = root.join("stale.txt");
        fs::write(&stale, "x").unwrap();
        let l = ProjectLayout::new(&Options::default().with_output(&root).with_override(true));
        l.save().unwrap();
        assert!(!stale.exists());
        assert!(l.config_root().is_dir());
    }

    #[test]
    fn test_ensure_service_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let l = layout(dir.path());
        l.ensure_service_dirs("HealthCheckService").unwrap();
        l.ensure_service_dirs("HealthCheckService").unwrap();
        assert!(l.service_dir("HealthCheckService").is_dir());
        assert!(l.service_idl_dir("HealthCheckService").is_dir());
    }

    #[test]
    fn test_invalid_naming_override_is_rejected() {
        let opts = Options::default()
            .with_output("/srv/app")
            .with_naming_override("HealthCheckService", "health-check");
        match ProjectLayout::new(&opts).validate_naming_overrides().unwrap_err() {
            GenError::InvalidServiceDir { service, dir, .. } => {
                assert_eq!(service, "HealthCheckService");
                assert_eq!(dir, "health-check");
            }
            other => panic!("unexpected error: {other}"),
        }

        let valid = Options::default().with_naming_override("HealthCheckService", "health");
        assert!(ProjectLayout::new(&valid).validate_naming_overrides().is_ok());
    }
}
