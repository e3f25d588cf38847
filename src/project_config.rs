//! Project settings for svcforge
//!
//! A generated project records its generator settings in `svcforge.toml` at
//! the project root, so later `add`/`update` runs do not need the same flags
//! repeated:
//!
//! ```toml
//! module = "orders"
//! protoc = "/usr/local/bin/protoc"
//! include = ["proto", "third_party/googleapis"]
//! plugins = ["prost", "tonic"]
//!
//! [naming]
//! HealthCheckService = "health"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{GenError, IoResultExt, Result};
use crate::naming::is_module_name;
use crate::options::Options;

/// File name of the settings file inside a project root.
pub const SETTINGS_FILE: &str = "svcforge.toml";

/// Settings loaded from `svcforge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectSettings {
    /// Crate name of the generated project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// IDL compiler executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protoc: Option<PathBuf>,

    /// Include directories, relative to the project root unless absolute
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<PathBuf>,

    /// Compiler plugins (`prost` → `--prost_out`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    /// Service name → directory name overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub naming: BTreeMap<String, String>,
}

impl ProjectSettings {
    /// Fold these settings into `opts`.
    ///
    /// Settings act as defaults: include directories are appended after the
    /// ones already in `opts`, and the compiler, module and plugins are only
    /// applied when `explicit` says the caller did not set them.
    pub fn apply(&self, root: &Path, opts: Options, explicit: &ExplicitFlags) -> Options {
        let mut opts = opts;
        if !explicit.module {
            if let Some(module) = &self.module {
                opts = opts.with_module(module.clone());
            }
        }
        if !explicit.compiler {
            if let Some(protoc) = &self.protoc {
                opts = opts.with_compiler(protoc.clone());
            }
        }
        if !explicit.plugins && !self.plugins.is_empty() {
            opts = opts.with_plugins(self.plugins.clone());
        }
        let includes = self.include.iter().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                root.join(p)
            }
        });
        let mut opts = opts.with_include_paths(includes);
        for (service, dir) in &self.naming {
            if !opts.naming_overrides().contains_key(service) {
                opts = opts.with_naming_override(service.clone(), dir.clone());
            }
        }
        opts
    }

    /// Settings describing `opts`, as written by `svcforge new`.
    pub fn from_options(opts: &Options) -> Self {
        Self {
            module: Some(opts.module()),
            protoc: Some(opts.compiler().to_path_buf()),
            include: vec![PathBuf::from("proto")],
            plugins: opts.plugins().to_vec(),
            naming: opts.naming_overrides().clone(),
        }
    }

    pub fn to_toml(&self, path: &Path) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GenError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Which options were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitFlags {
    pub module: bool,
    pub compiler: bool,
    pub plugins: bool,
}

/// Load `svcforge.toml` from a project root.
///
/// Returns `Ok(None)` if the file does not exist (not an error) and
/// `Err(GenError::Config)` if it exists but fails to parse.
pub fn load_project_settings(root: &Path) -> Result<Option<ProjectSettings>> {
    let path = root.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).with_path("read settings", &path)?;
    let settings: ProjectSettings = toml::from_str(&contents).map_err(|e| GenError::Config {
        path: path.clone(),
        message: e.to_string(),
    })?;
    if let Some((service, dir)) = settings.naming.iter().find(|(_, dir)| !is_module_name(dir)) {
        return Err(GenError::Config {
            path,
            message: format!(
                "[naming] {service} = \"{dir}\": directory must be a lowercase snake_case identifier"
            ),
        });
    }
    Ok(Some(settings))
}
