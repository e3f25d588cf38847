//! # Service Synthesizer
//!
//! Turns [`ServiceDescriptor`]s into files under the services root. Two
//! write policies apply:
//!
//! - [`WritePolicy::CreateOnly`] for hand-owned files (implementation type
//!   and per-method handlers): written when absent, otherwise left alone.
//! - [`WritePolicy::Derived`] for the wiring file: rendered from the
//!   descriptor on every run and written only when its bytes change.
//!
//! In [`Mode::Add`] a preflight pass checks every service before anything is
//! written, so a conflict on the third service leaves the first two
//! untouched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::templates::{
    render, MethodTemplate, MethodView, ServiceImplTemplate, ServiceView, WiringTemplate,
};
use crate::error::{GenError, IoResultExt, Result};
use crate::idl::ServiceDescriptor;
use crate::layout::ProjectLayout;
use crate::naming::rust_ident;
use crate::options::{Mode, Options};

/// Start of the first line of every wiring file.
const GENERATED_HEADER: &str = "// @generated by svcforge";

/// How a generated file treats an existing file at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Write only when absent (or when forced).
    CreateOnly,
    /// Always reflect the latest render; unchanged bytes are not rewritten.
    Derived,
}

/// Paths touched by a synthesis run, in the order they were visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub created: Vec<PathBuf>,
    pub overwritten: Vec<PathBuf>,
    /// Existing hand-owned files left alone
    pub skipped: Vec<PathBuf>,
    /// Derived files whose rendered bytes matched the file on disk
    pub unchanged: Vec<PathBuf>,
}

impl SynthesisReport {
    pub fn merge(&mut self, other: SynthesisReport) {
        self.created.extend(other.created);
        self.overwritten.extend(other.overwritten);
        self.skipped.extend(other.skipped);
        self.unchanged.extend(other.unchanged);
    }

    /// Files whose bytes changed.
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.created.iter().chain(&self.overwritten)
    }
}

/// Write `contents` to `path` under `policy`, recording the outcome.
///
/// `force` makes a [`WritePolicy::CreateOnly`] file behave as if it were
/// absent.
pub(crate) fn write_file(
    path: &Path,
    contents: &str,
    policy: WritePolicy,
    force: bool,
    report: &mut SynthesisReport,
) -> Result<()> {
    let exists = path.exists();
    match policy {
        WritePolicy::CreateOnly if exists && !force => {
            debug!(path = %path.display(), "keeping existing file");
            report.skipped.push(path.to_path_buf());
            return Ok(());
        }
        WritePolicy::Derived if exists => {
            let current = fs::read(path).with_path("read", path)?;
            if current == contents.as_bytes() {
                debug!(path = %path.display(), "derived file up to date");
                report.unchanged.push(path.to_path_buf());
                return Ok(());
            }
        }
        _ => {}
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path("create directory", parent)?;
    }
    fs::write(path, contents).with_path("write", path)?;
    if exists {
        info!(path = %path.display(), "overwrote file");
        report.overwritten.push(path.to_path_buf());
    } else {
        info!(path = %path.display(), "created file");
        report.created.push(path.to_path_buf());
    }
    Ok(())
}

/// Generates per-service directories for one project.
pub struct ServiceSynthesizer<'a> {
    opts: &'a Options,
    layout: ProjectLayout,
}

impl<'a> ServiceSynthesizer<'a> {
    pub fn new(opts: &'a Options) -> Self {
        Self {
            opts,
            layout: ProjectLayout::new(opts),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Rust module name of a service's directory.
    pub fn service_module(&self, service: &ServiceDescriptor) -> String {
        rust_ident(&self.layout.service_dir_name(&service.name))
    }

    pub fn service_view(&self, service: &ServiceDescriptor) -> ServiceView {
        ServiceView::new(service, self.service_module(service))
    }

    /// Checks that run before any write.
    ///
    /// In every mode, each service must map to a valid directory of its own:
    /// naming overrides must be module names, two services may not share a
    /// directory, and a directory already wired for another service is not
    /// taken over. In [`Mode::Add`] an existing implementation file is a
    /// conflict unless override or ignore-exists is set.
    pub fn preflight(&self, services: &[ServiceDescriptor]) -> Result<()> {
        self.layout.validate_naming_overrides()?;
        let mut dirs: HashMap<String, &str> = HashMap::new();
        for service in services {
            let dir = self.layout.service_dir_name(&service.name);
            if let Some(previous) = dirs.insert(dir.clone(), &service.name) {
                return Err(GenError::InvalidServiceDir {
                    service: service.name.clone(),
                    dir,
                    reason: format!("also used by service `{previous}`"),
                });
            }
            self.check_wiring_owner(service, &dir)?;
        }

        if self.opts.mode() != Mode::Add {
            return Ok(());
        }
        for service in services {
            let path = self.layout.implementation_file(&service.name);
            if !path.exists() {
                continue;
            }
            if self.opts.override_existing() {
                warn!(
                    service = %service.name,
                    path = %path.display(),
                    "regenerating existing service"
                );
            } else if self.opts.ignore_exists() {
                warn!(
                    service = %service.name,
                    path = %path.display(),
                    "service exists, continuing as update"
                );
            } else {
                return Err(GenError::AlreadyExists { path });
            }
        }
        Ok(())
    }

    /// An existing wiring file names the service it was generated for in its
    /// first line.
    fn check_wiring_owner(&self, service: &ServiceDescriptor, dir: &str) -> Result<()> {
        let path = self.layout.wiring_file(&service.name);
        if !path.is_file() {
            return Ok(());
        }
        let contents = fs::read_to_string(&path).with_path("read", &path)?;
        let header = contents.lines().next().unwrap_or_default();
        if !header.starts_with(GENERATED_HEADER) {
            return Ok(());
        }
        let owner = format!("for `{}`", service.full_name());
        if header.contains(&owner) {
            return Ok(());
        }
        Err(GenError::InvalidServiceDir {
            service: service.name.clone(),
            dir: dir.to_string(),
            reason: format!("{} was generated for another service", path.display()),
        })
    }

    /// Synthesize every service, in order.
    pub fn synthesize(&self, services: &[ServiceDescriptor]) -> Result<SynthesisReport> {
        self.preflight(services)?;
        let mut report = SynthesisReport::default();
        for service in services {
            report.merge(self.synthesize_service(service)?);
        }
        Ok(report)
    }

    /// Create the service's hand-owned files if absent and rewrite its
    /// wiring file.
    pub fn synthesize_service(&self, service: &ServiceDescriptor) -> Result<SynthesisReport> {
        let force = self.opts.mode() == Mode::Add && self.opts.override_existing();
        let mut report = SynthesisReport::default();
        self.layout.ensure_service_dirs(&service.name)?;

        let view = self.service_view(service);
        let methods: Vec<MethodView> = service.methods.iter().map(MethodView::new).collect();

        let impl_file = self.layout.implementation_file(&service.name);
        if impl_file.exists() && !force {
            debug!(service = %service.name, "implementation exists, adding missing methods only");
            report.skipped.push(impl_file);
        } else {
            let rendered = render(
                "service.rs",
                &ServiceImplTemplate {
                    service: view.clone(),
                },
            )?;
            write_file(&impl_file, &rendered, WritePolicy::CreateOnly, force, &mut report)?;
        }

        for (method, method_view) in service.methods.iter().zip(&methods) {
            let path = self.layout.method_file(&service.name, &method.name);
            if path.exists() && !force {
                debug!(method = %method.name, path = %path.display(), "keeping existing handler");
                report.skipped.push(path);
                continue;
            }
            let rendered = render(
                "method.rs",
                &MethodTemplate {
                    service: view.clone(),
                    method: method_view.clone(),
                },
            )?;
            write_file(&path, &rendered, WritePolicy::CreateOnly, force, &mut report)?;
        }

        let wiring = render(
            "service mod.rs",
            &WiringTemplate {
                service: view,
                methods,
            },
        )?;
        write_file(
            &self.layout.wiring_file(&service.name),
            &wiring,
            WritePolicy::Derived,
            false,
            &mut report,
        )?;
        Ok(report)
    }
}
