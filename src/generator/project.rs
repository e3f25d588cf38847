//! Project-level pipeline: scaffolding a new project and synthesizing
//! services from an IDL file into an existing one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::injector::{insert_lines, StubMarker};
use super::synth::{write_file, ServiceSynthesizer, SynthesisReport, WritePolicy};
use super::templates::{
    render, BindingsIndexTemplate, CargoTomlTemplate, ConfigYamlTemplate, MainRsTemplate,
    ServiceView, ServicesIndexTemplate, SettingsTemplate,
};
use crate::error::{GenError, IoResultExt, Result};
use crate::idl::{self, ServiceDescriptor};
use crate::layout::{ProjectLayout, CONFIG_DIR, CONFIG_FILE, MOD_FILE};
use crate::naming::rust_ident;
use crate::options::Options;
use crate::project_config::ProjectSettings;

/// Outcome of one generator command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Fully-qualified names of the services processed
    pub services: Vec<String>,
    pub created: Vec<PathBuf>,
    pub overwritten: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Lines spliced into the entry-point file
    pub spliced: Vec<String>,
}

impl GenerationReport {
    fn absorb(&mut self, files: SynthesisReport) {
        self.created.extend(files.created);
        self.overwritten.extend(files.overwritten);
        self.skipped.extend(files.skipped);
        self.unchanged.extend(files.unchanged);
    }
}

/// Scaffold a new project at `opts.output()`.
///
/// Creates the directory skeleton and renders the manifest, entry point,
/// configuration, settings file and empty module indexes.
pub fn init_project(opts: &Options) -> Result<GenerationReport> {
    let layout = ProjectLayout::new(opts);
    layout.save()?;

    let name = opts.module();
    let force = opts.override_existing();
    let mut files = SynthesisReport::default();

    let manifest = render("Cargo.toml", &CargoTomlTemplate { name: name.clone() })?;
    write_file(&layout.manifest_file(), &manifest, WritePolicy::CreateOnly, force, &mut files)?;

    let config_path = format!("{CONFIG_DIR}/{CONFIG_FILE}");
    let main_rs = render("main.rs", &MainRsTemplate::new(name.clone(), config_path))?;
    write_file(&layout.entry_file(), &main_rs, WritePolicy::CreateOnly, force, &mut files)?;

    let config = render("config.yaml", &ConfigYamlTemplate { name })?;
    write_file(&layout.config_file(), &config, WritePolicy::CreateOnly, force, &mut files)?;

    let settings_path = layout.settings_file();
    let body = ProjectSettings::from_options(opts).to_toml(&settings_path)?;
    let settings = render("svcforge.toml", &SettingsTemplate { body })?;
    write_file(&settings_path, &settings, WritePolicy::CreateOnly, force, &mut files)?;

    files.merge(regenerate_indexes(&layout)?);

    info!(root = %layout.root().display(), files = files.created.len(), "initialized project");
    let mut report = GenerationReport::default();
    report.absorb(files);
    Ok(report)
}

/// Fail unless `layout` points at an initialized project.
fn ensure_project(layout: &ProjectLayout) -> Result<()> {
    for required in [layout.entry_file(), layout.services_root()] {
        if !required.exists() {
            return Err(GenError::ProjectNotFound {
                root: layout.root().to_path_buf(),
                missing: required,
            });
        }
    }
    Ok(())
}

/// Copy `idl_file` into the service's IDL directory, unless it already is
/// that file.
fn copy_idl(
    layout: &ProjectLayout,
    service: &ServiceDescriptor,
    idl_file: &Path,
    report: &mut SynthesisReport,
) -> Result<()> {
    let dest = layout.service_idl_file(&service.name, idl_file);
    let src_canonical = idl_file.canonicalize().with_path("resolve", idl_file)?;
    if dest.canonicalize().is_ok_and(|d| d == src_canonical) {
        debug!(path = %dest.display(), "IDL already in place");
        return Ok(());
    }
    let contents = fs::read_to_string(idl_file).with_path("read IDL file", idl_file)?;
    write_file(&dest, &contents, WritePolicy::Derived, false, report)
}

/// Entry-point lines that register `service`, keyed by marker.
pub fn stub_lines(view: &ServiceView) -> [(StubMarker, String); 3] {
    let package_path = view
        .bindings_module
        .strip_prefix("crate::")
        .unwrap_or(&view.bindings_module);
    [
        (
            StubMarker::PackageImports,
            format!(
                "use {package_path}::{}::{};",
                view.server_module, view.server_type
            ),
        ),
        (
            StubMarker::TypeImports,
            format!("use services::{}::{};", view.module, view.impl_type),
        ),
        (
            StubMarker::Registrations,
            format!(
                ".add_service({}::new({}::default()))",
                view.server_type, view.impl_type
            ),
        ),
    ]
}

/// Generate or update the services declared in `idl_file`.
///
/// Steps, each of which aborts the run on failure: check the project
/// exists and the naming overrides are usable, compile bindings, parse the
/// IDL, copy it into each service's IDL directory, synthesize service files,
/// regenerate the module indexes and splice registrations into the entry
/// point. Nothing is rolled back.
pub fn synthesize_from_idl(opts: &Options, idl_file: &Path) -> Result<GenerationReport> {
    let layout = ProjectLayout::new(opts);
    ensure_project(&layout)?;
    layout.validate_naming_overrides()?;

    let bindings = layout.bindings_dir();
    fs::create_dir_all(&bindings).with_path("create directory", &bindings)?;
    idl::compile(opts, idl_file)?;

    let services = idl::parse(idl_file, opts.include_paths())?;
    if services.is_empty() {
        return Err(GenError::NoServices {
            idl: idl_file.to_path_buf(),
        });
    }
    info!(
        idl = %idl_file.display(),
        services = services.len(),
        mode = ?opts.mode(),
        "synthesizing services"
    );

    let synth = ServiceSynthesizer::new(opts);
    synth.preflight(&services)?;

    let mut files = SynthesisReport::default();
    for service in &services {
        layout.ensure_service_dirs(&service.name)?;
        copy_idl(&layout, service, idl_file, &mut files)?;
    }
    for service in &services {
        files.merge(synth.synthesize_service(service)?);
    }
    files.merge(regenerate_indexes(&layout)?);

    let lines: Vec<(StubMarker, String)> = services
        .iter()
        .flat_map(|s| stub_lines(&synth.service_view(s)))
        .collect();
    let spliced = insert_lines(&layout.entry_file(), &lines)?;

    let mut report = GenerationReport {
        services: services.iter().map(ServiceDescriptor::full_name).collect(),
        spliced,
        ..GenerationReport::default()
    };
    report.absorb(files);
    Ok(report)
}

/// Parse `idl_file` without touching any project.
pub fn inspect(idl_file: &Path, include_paths: &[PathBuf]) -> Result<Vec<ServiceDescriptor>> {
    idl::parse(idl_file, include_paths)
}

/// Rewrite `src/services/mod.rs` and `src/pb/mod.rs` from the directory
/// contents.
pub fn regenerate_indexes(layout: &ProjectLayout) -> Result<SynthesisReport> {
    let mut report = SynthesisReport::default();

    let modules = service_modules(&layout.services_root())?;
    let services_index = render("services mod.rs", &ServicesIndexTemplate { modules })?;
    write_file(
        &layout.services_index(),
        &services_index,
        WritePolicy::Derived,
        false,
        &mut report,
    )?;

    let lines = bindings_index_lines(&layout.bindings_dir())?;
    let bindings_index = render("pb mod.rs", &BindingsIndexTemplate { lines })?;
    write_file(
        &layout.bindings_index(),
        &bindings_index,
        WritePolicy::Derived,
        false,
        &mut report,
    )?;
    Ok(report)
}

/// Subdirectories of the services root that hold a wiring file, sorted.
fn service_modules(services_root: &Path) -> Result<Vec<String>> {
    let mut modules = Vec::new();
    for entry in fs::read_dir(services_root).with_path("read directory", services_root)? {
        let entry = entry.with_path("read directory", services_root)?;
        let path = entry.path();
        if path.is_dir() && path.join(MOD_FILE).is_file() {
            modules.push(rust_ident(&entry.file_name().to_string_lossy()));
        }
    }
    modules.sort();
    Ok(modules)
}

#[derive(Debug, Default)]
struct ModuleNode {
    includes: Vec<String>,
    children: BTreeMap<String, ModuleNode>,
}

impl ModuleNode {
    fn render(&self, depth: usize, out: &mut Vec<String>) {
        let indent = "    ".repeat(depth);
        for file in &self.includes {
            out.push(format!("{indent}include!(\"{file}\");"));
        }
        for (name, child) in &self.children {
            out.push(format!("{indent}pub mod {name} {{"));
            child.render(depth + 1, out);
            out.push(format!("{indent}}}"));
        }
    }
}

/// `pub mod` tree including every compiler output file, nested by package.
///
/// prost writes one `<package>.rs` per package and tonic a matching
/// `<package>.tonic.rs`; files without a package are named `_.rs`.
fn bindings_index_lines(bindings_dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(bindings_dir).with_path("read directory", bindings_dir)? {
        let entry = entry.with_path("read directory", bindings_dir)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_file() && name.ends_with(".rs") && name != MOD_FILE {
            files.push(name);
        }
    }
    files.sort();

    let mut root = ModuleNode::default();
    for file in files {
        let package = file
            .strip_suffix(".tonic.rs")
            .or_else(|| file.strip_suffix(".rs"))
            .unwrap_or(&file)
            .to_string();
        let mut node = &mut root;
        if package != "_" {
            for segment in idl::descriptor::package_module_path(&package) {
                node = node.children.entry(segment).or_default();
            }
        }
        node.includes.push(file);
    }

    let mut lines = Vec::new();
    root.render(0, &mut lines);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_index_nests_packages() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["health.v1.rs", "health.v1.tonic.rs", "common.rs", "_.rs", "mod.rs"] {
            fs::write(dir.path().join(f), "").unwrap();
        }
        let lines = bindings_index_lines(dir.path()).unwrap();
        assert_eq!(
            lines,
            vec![
                "include!(\"_.rs\");",
                "pub mod common {",
                "    include!(\"common.rs\");",
                "}",
                "pub mod health {",
                "    pub mod v1 {",
                "        include!(\"health.v1.rs\");",
                "        include!(\"health.v1.tonic.rs\");",
                "    }",
                "}",
            ]
        );
    }

    #[test]
    fn test_service_modules_require_wiring_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b_service")).unwrap();
        fs::write(dir.path().join("b_service").join(MOD_FILE), "").unwrap();
        fs::create_dir_all(dir.path().join("a_service")).unwrap();
        fs::write(dir.path().join("a_service").join(MOD_FILE), "").unwrap();
        fs::create_dir_all(dir.path().join("scratch")).unwrap();
        assert_eq!(
            service_modules(dir.path()).unwrap(),
            vec!["a_service".to_string(), "b_service".to_string()]
        );
    }
}
