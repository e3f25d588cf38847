//! Transitive import loading and type resolution.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::descriptor::{
    RpcMethod, ServiceDescriptor, TypeRef, WELL_KNOWN_PACKAGE, WELL_KNOWN_TYPES,
};
use super::parser::{parse_source, IdlFile, RawTypeName};
use crate::error::{GenError, IoResultExt, Result};
use crate::naming::{is_convertible, to_snake_case};

/// Method file stems taken by the implementation and wiring files.
const RESERVED_METHOD_FILES: &[&str] = &["service", "mod"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolKind {
    Message,
    Enum,
}

/// Every message and enum declared by the loaded files, keyed by full name.
#[derive(Debug, Default)]
struct SymbolTable {
    symbols: HashMap<String, (SymbolKind, TypeRef)>,
}

impl SymbolTable {
    fn with_well_known_types() -> Self {
        let mut table = Self::default();
        for name in WELL_KNOWN_TYPES {
            table.insert(
                SymbolKind::Message,
                TypeRef::new(WELL_KNOWN_PACKAGE, vec![(*name).to_string()]),
            );
        }
        table
    }

    fn insert(&mut self, kind: SymbolKind, ty: TypeRef) {
        self.symbols.insert(ty.full_name(), (kind, ty));
    }

    fn add_file(&mut self, file: &IdlFile) {
        let package = file.package.clone().unwrap_or_default();
        for path in &file.messages {
            self.insert(SymbolKind::Message, TypeRef::new(package.clone(), path.clone()));
        }
        for path in &file.enums {
            self.insert(SymbolKind::Enum, TypeRef::new(package.clone(), path.clone()));
        }
    }

    /// Resolve `name` as seen from `package`: fully-qualified names are
    /// looked up as-is, relative names from the innermost package scope
    /// outwards.
    fn resolve(&self, package: &str, name: &str) -> Option<&(SymbolKind, TypeRef)> {
        if let Some(absolute) = name.strip_prefix('.') {
            return self.symbols.get(absolute);
        }
        let mut scope: Vec<&str> = package.split('.').filter(|s| !s.is_empty()).collect();
        loop {
            let candidate = if scope.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", scope.join("."), name)
            };
            if let Some(found) = self.symbols.get(&candidate) {
                return Some(found);
            }
            if scope.pop().is_none() {
                return None;
            }
        }
    }
}

/// Loads an IDL file and everything it imports, each file once.
pub struct IdlLoader<'a> {
    include_paths: &'a [PathBuf],
    files: Vec<IdlFile>,
    loaded: HashSet<PathBuf>,
}

impl<'a> IdlLoader<'a> {
    pub fn new(include_paths: &'a [PathBuf]) -> Self {
        Self {
            include_paths,
            files: Vec::new(),
            loaded: HashSet::new(),
        }
    }

    /// Find an imported file: include paths in order, first match wins,
    /// then the importing file's directory.
    pub fn resolve_import(&self, import: &str, importing_dir: Option<&Path>) -> Option<PathBuf> {
        self.include_paths
            .iter()
            .map(PathBuf::as_path)
            .chain(importing_dir)
            .map(|dir| dir.join(import))
            .find(|candidate| candidate.is_file())
    }

    /// Load `path` and its imports; imported files are pushed before the
    /// files that import them, so the file passed first ends up last.
    fn load(&mut self, path: &Path) -> Result<()> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.loaded.insert(key) {
            return Ok(());
        }
        let source = fs::read_to_string(path).with_path("read IDL file", path)?;
        let file = parse_source(path, &source)?;
        debug!(file = %path.display(), imports = file.imports.len(), "parsed IDL file");
        let importing_dir = path.parent().map(Path::to_path_buf);
        for import in &file.imports {
            match self.resolve_import(&import.path, importing_dir.as_deref()) {
                Some(found) => {
                    self.load(&found)?;
                }
                None if import.path.starts_with("google/protobuf/") => {
                    debug!(import = %import.path, "using built-in well-known types");
                }
                None => {
                    let searched = self
                        .include_paths
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(GenError::parse(
                        file.location(import.line, import.column),
                        format!("import \"{}\"", import.path),
                        format!("file not found (searched: [{searched}])"),
                    ));
                }
            }
        }
        self.files.push(file);
        Ok(())
    }
}

/// Parse `idl_file` and return the services it declares, in declaration
/// order, with request/response types resolved across its imports.
pub fn load_services(idl_file: &Path, include_paths: &[PathBuf]) -> Result<Vec<ServiceDescriptor>> {
    let mut loader = IdlLoader::new(include_paths);
    loader.load(idl_file)?;
    let mut table = SymbolTable::with_well_known_types();
    for file in &loader.files {
        table.add_file(file);
    }
    let Some(file) = loader.files.last() else {
        return Ok(Vec::new());
    };

    let mut services = Vec::with_capacity(file.services.len());
    let mut service_dirs: HashMap<String, &str> = HashMap::new();
    for raw in &file.services {
        let construct = format!("service {}", raw.name);
        let Some(package) = file.package.as_deref() else {
            return Err(GenError::parse(
                file.location(raw.line, raw.column),
                construct,
                "files that declare services must declare a `package`",
            ));
        };
        if !is_convertible(&raw.name) {
            return Err(GenError::parse(
                file.location(raw.line, raw.column),
                construct,
                "service name has no usable identifier characters",
            ));
        }
        if let Some(previous) = service_dirs.insert(to_snake_case(&raw.name), &raw.name) {
            return Err(GenError::parse(
                file.location(raw.line, raw.column),
                construct,
                format!("service name collides with `{previous}`"),
            ));
        }

        let mut methods = Vec::with_capacity(raw.methods.len());
        let mut method_files: HashMap<String, &str> = HashMap::new();
        for m in &raw.methods {
            let construct = format!("rpc {}.{}", raw.name, m.name);
            if !is_convertible(&m.name) {
                return Err(GenError::parse(
                    file.location(m.line, m.column),
                    construct,
                    "method name has no usable identifier characters",
                ));
            }
            let file_stem = to_snake_case(&m.name);
            if RESERVED_METHOD_FILES.contains(&file_stem.as_str()) {
                return Err(GenError::parse(
                    file.location(m.line, m.column),
                    construct,
                    format!("method file `{file_stem}.rs` would clash with a generated file"),
                ));
            }
            if let Some(previous) = method_files.insert(file_stem, &m.name) {
                return Err(GenError::parse(
                    file.location(m.line, m.column),
                    construct,
                    format!("method name collides with `{previous}`"),
                ));
            }
            let resolve = |raw_ty: &RawTypeName| -> Result<TypeRef> {
                match table.resolve(package, &raw_ty.name) {
                    Some((SymbolKind::Message, ty)) => Ok(ty.clone()),
                    Some((SymbolKind::Enum, ty)) => Err(GenError::parse(
                        file.location(raw_ty.line, raw_ty.column),
                        construct.clone(),
                        format!("`{}` is an enum; RPC types must be messages", ty.full_name()),
                    )),
                    None => Err(GenError::parse(
                        file.location(raw_ty.line, raw_ty.column),
                        construct.clone(),
                        format!("unknown type `{}`", raw_ty.name),
                    )),
                }
            };
            methods.push(RpcMethod {
                name: m.name.clone(),
                request: resolve(&m.input)?,
                response: resolve(&m.output)?,
                client_streaming: m.client_streaming,
                server_streaming: m.server_streaming,
            });
        }
        services.push(ServiceDescriptor {
            name: raw.name.clone(),
            package: package.to_string(),
            file: file.path.clone(),
            methods,
        });
    }
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_resolution_scopes() {
        let mut table = SymbolTable::default();
        table.insert(SymbolKind::Message, TypeRef::new("a.b", vec!["Msg".into()]));
        table.insert(SymbolKind::Message, TypeRef::new("a", vec!["Msg".into()]));
        table.insert(SymbolKind::Message, TypeRef::new("a", vec!["Outer".into(), "Inner".into()]));

        let found = |pkg: &str, name: &str| table.resolve(pkg, name).map(|(_, t)| t.full_name());
        assert_eq!(found("a.b", "Msg").as_deref(), Some("a.b.Msg"));
        assert_eq!(found("a.c", "Msg").as_deref(), Some("a.Msg"));
        assert_eq!(found("a.b", ".a.Msg").as_deref(), Some("a.Msg"));
        assert_eq!(found("a.b", "Outer.Inner").as_deref(), Some("a.Outer.Inner"));
        assert_eq!(found("x", "a.b.Msg").as_deref(), Some("a.b.Msg"));
        assert_eq!(found("a.b", "Missing"), None);
        assert_eq!(found("a.b", ".b.Msg"), None);
    }

    #[test]
    fn test_import_first_include_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("common.proto"), "package one;").unwrap();
        fs::write(second.join("common.proto"), "package two;").unwrap();

        let includes = vec![first.clone(), second];
        let loader = IdlLoader::new(&includes);
        assert_eq!(
            loader.resolve_import("common.proto", None),
            Some(first.join("common.proto"))
        );
    }

    #[test]
    fn test_method_names_that_cannot_become_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for (rpc, message) in [("_", "no usable identifier"), ("Service", "would clash")] {
            let path = dir.path().join("m.proto");
            fs::write(
                &path,
                format!("package m;\nmessage M {{}}\nservice S {{ rpc {rpc}(M) returns (M); }}\n"),
            )
            .unwrap();
            let err = load_services(&path, &[]).unwrap_err();
            assert!(err.to_string().contains(message), "{err}");
        }
    }
}
