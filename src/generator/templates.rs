use askama::Template;

use super::injector::StubMarker;
use crate::error::{GenError, Result};
use crate::idl::{RpcMethod, ServiceDescriptor};
use crate::naming::{snake_ident, to_upper_camel_case};

/// Identifiers a service contributes to generated code.
#[derive(Debug, Clone)]
pub struct ServiceView {
    /// Service name as declared in the IDL
    pub proto_name: String,
    /// Fully-qualified service name, e.g. `health.HealthCheckService`
    pub full_name: String,
    /// Module of the service directory under `src/services`
    pub module: String,
    /// Hand-written type, e.g. `HealthCheckServiceImpl`
    pub impl_type: String,
    /// tonic server module, e.g. `health_check_service_server`
    pub server_module: String,
    /// tonic server type, e.g. `HealthCheckServiceServer`
    pub server_type: String,
    /// Full path of the tonic service trait
    pub trait_path: String,
    /// Module path of the package bindings, e.g. `crate::pb::health`
    pub bindings_module: String,
    /// File name of the IDL the service was read from
    pub idl_file: String,
}

impl ServiceView {
    /// `module` is the Rust module name of the service directory.
    pub fn new(service: &ServiceDescriptor, module: impl Into<String>) -> Self {
        let type_name = to_upper_camel_case(&service.name);
        let server_module = format!("{}_server", snake_ident(&service.name));
        let bindings_module = service.bindings_module();
        Self {
            proto_name: service.name.clone(),
            full_name: service.full_name(),
            module: module.into(),
            impl_type: format!("{type_name}Impl"),
            server_type: format!("{type_name}Server"),
            trait_path: format!("{bindings_module}::{server_module}::{type_name}"),
            server_module,
            bindings_module,
            idl_file: service
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Identifiers and signature pieces for one RPC method.
#[derive(Debug, Clone)]
pub struct MethodView {
    pub proto_name: String,
    /// Handler module (file stem) and function name
    pub module: String,
    pub fn_name: String,
    /// Rust type of the response message
    pub response_type: String,
    /// Type parameter of `tonic::Request<_>`
    pub request_param: String,
    /// Type parameter of `tonic::Response<_>` in the trait implementation
    pub response_return: String,
    /// Type parameter of `tonic::Response<_>` in the handler file
    pub handler_return: String,
    pub server_streaming: bool,
    /// Associated stream type for server-streaming methods
    pub stream_type: String,
    /// IDL signature, e.g. `rpc HealthCheck(HealthCheckRequest) returns (HealthCheckResponse)`
    pub signature: String,
}

impl MethodView {
    pub fn new(method: &RpcMethod) -> Self {
        let ident = snake_ident(&method.name);
        let request_type = method.request.rust_type();
        let response_type = method.response.rust_type();
        let stream_type = format!("{}Stream", method.name);
        let request_param = if method.client_streaming {
            format!("::tonic::Streaming<{request_type}>")
        } else {
            request_type
        };
        let (response_return, handler_return) = if method.server_streaming {
            (stream_type.clone(), format!("super::{stream_type}"))
        } else {
            (response_type.clone(), response_type.clone())
        };
        let stream_kw = |on: bool| if on { "stream " } else { "" };
        Self {
            proto_name: method.name.clone(),
            module: ident.clone(),
            fn_name: ident,
            signature: format!(
                "rpc {}({}{}) returns ({}{})",
                method.name,
                stream_kw(method.client_streaming),
                method.request.full_name(),
                stream_kw(method.server_streaming),
                method.response.full_name(),
            ),
            response_type,
            request_param,
            response_return,
            handler_return,
            server_streaming: method.server_streaming,
            stream_type,
        }
    }
}

/// Manifest of a generated project.
#[derive(Template)]
#[template(path = "Cargo.toml.txt", escape = "none")]
pub struct CargoTomlTemplate {
    pub name: String,
}

/// Entry point with the three splice markers.
#[derive(Template)]
#[template(path = "main.rs.txt", escape = "none")]
pub struct MainRsTemplate {
    pub name: String,
    pub config_path: String,
    pub type_imports_marker: &'static str,
    pub package_imports_marker: &'static str,
    pub registrations_marker: &'static str,
}

impl MainRsTemplate {
    pub fn new(name: impl Into<String>, config_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_path: config_path.into(),
            type_imports_marker: StubMarker::TypeImports.token(),
            package_imports_marker: StubMarker::PackageImports.token(),
            registrations_marker: StubMarker::Registrations.token(),
        }
    }
}

#[derive(Template)]
#[template(path = "config.yaml", escape = "none")]
pub struct ConfigYamlTemplate {
    pub name: String,
}

#[derive(Template)]
#[template(path = "svcforge.toml.txt", escape = "none")]
pub struct SettingsTemplate {
    /// Serialized `ProjectSettings`
    pub body: String,
}

/// `src/services/mod.rs`
#[derive(Template)]
#[template(path = "services_mod.rs.txt", escape = "none")]
pub struct ServicesIndexTemplate {
    pub modules: Vec<String>,
}

/// `src/pb/mod.rs`; `lines` are pre-indented.
#[derive(Template)]
#[template(path = "pb_mod.rs.txt", escape = "none")]
pub struct BindingsIndexTemplate {
    pub lines: Vec<String>,
}

/// Per-service wiring file.
#[derive(Template)]
#[template(path = "service_mod.rs.txt", escape = "none")]
pub struct WiringTemplate {
    pub service: ServiceView,
    pub methods: Vec<MethodView>,
}

/// Implementation stub, created once.
#[derive(Template)]
#[template(path = "service.rs.txt", escape = "none")]
pub struct ServiceImplTemplate {
    pub service: ServiceView,
}

/// Handler stub for one method, created once.
#[derive(Template)]
#[template(path = "method.rs.txt", escape = "none")]
pub struct MethodTemplate {
    pub service: ServiceView,
    pub method: MethodView,
}

/// Render `template`, ending the output with exactly one newline.
pub fn render<T: Template>(name: &'static str, template: &T) -> Result<String> {
    let mut rendered = template.render().map_err(|source| GenError::Template {
        template: name,
        source,
    })?;
    let trimmed_len = rendered.trim_end_matches('\n').len();
    rendered.truncate(trimmed_len);
    rendered.push('\n');
    Ok(rendered)
}
