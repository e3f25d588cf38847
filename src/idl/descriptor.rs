use serde::Serialize;
use std::path::PathBuf;

use crate::naming::{rust_ident, to_snake_case, to_upper_camel_case};

/// Package of the protobuf well-known types.
pub const WELL_KNOWN_PACKAGE: &str = "google.protobuf";

/// Well-known types that are always resolvable, even when their IDL files
/// are not on any include path.
pub const WELL_KNOWN_TYPES: &[&str] = &[
    "Any",
    "BoolValue",
    "BytesValue",
    "DoubleValue",
    "Duration",
    "Empty",
    "FieldMask",
    "FloatValue",
    "Int32Value",
    "Int64Value",
    "ListValue",
    "StringValue",
    "Struct",
    "Timestamp",
    "UInt32Value",
    "UInt64Value",
    "Value",
];

/// A resolved reference to a message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    /// Proto package, e.g. `health.v1` (empty when the file has none)
    pub package: String,
    /// Message name, outermost first, e.g. `["Outer", "Inner"]`
    pub path: Vec<String>,
}

impl TypeRef {
    pub fn new(package: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            package: package.into(),
            path,
        }
    }

    /// Fully-qualified proto name without the leading dot, e.g. `health.v1.HealthCheckRequest`.
    pub fn full_name(&self) -> String {
        let name = self.path.join(".");
        if self.package.is_empty() {
            name
        } else {
            format!("{}.{}", self.package, name)
        }
    }

    /// Innermost message name.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_well_known(&self) -> bool {
        self.package == WELL_KNOWN_PACKAGE
    }

    /// Rust type generated for this message by prost, as seen from the
    /// generated project's crate root (bindings live under `crate::pb`).
    pub fn rust_type(&self) -> String {
        if self.is_well_known() && self.path.len() == 1 {
            let mapped = match self.name() {
                "Empty" => "()",
                "BoolValue" => "bool",
                "BytesValue" => "::prost::alloc::vec::Vec<u8>",
                "DoubleValue" => "f64",
                "FloatValue" => "f32",
                "Int32Value" => "i32",
                "Int64Value" => "i64",
                "StringValue" => "::prost::alloc::string::String",
                "UInt32Value" => "u32",
                "UInt64Value" => "u64",
                other => return format!("::prost_types::{}", to_upper_camel_case(other)),
            };
            return mapped.to_string();
        }
        let mut segments = vec!["crate".to_string(), "pb".to_string()];
        segments.extend(package_module_path(&self.package));
        if let Some((last, outer)) = self.path.split_last() {
            segments.extend(outer.iter().map(|o| rust_ident(&to_snake_case(o))));
            segments.push(to_upper_camel_case(last));
        }
        segments.join("::")
    }
}

/// Module path segments for a proto package, e.g. `health.v1` → `["health", "v1"]`.
pub fn package_module_path(package: &str) -> Vec<String> {
    package
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|s| rust_ident(&to_snake_case(s)))
        .collect()
}

/// One RPC method of a service, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcMethod {
    /// Method name as declared, e.g. `HealthCheck`
    pub name: String,
    pub request: TypeRef,
    pub response: TypeRef,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

impl RpcMethod {
    pub fn request_type_name(&self) -> String {
        self.request.full_name()
    }

    pub fn response_type_name(&self) -> String {
        self.response.full_name()
    }
}

/// A service declared in an IDL file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    /// Service name as declared, e.g. `HealthCheckService`
    pub name: String,
    /// Proto package of the declaring file
    pub package: String,
    /// File that declares the service
    pub file: PathBuf,
    pub methods: Vec<RpcMethod>,
}

impl ServiceDescriptor {
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Module path of the package bindings, e.g. `crate::pb::health::v1`.
    pub fn bindings_module(&self) -> String {
        let mut segments = vec!["crate".to_string(), "pb".to_string()];
        segments.extend(package_module_path(&self.package));
        segments.join("::")
    }
}
