//! # svcforge
//!
//! **svcforge** scaffolds gRPC service projects from protobuf IDL and keeps
//! them in step with the IDL as it grows, without ever overwriting code a
//! developer has written.
//!
//! ## Overview
//!
//! A run takes an IDL file and a project root, compiles language bindings
//! with an external compiler, parses the IDL for its services, and then:
//!
//! - creates an implementation file per service and a handler file per RPC
//!   method, but only where none exists yet;
//! - rewrites the derived wiring and index files that tie those files to the
//!   generated bindings;
//! - splices imports and registrations into the entry point above marker
//!   comments, once.
//!
//! Re-running with an unchanged IDL changes nothing. Adding a method to the
//! IDL and running `update` creates exactly one new handler stub and refreshes
//! the service's wiring file.
//!
//! ## Architecture
//!
//! - **[`options`]** - immutable settings passed explicitly to every component
//! - **[`layout`]** - pure path derivation for a project root
//! - **[`idl`]** - compiler adapter and embedded IDL parser
//! - **[`generator`]** - service synthesizer, stub injector and the pipeline
//! - **[`project_config`]** - `svcforge.toml` settings
//! - **[`cli`]** - the `svcforge` command line
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ```text
//! svcforge add --idl health.proto
//!   │
//!   ├─ layout    ── check the project exists
//!   ├─ idl       ── protoc → src/pb/*.rs, then parse → Vec<ServiceDescriptor>
//!   ├─ generator ── proto/<svc>/health.proto, src/services/<svc>/*.rs
//!   ├─ generator ── src/services/mod.rs, src/pb/mod.rs
//!   └─ generator ── splice lines into src/main.rs
//! ```
//!
//! ## Errors
//!
//! Every fallible operation returns [`Result`] over [`GenError`]. Failures
//! are fail-fast and not rolled back: files written before the failing step
//! stay on disk.
//!
//! ## Concurrency
//!
//! All work is synchronous on one thread. Concurrent runs against the same
//! project are unsupported and may interleave writes.

pub mod cli;
pub mod error;
pub mod generator;
pub mod idl;
pub mod layout;
pub mod logging;
pub mod naming;
pub mod options;
pub mod project_config;

pub use error::{GenError, Result, SourceLocation};
pub use generator::{init_project, inspect, synthesize_from_idl, GenerationReport};
pub use idl::{RpcMethod, ServiceDescriptor, TypeRef};
pub use layout::ProjectLayout;
pub use options::{Mode, Options};
