//! # CLI Module
//!
//! Command-line front end of the `svcforge` binary.
//!
//! ## Commands
//!
//! ### `new`
//!
//! Create a project skeleton with a manifest, an entry point carrying the
//! splice markers, a config file and `svcforge.toml`:
//!
//! ```bash
//! svcforge new --output orders
//! ```
//!
//! ### `add`
//!
//! Compile an IDL file, then scaffold every service it declares:
//!
//! ```bash
//! svcforge add --idl api/orders.proto --output orders -I third_party
//! ```
//!
//! Options:
//! - `--idl <FILE>` - IDL file (required)
//! - `--output <DIR>` - project root (default: `.`)
//! - `-I, --include <DIR>` - include directory, repeatable
//! - `--protoc <PATH>` - compiler executable (env: `SVCFORGE_PROTOC`)
//! - `--plugin <NAME>` - compiler plugin, repeatable
//! - `--name-override <Service=dir>` - directory name for a service
//! - `--force` - regenerate existing services
//! - `--ignore-exists` - keep existing services, add what is missing
//!
//! ### `update`
//!
//! Same flags as `add`. Adds handler stubs for new methods and never touches
//! existing implementation or handler files.
//!
//! ### `inspect`
//!
//! ```bash
//! svcforge inspect --idl api/orders.proto --json
//! ```
//!
//! Flags given on the command line win over `svcforge.toml`; include
//! directories from both are searched, command-line ones first.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{generation_options, run_cli, Cli, Commands, GenerateArgs};
