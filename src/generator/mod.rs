//! # Generator Module
//!
//! Turns parsed IDL into source files inside a generated project and keeps
//! those files in step with the IDL across later runs.
//!
//! ## Architecture
//!
//! ```text
//! IDL file → compiler (bindings) → parser → synthesizer → indexes → injector
//! ```
//!
//! 1. **Compiler** - the external IDL compiler writes bindings into `src/pb`
//! 2. **Parser** - [`crate::idl::parse`] yields one descriptor per service
//! 3. **Synthesizer** - [`ServiceSynthesizer`] creates hand-owned stubs once
//!    and rewrites the derived wiring file for each service
//! 4. **Indexes** - `src/services/mod.rs` and `src/pb/mod.rs` are rebuilt
//!    from directory contents
//! 5. **Injector** - registrations and imports are spliced into
//!    `src/main.rs` above its marker comments
//!
//! ## Ownership of generated files
//!
//! | File                                  | Owner     | Policy                         |
//! |---------------------------------------|-----------|--------------------------------|
//! | `src/services/<svc>/service.rs`       | developer | created once                   |
//! | `src/services/<svc>/<method>.rs`      | developer | created once                   |
//! | `src/services/<svc>/mod.rs`           | svcforge  | rewritten when its bytes change |
//! | `src/services/mod.rs`, `src/pb/mod.rs`| svcforge  | rewritten when its bytes change |
//! | `src/main.rs`                         | developer | only marker splices            |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use svcforge::generator::{init_project, synthesize_from_idl};
//! use svcforge::options::{Mode, Options};
//!
//! # fn main() -> svcforge::Result<()> {
//! let opts = Options::default().with_output("orders");
//! init_project(&opts)?;
//! synthesize_from_idl(&opts.with_mode(Mode::Add), Path::new("orders.proto"))?;
//! # Ok(())
//! # }
//! ```
//!
//! Runs against the same project must not overlap; there is no locking.

pub mod injector;
mod project;
pub mod synth;
pub mod templates;


pub use injector::{insert, insert_lines, splice, InsertOutcome, MarkerAnomaly, Splice, StubMarker};
pub use project::{
    init_project, inspect, regenerate_indexes, stub_lines, synthesize_from_idl, GenerationReport,
};
pub use synth::{ServiceSynthesizer, SynthesisReport, WritePolicy};
