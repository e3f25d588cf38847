use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::generator::{self, GenerationReport};
use crate::idl::ServiceDescriptor;
use crate::naming::is_module_name;
use crate::options::{Mode, Options};
use crate::project_config::{load_project_settings, ExplicitFlags};

const CONCURRENCY_NOTE: &str = "Runs against the same project must not overlap: svcforge does no \
file locking, and two concurrent runs can interleave writes to the same files.";

/// Command-line interface for svcforge
///
/// Scaffolds gRPC service projects and keeps their service stubs in step
/// with protobuf IDL files.
#[derive(Parser, Debug)]
#[command(name = "svcforge", version)]
#[command(about = "Scaffold and grow gRPC services from protobuf IDL", long_about = None)]
#[command(after_help = CONCURRENCY_NOTE)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by `add` and `update`
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// IDL file declaring the services
    #[arg(long)]
    pub idl: PathBuf,

    /// Project root created by `svcforge new`
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Extra include directory for imports (repeatable, searched in order)
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,

    /// IDL compiler executable (default: protoc, or the project setting)
    #[arg(long, env = "SVCFORGE_PROTOC")]
    pub protoc: Option<PathBuf>,

    /// Compiler plugin producing bindings (repeatable; default: prost, tonic)
    #[arg(long = "plugin")]
    pub plugins: Vec<String>,

    /// Directory name for a service, as `Service=dir` (repeatable)
    #[arg(long = "name-override", value_parser = parse_name_override)]
    pub name_overrides: Vec<(String, String)>,

    /// Regenerate existing service stubs instead of failing
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Keep existing services and add only what is missing
    #[arg(long, default_value_t = false, conflicts_with = "force")]
    pub ignore_exists: bool,
}

/// Available svcforge commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project skeleton
    New {
        /// Directory to create
        #[arg(short, long)]
        output: PathBuf,

        /// Crate name of the project (default: derived from the directory name)
        #[arg(long)]
        module: Option<String>,

        /// Remove and recreate an existing project directory
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Reuse existing directories and keep existing files
        #[arg(long, default_value_t = false, conflicts_with = "force")]
        ignore_exists: bool,
    },
    /// Scaffold the services declared in an IDL file
    ///
    /// Fails if a service already has an implementation file, unless
    /// --force or --ignore-exists is given.
    Add(GenerateArgs),
    /// Add stubs for new methods of services declared in an IDL file
    ///
    /// Existing implementation and handler files are never modified.
    Update(GenerateArgs),
    /// Print the services and methods declared in an IDL file
    Inspect {
        /// IDL file to read
        #[arg(long)]
        idl: PathBuf,

        /// Extra include directory for imports (repeatable)
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Parse `Service=dir`.
fn parse_name_override(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((service, dir)) if !service.trim().is_empty() && !dir.trim().is_empty() => {
            let dir = dir.trim();
            if !is_module_name(dir) {
                return Err(format!(
                    "directory `{dir}` must be a lowercase snake_case identifier"
                ));
            }
            Ok((service.trim().to_string(), dir.to_string()))
        }
        _ => Err(format!("expected `Service=dir`, got `{s}`")),
    }
}

/// Options for `add`/`update`: command-line flags layered over the
/// project's `svcforge.toml`.
pub fn generation_options(args: &GenerateArgs, mode: Mode) -> Result<Options> {
    let mut opts = Options::default()
        .with_output(&args.output)
        .with_mode(mode)
        .with_override(args.force)
        .with_ignore_exists(args.ignore_exists)
        .with_include_paths(args.include.iter().cloned());
    if let Some(protoc) = &args.protoc {
        opts = opts.with_compiler(protoc);
    }
    if !args.plugins.is_empty() {
        opts = opts.with_plugins(args.plugins.iter().cloned());
    }
    for (service, dir) in &args.name_overrides {
        opts = opts.with_naming_override(service.clone(), dir.clone());
    }

    let explicit = ExplicitFlags {
        module: false,
        compiler: args.protoc.is_some(),
        plugins: !args.plugins.is_empty(),
    };
    let settings = load_project_settings(&args.output)
        .with_context(|| format!("Failed to load settings from {}", args.output.display()))?;
    if let Some(settings) = settings {
        opts = settings.apply(&args.output, opts, &explicit);
    }
    Ok(opts)
}

fn print_report(report: &GenerationReport) {
    for path in &report.created {
        println!("✅ Created {}", path.display());
    }
    for path in &report.overwritten {
        println!("✅ Updated {}", path.display());
    }
    for path in &report.skipped {
        println!("⚠️  Kept existing {}", path.display());
    }
    for line in &report.spliced {
        println!("✅ Spliced `{line}`");
    }
}

fn print_services(services: &[ServiceDescriptor]) {
    for service in services {
        println!("{} ({})", service.full_name(), service.file.display());
        for m in &service.methods {
            let stream = |on: bool| if on { "stream " } else { "" };
            println!(
                "  rpc {}({}{}) returns ({}{})",
                m.name,
                stream(m.client_streaming),
                m.request_type_name(),
                stream(m.server_streaming),
                m.response_type_name(),
            );
        }
    }
}

fn run_generate(args: &GenerateArgs, mode: Mode) -> Result<()> {
    let opts = generation_options(args, mode)?;
    let report = generator::synthesize_from_idl(&opts, &args.idl).with_context(|| {
        format!(
            "Failed to synthesize services from {} into {}",
            args.idl.display(),
            args.output.display()
        )
    })?;
    print_report(&report);
    println!("✅ {} service(s) from {}", report.services.len(), args.idl.display());
    Ok(())
}

fn run_new(output: &Path, module: Option<&str>, force: bool, ignore_exists: bool) -> Result<()> {
    let mut opts = Options::default()
        .with_output(output)
        .with_override(force)
        .with_ignore_exists(ignore_exists);
    if let Some(module) = module {
        opts = opts.with_module(module);
    }
    let report = generator::init_project(&opts)
        .with_context(|| format!("Failed to create project at {}", output.display()))?;
    print_report(&report);
    println!("✅ Project ready at {}", output.display());
    Ok(())
}

/// Execute a parsed command line.
pub fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::New {
            output,
            module,
            force,
            ignore_exists,
        } => run_new(output, module.as_deref(), *force, *ignore_exists),
        Commands::Add(args) => run_generate(args, Mode::Add),
        Commands::Update(args) => run_generate(args, Mode::Update),
        Commands::Inspect { idl, include, json } => {
            let services = generator::inspect(idl, include)
                .with_context(|| format!("Failed to read {}", idl.display()))?;
            if *json {
                let text = serde_json::to_string_pretty(&services)
                    .context("Failed to serialize services")?;
                println!("{text}");
            } else {
                print_services(&services);
            }
            Ok(())
        }
    }
}
