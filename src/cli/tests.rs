//! Unit tests for CLI commands

use crate::cli::{generation_options, Cli, Commands};
use crate::options::Mode;
use crate::project_config::SETTINGS_FILE;
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_new_command_parses() {
    let cli = Cli::try_parse_from([
        "svcforge", "new", "--output", "orders", "--module", "orders_svc",
    ])
    .unwrap();
    match cli.command {
        Commands::New {
            output,
            module,
            force,
            ignore_exists,
        } => {
            assert_eq!(output, PathBuf::from("orders"));
            assert_eq!(module.as_deref(), Some("orders_svc"));
            assert!(!force);
            assert!(!ignore_exists);
        }
        _ => panic!("Expected New command"),
    }
}

#[test]
fn test_add_command_with_repeated_flags() {
    let cli = Cli::try_parse_from([
        "svcforge",
        "add",
        "--idl",
        "health.proto",
        "-o",
        "app",
        "-I",
        "vendor",
        "--include",
        "third_party",
        "--plugin",
        "prost",
        "--name-override",
        "HealthCheckService=health",
        "--force",
    ])
    .unwrap();
    match cli.command {
        Commands::Add(args) => {
            assert_eq!(args.idl, PathBuf::from("health.proto"));
            assert_eq!(args.output, PathBuf::from("app"));
            assert_eq!(args.include, vec![PathBuf::from("vendor"), PathBuf::from("third_party")]);
            assert_eq!(args.plugins, vec!["prost".to_string()]);
            assert_eq!(
                args.name_overrides,
                vec![("HealthCheckService".to_string(), "health".to_string())]
            );
            assert!(args.force);
        }
        _ => panic!("Expected Add command"),
    }
}

#[test]
fn test_force_conflicts_with_ignore_exists() {
    let result = Cli::try_parse_from([
        "svcforge",
        "update",
        "--idl",
        "a.proto",
        "--force",
        "--ignore-exists",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_bad_name_override_is_rejected() {
    let result = Cli::try_parse_from([
        "svcforge",
        "add",
        "--idl",
        "a.proto",
        "--name-override",
        "NoDirectory",
    ]);
    assert!(result.is_err());

    let result = Cli::try_parse_from([
        "svcforge",
        "add",
        "--idl",
        "a.proto",
        "--name-override",
        "HealthCheckService=health-check",
    ]);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("lowercase snake_case"), "{err}");
}

#[test]
fn test_inspect_command_parses() {
    let cli = Cli::try_parse_from(["svcforge", "inspect", "--idl", "a.proto", "--json"]).unwrap();
    match cli.command {
        Commands::Inspect { idl, include, json } => {
            assert_eq!(idl, PathBuf::from("a.proto"));
            assert!(include.is_empty());
            assert!(json);
        }
        _ => panic!("Expected Inspect command"),
    }
}

#[test]
fn test_help_mentions_concurrent_runs() {
    let err = Cli::try_parse_from(["svcforge", "--help"]).unwrap_err();
    assert!(err.to_string().contains("must not overlap"));
}

#[test]
fn test_flags_layer_over_project_settings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(SETTINGS_FILE),
        "protoc = \"/opt/protoc\"\ninclude = [\"proto\"]\nplugins = [\"prost\"]\n\n[naming]\nHealthCheckService = \"health\"\nOther = \"other_dir\"\n",
    )
    .unwrap();
    let output = dir.path().to_string_lossy().into_owned();

    let cli = Cli::try_parse_from([
        "svcforge",
        "update",
        "--idl",
        "a.proto",
        "--output",
        output.as_str(),
        "-I",
        "vendor",
        "--name-override",
        "HealthCheckService=hc",
    ])
    .unwrap();
    let Commands::Update(args) = cli.command else {
        panic!("Expected Update command");
    };
    let opts = generation_options(&args, Mode::Update).unwrap();

    assert_eq!(opts.mode(), Mode::Update);
    assert_eq!(
        opts.include_paths(),
        &[PathBuf::from("vendor"), dir.path().join("proto")]
    );
    assert_eq!(opts.plugins(), &["prost".to_string()]);
    assert_eq!(opts.naming_overrides()["HealthCheckService"], "hc");
    assert_eq!(opts.naming_overrides()["Other"], "other_dir");
    if std::env::var_os("SVCFORGE_PROTOC").is_none() {
        assert_eq!(opts.compiler(), std::path::Path::new("/opt/protoc"));
    }
}
