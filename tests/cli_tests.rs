//! CLI argument parsing tests
//!
//! Run with: cargo test --test cli_tests

use clap::Parser;
use schoolgate::cli::{Cli, Commands, OutputFormat};

#[test]
fn test_cli_serve_overrides() {
    let cli = Cli::try_parse_from(["schoolgate", "serve", "--host", "127.0.0.1", "-p", "9090"])
        .expect("serve should parse");
    match cli.command {
        Commands::Serve { host, port } => {
            assert_eq!(host.as_deref(), Some("127.0.0.1"));
            assert_eq!(port, Some(9090));
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_cli_serve_defaults_to_config() {
    let cli = Cli::try_parse_from(["schoolgate", "serve"]).expect("serve should parse");
    assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
}

#[test]
fn test_cli_global_config_flag() {
    let cli = Cli::try_parse_from(["schoolgate", "routes", "/admin", "--config", "/etc/schoolgate.toml"])
        .expect("routes should parse");
    assert_eq!(
        cli.config.as_deref().and_then(|p| p.to_str()),
        Some("/etc/schoolgate.toml")
    );
}

#[test]
fn test_cli_routes_formats() {
    let cli = Cli::try_parse_from(["schoolgate", "routes", "/", "/admin", "-f", "yaml"])
        .expect("routes should parse");
    match cli.command {
        Commands::Routes { paths, format } => {
            assert_eq!(paths, vec!["/".to_string(), "/admin".to_string()]);
            assert!(matches!(format, OutputFormat::Yaml));
        }
        _ => panic!("expected routes"),
    }
}

#[test]
fn test_cli_routes_requires_a_path() {
    assert!(Cli::try_parse_from(["schoolgate", "routes"]).is_err());
}

#[test]
fn test_cli_token_default_format() {
    let cli = Cli::try_parse_from(["schoolgate", "token", "abc.def.ghi"]).expect("token should parse");
    match cli.command {
        Commands::Token { token, format } => {
            assert_eq!(token, "abc.def.ghi");
            assert!(matches!(format, OutputFormat::Table));
        }
        _ => panic!("expected token"),
    }
}

#[test]
fn test_cli_rejects_unknown_format() {
    assert!(Cli::try_parse_from(["schoolgate", "token", "x", "--format", "xml"]).is_err());
}
