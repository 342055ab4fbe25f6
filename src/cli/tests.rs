//! Unit tests for CLI commands

use crate::cli::{run_cli, Cli, Commands};
use clap::Parser;

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let config = cli.load_config().unwrap();
    let mut out = Vec::new();
    run_cli(&cli, &config, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_dispatch_command_parses_headers() {
    let cli = Cli::try_parse_from([
        "minimvc",
        "dispatch",
        "/demo/query",
        "-H",
        "x-request-id: abc",
        "--header",
        "accept: text/plain",
    ])
    .unwrap();

    match cli.command {
        Commands::Dispatch { uri, headers } => {
            assert_eq!(uri, "/demo/query");
            assert_eq!(headers, ["x-request-id: abc", "accept: text/plain"]);
        }
        Commands::Routes => panic!("Expected Dispatch command"),
    }
}

#[test]
fn test_missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["minimvc"]).is_err());
}

#[test]
fn test_routes_lists_demo_routes() {
    let out = run(&["minimvc", "routes", "--scan-package", "app"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        [
            "/demo/query -> demoController::query",
            "/demo/validate -> demoController::validate",
        ]
    );
}

#[test]
fn test_dispatch_prints_status_and_body() {
    let out = run(&[
        "minimvc",
        "--scan-package",
        "app",
        "dispatch",
        "/demo/query?username=zhangsan&name=lisi",
    ]);
    assert_eq!(out, "200 OK\nlisi\n");

    let out = run(&[
        "minimvc",
        "--scan-package",
        "app",
        "dispatch",
        "/demo/validate?username=zhangsan&name=lisi",
    ]);
    assert_eq!(out, "403 Forbidden\nNo Access Permission\n");
}

#[test]
fn test_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.yaml");
    std::fs::write(&path, "scan_package: app\nidentity_param: user\n").unwrap();

    let out = run(&[
        "minimvc",
        "--config",
        path.to_str().unwrap(),
        "dispatch",
        "/demo/query?user=zhangsan&name=x",
    ]);
    assert_eq!(out, "200 OK\nx\n");
}
