//! Tests for CLI subcommand parsing.

use clap::Parser;
use std::path::PathBuf;

use typed_import::config::{Cli, Command, DB_PATH, DEFAULT_BATCH_SIZE};
use typed_import::{Config, ErrorPolicy, LogFormat, LogLevel};

fn parse_import(args: &[&str]) -> Config {
    let cli = Cli::try_parse_from(args).expect("arguments parse");
    match cli.command {
        Command::Import(args) => Config::from(args),
        other => panic!("expected import command, got {other:?}"),
    }
}

#[test]
fn test_import_defaults() {
    let config = parse_import(&[
        "typed_import",
        "import",
        "people.csv",
        "--fields",
        "name",
        "age",
        "--types",
        "s",
        "i",
    ]);

    assert_eq!(config.file, PathBuf::from("people.csv"));
    assert_eq!(config.fields, vec!["name", "age"]);
    assert_eq!(config.types, vec!["s", "i"]);
    assert_eq!(config.encoding, "UTF-8");
    assert_eq!(config.db_path, PathBuf::from(DB_PATH));
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(config.on_error, ErrorPolicy::Abort);
    assert_eq!(config.workers, 1);
    assert!(!config.drop);
    assert!(!config.skip_header);
    assert!(matches!(config.log_level, LogLevel::Info));
    assert!(matches!(config.log_format, LogFormat::Plain));
    config.validate().expect("defaults are valid");
}

#[test]
fn test_import_all_options() {
    let config = parse_import(&[
        "typed_import",
        "import",
        "legacy.csv",
        "--fields",
        "id",
        "created",
        "--types",
        "i",
        "d",
        "--encoding",
        "cp1252",
        "--db",
        "/tmp/out.db",
        "--collection",
        "events",
        "--drop",
        "--batch-size",
        "1000",
        "--on-error",
        "skip",
        "--workers",
        "4",
        "--skip-header",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ]);

    assert_eq!(config.encoding, "cp1252");
    assert_eq!(config.db_path, PathBuf::from("/tmp/out.db"));
    assert_eq!(config.collection, "events");
    assert!(config.drop);
    assert_eq!(config.batch_size, 1000);
    assert_eq!(config.on_error, ErrorPolicy::Skip);
    assert_eq!(config.workers, 4);
    assert!(config.skip_header);
    assert!(matches!(config.log_level, LogLevel::Debug));
    assert!(matches!(config.log_format, LogFormat::Json));
}

#[test]
fn test_import_requires_fields_and_types() {
    assert!(Cli::try_parse_from(["typed_import", "import", "people.csv"]).is_err());
    assert!(
        Cli::try_parse_from(["typed_import", "import", "people.csv", "--fields", "name"])
            .is_err()
    );
}

#[test]
fn test_unknown_error_policy_is_rejected() {
    let result = Cli::try_parse_from([
        "typed_import",
        "import",
        "people.csv",
        "--fields",
        "name",
        "--types",
        "s",
        "--on-error",
        "retry",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_runs_subcommand() {
    let cli = Cli::try_parse_from(["typed_import", "runs", "--db", "x.db", "--limit", "3"])
        .expect("arguments parse");
    match cli.command {
        Command::Runs(args) => {
            assert_eq!(args.db_path, PathBuf::from("x.db"));
            assert_eq!(args.limit, Some(3));
        }
        other => panic!("expected runs command, got {other:?}"),
    }
}
