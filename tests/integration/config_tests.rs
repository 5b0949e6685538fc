use clap::Parser;
use pngx::cli::{Cli, Commands};
use pngx::config::Config;
use pngx::error::PngxError;
use pngx::upload::DEFAULT_DATE_RULE;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all PNGX_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("PNGX_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
url = "https://paperless.example.org"
token = "abc123"

[upload]
owner = "alice"
groups = ["family"]
tags = ["inbox"]
tags_must_exist = true
nameres = ["s/_/ /g"]
tries = 5
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.url.as_deref(), Some("https://paperless.example.org"));
    assert_eq!(config.token.as_deref(), Some("abc123"));
    assert_eq!(config.upload.owner.as_deref(), Some("alice"));
    assert_eq!(config.upload.groups, vec!["family"]);
    assert!(config.upload.tags_must_exist);
    assert_eq!(config.upload.tries, 5);
    // Keys absent from the file keep their defaults.
    assert_eq!(config.upload.dateres, vec![DEFAULT_DATE_RULE.to_string()]);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();

    let config = Config::load_from_path(temp_dir.path().join("nonexistent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_invalid_toml_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "url = [unterminated").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, PngxError::Config(_)));
}

#[test]
fn test_config_zero_tries_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[upload]\ntries = 0\n").unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

#[test]
fn test_config_roundtrips_through_toml() {
    let mut config = Config::default();
    config.url = Some("https://p.example.org".into());
    config.upload.tags = vec!["inbox".into()];

    let content = toml::to_string_pretty(&config).unwrap();
    assert!(content.contains("url = \"https://p.example.org\""));
    assert!(content.contains("[upload]"));

    let parsed: Config = toml::from_str(&content).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_config_hierarchy_defaults_file_env_cli() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    // 1. Config file overrides defaults
    fs::write(
        &config_path,
        "url = \"https://file.example.org\"\ntoken = \"file\"\n[upload]\ntries = 4\n",
    )
    .unwrap();

    // 2. Environment variables override the config file
    std::env::set_var("PNGX_TOKEN", "env");
    std::env::set_var("PNGX_UPLOAD__TRIES", "6");

    let mut config = Config::load_from_path(&config_path).unwrap();
    assert_eq!(config.url.as_deref(), Some("https://file.example.org"));
    assert_eq!(config.token.as_deref(), Some("env"));
    assert_eq!(config.upload.tries, 6);

    // 3. CLI flags override environment variables
    let cli = Cli::try_parse_from([
        "pngx", "-T", "cli", "upload", "--tries", "2", "--datere", "first", "a.pdf",
    ])
    .unwrap();
    config.merge_cli(&cli);
    if let Commands::Upload(args) = &cli.command {
        config.merge_upload_args(args);
    }

    assert_eq!(config.connection().token.as_deref(), Some("cli"));
    let request = config.upload_request();
    assert_eq!(request.max_tries, 2);
    assert_eq!(
        request.date_rules,
        vec!["first".to_string(), DEFAULT_DATE_RULE.to_string()]
    );

    clear_env();
}

#[test]
fn test_dry_run_from_config_survives_cli() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "dry_run = true\n").unwrap();

    let mut config = Config::load_from_path(&config_path).unwrap();
    let cli = Cli::try_parse_from(["pngx", "tags", "list"]).unwrap();
    config.merge_cli(&cli);
    assert!(config.connection().dry_run);
}
