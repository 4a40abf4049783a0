//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interference between tests.

use cadastre_ingest::config::load_config;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("CADASTRE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("CADASTRE_DOWNLOAD_MAX_CONCURRENT");
    std::env::remove_var("CADASTRE_DATABASE_CONNECTION_STRING");
    std::env::remove_var("CADASTRE_GEOSERVER_DATASTORE_HOST");
    std::env::remove_var("TEST_CADASTRE_DB_PASSWORD");
    std::env::remove_var("TEST_GEOSERVER_PASSWORD");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "debug"

[sources]
cadastral_feed_url = "https://feeds.example.com/atom_feed.xml"
administrative_units_url = "https://feeds.example.com/au.zip"
addresses_url = "https://feeds.example.com/ad.zip"
downloads_dir = "/var/lib/cadastre/downloads"

[download]
max_concurrent = 8
timeout_seconds = 300
parse_workers = 2
skip_existing_batch = true

[database]
connection_string = "postgresql://etl:secret@db:5432/cadastre"
max_connections = 6
staging_schema = "staging"
promotion_routine = "staging.update_tables"
journal_schema = "journal"
summary_window_minutes = 90

[loader]
program = "/usr/bin/ogr2ogr"
promote_to_multi = false
sql_template_dir = "/etc/cadastre/sql"

[geoserver]
url = "https://maps.example.com/geoserver"
username = "publisher"
password = "hunter2"
workspace = "cadastre"
datastore = "cadastre-postgis"
datastore_host = "db.internal"

[[layers]]
id = "cadastral_parcels"
wms_name = "parcels"
native_table = "gs.v_cadastral_parcels"

[[layers]]
id = "buildings"
wms_name = "buildings"
native_table = "gs.v_buildings"
workspace = "other"
title = "Zgrade"

[logging]
local_enabled = true
local_path = "/var/log/cadastre"
local_rotation = "hourly"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.sources.downloads_dir, "/var/lib/cadastre/downloads");
    assert_eq!(config.download.max_concurrent, 8);
    assert_eq!(config.download.parse_workers, 2);
    assert!(config.download.skip_existing_batch);

    assert_eq!(
        config.database.connection_string.expose_secret(),
        "postgresql://etl:secret@db:5432/cadastre"
    );
    assert_eq!(config.database.max_connections, 6);
    assert_eq!(config.database.summary_window_minutes, 90);

    assert_eq!(config.loader.program, "/usr/bin/ogr2ogr");
    assert!(!config.loader.promote_to_multi);
    assert_eq!(
        config.loader.sql_template_dir.as_deref(),
        Some("/etc/cadastre/sql")
    );

    assert_eq!(config.geoserver.username, "publisher");
    assert_eq!(config.geoserver.password.expose_secret(), "hunter2");
    assert_eq!(config.geoserver.datastore_host.as_deref(), Some("db.internal"));

    // Layer defaults come from the geoserver section
    assert_eq!(config.layers.len(), 2);
    assert_eq!(config.layers[0].workspace, "cadastre");
    assert_eq!(config.layers[0].title, "Cadastral Parcels");
    assert_eq!(config.layers[1].workspace, "other");
    assert_eq!(config.layers[1].title, "Zgrade");

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[database]
connection_string = "postgresql://etl@localhost/cadastre"
"#,
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(
        config.sources.cadastral_feed_url,
        "https://oss.uredjenazemlja.hr/oss/public/atom/atom_feed.xml"
    );
    assert_eq!(config.download.max_concurrent, 5);
    assert_eq!(config.download.parse_workers, 4);
    assert!(!config.download.skip_existing_batch);
    assert_eq!(config.database.promotion_routine, "staging.update_tables");
    assert_eq!(config.loader.program, "ogr2ogr");
    assert_eq!(config.geoserver.workspace, "cro-geo-data");
    assert_eq!(config.geoserver.srs, "EPSG:3765");

    // Default catalog
    assert_eq!(config.layers.len(), 7);
    assert!(config
        .layers
        .iter()
        .any(|l| l.native_table == "gs.mv_streets"));
    assert!(config.layers.iter().all(|l| l.workspace == "cro-geo-data"));
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    std::env::set_var("TEST_CADASTRE_DB_PASSWORD", "s3cret");
    std::env::set_var("TEST_GEOSERVER_PASSWORD", "gs-pass");

    let temp_file = write_config(
        r#"
[database]
connection_string = "postgresql://etl:${TEST_CADASTRE_DB_PASSWORD}@db/cadastre"

[geoserver]
password = "${TEST_GEOSERVER_PASSWORD}"
"#,
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(
        config.database.connection_string.expose_secret(),
        "postgresql://etl:s3cret@db/cadastre"
    );
    assert_eq!(config.geoserver.password.expose_secret(), "gs-pass");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[database]
connection_string = "postgresql://etl:${TEST_CADASTRE_DB_PASSWORD}@db/cadastre"
"#,
    );
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_CADASTRE_DB_PASSWORD"));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    std::env::set_var("CADASTRE_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("CADASTRE_DOWNLOAD_MAX_CONCURRENT", "12");
    std::env::set_var(
        "CADASTRE_DATABASE_CONNECTION_STRING",
        "postgresql://override@db2/cadastre",
    );
    std::env::set_var("CADASTRE_GEOSERVER_DATASTORE_HOST", "postgis");

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[download]
max_concurrent = 3

[database]
connection_string = "postgresql://etl@db/cadastre"
"#,
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.download.max_concurrent, 12);
    assert_eq!(
        config.database.connection_string.expose_secret(),
        "postgresql://override@db2/cadastre"
    );
    assert_eq!(config.geoserver.datastore_host.as_deref(), Some("postgis"));

    cleanup_env_vars();
}

#[test]
fn test_invalid_values_are_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        (
            "bad log level",
            "[application]\nlog_level = \"loud\"\n[database]\nconnection_string = \"postgresql://db/c\"",
        ),
        (
            "zero concurrency",
            "[download]\nmax_concurrent = 0\n[database]\nconnection_string = \"postgresql://db/c\"",
        ),
        (
            "non postgres url",
            "[database]\nconnection_string = \"mysql://db/c\"",
        ),
        (
            "routine injection",
            "[database]\nconnection_string = \"postgresql://db/c\"\npromotion_routine = \"x(); DROP TABLE y\"",
        ),
        (
            "bad geoserver url",
            "[database]\nconnection_string = \"postgresql://db/c\"\n[geoserver]\nurl = \"geoserver:8080\"",
        ),
        (
            "empty layer table",
            "[database]\nconnection_string = \"postgresql://db/c\"\n[[layers]]\nid = \"a\"\nwms_name = \"a\"\nnative_table = \"\"",
        ),
    ];

    for (name, contents) in cases {
        let temp_file = write_config(contents);
        assert!(
            load_config(temp_file.path()).is_err(),
            "expected '{name}' to be rejected"
        );
    }
}

#[test]
fn test_missing_database_section_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    assert!(load_config(temp_file.path()).is_err());
}
