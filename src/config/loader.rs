//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::IngestConfig;
use super::secret_string;
use crate::domain::errors::IngestError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into IngestConfig
/// 4. Applies environment variable overrides (CADASTRE_* prefix)
/// 5. Fills layer catalog defaults
/// 6. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use cadastre_ingest::config::loader::load_config;
///
/// let config = load_config("cadastre-ingest.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<IngestConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IngestError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        IngestError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text with the same pipeline as [`load_config`]
///
/// # Errors
///
/// Returns an error if substitution, parsing or validation fails.
pub fn parse_config(contents: &str) -> Result<IngestConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: IngestConfig = toml::from_str(&contents)
        .map_err(|e| IngestError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);
    config.apply_layer_defaults();

    config.validate().map_err(|e| {
        IngestError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error listing every referenced environment variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| IngestError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(IngestError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse().ok())
}

/// Applies environment variable overrides using the CADASTRE_* prefix
///
/// Variables follow the pattern `CADASTRE_<SECTION>_<KEY>`, for example
/// `CADASTRE_DATABASE_CONNECTION_STRING` or `CADASTRE_DOWNLOAD_MAX_CONCURRENT`.
/// Unparseable numeric or boolean values are ignored.
fn apply_env_overrides(config: &mut IngestConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CADASTRE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Ok(val) = std::env::var("CADASTRE_SOURCES_CADASTRAL_FEED_URL") {
        config.sources.cadastral_feed_url = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_SOURCES_ADMINISTRATIVE_UNITS_URL") {
        config.sources.administrative_units_url = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_SOURCES_ADDRESSES_URL") {
        config.sources.addresses_url = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_SOURCES_DOWNLOADS_DIR") {
        config.sources.downloads_dir = val;
    }

    // Download overrides
    if let Some(val) = env_parse("CADASTRE_DOWNLOAD_MAX_CONCURRENT") {
        config.download.max_concurrent = val;
    }
    if let Some(val) = env_parse("CADASTRE_DOWNLOAD_TIMEOUT_SECONDS") {
        config.download.timeout_seconds = val;
    }
    if let Some(val) = env_parse("CADASTRE_DOWNLOAD_SKIP_EXISTING_BATCH") {
        config.download.skip_existing_batch = val;
    }

    // Database overrides
    if let Ok(val) = std::env::var("CADASTRE_DATABASE_CONNECTION_STRING") {
        config.database.connection_string = secret_string(val);
    }
    if let Some(val) = env_parse("CADASTRE_DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_DATABASE_PROMOTION_ROUTINE") {
        config.database.promotion_routine = val;
    }
    if let Some(val) = env_parse("CADASTRE_DATABASE_SUMMARY_WINDOW_MINUTES") {
        config.database.summary_window_minutes = val;
    }

    // Loader overrides
    if let Ok(val) = std::env::var("CADASTRE_LOADER_PROGRAM") {
        config.loader.program = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_LOADER_SQL_TEMPLATE_DIR") {
        config.loader.sql_template_dir = Some(val);
    }

    // GeoServer overrides
    if let Ok(val) = std::env::var("CADASTRE_GEOSERVER_URL") {
        config.geoserver.url = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_GEOSERVER_USERNAME") {
        config.geoserver.username = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_GEOSERVER_PASSWORD") {
        config.geoserver.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("CADASTRE_GEOSERVER_WORKSPACE") {
        config.geoserver.workspace = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_GEOSERVER_DATASTORE") {
        config.geoserver.datastore = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_GEOSERVER_DATASTORE_HOST") {
        config.geoserver.datastore_host = Some(val);
    }

    // Logging overrides
    if let Some(val) = env_parse("CADASTRE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("CADASTRE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
