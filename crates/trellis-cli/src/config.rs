//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};

use trellis::config::AppConfig;

use crate::error::CliError;

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (trellis/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CliError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("trellis/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("rs", "trellis", "trellis") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if the file is missing, unreadable or not valid TOML for
/// [`AppConfig`].
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CliError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CliError::MissingConfig(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| CliError::ConfigParse {
        path: PathBuf::from(path),
        source,
    })
}
