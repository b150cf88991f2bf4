use {
    crate::{config::Config, error::ConfigError},
    std::{fs, path::Path},
};

/// Save settings to a JSON file, creating parent directories as needed
pub fn save_settings(config: &Config, file_path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let file_path = file_path.as_ref();
    config.analysis.validate()?;

    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(file_path, json)?;

    log::debug!("Saved settings to {}", file_path.display());
    Ok(())
}

/// Load settings from a JSON file; a missing file yields defaults
pub fn load_settings(file_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        log::info!("No settings file found at {}, using defaults", file_path.display());
        return Ok(Config::default());
    }

    let json = fs::read_to_string(file_path)?;
    let config: Config = serde_json::from_str(&json)?;
    config.analysis.validate()?;

    log::info!("Loaded settings from {}", file_path.display());
    Ok(config)
}
