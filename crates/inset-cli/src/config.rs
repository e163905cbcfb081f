//! Locating the engine configuration and the territory list.
//!
//! The engine configuration comes from, in order: `--config`, the
//! `INSET_CONFIG` environment variable, `inset.toml` in the working
//! directory, the platform config directory, or the built-in defaults.
//! A missing territory-list argument falls back to `territories.toml` or
//! `inset/territories.toml` in the working directory.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use inset::{InsetError, config::AppConfig};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "INSET_CONFIG";

const LOCAL_CONFIG: &str = "inset.toml";
const TERRITORY_CANDIDATES: [&str; 2] = ["territories.toml", "inset/territories.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("no territory list given and none found in {0}")]
    NoTerritoryList(PathBuf),
}

impl From<ConfigError> for InsetError {
    fn from(err: ConfigError) -> Self {
        InsetError::Config(err.to_string())
    }
}

/// Where the engine configuration is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Environment(PathBuf),
    Local(PathBuf),
    Platform(PathBuf),
    Default,
}

impl ConfigSource {
    fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Environment(path) | Self::Local(path) | Self::Platform(path) => Some(path),
            Self::Default => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Explicit(_) => "explicit",
            Self::Environment(_) => "environment",
            Self::Local(_) => "local",
            Self::Platform(_) => "platform",
            Self::Default => return f.write_str("built-in defaults"),
        };
        match self.path() {
            Some(path) => write!(f, "{kind} {}", path.display()),
            None => f.write_str(kind),
        }
    }
}

/// Picks the configuration source.
///
/// An explicit or environment path is returned even if it does not exist,
/// so that [`load_config`] can report it. Local and platform files are only
/// picked when present.
pub fn locate_config(explicit: Option<&Path>, from_env: Option<PathBuf>, working_dir: &Path) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|path| !path.as_os_str().is_empty()) {
        return ConfigSource::Environment(path);
    }

    let local = working_dir.join(LOCAL_CONFIG);
    if local.is_file() {
        return ConfigSource::Local(local);
    }

    match ProjectDirs::from("com", "inset", "inset") {
        Some(dirs) => {
            let platform = dirs.config_dir().join("config.toml");
            if platform.is_file() {
                return ConfigSource::Platform(platform);
            }
            debug!(path:? = platform; "No platform configuration file");
        }
        None => debug!("Could not determine platform-specific config directory"),
    }

    ConfigSource::Default
}

/// Reads the configuration from `source`.
///
/// # Errors
///
/// Returns [`InsetError::Config`] for a missing or malformed file.
pub fn load_config(source: &ConfigSource) -> Result<AppConfig, InsetError> {
    let Some(path) = source.path() else {
        debug!("Using built-in configuration");
        return Ok(AppConfig::default());
    };
    info!(source:% = source; "Loading configuration");

    if !path.is_file() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(config)
}

/// Returns the territory list to read: `explicit` when given, otherwise the
/// first default candidate present in `working_dir`.
///
/// # Errors
///
/// Returns [`InsetError::Config`] when nothing was given and no candidate
/// exists.
pub fn locate_territories(explicit: Option<&Path>, working_dir: &Path) -> Result<PathBuf, InsetError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let found = TERRITORY_CANDIDATES
        .iter()
        .map(|candidate| working_dir.join(candidate))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::NoTerritoryList(working_dir.to_path_buf()))?;
    info!(path:? = found; "Using default territory list");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use inset::config::ValidationPolicy;

    use super::*;

    #[test]
    fn test_explicit_config_wins() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LOCAL_CONFIG), "").unwrap();
        let explicit = dir.path().join("custom.toml");

        let source = locate_config(Some(explicit.as_path()), Some(dir.path().join("env.toml")), dir.path());
        assert_eq!(source, ConfigSource::Explicit(explicit));
    }

    #[test]
    fn test_environment_before_local() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LOCAL_CONFIG), "").unwrap();
        let from_env = dir.path().join("env.toml");

        let source = locate_config(None, Some(from_env.clone()), dir.path());
        assert_eq!(source, ConfigSource::Environment(from_env));

        let source = locate_config(None, Some(PathBuf::new()), dir.path());
        assert_eq!(source, ConfigSource::Local(dir.path().join(LOCAL_CONFIG)));
    }

    #[test]
    fn test_local_config_is_loaded() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(LOCAL_CONFIG),
            "[engine]\nvalidation = \"reject\"\n\n[map]\nwidth = 1200\n",
        )
        .unwrap();

        let source = locate_config(None, None, dir.path());
        let config = load_config(&source).unwrap();
        assert_eq!(config.engine().validation(), ValidationPolicy::Reject);
        assert_eq!(config.map().width(), 1200.0);
    }

    #[test]
    fn test_default_source_uses_defaults() {
        let config = load_config(&ConfigSource::Default).unwrap();
        assert_eq!(config.map().reference_scale(), AppConfig::default().map().reference_scale());
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempdir().unwrap();
        let source = ConfigSource::Explicit(dir.path().join("absent.toml"));
        let err = load_config(&source).unwrap_err();
        assert!(matches!(err, InsetError::Config(message) if message.starts_with("missing configuration file")));
    }

    #[test]
    fn test_malformed_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\nvalidation = \"sometimes\"\n").unwrap();

        let err = load_config(&ConfigSource::Explicit(path)).unwrap_err();
        assert!(matches!(err, InsetError::Config(message) if message.starts_with("failed to parse configuration")));
    }

    #[test]
    fn test_territory_list_discovery() {
        let dir = tempdir().unwrap();
        let err = locate_territories(None, dir.path()).unwrap_err();
        assert!(matches!(err, InsetError::Config(message) if message.contains("no territory list")));

        fs::create_dir(dir.path().join("inset")).unwrap();
        fs::write(dir.path().join("inset/territories.toml"), "").unwrap();
        assert_eq!(
            locate_territories(None, dir.path()).unwrap(),
            dir.path().join("inset/territories.toml")
        );

        fs::write(dir.path().join("territories.toml"), "").unwrap();
        assert_eq!(
            locate_territories(None, dir.path()).unwrap(),
            dir.path().join("territories.toml")
        );

        let explicit = Path::new("elsewhere.toml");
        assert_eq!(locate_territories(Some(explicit), dir.path()).unwrap(), explicit);
    }
}
