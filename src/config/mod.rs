pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "kubewizard.toml";

/// Load configuration by merging global, local, environment and CLI sources.
/// Precedence: CLI > environment > local (or `--config`) file > global file > defaults.
///
/// Missing config files are handled gracefully (defaults apply). A file named
/// explicitly with `--config` must exist and parse.
pub fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    // Layer 1: Global config (~/.config/kubewizard/kubewizard.toml or platform equivalent)
    let global = load_global_config();

    // Layer 2: Explicit --config file, or ./kubewizard.toml
    let local = match cli.common().config.as_deref() {
        Some(path) => load_toml_file(path)?.ok_or_else(|| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: "config file not found".to_string(),
        })?,
        None => load_discovered(Path::new(CONFIG_FILE_NAME)),
    };

    // Layer 3: Environment
    let env = env_to_partial(|key| std::env::var(key).ok());

    // Layer 4: CLI args
    let cli_partial = cli_to_partial(cli);

    cli_partial
        .with_fallback(env)
        .with_fallback(local)
        .with_fallback(global)
        .finalize()
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_discovered(&p),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load a config file found by search rather than named by the user.
/// Parse errors are logged and the file is skipped.
fn load_discovered(path: &Path) -> PartialConfig {
    match load_toml_file(path) {
        Ok(partial) => partial.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("{}", e);
            PartialConfig::default()
        }
    }
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns `Ok(None)` on file-not-found.
pub fn load_toml_file(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::IoError(e)),
    };

    let config_file =
        toml::from_str::<ConfigFile>(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(Some(config_file.to_partial()))
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/kubewizard/kubewizard.toml
/// macOS: ~/Library/Application Support/kubewizard/kubewizard.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "kubewizard")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Read `DEBUG_LEVEL` and `KUBEWIZARD_MODEL` through `lookup`.
/// An unparseable `DEBUG_LEVEL` is ignored with a warning.
pub fn env_to_partial<F>(lookup: F) -> PartialConfig
where
    F: Fn(&str) -> Option<String>,
{
    let debug_level = lookup("DEBUG_LEVEL").and_then(|raw| match raw.trim().parse::<u8>() {
        Ok(level) => Some(level),
        Err(_) => {
            tracing::warn!("Ignoring invalid DEBUG_LEVEL={:?}", raw);
            None
        }
    });

    PartialConfig {
        model: lookup("KUBEWIZARD_MODEL").filter(|m| !m.trim().is_empty()),
        debug_level,
        ..Default::default()
    }
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    let common = cli.common();
    let (model, debug_level) = match cli.chat_args() {
        Some(chat) => (chat.model.clone(), chat.debug_level),
        None => (None, None),
    };

    PartialConfig {
        model,
        debug_level,
        command_timeout_secs: common.timeout,
        approval: if common.yes {
            Some(ApprovalMode::Auto)
        } else {
            common.approval
        },
        ..Default::default()
    }
}
