//! GlobalOpts-aware wrappers over `webpush_config`.

use std::path::{Path, PathBuf};

use webpush_config::{Config, ConfigError, load_config, resolve_instance};
use webpush_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file selected by `--config`, or the platform default.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(webpush_config::config_path)
}

/// Load the config file named by the global options.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = active_path(global);
    load_config(Some(&path)).map_err(|err| config_error(err, &path, None))
}

/// Load the config and build the selected instance's `ClientConfig`.
pub fn resolve_client(global: &GlobalOpts) -> Result<(String, ClientConfig), CliError> {
    let path = active_path(global);
    let cfg = load(global)?;
    let (name, _) = cfg
        .instance(global.instance.as_deref())
        .map_err(|err| config_error(err, &path, Some(&cfg)))?;
    let client =
        resolve_instance(&cfg, Some(name)).map_err(|err| config_error(err, &path, Some(&cfg)))?;
    Ok((name.to_owned(), client))
}

fn config_error(err: ConfigError, path: &Path, cfg: Option<&Config>) -> CliError {
    let available: Vec<&str> = cfg
        .map(|cfg| cfg.instances.keys().map(String::as_str).collect())
        .unwrap_or_default();
    CliError::from_config(err, &path.display().to_string(), &available)
}
