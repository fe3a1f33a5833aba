//! Configuration for web push client instances.
//!
//! TOML file with shared defaults and named instances, overlaid with
//! `WEBPUSH_` environment variables, validated and translated into
//! `webpush_core::ClientConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use webpush_core::{ClientConfig, DEFAULT_SCRIPT_BASE, DEFAULT_SCRIPT_NAME, decode_server_key};

/// Length of an uncompressed P-256 public key.
const VAPID_KEY_LEN: usize = 65;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no instance named '{name}' is configured")]
    UnknownInstance { name: String },

    #[error("no instance selected and no default_instance configured")]
    NoInstance,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Instance used when none is named explicitly.
    pub default_instance: Option<String>,

    /// Settings shared by every instance.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named client instances.
    #[serde(default)]
    pub instances: BTreeMap<String, Instance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_subscribe_label")]
    pub subscribe_label: String,

    #[serde(default = "default_unsubscribe_label")]
    pub unsubscribe_label: String,

    #[serde(default)]
    pub send_existing_subscription_on_init: bool,

    #[serde(default = "default_true")]
    pub disable_button_when_unsupported: bool,

    #[serde(default)]
    pub show_tooltip: bool,

    #[serde(default = "default_script_base")]
    pub script_base: String,

    #[serde(default = "default_script_name")]
    pub script_name: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            subscribe_label: default_subscribe_label(),
            unsubscribe_label: default_unsubscribe_label(),
            send_existing_subscription_on_init: false,
            disable_button_when_unsupported: true,
            show_tooltip: false,
            script_base: default_script_base(),
            script_name: default_script_name(),
        }
    }
}

fn default_subscribe_label() -> String {
    "Subscribe".into()
}
fn default_unsubscribe_label() -> String {
    "Unsubscribe".into()
}
fn default_true() -> bool {
    true
}
fn default_script_base() -> String {
    DEFAULT_SCRIPT_BASE.into()
}
fn default_script_name() -> String {
    DEFAULT_SCRIPT_NAME.into()
}

/// One client instance. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Instance {
    /// Identifier assigned by the hosting dashboard.
    pub id: String,

    /// VAPID public key, base64url encoded.
    pub public_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsubscribe_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_existing_subscription_on_init: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_button_when_unsupported: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_tooltip: Option<bool>,
}

impl Config {
    /// Pick the named instance, or the default one when `name` is `None`.
    pub fn instance<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a Instance), ConfigError> {
        let name = name
            .or(self.default_instance.as_deref())
            .ok_or(ConfigError::NoInstance)?;
        self.instances
            .get(name)
            .map(|instance| (name, instance))
            .ok_or_else(|| ConfigError::UnknownInstance { name: name.into() })
    }

    /// A config with one example instance, for `init`.
    pub fn starter(id: &str, public_key: &str) -> Self {
        let mut instances = BTreeMap::new();
        instances.insert(
            "default".to_owned(),
            Instance {
                id: id.into(),
                public_key: public_key.into(),
                subscribe_label: None,
                unsubscribe_label: None,
                send_existing_subscription_on_init: None,
                disable_button_when_unsupported: None,
                show_tooltip: None,
            },
        );
        Self {
            default_instance: Some("default".into()),
            defaults: Defaults::default(),
            instances,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "webpush", "webpush").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("webpush");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// `path` overrides the platform config location. A missing file is not
/// an error; the environment alone can describe an instance, e.g.
/// `WEBPUSH_INSTANCES__DEFAULT__ID`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading configuration");

    let env = Env::prefixed("WEBPUSH_").split("__");
    // Env values are parsed, so `20240101.123456` would arrive as a float
    // and `0123` as 123. Text fields are re-applied verbatim on top.
    let verbatim: Vec<_> = env
        .iter()
        .filter(|(key, _)| is_text_key(key.as_str()))
        .collect();

    let mut figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(env);
    for (key, value) in verbatim {
        figment = figment.merge(Serialized::default(key.as_str(), value));
    }

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Dotted config keys whose value is free text, never a number or bool.
fn is_text_key(key: &str) -> bool {
    const INSTANCE_TEXT: [&str; 4] = ["id", "public_key", "subscribe_label", "unsubscribe_label"];
    const DEFAULTS_TEXT: [&str; 4] = [
        "subscribe_label",
        "unsubscribe_label",
        "script_base",
        "script_name",
    ];

    match key.split('.').collect::<Vec<_>>().as_slice() {
        ["default_instance"] => true,
        ["defaults", field] => DEFAULTS_TEXT.contains(field),
        ["instances", _, field] => INSTANCE_TEXT.contains(field),
        _ => false,
    }
}

// ── Config saving ───────────────────────────────────────────────────

/// Render config as pretty TOML.
pub fn render_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_config(cfg)?)?;
    Ok(())
}

// ── Translation to ClientConfig ─────────────────────────────────────

/// Validate an instance and merge it with the shared defaults.
pub fn instance_to_client_config(
    instance: &Instance,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    if instance.id.trim().is_empty() {
        return Err(validation("id", "must not be empty"));
    }

    let key = decode_server_key(&instance.public_key)
        .map_err(|err| validation("public_key", &err.to_string()))?;
    if key.len() != VAPID_KEY_LEN {
        return Err(validation(
            "public_key",
            &format!(
                "expected a {VAPID_KEY_LEN}-byte P-256 public key, got {} bytes",
                key.len()
            ),
        ));
    }

    let subscribe_label = instance
        .subscribe_label
        .clone()
        .unwrap_or_else(|| defaults.subscribe_label.clone());
    let unsubscribe_label = instance
        .unsubscribe_label
        .clone()
        .unwrap_or_else(|| defaults.unsubscribe_label.clone());
    for (field, label) in [
        ("subscribe_label", &subscribe_label),
        ("unsubscribe_label", &unsubscribe_label),
    ] {
        if label.trim().is_empty() {
            return Err(validation(field, "must not be empty"));
        }
    }

    let mut config = ClientConfig::new(instance.id.as_str(), instance.public_key.trim());
    config.subscribe_label = subscribe_label;
    config.unsubscribe_label = unsubscribe_label;
    config.send_existing_subscription_on_init = instance
        .send_existing_subscription_on_init
        .unwrap_or(defaults.send_existing_subscription_on_init);
    config.disable_button_when_unsupported = instance
        .disable_button_when_unsupported
        .unwrap_or(defaults.disable_button_when_unsupported);
    config.show_tooltip = instance.show_tooltip.unwrap_or(defaults.show_tooltip);
    config.script_base.clone_from(&defaults.script_base);
    config.script_name.clone_from(&defaults.script_name);
    Ok(config)
}

/// Select an instance from `cfg` and build its `ClientConfig`.
pub fn resolve_instance(cfg: &Config, name: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let (name, instance) = cfg.instance(name)?;
    debug!(instance = name, id = %instance.id, "resolving instance");
    instance_to_client_config(instance, &cfg.defaults)
}

fn validation(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const KEY: &str =
        "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U";

    // Every test that reads the environment runs inside a `Jail`, which
    // serializes them and restores the variables afterwards.

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let cfg = load_config(Some(&jail.directory().join("absent.toml"))).unwrap();
            assert_eq!(cfg.defaults, Defaults::default());
            assert!(cfg.instances.is_empty());
            Ok(())
        });
    }

    #[test]
    fn instance_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                &format!(
                    r#"
default_instance = "kitchen"

[defaults]
subscribe_label = "Notify me"
show_tooltip = true
script_base = "/ui/web_push"

[instances.kitchen]
id = "8f2c.3a1"
public_key = "{KEY}"
unsubscribe_label = "Stop"
send_existing_subscription_on_init = true
"#
                ),
            )?;

            let cfg = load_config(Some(&jail.directory().join("config.toml"))).unwrap();
            let client = resolve_instance(&cfg, None).unwrap();

            assert_eq!(client.id.as_str(), "8f2c.3a1");
            assert_eq!(client.subscribe_label, "Notify me");
            assert_eq!(client.unsubscribe_label, "Stop");
            assert!(client.show_tooltip);
            assert!(client.send_existing_subscription_on_init);
            assert!(client.disable_button_when_unsupported);
            assert_eq!(
                client.script_url(),
                "/ui/web_push/8f2c%2E3a1/nodered_push_service.js"
            );
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                &format!("[instances.site]\nid = \"n1\"\npublic_key = \"{KEY}\"\n"),
            )?;
            jail.set_env("WEBPUSH_INSTANCES__SITE__UNSUBSCRIBE_LABEL", "Mute");
            jail.set_env("WEBPUSH_DEFAULTS__SHOW_TOOLTIP", "true");

            let cfg = load_config(Some(&jail.directory().join("config.toml"))).unwrap();
            let client = resolve_instance(&cfg, Some("site")).unwrap();
            assert_eq!(client.unsubscribe_label, "Mute");
            assert!(client.show_tooltip);
            Ok(())
        });
    }

    #[test]
    fn unknown_and_missing_instances_are_errors() {
        let cfg = Config::starter("n1", KEY);
        assert!(matches!(
            resolve_instance(&cfg, Some("nope")),
            Err(ConfigError::UnknownInstance { .. })
        ));

        let empty = Config::default();
        assert!(matches!(
            resolve_instance(&empty, None),
            Err(ConfigError::NoInstance)
        ));
    }

    #[test]
    fn rejects_empty_id() {
        let cfg = Config::starter("  ", KEY);
        let err = resolve_instance(&cfg, None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "id"));
    }

    #[test]
    fn rejects_undecodable_or_short_key() {
        for key in ["not a key!", "YWJj"] {
            let cfg = Config::starter("n1", key);
            let err = resolve_instance(&cfg, None).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation { ref field, .. } if field == "public_key"),
                "key {key:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_blank_label() {
        let mut cfg = Config::starter("n1", KEY);
        cfg.defaults.unsubscribe_label = " ".into();
        let err = resolve_instance(&cfg, None).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "unsubscribe_label")
        );
    }

    #[test]
    fn text_keys_cover_ids_keys_and_labels() {
        assert!(is_text_key("default_instance"));
        assert!(is_text_key("instances.num.id"));
        assert!(is_text_key("instances.num.public_key"));
        assert!(is_text_key("defaults.subscribe_label"));
        assert!(!is_text_key("defaults.show_tooltip"));
        assert!(!is_text_key("instances.num.show_tooltip"));
        assert!(!is_text_key("id"));
    }

    #[test]
    fn numeric_looking_env_values_stay_text() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("WEBPUSH_DEFAULT_INSTANCE", "2024");
            jail.set_env("WEBPUSH_INSTANCES__2024__ID", "20240101.123456");
            jail.set_env("WEBPUSH_INSTANCES__2024__PUBLIC_KEY", KEY);
            jail.set_env("WEBPUSH_INSTANCES__2024__SUBSCRIBE_LABEL", "1");
            jail.set_env("WEBPUSH_INSTANCES__2024__SHOW_TOOLTIP", "true");
            jail.set_env("WEBPUSH_INSTANCES__ZERO__ID", "0123");
            jail.set_env("WEBPUSH_INSTANCES__ZERO__PUBLIC_KEY", KEY);

            let cfg = load_config(Some(&jail.directory().join("absent.toml"))).unwrap();
            assert_eq!(cfg.default_instance.as_deref(), Some("2024"));

            let client = resolve_instance(&cfg, None).unwrap();
            assert_eq!(client.id.as_str(), "20240101.123456");
            assert_eq!(client.subscribe_label, "1");
            assert!(client.show_tooltip);

            let zero = resolve_instance(&cfg, Some("zero")).unwrap();
            assert_eq!(zero.id.as_str(), "0123");
            Ok(())
        });
    }

    #[test]
    fn saved_starter_loads_back() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("config.toml");
            let starter = Config::starter("n1", KEY);

            save_config(&starter, &path).unwrap();
            let loaded = load_config(Some(&path)).unwrap();

            assert_eq!(loaded, starter);
            assert!(resolve_instance(&loaded, None).is_ok());
            Ok(())
        });
    }
}
