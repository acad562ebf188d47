/// Configuration system for leadscope.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::LeadscopeConfig::default()`]
/// 2. **User global config** — `~/.leadscope/config.toml`
/// 3. **Project local config** — `.leadscope.toml` in the current working directory
/// 4. **Environment** — `LEADSCOPE_SERVICE_URL` overrides the service base URL
///
/// File layers are overlaid key by key: a project file that sets only
/// `service.base_url` keeps the timeout from the global file. A layer that
/// does not parse, or that holds a value of the wrong type, is skipped with a
/// warning.
///
/// # Usage
///
/// ```rust,ignore
/// use leadscope::config;
///
/// let cfg = config::load();
/// let client = leadscope::client::ServiceClient::from_config(&cfg);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use toml::Value;

pub use schema::LeadscopeConfig;

/// Environment variable overriding `service.base_url`.
pub const SERVICE_URL_ENV: &str = "LEADSCOPE_SERVICE_URL";

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Layers in order: defaults → global TOML → project TOML → env.
pub fn load() -> LeadscopeConfig {
    let mut config = resolve_layers(
        [global_config_path(), project_config_path()]
            .into_iter()
            .flatten()
            .filter_map(|path| read_layer(&path)),
    );
    apply_env_overrides(&mut config);
    config
}

/// Overlay file layers onto the defaults.
fn resolve_layers(layers: impl IntoIterator<Item = Value>) -> LeadscopeConfig {
    let mut merged = match Value::try_from(LeadscopeConfig::default()) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "could not encode default config; file layers ignored");
            return LeadscopeConfig::default();
        }
    };

    for layer in layers {
        overlay(&mut merged, layer);
    }

    merged.try_into().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config layers do not combine; using defaults");
        LeadscopeConfig::default()
    })
}

/// Read one config file as a raw TOML tree.
///
/// Returns `None` when the file is absent. A file that fails to parse, or
/// that would not load as a config on its own, is reported and skipped.
fn read_layer(path: &Path) -> Option<Value> {
    let text = fs::read_to_string(path).ok()?;

    let layer: Value = match toml::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            return None;
        }
    };

    if let Err(e) = layer.clone().try_into::<LeadscopeConfig>() {
        tracing::warn!(path = %path.display(), error = %e, "ignoring config file with invalid values");
        return None;
    }

    Some(layer)
}

/// Lay `top` over `base`: tables merge per key, anything else replaces.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Table(base), Value::Table(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(config: &mut LeadscopeConfig) {
    if let Ok(val) = std::env::var(SERVICE_URL_ENV)
        && !val.trim().is_empty()
    {
        config.service.base_url = val.trim().to_string();
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".leadscope").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".leadscope.toml"))
}

/// `~/.leadscope/config.toml`, the file `config init|set|reset` writes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// `.leadscope.toml` in the working directory.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Writing the global file
// ---------------------------------------------------------------------------

/// Write the annotated defaults to `~/.leadscope/config.toml`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to replace it",
            path.display()
        );
    }

    write_global(&path, &LeadscopeConfig::default_toml())?;
    Ok(path)
}

/// Update one dotted key (e.g. `service.timeout_ms`) in the global file.
///
/// The type of the current value decides how `value` is parsed. When no
/// file exists yet, the defaults are used as the starting point. The edit is
/// rejected if the result would no longer load as a config.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let current = if path.exists() {
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        LeadscopeConfig::default_toml()
    };

    let mut root: Value = toml::from_str(&current)
        .with_context(|| format!("{} is not valid TOML", path.display()))?;
    assign(&mut root, key, value)?;

    let _: LeadscopeConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}'"))?;

    let text = toml::to_string_pretty(&root).context("failed to encode updated config")?;
    write_global(&path, &text)
}

/// Overwrite the global file with the annotated defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective config, encoded as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to encode effective config")
}

fn write_global(path: &Path, text: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Replace the leaf at a dotted path, keeping its TOML type.
fn assign(root: &mut Value, key: &str, raw: &str) -> Result<()> {
    let Some((section, leaf)) = key.rsplit_once('.') else {
        bail!("expected a dotted key such as 'service.base_url', got '{key}'");
    };

    let mut node = root;
    for part in section.split('.') {
        node = node
            .get_mut(part)
            .with_context(|| format!("no section '{part}' in '{key}'"))?;
    }
    let table = node
        .as_table_mut()
        .with_context(|| format!("'{section}' is not a section"))?;

    let replacement = match table.get(leaf) {
        Some(Value::String(_)) => Value::String(raw.to_string()),
        Some(Value::Integer(_)) => Value::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("'{key}' takes a whole number, got '{raw}'"))?,
        ),
        Some(Value::Boolean(_)) => Value::Boolean(parse_flag(raw).with_context(|| {
            format!("'{key}' takes true/false, got '{raw}'")
        })?),
        Some(_) => bail!("'{key}' cannot be set from the command line"),
        None => bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), replacement);
    Ok(())
}

/// Parse a yes/no flag.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults_tree() -> Value {
        toml::from_str(&LeadscopeConfig::default_toml()).unwrap()
    }

    fn layer(text: &str) -> Value {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn later_layer_overrides_single_key() {
        let global = layer("[service]\nbase_url = \"http://scoring:8000\"\ntimeout_ms = 2500\n");
        let project = layer("[service]\nbase_url = \"http://localhost:9000\"\n");

        let cfg = resolve_layers([global, project]);
        assert_eq!(cfg.service.base_url, "http://localhost:9000");
        assert_eq!(cfg.service.timeout_ms, 2500);
        assert_eq!(cfg.dashboard.top_features, 5);
    }

    #[test]
    fn no_layers_is_default() {
        assert_eq!(resolve_layers(Vec::new()), LeadscopeConfig::default());
    }

    #[test]
    fn overlay_adds_missing_sections() {
        let mut base = layer("[service]\ntimeout_ms = 1\n");
        overlay(&mut base, layer("[logging]\ncall_log = false\n"));
        assert_eq!(base["service"]["timeout_ms"].as_integer(), Some(1));
        assert_eq!(base["logging"]["call_log"].as_bool(), Some(false));
    }

    #[test]
    fn flags_parse_strictly() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("No"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn assign_keeps_value_types() {
        let mut root = defaults_tree();
        assign(&mut root, "service.base_url", "http://scoring:8000").unwrap();
        assign(&mut root, "service.timeout_ms", "2500").unwrap();
        assign(&mut root, "dashboard.open_browser", "off").unwrap();

        assert_eq!(root["service"]["base_url"].as_str(), Some("http://scoring:8000"));
        assert_eq!(root["service"]["timeout_ms"].as_integer(), Some(2500));
        assert_eq!(root["dashboard"]["open_browser"].as_bool(), Some(false));
    }

    #[test]
    fn assign_rejects_bad_values() {
        let mut root = defaults_tree();
        assert!(assign(&mut root, "dashboard.top_features", "five").is_err());
        assert!(assign(&mut root, "logging.call_log", "sometimes").is_err());
    }

    #[test]
    fn assign_rejects_unknown_keys() {
        let mut root = defaults_tree();
        assert!(assign(&mut root, "nonexistent.key", "x").is_err());
        assert!(assign(&mut root, "service.nope", "x").is_err());
        assert!(assign(&mut root, "service", "x").is_err());
    }

    #[test]
    fn negative_top_features_fails_validation() {
        let mut root = defaults_tree();
        assign(&mut root, "dashboard.top_features", "-3").unwrap();
        assert!(root.try_into::<LeadscopeConfig>().is_err());
    }

    #[test]
    fn effective_config_round_trips() {
        let text = show_effective_config().unwrap();
        let _: LeadscopeConfig = toml::from_str(&text).unwrap();
    }
}
