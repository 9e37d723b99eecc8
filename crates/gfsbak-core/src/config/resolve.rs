use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GfsbakError, Result};

use super::types::GfsbakConfig;
use super::util::expand_tilde;

/// Where the effective config file came from, for diagnostics.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    System(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Flag(p)
            | ConfigSource::Env(p)
            | ConfigSource::Project(p)
            | ConfigSource::User(p)
            | ConfigSource::System(p) => p,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, path) = match self {
            ConfigSource::Flag(p) => ("--config", p),
            ConfigSource::Env(p) => ("GFSBAK_CONFIG", p),
            ConfigSource::Project(p) => ("project", p),
            ConfigSource::User(p) => ("user", p),
            ConfigSource::System(p) => ("system", p),
        };
        write!(f, "{} ({label})", path.display())
    }
}

/// Candidate config locations in lookup order.
pub fn default_config_search_paths() -> Vec<(PathBuf, &'static str)> {
    let mut paths = vec![(PathBuf::from("gfsbak.yaml"), "project")];
    if let Some(user) = dirs::config_dir().map(|base| base.join("gfsbak").join("config.yaml")) {
        paths.push((user, "user"));
    }
    paths.push((PathBuf::from("/etc/gfsbak/config.yaml"), "system"));
    paths
}

/// Resolve the config file: explicit flag, then `GFSBAK_CONFIG`, then the
/// default search paths. `None` when nothing is found.
pub fn resolve_config_path(flag: Option<&str>) -> Option<ConfigSource> {
    if let Some(flag) = flag {
        return Some(ConfigSource::Flag(PathBuf::from(expand_tilde(flag))));
    }
    if let Ok(env) = std::env::var("GFSBAK_CONFIG") {
        if !env.is_empty() {
            return Some(ConfigSource::Env(PathBuf::from(expand_tilde(&env))));
        }
    }
    for (path, level) in default_config_search_paths() {
        if path.is_file() {
            return Some(match level {
                "project" => ConfigSource::Project(path),
                "user" => ConfigSource::User(path),
                _ => ConfigSource::System(path),
            });
        }
    }
    None
}

/// Load, expand and validate the config file.
pub fn load_config(path: &Path) -> Result<GfsbakConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GfsbakError::Config(format!("cannot read config '{}': {e}", path.display()))
    })?;
    let expanded = expand_env_placeholders(&raw, path)?;
    let mut config: GfsbakConfig = serde_yaml::from_str(&expanded).map_err(|e| {
        GfsbakError::Config(format!("invalid config '{}': {e}", path.display()))
    })?;
    config.storage_root = expand_tilde(&config.storage_root);
    config.validate()?;
    Ok(config)
}

/// Expand `${VAR}` and `${VAR:-default}` placeholders in raw config text.
fn expand_env_placeholders(input: &str, path: &Path) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0usize;

    while let Some(offset) = input[cursor..].find("${") {
        let start = cursor + offset;
        out.push_str(&input[cursor..start]);

        let token_start = start + 2;
        let Some(token_end_rel) = input[token_start..].find('}') else {
            return Err(GfsbakError::Config(format!(
                "unterminated environment placeholder in '{}'",
                path.display()
            )));
        };
        let token_end = token_start + token_end_rel;
        let token = &input[token_start..token_end];

        let (name, fallback) = match token.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (token, None),
        };
        if name.is_empty() {
            return Err(GfsbakError::Config(format!(
                "empty environment placeholder in '{}'",
                path.display()
            )));
        }
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => match fallback {
                Some(fallback) => out.push_str(fallback),
                None => {
                    return Err(GfsbakError::Config(format!(
                        "environment variable '{name}' referenced in '{}' is not set",
                        path.display()
                    )));
                }
            },
        }
        cursor = token_end + 1;
    }

    out.push_str(&input[cursor..]);
    Ok(out)
}

/// A commented starter config, written by `gfsbak config`.
pub fn minimal_config_template() -> &'static str {
    r#"# gfsbak configuration
#
# One node per config file. All backups live under
# <storage_root>/<node>/backups/<tier>/ with chain metadata mirrored
# under <storage_root>/<node>/checkpoints/<tier>/.

node: db1
storage_root: /srv/backups

# Abort any backup or restore once partition usage reaches this.
usage_threshold_percent: 90

# Instances kept per tier, counting the one being produced.
# Omit a tier to keep it unbounded.
retention:
  daily: 7
  weekly: 5
  monthly: 12
  # annually: unbounded

compression:
  daily: false
  weekly: false
  monthly: true
  annually: true

# Credential reference passed to the engine via GFSBAK_CREDENTIAL.
# Values support ${VAR} and ${VAR:-default} expansion.
# credential: "${GFSBAK_CREDENTIAL:-}"

# Engine command templates may be overridden here; the defaults drive
# mariabackup. Run `gfsbak list` after the first backup to verify layout.
# engine:
#   timeout: 2h

# restore:
#   data_dir: /var/lib/mysql
"#
}
