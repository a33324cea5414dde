//! Optional config file loading. Search order: ./pepcheck.toml, then
//! $XDG_CONFIG_HOME/pepcheck/config.toml (or ~/.config/pepcheck/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// PEP index URL (default https://peps.python.org/).
    pub index_url: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in milliseconds between network requests. Cache hits are not delayed.
    pub request_delay_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Response cache directory. Default: <user cache dir>/pepcheck/http.
    pub cache_dir: Option<PathBuf>,
    /// Disable the response cache entirely.
    pub no_cache: Option<bool>,
    /// Append log lines to this file in addition to stderr.
    pub log_file: Option<PathBuf>,
}

/// Search order: (1) ./pepcheck.toml, (2) $XDG_CONFIG_HOME/pepcheck/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("pepcheck.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("pepcheck").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}
