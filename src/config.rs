use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

const CONFIG_ENV: &str = "LANTERN_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "lantern.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Settings consumed by every connection handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory that request paths are appended to.
    pub root: PathBuf,
    /// Served when the request path is exactly `/`.
    pub default_document: String,
    /// Body of every 404 response. Relative paths resolve against the
    /// process working directory, not `root`.
    pub not_found_document: PathBuf,
    /// Value of the `Server:` header.
    pub server_name: String,
    /// Replacement for `<cs371server>` in text responses.
    pub server_version: String,
    /// Longest silence tolerated while waiting for request bytes. The timer
    /// restarts whenever data arrives. `None` waits forever.
    pub request_idle_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            default_document: "index.html".to_string(),
            not_found_document: PathBuf::from("404.html"),
            server_name: "Lantern".to_string(),
            server_version: "Lantern 2.0".to_string(),
            request_idle_timeout_ms: None,
        }
    }
}

impl Config {
    /// Loads the configuration file named by `LANTERN_CONFIG`, falling back
    /// to `lantern.yaml` and then to built-in defaults. `LISTEN` overrides
    /// the listen address in every case.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
