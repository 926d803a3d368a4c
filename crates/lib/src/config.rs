//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.frame-bridge/config.json`) and environment.
//! CLI flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Rosbridge server connection and subscription options.
    #[serde(default)]
    pub rosbridge: RosbridgeConfig,

    /// Namespace prefix for the image topic (e.g. "/kitware"). Overridden by FRAME_BRIDGE_WORKSPACE env.
    #[serde(default)]
    pub workspace: String,

    /// Browser viewer and display element settings.
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Rosbridge WebSocket URL and subscribe options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosbridgeConfig {
    /// WebSocket URL of the rosbridge server (default "ws://localhost:9090"). Overridden by ROSBRIDGE_URL env.
    #[serde(default = "default_rosbridge_url")]
    pub url: String,

    /// Minimum ms between messages the server sends for this subscription (0 = every message).
    #[serde(default)]
    pub throttle_rate: u32,

    /// Server-side queue length for the subscription (0 = rosbridge default).
    #[serde(default)]
    pub queue_length: u32,
}

/// Viewer bind address, port, and the id of the image element it renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Port for HTTP and WebSocket (default 8080).
    #[serde(default = "default_viewer_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_viewer_bind")]
    pub bind: String,

    /// Id of the image element frames are written to (default "hl-image").
    #[serde(default = "default_element_id")]
    pub element_id: String,
}

fn default_rosbridge_url() -> String {
    "ws://localhost:9090".to_string()
}

fn default_viewer_port() -> u16 {
    8080
}

fn default_viewer_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_element_id() -> String {
    crate::display::DEFAULT_ELEMENT_ID.to_string()
}

impl Default for RosbridgeConfig {
    fn default() -> Self {
        Self {
            url: default_rosbridge_url(),
            throttle_rate: 0,
            queue_length: 0,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            port: default_viewer_port(),
            bind: default_viewer_bind(),
            element_id: default_element_id(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Trimmed value, or None when unset or blank.
fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the rosbridge URL: the CLI flag wins, then env ROSBRIDGE_URL, then config.
pub fn resolve_rosbridge_url(config: &Config, flag: Option<String>) -> String {
    rosbridge_url_from(config, flag, env_var)
}

fn rosbridge_url_from(
    config: &Config,
    flag: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    flag.or_else(|| non_empty(env("ROSBRIDGE_URL")))
        .unwrap_or_else(|| config.rosbridge.url.trim().to_string())
}

/// Resolve the workspace prefix: the CLI flag wins, then env FRAME_BRIDGE_WORKSPACE, then config.
/// Only surrounding whitespace is trimmed, so an unset workspace yields topics rooted at "/".
pub fn resolve_workspace(config: &Config, flag: Option<String>) -> String {
    workspace_from(config, flag, env_var)
}

fn workspace_from(
    config: &Config,
    flag: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    flag.or_else(|| non_empty(env("FRAME_BRIDGE_WORKSPACE")))
        .unwrap_or_else(|| config.workspace.trim().to_string())
}

/// Resolve config path from env FRAME_BRIDGE_CONFIG_PATH or the default `~/.frame-bridge/config.json`.
pub fn default_config_path() -> PathBuf {
    config_path_from(env_var, dirs::home_dir())
}

fn config_path_from(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> PathBuf {
    non_empty(env("FRAME_BRIDGE_CONFIG_PATH"))
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            home.map(|h| h.join(".frame-bridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, FRAME_BRIDGE_CONFIG_PATH, or the default. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
