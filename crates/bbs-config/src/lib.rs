//! Configuration management for the BBS gateway.
//!
//! Parses `bbs.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `proxy[].target`

mod expand;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use bbs_router::Revision;
use bbs_router::{DEFAULT_PREFERENCE_KEY, DEFAULT_SELECTION_PATH};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override SPA bundle directory.
    pub dist_dir: Option<PathBuf>,
    /// Override the upstream origin of every proxy rule.
    pub target: Option<String>,
    /// Override the navigation gate switch.
    pub gate_enabled: Option<bool>,
    /// Override the route table revision.
    pub revision: Option<Revision>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "bbs.toml";

/// Remote backend the dev proxy forwards to.
pub const DEFAULT_UPSTREAM: &str = "https://bbs.zhiyuhub.top";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Frontend bundle configuration (paths are relative strings from TOML).
    frontend: FrontendConfigRaw,
    /// Router configuration.
    pub router: RouterConfig,
    /// Navigation gate configuration.
    pub gate: GateConfig,
    /// Proxy rules, checked in order.
    pub proxy: Vec<ProxyRuleConfig>,

    /// Resolved frontend configuration (set after loading).
    #[serde(skip)]
    pub frontend_resolved: FrontendConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Extra host names accepted in the `Host` header.
    ///
    /// Localhost and IP literals are always accepted. A leading `.` also
    /// accepts subdomains; the single entry `"all"` disables the check.
    pub allowed_hosts: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            allowed_hosts: vec!["newui.bbs.zhiyuhub.top".to_owned()],
        }
    }
}

/// Raw frontend configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FrontendConfigRaw {
    dist_dir: Option<String>,
}

/// Resolved frontend configuration with absolute paths.
#[derive(Debug, Default)]
pub struct FrontendConfig {
    /// Directory holding the compiled SPA (`index.html` and assets).
    pub dist_dir: PathBuf,
}

/// Router configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Route table revision.
    pub revision: Revision,
}

/// Navigation gate configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Whether page navigations are gated.
    pub enabled: bool,
    /// Page that first-time visitors are sent to.
    pub selection_path: String,
    /// Name of the cookie holding the UI preference flag.
    pub preference_key: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selection_path: DEFAULT_SELECTION_PATH.to_owned(),
            preference_key: DEFAULT_PREFERENCE_KEY.to_owned(),
        }
    }
}

/// One reverse-proxy rule.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProxyRuleConfig {
    /// Path prefix that selects this rule.
    pub prefix: String,
    /// Upstream origin, e.g. `https://bbs.zhiyuhub.top`.
    pub target: String,
    /// Rewrite `Host` (and `Origin`) to the upstream.
    #[serde(default = "default_true")]
    pub change_origin: bool,
    /// Verify the upstream TLS certificate.
    #[serde(default)]
    pub secure: bool,
    /// Optional path rewrite applied before forwarding.
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,
}

/// Path rewrite: first match of regex `from` is replaced with `to`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Regular expression matched against the request path.
    pub from: String,
    /// Replacement text.
    pub to: String,
}

fn default_true() -> bool {
    true
}

/// Rules used when the config has no `[[proxy]]` tables.
///
/// The `/api` rewrite maps the prefix onto itself; it is kept so a deployment
/// can point it somewhere else without adding a rule.
pub fn default_proxy_rules() -> Vec<ProxyRuleConfig> {
    vec![
        ProxyRuleConfig {
            prefix: "/api".to_owned(),
            target: DEFAULT_UPSTREAM.to_owned(),
            change_origin: true,
            secure: false,
            rewrite: Some(RewriteConfig {
                from: "^/api".to_owned(),
                to: "/api".to_owned(),
            }),
        },
        ProxyRuleConfig {
            prefix: "/client".to_owned(),
            target: DEFAULT_UPSTREAM.to_owned(),
            change_origin: true,
            secure: false,
            rewrite: None,
        },
    ]
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`proxy.target`").
        field: String,
        /// Error message (e.g., "${`BBS_UPSTREAM`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `bbs.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// result is validated again.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(dist_dir) = &settings.dist_dir {
            self.frontend_resolved.dist_dir.clone_from(dist_dir);
        }
        if let Some(target) = &settings.target {
            for rule in &mut self.proxy {
                rule.target.clone_from(target);
            }
        }
        if let Some(enabled) = settings.gate_enabled {
            self.gate.enabled = enabled;
        }
        if let Some(revision) = settings.revision {
            self.router.revision = revision;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            frontend: FrontendConfigRaw::default(),
            router: RouterConfig::default(),
            gate: GateConfig::default(),
            proxy: default_proxy_rules(),
            frontend_resolved: FrontendConfig {
                dist_dir: base.join("dist"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after applying CLI
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_gate()?;
        self.validate_proxy()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // The dev server listens on a fixed port; 0 would pick a random one
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        for host in &self.server.allowed_hosts {
            require_non_empty(host.trim_start_matches('.'), "server.allowed_hosts")?;
        }

        Ok(())
    }

    fn validate_gate(&self) -> Result<(), ConfigError> {
        if !self.gate.selection_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "gate.selection_path must start with '/'".to_owned(),
            ));
        }
        require_non_empty(&self.gate.preference_key, "gate.preference_key")?;
        Ok(())
    }

    fn validate_proxy(&self) -> Result<(), ConfigError> {
        let mut prefixes = HashSet::new();
        for rule in &self.proxy {
            if !rule.prefix.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "proxy.prefix '{}' must start with '/'",
                    rule.prefix
                )));
            }
            if !prefixes.insert(rule.prefix.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "proxy.prefix '{}' is configured twice",
                    rule.prefix
                )));
            }
            require_non_empty(&rule.target, "proxy.target")?;
            require_http_url(&rule.target, "proxy.target")?;
            if let Some(rewrite) = &rule.rewrite {
                regex::Regex::new(&rewrite.from).map_err(|e| {
                    ConfigError::Validation(format!("proxy.rewrite.from is not a valid regex: {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        for rule in &mut self.proxy {
            rule.target = expand::expand_env(&rule.target, "proxy.target")?;
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.frontend_resolved = FrontendConfig {
            dist_dir: config_dir.join(self.frontend.dist_dir.as_deref().unwrap_or("dist")),
        };
    }
}
