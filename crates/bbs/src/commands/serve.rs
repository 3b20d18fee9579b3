//! `bbs serve` command implementation.

use std::path::PathBuf;

use bbs_config::{CliSettings, Config};
use bbs_server::{run_server, server_config_from_bbs_config};
use clap::Args;

use super::revision_override;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover bbs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compiled front-end directory (overrides config).
    #[arg(short, long)]
    dist_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream origin for every proxy rule (overrides config).
    #[arg(long, env = "BBS_UPSTREAM")]
    target: Option<String>,

    /// Serve every page without the UI selection gate.
    #[arg(long)]
    no_gate: bool,

    /// Use the legacy route table (home and post detail only).
    #[arg(long)]
    legacy: bool,

    /// Enable verbose output (request and proxy logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            dist_dir: self.dist_dir,
            target: self.target,
            gate_enabled: self.no_gate.then_some(false),
            revision: revision_override(self.legacy),
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting gateway on http://{}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Front-end bundle: {}",
            config.frontend_resolved.dist_dir.display()
        ));
        for rule in &config.proxy {
            output.info(&format!("Proxy: {} -> {}", rule.prefix, rule.target));
        }
        if config.gate.enabled {
            output.info(&format!(
                "UI selection gate: enabled (cookie '{}', page {})",
                config.gate.preference_key, config.gate.selection_path
            ));
        } else {
            output.info("UI selection gate: disabled");
        }

        let server_config = server_config_from_bbs_config(&config);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
