//! `bbs check` command implementation.
//!
//! Runs one navigation through the route table and the gate without
//! starting the server.

use std::path::PathBuf;

use bbs_config::{CliSettings, Config};
use bbs_router::{GateDecision, NavigationGate, RouteMatch, RouteTable};
use clap::Args;

use super::revision_override;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Navigation path, e.g. `/post/42`.
    path: String,

    /// Stored UI preference; omit to simulate a first visit.
    #[arg(long)]
    ui_version: Option<String>,

    /// Path to configuration file (default: auto-discover bbs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the legacy route table.
    #[arg(long)]
    legacy: bool,
}

impl CheckArgs {
    /// Execute the check command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let cli_settings = CliSettings {
            revision: revision_override(self.legacy),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let table = RouteTable::for_revision(config.router.revision);
        let gate = config
            .gate
            .enabled
            .then(|| NavigationGate::new(&config.gate.selection_path));

        output.highlight(&self.path);
        output.info(&describe_match(table.resolve(&self.path).as_ref()));

        match gate.map(|g| g.check(self.ui_version.as_deref(), &self.path)) {
            Some(GateDecision::Redirect(target)) => {
                output.warning(&format!("Gate: redirect to {target}"));
            }
            Some(GateDecision::Proceed) => output.success("Gate: proceed"),
            None => output.success("Gate: disabled"),
        }
        Ok(())
    }
}

/// Human-readable route match, e.g. `Page: PostDetail (id=42)`.
fn describe_match(matched: Option<&RouteMatch>) -> String {
    let Some(matched) = matched else {
        return "Page: no matching route".to_owned();
    };
    if matched.params.is_empty() {
        return format!("Page: {}", matched.page);
    }
    let params: Vec<String> = matched
        .params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!("Page: {} ({})", matched.page, params.join(", "))
}
