//! `bbs routes` command implementation.

use std::path::PathBuf;

use bbs_config::{CliSettings, Config};
use bbs_router::RouteTable;
use clap::Args;

use super::revision_override;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the routes command.
#[derive(Args)]
pub(crate) struct RoutesArgs {
    /// Path to configuration file (default: auto-discover bbs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show the legacy route table.
    #[arg(long)]
    legacy: bool,
}

impl RoutesArgs {
    /// Execute the routes command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let cli_settings = CliSettings {
            revision: revision_override(self.legacy),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let table = RouteTable::for_revision(config.router.revision);

        output.highlight(&format!("Routes ({:?})", config.router.revision));
        for line in route_lines(&table) {
            output.info(&line);
        }
        Ok(())
    }
}

/// One aligned line per route: pattern, page, and input parameter.
fn route_lines(table: &RouteTable) -> Vec<String> {
    let width = table.routes().map(|r| r.pattern().len()).max().unwrap_or(0);
    table
        .routes()
        .map(|route| match route.param_name() {
            Some(param) => format!(
                "  {:width$}  {} (input: {param})",
                route.pattern(),
                route.page()
            ),
            None => format!("  {:width$}  {}", route.pattern(), route.page()),
        })
        .collect()
}
