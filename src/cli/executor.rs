//! Command executor for dispatching CLI commands

use super::handlers::{ScrapeCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::scraper::{NormalizeOptions, SiteRegistry};

/// Execute a CLI command with merged, validated settings.
///
/// No subcommand means `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Scrape {
            site,
            expand_multi,
            output,
            headed: _,
        }) => {
            let normalize = NormalizeOptions {
                expand_multi: *expand_multi,
            };
            let summary = ScrapeCommandHandler::from_settings(&settings)
                .execute(site, normalize, output.as_deref())
                .await?;
            tracing::info!(
                task_id = %summary.task_id,
                records = summary.records,
                "Scrape command finished"
            );
            Ok(())
        }
        Some(Commands::Sites) => {
            for site in SiteRegistry::with_defaults().supported() {
                println!("{site}");
            }
            Ok(())
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Serve {
        host: Some(host),
        port: Some(port),
        ..
    }) = &cli.command
        && *port < 1024
        && host == "0.0.0.0"
    {
        eprintln!("Warning: Binding to 0.0.0.0 on port {port} requires root privileges");
    }

    Ok(())
}
