// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the SafeCode CLI.

pub mod catalog;
pub mod completion;
pub mod scan;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use safecode_core::AppConfig;

use crate::cli::{CatalogCommand, Commands, CompletionCommand, OutputContext};
use crate::output;

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if !ctx.is_interactive() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, ctx: OutputContext, mut config: AppConfig) -> Result<()> {
    match command {
        Commands::Scan {
            files,
            project,
            recommendations_url,
        } => {
            if let Some(url) = recommendations_url {
                config.enrichment.recommendation_url = Some(url);
            }
            let result = scan::run(&files, project.as_deref(), &config, &ctx).await?;
            output::render(&result, &ctx)
        }

        Commands::Catalog(catalog_cmd) => match catalog_cmd {
            CatalogCommand::List => output::render(&catalog::list()?, &ctx),
            CatalogCommand::Show { id } => output::render(&catalog::show(&id)?, &ctx),
        },

        Commands::Rules => output::render(&catalog::rules(&config)?, &ctx),

        Commands::Completion(CompletionCommand::Generate { shell }) => {
            completion::run_generate(shell)
        }
    }
}
