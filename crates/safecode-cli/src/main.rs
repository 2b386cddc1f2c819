// SPDX-License-Identifier: Apache-2.0

//! SafeCode - static security and compliance detection for Java syntax trees.
//!
//! A thin shell over `safecode-core`: reads trees and configuration files
//! named on the command line, runs a scan session and renders the report.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use safecode_core::config;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let output_ctx = OutputContext::from_cli(cli.output, cli.quiet, cli.verbose);

    let result = async {
        let config = config::load_config().context("Failed to load configuration")?;
        debug!("Configuration loaded successfully");
        commands::run(cli.command, output_ctx, config).await
    }
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", errors::format_error(&e));
            ExitCode::FAILURE
        }
    }
}
