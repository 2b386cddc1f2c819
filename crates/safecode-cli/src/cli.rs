// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for SafeCode.
//!
//! Uses clap's derive API with noun-verb subcommands.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Extended help text for the generate subcommand with shell-specific examples.
const COMPLETION_GENERATE_HELP: &str = r#"EXAMPLES

  bash
    Add to ~/.bashrc or ~/.bash_profile:
      eval "$(safecode completion generate bash)"

  zsh
    mkdir -p ~/.zsh/completions
    safecode completion generate zsh > ~/.zsh/completions/_safecode

  fish
    safecode completion generate fish > ~/.config/fish/completions/safecode.fish
"#;

/// Extended help text for the scan subcommand.
const SCAN_HELP: &str = r"INPUTS

  *.json                  Syntax trees in the SafeCode interchange format
  *.properties, *.yml     Configuration files, read as plain text

The project configuration defaults to ./safecode-config.json when present.
";

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// YAML output for programmatic consumption
    Yaml,
    /// SARIF 2.1.0 for code-scanning dashboards (scan only, JSON elsewhere)
    Sarif,
}

/// Global output configuration passed to commands.
#[derive(Clone, Debug)]
pub struct OutputContext {
    /// Output format
    pub format: OutputFormat,
    /// Suppress non-essential output (spinners, summaries)
    pub quiet: bool,
    /// Show recommendations and performance impacts
    pub verbose: bool,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, colors) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet && self.format == OutputFormat::Text
    }
}

/// SafeCode - static security and compliance detection for Java syntax trees.
#[derive(Parser)]
#[command(name = "safecode")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output (spinners, summaries)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug-level logging, full finding details)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan syntax trees and configuration files
    #[command(after_long_help = SCAN_HELP)]
    Scan {
        /// Files to scan
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Project configuration file (compliance regimes, custom settings)
        #[arg(long, value_name = "PATH")]
        project: Option<PathBuf>,

        /// Recommendation service endpoint (overrides the config file)
        #[arg(long, value_name = "URL")]
        recommendations_url: Option<String>,
    },

    /// Inspect the vulnerability catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// List the detector rules
    Rules,

    /// Generate shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

/// Catalog subcommands
#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List every vulnerability definition
    List,

    /// Show one definition with its recommendations and performance impacts
    Show {
        /// Definition id (e.g., 101)
        id: String,
    },
}

/// Completion subcommands
#[derive(Subcommand)]
pub enum CompletionCommand {
    /// Generate completion script for a shell (output to stdout)
    #[command(after_long_help = COMPLETION_GENERATE_HELP)]
    Generate {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
