// src/cli/mod.rs — CLI definition (clap derive)

pub mod generate;
pub mod render;
pub mod repl;
pub mod status;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::backend::retry::{RetryBackend, RetryConfig};
use crate::backend::HttpBackend;
use crate::infra::config::{Config, ServerConfig};
use crate::infra::errors::GenStreamError;
use crate::session::Outcome;

#[derive(Parser)]
#[command(
    name = "genstream",
    about = "Stream tokens from an NDJSON generation endpoint",
    version
)]
pub struct Cli {
    /// Prompt to generate from (default command when no subcommand given)
    #[arg(trailing_var_arg = true)]
    pub prompt: Vec<String>,

    /// Model name (omit to use the server default)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum tokens to generate
    #[arg(short = 'n', long)]
    pub num_predict: Option<u32>,

    /// How long the server keeps the model loaded (e.g. 5m, 1h)
    #[arg(long)]
    pub keep_alive: Option<String>,

    /// Server base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    /// Only print generated text (and errors)
    #[arg(long)]
    pub quiet: bool,

    /// Debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Read the prompt from stdin
    #[arg(long)]
    pub stdin: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive prompt loop with retry and shorten
    Repl,
    /// List models available on the server
    Models,
    /// Check server reachability and show effective settings
    Status,
}

impl Cli {
    /// Flags win over config file and environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.base_url {
            config.server.base_url = url.clone();
        }
        if let Some(ref model) = self.model {
            config.generation.model = Some(model.clone()).filter(|m| !m.trim().is_empty());
        }
        if let Some(n) = self.num_predict.filter(|n| *n > 0) {
            config.generation.num_predict = n;
        }
        if let Some(ref keep_alive) = self.keep_alive {
            config.generation.keep_alive = keep_alive.clone();
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// HTTP transport with initial-connect retries, as configured.
pub fn build_backend(server: &ServerConfig) -> Result<RetryBackend, GenStreamError> {
    let http = HttpBackend::new(server)?;
    Ok(RetryBackend::with_config(
        Arc::new(http),
        RetryConfig::with_max_retries(server.connect_retries),
    ))
}

/// Process exit code for a finished session.
pub fn exit_code(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Completed(_) => 0,
        Outcome::Cancelled(_) => 130,
        Outcome::Errored(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CancelReason, Summary};

    #[test]
    fn test_parse_one_shot_prompt() {
        let cli = Cli::parse_from(["genstream", "-m", "llama3", "-n", "128", "tell", "me", "a", "joke"]);
        assert_eq!(cli.prompt.join(" "), "tell me a joke");
        assert_eq!(cli.model.as_deref(), Some("llama3"));
        assert_eq!(cli.num_predict, Some(128));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["genstream", "--base-url", "http://h:1", "repl"]);
        assert!(matches!(cli.command, Some(Commands::Repl)));
        assert_eq!(cli.base_url.as_deref(), Some("http://h:1"));
        assert!(matches!(
            Cli::parse_from(["genstream", "models"]).command,
            Some(Commands::Models)
        ));
    }

    #[test]
    fn test_overrides_beat_config() {
        let cli = Cli::parse_from([
            "genstream",
            "--base-url",
            "http://gpu-box:9000",
            "-m",
            "phi3",
            "-n",
            "64",
            "--keep-alive",
            "1h",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.base_url, "http://gpu-box:9000");
        assert_eq!(config.generation.model.as_deref(), Some("phi3"));
        assert_eq!(config.generation.num_predict, 64);
        assert_eq!(config.generation.keep_alive, "1h");
    }

    #[test]
    fn test_zero_num_predict_flag_ignored() {
        let cli = Cli::parse_from(["genstream", "-n", "0"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.generation.num_predict, 512);
    }

    #[test]
    fn test_log_level() {
        assert_eq!(Cli::parse_from(["genstream"]).log_level(), "warn");
        assert_eq!(Cli::parse_from(["genstream", "--verbose"]).log_level(), "debug");
    }

    #[test]
    fn test_exit_codes() {
        let summary = Summary {
            tokens: 1,
            elapsed_secs: 1.0,
            rate: 1.0,
        };
        assert_eq!(exit_code(&Outcome::Completed(summary)), 0);
        assert_eq!(exit_code(&Outcome::Cancelled(CancelReason::User)), 130);
        assert_eq!(exit_code(&Outcome::Cancelled(CancelReason::Timeout)), 130);
        assert_eq!(exit_code(&Outcome::Errored(GenStreamError::EmptyBody)), 1);
    }
}
