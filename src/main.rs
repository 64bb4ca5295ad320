// src/main.rs — genstream entry point

use clap::Parser;

use genstream::cli::generate::{self, PromptSource};
use genstream::cli::{repl, status, Cli, Commands};
use genstream::infra::config::Config;
use genstream::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Respects RUST_LOG / GENSTREAM_LOG
    logger::init_logging(cli.log_level());

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    // Falls back to defaults if no config.toml
    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = Config::load_from(std::path::Path::new(path))?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    match cli.command {
        Some(Commands::Repl) => {
            repl::run_repl(&config, cli.quiet).await?;
            Ok(0)
        }
        Some(Commands::Models) => {
            status::show_models(&config).await?;
            Ok(0)
        }
        Some(Commands::Status) => {
            status::show_status(&config, cli.config.as_deref()).await?;
            Ok(0)
        }
        None => {
            let source = if cli.stdin {
                PromptSource::Stdin
            } else if !cli.prompt.is_empty() {
                PromptSource::Args(cli.prompt.clone())
            } else {
                anyhow::bail!("no prompt given. Pass PROMPT, use --stdin, or run `genstream repl`");
            };
            generate::run_generate(&config, source, cli.quiet).await
        }
    }
}
