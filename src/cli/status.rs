// src/cli/status.rs — `models` and `status` commands

use super::build_backend;
use crate::backend::{GenerateBackend, HttpBackend, ModelInfo, ServerStatus};
use crate::infra::config::Config;
use crate::infra::paths;

/// List models the server knows about.
pub async fn show_models(config: &Config) -> anyhow::Result<()> {
    let backend = build_backend(&config.server)?;
    let models = backend.list_models().await?;

    if models.is_empty() {
        eprintln!("No models reported by {}", config.server.base_url);
        return Ok(());
    }

    let default = config.generation.model.as_deref();
    for line in format_models(&models, default) {
        println!("{}", line);
    }
    Ok(())
}

/// Probe the server and print the effective settings.
pub async fn show_status(config: &Config, config_path: Option<&str>) -> anyhow::Result<()> {
    let backend = HttpBackend::new(&config.server)?;
    let status = backend.probe().await;

    println!("genstream v{}", env!("CARGO_PKG_VERSION"));
    println!();

    match config_path {
        Some(path) => println!("  Config:     {} (loaded)", path),
        None => {
            let default_path = paths::config_file_path();
            if default_path.exists() {
                println!("  Config:     {} (loaded)", default_path.display());
            } else {
                println!("  Config:     (using defaults)");
            }
        }
    }

    println!("  Server:     {}", backend.base_url());
    println!("  Endpoint:   {}", backend.generate_url());
    match &status {
        ServerStatus::Online { status } => println!("  Reachable:  yes (HTTP {})", status),
        ServerStatus::Offline { reason } => println!("  Reachable:  no ({})", reason),
    }

    let generation = &config.generation;
    println!();
    println!(
        "  Model:      {}",
        generation.model.as_deref().unwrap_or("(server default)")
    );
    println!("  Max tokens: {}", generation.num_predict);
    println!("  Keep-alive: {}", generation.keep_alive);

    let session = &config.session;
    println!();
    println!(
        "  Timeouts:   hard {}s, silence hint {:.1}s",
        session.hard_timeout_secs,
        session.silence_threshold_ms as f64 / 1000.0
    );

    if !status.is_online() {
        anyhow::bail!("server at {} is not reachable", backend.base_url());
    }
    Ok(())
}

fn format_models(models: &[ModelInfo], default: Option<&str>) -> Vec<String> {
    let width = models.iter().map(|m| m.name.len()).max().unwrap_or(0);
    models
        .iter()
        .map(|m| {
            let marker = if Some(m.name.as_str()) == default { "*" } else { " " };
            let size = m.size.map(format_bytes).unwrap_or_default();
            format!("{} {:<width$}  {}", marker, m.name, size, width = width)
                .trim_end()
                .to_string()
        })
        .collect()
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1}GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1}MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}
