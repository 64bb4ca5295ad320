// src/cli/repl.rs — Interactive prompt loop

use tokio::io::{AsyncBufReadExt, BufReader};

use super::build_backend;
use super::render::TerminalView;
use crate::backend::GenerateBackend;
use crate::infra::config::Config;
use crate::infra::errors::GenStreamError;
use crate::session::controller::{with_interrupt, Controller};
use crate::session::request::{parse_max_tokens, RequestForm};
use crate::session::{CancelReason, Outcome, SessionSettings};
use crate::util::preview;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Prompt(String),
    Retry,
    Shorten,
    Model(Option<String>),
    Tokens(Option<String>),
    KeepAlive(Option<String>),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }
        if trimmed == "quit" || trimmed == "exit" {
            return ReplCommand::Quit;
        }
        if !trimmed.starts_with('/') {
            return ReplCommand::Prompt(trimmed.to_string());
        }

        let mut parts = trimmed.splitn(2, ' ');
        let cmd = parts.next().unwrap_or_default();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        match cmd {
            "/retry" => ReplCommand::Retry,
            "/shorten" => ReplCommand::Shorten,
            "/model" => ReplCommand::Model(arg),
            "/tokens" => ReplCommand::Tokens(arg),
            "/keepalive" => ReplCommand::KeepAlive(arg),
            "/status" => ReplCommand::Status,
            "/help" => ReplCommand::Help,
            "/quit" | "/exit" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

type ReplController<B> = Controller<B, TerminalView<std::io::Stdout, std::io::Stderr>>;

/// Run the interactive loop until EOF, `/quit`, or Ctrl-C while idle.
pub async fn run_repl(config: &Config, quiet: bool) -> anyhow::Result<()> {
    let backend = build_backend(&config.server)?;
    let mut controller = Controller::new(
        backend,
        TerminalView::stdio(quiet),
        SessionSettings::from(&config.session),
    )
    .with_form(RequestForm::from(&config.generation));
    let canceller = controller.canceller();

    eprintln!(
        "genstream v{} | {} | /help for commands",
        env!("CARGO_PKG_VERSION"),
        config.server.base_url,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("> ");
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Prompt(prompt) => {
                controller.form_mut().prompt = prompt;
                let result = with_interrupt(canceller.clone(), controller.submit(None)).await;
                report(&mut controller, result);
            }
            ReplCommand::Retry => {
                let retried = with_interrupt(canceller.clone(), controller.retry()).await;
                match retried {
                    Some(result) => report(&mut controller, result),
                    None => controller.view_mut().note("  Nothing to retry yet."),
                }
            }
            ReplCommand::Shorten => {
                controller.shorten();
            }
            ReplCommand::Model(arg) => handle_model(&mut controller, arg).await,
            ReplCommand::Tokens(arg) => handle_tokens(&mut controller, arg),
            ReplCommand::KeepAlive(arg) => handle_keep_alive(&mut controller, arg),
            ReplCommand::Status => show_session_status(&mut controller),
            ReplCommand::Help => print_help(&mut controller),
            ReplCommand::Unknown(cmd) => controller
                .view_mut()
                .note(&format!("Unknown command: {}. Type /help for commands.", cmd)),
        }
    }

    // Nothing should be running here, but never leave a connection behind.
    canceller.cancel(CancelReason::Teardown);
    Ok(())
}

fn report<B: GenerateBackend>(
    controller: &mut ReplController<B>,
    result: Result<Outcome, GenStreamError>,
) {
    match result {
        Ok(outcome) => tracing::debug!(state = ?outcome.state(), "Session finished"),
        // Validation problems were already shown as a hint.
        Err(GenStreamError::Validation(_)) => {}
        Err(e) => controller.view_mut().note(&format!("[error] {}", e)),
    }
}

async fn handle_model<B: GenerateBackend>(controller: &mut ReplController<B>, arg: Option<String>) {
    match arg {
        Some(name) => {
            let model = if name == "-" || name == "default" {
                String::new()
            } else {
                name
            };
            controller.form_mut().model = model;
            let shown = display_model(&controller.form().model).to_string();
            controller
                .view_mut()
                .note(&format!("  Model set to {}", shown));
        }
        None => {
            let current = display_model(&controller.form().model).to_string();
            let listing = controller.backend().list_models().await;
            let view = controller.view_mut();
            view.note(&format!("  Current model: {}", current));
            match listing {
                Ok(models) if models.is_empty() => view.note("  Server reports no models."),
                Ok(models) => {
                    view.note("  Available models:");
                    for m in models {
                        let marker = if m.name == current { " *" } else { "" };
                        view.note(&format!("    {}{}", m.name, marker));
                    }
                }
                Err(e) => view.note(&format!("  Could not list models: {}", e)),
            }
            view.note("  Usage: /model <name>  (/model default to clear)");
        }
    }
}

fn handle_tokens<B: GenerateBackend>(controller: &mut ReplController<B>, arg: Option<String>) {
    if let Some(raw) = arg {
        controller.form_mut().max_tokens = raw;
    }
    let raw = controller.form().max_tokens.clone();
    let effective = parse_max_tokens(&raw);
    controller
        .view_mut()
        .note(&format!("  Max tokens: {} (field: {:?})", effective, raw));
}

fn handle_keep_alive<B: GenerateBackend>(controller: &mut ReplController<B>, arg: Option<String>) {
    if let Some(value) = arg {
        controller.form_mut().keep_alive = value;
    }
    let value = controller.form().keep_alive.clone();
    controller.view_mut().note(&format!("  Keep-alive: {}", value));
}

fn show_session_status<B: GenerateBackend>(controller: &mut ReplController<B>) {
    let form = controller.form().clone();
    let snapshot = controller.history().last().cloned();
    let recorded_at = controller.history().recorded_at();
    let backend = controller.backend().id().to_string();

    let view = controller.view_mut();
    let last_status = view.status().to_string();
    view.note(&format!("  Backend:    {}", backend));
    view.note(&format!("  Model:      {}", display_model(&form.model)));
    view.note(&format!("  Max tokens: {}", form.max_tokens_value()));
    view.note(&format!("  Keep-alive: {}", form.keep_alive));
    view.note(&format!("  Last status: {}", last_status));
    match (snapshot, recorded_at) {
        (Some(req), Some(at)) => view.note(&format!(
            "  Last request: {:?} ({} tokens, sent {})",
            preview(&req.prompt, 40),
            req.num_predict,
            at.format("%H:%M:%S"),
        )),
        _ => view.note("  Last request: (none)"),
    }
}

fn print_help<B: GenerateBackend>(controller: &mut ReplController<B>) {
    let view = controller.view_mut();
    view.note("Type a prompt to generate. Ctrl-C cancels a running generation.");
    view.note("Slash commands:");
    view.note("  /retry             Resend the last request");
    view.note("  /shorten           Halve max tokens (min 32) for a faster answer");
    view.note("  /model [name]      Show models or switch model");
    view.note("  /tokens [n]        Show or set max tokens");
    view.note("  /keepalive [dur]   Show or set keep-alive (e.g. 5m)");
    view.note("  /status            Show current settings and last request");
    view.note("  /help              Show this help");
    view.note("  /quit, quit, exit  Leave");
}

fn display_model(model: &str) -> &str {
    if model.trim().is_empty() {
        "(server default)"
    } else {
        model
    }
}
