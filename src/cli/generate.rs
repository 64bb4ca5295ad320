// src/cli/generate.rs — One-shot generation (the default command)

use tokio::io::{AsyncRead, AsyncReadExt};

use super::render::TerminalView;
use super::{build_backend, exit_code};
use crate::infra::config::Config;
use crate::session::controller::{with_interrupt, Controller};
use crate::session::request::RequestForm;
use crate::session::SessionSettings;

/// Where the prompt comes from.
pub enum PromptSource {
    Args(Vec<String>),
    Stdin,
}

impl PromptSource {
    pub async fn read(self) -> anyhow::Result<String> {
        match self {
            PromptSource::Args(words) => Ok(words.join(" ")),
            PromptSource::Stdin => read_all(tokio::io::stdin()).await,
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> anyhow::Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).await?;
    Ok(buf)
}

/// Generate once and return the process exit code.
pub async fn run_generate(config: &Config, source: PromptSource, quiet: bool) -> anyhow::Result<i32> {
    let prompt = source.read().await?;
    let backend = build_backend(&config.server)?;

    let mut form = RequestForm::from(&config.generation);
    form.prompt = prompt;

    let mut controller = Controller::new(
        backend,
        TerminalView::stdio(quiet),
        SessionSettings::from(&config.session),
    )
    .with_form(form);

    let canceller = controller.canceller();
    let outcome = with_interrupt(canceller, controller.submit(None)).await?;
    Ok(exit_code(&outcome))
}
