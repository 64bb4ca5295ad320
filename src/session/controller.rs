// src/session/controller.rs — Owns the form, the snapshot and the one live session

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::Instrument;

use super::driver;
use super::history::RequestHistory;
use super::request::{GenerationRequest, RequestForm};
use super::view::{Controls, SessionView, Status};
use super::{CancelReason, GenerationSession, Outcome, SessionSettings};
use crate::backend::GenerateBackend;
use crate::infra::errors::GenStreamError;

type CancelSender = watch::Sender<Option<CancelReason>>;
type CancelSlot = Arc<Mutex<Option<CancelSender>>>;

fn lock_slot(slot: &CancelSlot) -> MutexGuard<'_, Option<CancelSender>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle for aborting the active session from elsewhere (a signal handler,
/// another task). Cheap to clone; a no-op while nothing is running.
#[derive(Clone)]
pub struct Canceller {
    slot: CancelSlot,
}

impl Canceller {
    /// Returns true if a running session received the signal.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        match lock_slot(&self.slot).as_ref() {
            Some(tx) => tx.send(Some(reason)).is_ok(),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        lock_slot(&self.slot).is_some()
    }
}

/// Clears the cancel slot when a dispatch ends, however it ends.
struct ActiveSlot {
    slot: CancelSlot,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        lock_slot(&self.slot).take();
    }
}

pub struct Controller<B: GenerateBackend, V: SessionView> {
    backend: B,
    view: V,
    settings: SessionSettings,
    form: RequestForm,
    history: RequestHistory,
    slot: CancelSlot,
}

impl<B: GenerateBackend, V: SessionView> Controller<B, V> {
    pub fn new(backend: B, mut view: V, settings: SessionSettings) -> Self {
        view.set_status(&Status::Idle);
        view.set_controls(Controls::idle(false));
        Self {
            backend,
            view,
            settings,
            form: RequestForm::default(),
            history: RequestHistory::new(),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_form(mut self, form: RequestForm) -> Self {
        self.form = form;
        self
    }

    pub fn form(&self) -> &RequestForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RequestForm {
        &mut self.form
    }

    pub fn history(&self) -> &RequestHistory {
        &self.history
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            slot: self.slot.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        lock_slot(&self.slot).is_some()
    }

    /// Build a request (from the form, or `override_request` when given),
    /// snapshot it and run one session to its end.
    ///
    /// Validation failures return before anything is sent. Cancellation and
    /// transport failures are not errors here: they are the `Outcome`.
    pub async fn submit(
        &mut self,
        override_request: Option<GenerationRequest>,
    ) -> Result<Outcome, GenStreamError> {
        if self.is_active() {
            return Err(GenStreamError::Busy);
        }

        let built = match override_request {
            Some(request) => request.normalized(),
            None => self.form.build(),
        };
        let request = match built {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Rejected submission: {}", e);
                self.view.set_hint(Some(&e.to_string()));
                return Err(e);
            }
        };

        self.history.record(&request);
        Ok(self.dispatch(request).await)
    }

    /// Replay the last snapshot verbatim. `None` when nothing was sent yet.
    pub async fn retry(&mut self) -> Option<Result<Outcome, GenStreamError>> {
        let snapshot = self.history.replay()?;
        self.form.restore(&snapshot);
        Some(self.submit(Some(snapshot)).await)
    }

    /// Halve the max-token field (minimum 32) and the snapshot with it.
    pub fn shorten(&mut self) -> u32 {
        let next = self.history.shorten(&mut self.form);
        tracing::debug!(num_predict = next, "Shortened max tokens");
        self.view.set_hint(Some(&format!(
            "Max tokens reduced to {}; retry for a faster answer",
            next
        )));
        next
    }

    async fn dispatch(&mut self, request: GenerationRequest) -> Outcome {
        let (tx, mut rx) = watch::channel(None);
        *lock_slot(&self.slot) = Some(tx);
        let _active = ActiveSlot {
            slot: self.slot.clone(),
        };

        let retry_available = self.history.has_snapshot();
        let mut session = GenerationSession::start(&mut self.view, &self.settings, retry_available);
        let span = tracing::info_span!(
            "session",
            id = %session.id(),
            backend = self.backend.id(),
            model = request.model.as_deref().unwrap_or("default"),
        );

        driver::drive(&self.backend, &request, &mut session, &self.settings, &mut rx)
            .instrument(span)
            .await;
        session.finish()
    }
}

/// Await `fut`, turning each Ctrl-C into a user cancel of whatever session the
/// canceller points at.
pub async fn with_interrupt<F: Future>(canceller: Canceller, fut: F) -> F::Output {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return out,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_err() {
                    return fut.await;
                }
                if canceller.cancel(CancelReason::User) {
                    tracing::debug!("Interrupt: cancelling active session");
                }
            }
        }
    }
}
