// src/session/driver.rs — The single-task event loop behind a session
//
// Everything that can wake a session is awaited in one `tokio::select!`: the
// cancel signal, the hard timeout, the connection attempt, the next body
// chunk, the silence deadline and the display tick. Each wake-up becomes one
// or more `SessionEvent`s, applied in order until the session is finished.

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use super::request::GenerationRequest;
use super::view::SessionView;
use super::{CancelReason, GenerationSession, SessionEvent, SessionSettings};
use crate::backend::{ByteStream, GenerateBackend};
use crate::infra::errors::GenStreamError;
use crate::stream::parser::{ChunkParser, ParsedItem};

/// What woke the loop.
enum Wake {
    Cancel(Option<CancelReason>),
    CancelClosed,
    Timeout,
    Opened(Result<ByteStream, GenStreamError>),
    Chunk(Option<Result<Vec<u8>, GenStreamError>>),
    Silence,
    Tick,
}

/// Run `session` against `backend` until it reaches a terminal state.
///
/// The connection, once opened, is owned by this function and dropped on
/// return, so every exit path releases it.
pub async fn drive<B, V>(
    backend: &B,
    request: &GenerationRequest,
    session: &mut GenerationSession<'_, V>,
    settings: &SessionSettings,
    cancel: &mut watch::Receiver<Option<CancelReason>>,
) where
    B: GenerateBackend + ?Sized,
    V: SessionView,
{
    let hard_deadline = Instant::now() + settings.hard_timeout;
    let mut parser = ChunkParser::with_failure_limit(settings.max_consecutive_parse_failures);
    let mut ticker = interval_at(Instant::now() + settings.tick_interval, settings.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let open = backend.open_stream(request);
    tokio::pin!(open);
    let mut stream: Option<ByteStream> = None;
    let mut received = 0usize;

    while !session.is_finished() {
        let silence = session.silence_deadline();

        let wake = tokio::select! {
            biased;

            changed = cancel.changed() => match changed {
                Ok(()) => Wake::Cancel(*cancel.borrow_and_update()),
                Err(_) => Wake::CancelClosed,
            },
            _ = sleep_until(hard_deadline) => Wake::Timeout,
            opened = &mut open, if stream.is_none() => Wake::Opened(opened),
            chunk = next_chunk(&mut stream), if stream.is_some() => Wake::Chunk(chunk),
            _ = sleep_until(silence.unwrap_or(hard_deadline)), if silence.is_some() => Wake::Silence,
            _ = ticker.tick() => Wake::Tick,
        };

        match wake {
            Wake::Cancel(Some(reason)) => session.handle_event(SessionEvent::Cancelled(reason)),
            Wake::Cancel(None) => {}
            Wake::CancelClosed => session.handle_event(SessionEvent::Cancelled(CancelReason::Teardown)),
            Wake::Timeout => {
                tracing::warn!(
                    timeout_secs = settings.hard_timeout.as_secs_f64(),
                    "Hard timeout reached, aborting request"
                );
                session.handle_event(SessionEvent::Cancelled(CancelReason::Timeout));
            }
            Wake::Opened(Ok(body)) => {
                tracing::debug!("Response headers received, streaming body");
                stream = Some(body);
            }
            Wake::Opened(Err(e)) => session.handle_event(SessionEvent::Failed(e)),
            Wake::Chunk(Some(Ok(bytes))) => {
                received += bytes.len();
                apply(session, parser.feed(&bytes));
            }
            Wake::Chunk(Some(Err(e))) => session.handle_event(SessionEvent::Failed(e)),
            Wake::Chunk(None) => {
                apply(session, parser.finish());
                stream = None;
                if !session.is_finished() {
                    let err = if received == 0 {
                        GenStreamError::EmptyBody
                    } else {
                        GenStreamError::transport("stream closed before completion")
                    };
                    session.handle_event(SessionEvent::Failed(err));
                }
            }
            Wake::Silence => session.handle_event(SessionEvent::SilenceElapsed),
            Wake::Tick => session.handle_event(SessionEvent::Tick),
        }
    }

    if parser.discarded() > 0 {
        tracing::debug!(discarded = parser.discarded(), "Malformed lines skipped");
    }
}

async fn next_chunk(stream: &mut Option<ByteStream>) -> Option<Result<Vec<u8>, GenStreamError>> {
    match stream.as_mut() {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

/// Feed decoded records to the session in order, stopping at the first
/// terminal one. Records after `done` in the same chunk are ignored.
fn apply<V: SessionView>(session: &mut GenerationSession<'_, V>, items: Vec<ParsedItem>) {
    for item in items {
        if session.is_finished() {
            break;
        }
        let event = match item {
            Ok(record) => SessionEvent::Stream(record),
            Err(e) => SessionEvent::Failed(e),
        };
        session.handle_event(event);
    }
}
