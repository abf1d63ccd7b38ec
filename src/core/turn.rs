//! One conversational turn, end to end.
//!
//! [`TurnController::submit`] renders the user's message, opens the stream
//! and pushes every chunk through reassembly, decoding and the phase
//! machine, strictly in arrival order. Whatever happens on the wire, the
//! submit affordance is disabled once when the turn starts and re-enabled
//! once when it ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::event::EventDecoder;
use crate::core::frame::FrameReassembler;
use crate::core::phase::{TurnEnd, TurnState};
use crate::core::transport::{ChatTransport, TransportError};
use crate::ui::renderer::ChatRenderer;

/// Shared "a turn is in flight" flag.
///
/// Clones observe the same flag, so an input reader on another task can
/// reject lines while a turn runs.
#[derive(Debug, Clone, Default)]
pub struct InputGate {
    busy: Arc<AtomicBool>,
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claims the gate, or `None` when a turn already holds it.
    pub fn try_begin(&self) -> Option<TurnGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TurnGuard {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Releases the [`InputGate`] on drop.
#[must_use = "dropping the guard releases the input gate immediately"]
#[derive(Debug)]
pub struct TurnGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub end: TurnEnd,
    /// Events that reached the phase machine, terminal one included.
    pub events: usize,
    pub malformed_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Another turn holds the input gate; nothing happened.
    Busy,
    Finished(TurnReport),
}

pub struct TurnController<T, R> {
    transport: T,
    renderer: R,
    gate: InputGate,
}

impl<T, R> TurnController<T, R>
where
    T: ChatTransport,
    R: ChatRenderer,
{
    pub fn new(transport: T, renderer: R) -> Self {
        Self::with_gate(transport, renderer, InputGate::new())
    }

    pub fn with_gate(transport: T, renderer: R, gate: InputGate) -> Self {
        Self {
            transport,
            renderer,
            gate,
        }
    }

    pub fn gate(&self) -> InputGate {
        self.gate.clone()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        let Some(guard) = self.gate.try_begin() else {
            debug!("Rejecting submit while a turn is in flight");
            return SubmitOutcome::Busy;
        };
        self.submit_claimed(text, guard).await
    }

    /// Runs a turn under a guard the caller already took from
    /// [`Self::gate`]. The gate is released when the turn ends.
    pub async fn submit_claimed(&mut self, text: &str, guard: TurnGuard) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.renderer.set_input_enabled(false);
        self.renderer.render_user_message(message);

        let report = self.run_turn(message).await;
        debug!(end = ?report.end, events = report.events, "Turn finished");

        drop(guard);
        self.renderer.set_input_enabled(true);
        SubmitOutcome::Finished(report)
    }

    async fn run_turn(&mut self, message: &str) -> TurnReport {
        let mut pipeline = Pipeline::default();

        match self.transport.open(message).await {
            Ok(mut body) => {
                while let Some(chunk) = body.next().await {
                    match chunk {
                        Ok(bytes) => {
                            let records = pipeline.reassembler.push(&bytes);
                            if pipeline.feed(records, &mut self.renderer) {
                                break;
                            }
                        }
                        Err(err) => {
                            pipeline.fail(&err, &mut self.renderer);
                            break;
                        }
                    }
                }
                // Dropping `body` here stops reading once the turn is decided.
            }
            Err(err) => pipeline.fail(&err, &mut self.renderer),
        }

        if !pipeline.state.is_finished() {
            let tail = pipeline.reassembler.finish();
            pipeline.feed(tail, &mut self.renderer);
        }
        pipeline.state.close(&mut self.renderer);

        pipeline.report()
    }
}

#[derive(Default)]
struct Pipeline {
    reassembler: FrameReassembler,
    decoder: EventDecoder,
    state: TurnState,
    events: usize,
}

impl Pipeline {
    /// Returns `true` once the turn is finished.
    fn feed<I, R>(&mut self, records: I, renderer: &mut R) -> bool
    where
        I: IntoIterator<Item = String>,
        R: ChatRenderer + ?Sized,
    {
        for record in records {
            if let Some(event) = self.decoder.decode(&record) {
                self.events += 1;
                self.state.apply(event, renderer);
                if self.state.is_finished() {
                    return true;
                }
            }
        }
        false
    }

    fn fail<R>(&mut self, err: &TransportError, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        warn!(error = %err, events = self.events, "Chat stream failed");
        self.state.abort(&err.user_message(), renderer);
    }

    fn report(&self) -> TurnReport {
        TurnReport {
            end: self.state.end().unwrap_or(TurnEnd::StreamClosed),
            events: self.events,
            malformed_records: self.decoder.malformed(),
        }
    }
}
