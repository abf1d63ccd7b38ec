//! Per-turn phase state machine.
//!
//! `Idle -> AwaitingStatus -> Streaming -> Finished`, driven by decoded
//! [`StreamEvent`]s. The machine owns the only status and streaming handles
//! of a turn, which keeps at most one of each alive no matter how the
//! server orders its events.

use tracing::debug;

use crate::core::event::StreamEvent;
use crate::ui::renderer::{
    compose_final_text, ChatRenderer, MessageHandle, StatusHandle, StatusPhase,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnStatus {
    #[default]
    Idle,
    AwaitingStatus,
    Streaming,
    Finished,
}

/// Why a turn reached `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEnd {
    Completed,
    ServerError,
    TransportFailed,
    /// Body ended without a terminal event.
    StreamClosed,
}

#[derive(Debug, Default)]
pub struct TurnState {
    status: TurnStatus,
    status_handle: Option<StatusHandle>,
    response_handle: Option<MessageHandle>,
    accumulated_text: String,
    end: Option<TurnEnd>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == TurnStatus::Finished
    }

    /// Latest snapshot (or final text) of the answer. Replaced, never appended.
    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    pub fn end(&self) -> Option<TurnEnd> {
        self.end
    }

    pub fn status_handle(&self) -> Option<StatusHandle> {
        self.status_handle
    }

    pub fn response_handle(&self) -> Option<MessageHandle> {
        self.response_handle
    }

    /// Applies one event and returns the resulting status.
    pub fn apply<R>(&mut self, event: StreamEvent, renderer: &mut R) -> TurnStatus
    where
        R: ChatRenderer + ?Sized,
    {
        if self.is_finished() {
            debug!(phase = event.phase(), "Ignoring event after turn finished");
            return self.status;
        }

        let before = self.status;
        match event {
            StreamEvent::Thinking => self.show_status(StatusPhase::Thinking, renderer),
            StreamEvent::Searching => self.refresh_status(StatusPhase::Searching, renderer),
            StreamEvent::Answering => self.refresh_status(StatusPhase::Answering, renderer),
            StreamEvent::StreamingDelta { partial_response } => {
                self.stream(partial_response, renderer)
            }
            StreamEvent::Complete { response, sources } => {
                self.complete(response, &sources, renderer)
            }
            StreamEvent::Error { error } => self.fail(&error, TurnEnd::ServerError, renderer),
        }

        if before != self.status {
            debug!(from = ?before, to = ?self.status, "Turn phase transition");
        }
        self.status
    }

    /// Transport failure: same effects as a server `error` event carrying
    /// `message`. No-op once finished.
    pub fn abort<R>(&mut self, message: &str, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        if self.is_finished() {
            return;
        }
        self.fail(message, TurnEnd::TransportFailed, renderer);
    }

    /// The body ended without `complete` or `error`. Tears down live widgets
    /// without rendering a message.
    pub fn close<R>(&mut self, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        if self.is_finished() {
            return;
        }
        self.clear_status(renderer);
        if let Some(handle) = self.response_handle.take() {
            renderer.finalize_streaming_message(handle, &self.accumulated_text, &[]);
        }
        self.finish(TurnEnd::StreamClosed);
    }

    fn show_status<R>(&mut self, phase: StatusPhase, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        match self.status {
            TurnStatus::Idle => {
                let handle = renderer.render_status(phase.status_text(), phase);
                self.status_handle = Some(handle);
                self.status = TurnStatus::AwaitingStatus;
            }
            // A repeated `thinking` reuses the live indicator.
            TurnStatus::AwaitingStatus => self.refresh_status(phase, renderer),
            TurnStatus::Streaming | TurnStatus::Finished => {}
        }
    }

    fn refresh_status<R>(&mut self, phase: StatusPhase, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        if self.status != TurnStatus::AwaitingStatus {
            return;
        }
        if let Some(handle) = self.status_handle {
            renderer.update_status(handle, phase.status_text(), phase);
        }
    }

    fn stream<R>(&mut self, snapshot: String, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        match self.response_handle {
            Some(handle) => {
                if snapshot != self.accumulated_text {
                    renderer.update_streaming_message(handle, &snapshot);
                }
            }
            None => {
                self.clear_status(renderer);
                self.response_handle = Some(renderer.render_streaming_message(&snapshot));
            }
        }
        self.accumulated_text = snapshot;
        self.status = TurnStatus::Streaming;
    }

    fn complete<R>(&mut self, response: String, sources: &[String], renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        self.clear_status(renderer);
        // The terminal payload is authoritative over the last delta.
        match self.response_handle.take() {
            Some(handle) => renderer.finalize_streaming_message(handle, &response, sources),
            None => renderer.render_message(&compose_final_text(&response, sources)),
        }
        self.accumulated_text = response;
        self.finish(TurnEnd::Completed);
    }

    fn fail<R>(&mut self, message: &str, end: TurnEnd, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        self.clear_status(renderer);
        if let Some(handle) = self.response_handle.take() {
            renderer.finalize_streaming_message(handle, &self.accumulated_text, &[]);
        }
        renderer.render_message(message);
        self.finish(end);
    }

    fn clear_status<R>(&mut self, renderer: &mut R)
    where
        R: ChatRenderer + ?Sized,
    {
        if let Some(handle) = self.status_handle.take() {
            renderer.remove_status(handle);
        }
    }

    fn finish(&mut self, end: TurnEnd) {
        self.status = TurnStatus::Finished;
        self.end = Some(end);
    }
}
