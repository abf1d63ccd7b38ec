//! Render port called by the turn pipeline.
//!
//! The core never draws anything itself. It asks a [`ChatRenderer`] to show
//! or change widgets and keeps the returned handles to address them later.

/// Heading placed before the source list of a finished answer.
pub const SOURCES_HEADING: &str = "📚 Sources: ";

/// Opaque reference to a displayed status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusHandle(u64);

impl StatusHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Opaque reference to a displayed, still growing bot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(u64);

impl MessageHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Phase a status indicator is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPhase {
    Thinking,
    Searching,
    Answering,
}

impl StatusPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusPhase::Thinking => "thinking",
            StatusPhase::Searching => "searching",
            StatusPhase::Answering => "answering",
        }
    }

    /// User-facing text for the indicator.
    pub fn status_text(self) -> &'static str {
        match self {
            StatusPhase::Thinking => "🤔 Processing your question...",
            StatusPhase::Searching => "🔍 Checking sources...",
            StatusPhase::Answering => "✍️ Formulating response...",
        }
    }
}

pub trait ChatRenderer {
    fn render_user_message(&mut self, text: &str);

    fn render_status(&mut self, text: &str, phase: StatusPhase) -> StatusHandle;
    fn update_status(&mut self, handle: StatusHandle, text: &str, phase: StatusPhase);
    fn remove_status(&mut self, handle: StatusHandle);

    fn render_streaming_message(&mut self, initial_text: &str) -> MessageHandle;
    /// Replaces the whole visible text; `text` is a snapshot.
    fn update_streaming_message(&mut self, handle: MessageHandle, text: &str);
    /// Writes the final text (see [`compose_final_text`]) and marks the
    /// message as no longer in progress.
    fn finalize_streaming_message(&mut self, handle: MessageHandle, text: &str, sources: &[String]);

    /// Standalone bot message: fallback answers and errors.
    fn render_message(&mut self, text: &str);

    /// Toggles the submit affordance.
    fn set_input_enabled(&mut self, enabled: bool);
}

/// Final answer text with the sources suffix appended when there are any.
pub fn compose_final_text(text: &str, sources: &[String]) -> String {
    if sources.is_empty() {
        return text.to_string();
    }
    format!("{text}\n\n{SOURCES_HEADING}{}", sources.join(", "))
}
