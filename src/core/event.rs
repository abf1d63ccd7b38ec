//! Decoding of `data: ` records into typed phase events.

use tracing::{debug, warn};

use crate::api::StreamPayload;

/// Prefix that marks a line as a protocol record.
pub const RECORD_PREFIX: &str = "data: ";

/// Text used when an `error` record carries no message of its own.
pub const DEFAULT_SERVER_ERROR: &str = "Processing error";

const LOGGED_RECORD_LIMIT: usize = 120;

/// One decoded protocol event. Exactly one phase per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Thinking,
    Searching,
    Answering,
    /// Full snapshot of the answer so far, not an increment.
    StreamingDelta {
        partial_response: String,
    },
    Complete {
        response: String,
        sources: Vec<String>,
    },
    Error {
        error: String,
    },
}

impl StreamEvent {
    /// Maps a payload onto its event. Returns the raw tag for phases this
    /// client does not know.
    pub fn from_payload(payload: StreamPayload) -> Result<Self, String> {
        let event = match payload.phase.as_str() {
            "thinking" => StreamEvent::Thinking,
            "searching" => StreamEvent::Searching,
            "answering" => StreamEvent::Answering,
            "streaming" => StreamEvent::StreamingDelta {
                partial_response: payload.partial_response.unwrap_or_default(),
            },
            "complete" => StreamEvent::Complete {
                response: payload.response.unwrap_or_default(),
                sources: payload.sources.unwrap_or_default(),
            },
            "error" => StreamEvent::Error {
                error: payload
                    .error
                    .unwrap_or_else(|| DEFAULT_SERVER_ERROR.to_string()),
            },
            _ => return Err(payload.phase),
        };
        Ok(event)
    }

    pub fn phase(&self) -> &'static str {
        match self {
            StreamEvent::Thinking => "thinking",
            StreamEvent::Searching => "searching",
            StreamEvent::Answering => "answering",
            StreamEvent::StreamingDelta { .. } => "streaming",
            StreamEvent::Complete { .. } => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}

/// What a single line turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(StreamEvent),
    /// Not a record (keep-alive, comment, blank separator) or an empty payload.
    Ignored,
    /// Carried the prefix but not a parseable payload.
    Malformed,
    /// Parsed, but the phase tag has no meaning here.
    Unrecognized(String),
}

impl Decoded {
    pub fn into_event(self) -> Option<StreamEvent> {
        match self {
            Decoded::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Decodes one reassembled line. Never fails: bad records are reported as
/// [`Decoded::Malformed`] and logged.
pub fn decode_line(line: &str) -> Decoded {
    let Some(payload) = line.strip_prefix(RECORD_PREFIX) else {
        return Decoded::Ignored;
    };
    if payload.trim().is_empty() {
        return Decoded::Ignored;
    }

    match serde_json::from_str::<StreamPayload>(payload) {
        Ok(parsed) => match StreamEvent::from_payload(parsed) {
            Ok(event) => Decoded::Event(event),
            Err(phase) => {
                debug!(phase = %phase, "Ignoring record with unrecognized phase");
                Decoded::Unrecognized(phase)
            }
        },
        Err(err) => {
            warn!(
                error = %err,
                record = %preview(payload),
                "Dropping malformed stream record"
            );
            Decoded::Malformed
        }
    }
}

fn preview(payload: &str) -> String {
    if payload.chars().count() <= LOGGED_RECORD_LIMIT {
        return payload.to_string();
    }
    let mut clipped: String = payload.chars().take(LOGGED_RECORD_LIMIT).collect();
    clipped.push('…');
    clipped
}

/// Stateful wrapper around [`decode_line`] that keeps drop counters for the
/// turn report.
#[derive(Debug, Default)]
pub struct EventDecoder {
    malformed: usize,
    unrecognized: usize,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, line: &str) -> Option<StreamEvent> {
        match decode_line(line) {
            Decoded::Event(event) => Some(event),
            Decoded::Ignored => None,
            Decoded::Malformed => {
                self.malformed += 1;
                None
            }
            Decoded::Unrecognized(_) => {
                self.unrecognized += 1;
                None
            }
        }
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn unrecognized(&self) -> usize {
        self.unrecognized
    }
}
