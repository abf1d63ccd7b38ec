//! Line-oriented [`ChatRenderer`] for a plain terminal.
//!
//! The status indicator lives on one line that is rewritten in place and
//! erased on removal. Streaming snapshots usually extend what is already on
//! screen, so only the new suffix is printed; a snapshot that rewrites
//! earlier text is reprinted on a fresh line.

use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::ui::renderer::{
    compose_final_text, ChatRenderer, MessageHandle, StatusHandle, StatusPhase,
};

const CLEAR_LINE: &str = "\r\x1b[2K";
const USER_PREFIX: &str = "You: ";
const BOT_PREFIX: &str = "Bot: ";

struct LiveMessage {
    handle: MessageHandle,
    printed: String,
}

pub struct TerminalRenderer<W: Write> {
    out: W,
    prompt: Option<String>,
    next_handle: u64,
    status: Option<StatusHandle>,
    live: Option<LiveMessage>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prompt: None,
            next_handle: 0,
            status: None,
            live: None,
        }
    }

    /// Prints `prompt` whenever input is re-enabled.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        if let Err(err) = self.out.write_fmt(args).and_then(|()| self.out.flush()) {
            debug!(error = %err, "Terminal write failed");
        }
    }

    fn clear_status_line(&mut self) {
        if self.status.take().is_some() {
            self.emit(format_args!("{CLEAR_LINE}"));
        }
    }

    fn show_snapshot(&mut self, text: &str) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if text == live.printed {
            return;
        }
        let suffix = text.strip_prefix(live.printed.as_str()).map(str::to_owned);
        live.printed = text.to_string();
        match suffix {
            Some(suffix) => self.emit(format_args!("{suffix}")),
            None => self.emit(format_args!("\n{BOT_PREFIX}{text}")),
        }
    }
}

impl<W: Write> ChatRenderer for TerminalRenderer<W> {
    fn render_user_message(&mut self, text: &str) {
        self.clear_status_line();
        self.emit(format_args!("{USER_PREFIX}{text}\n"));
    }

    fn render_status(&mut self, text: &str, _phase: StatusPhase) -> StatusHandle {
        let handle = StatusHandle::new(self.allocate());
        self.status = Some(handle);
        self.emit(format_args!("{CLEAR_LINE}{text}"));
        handle
    }

    fn update_status(&mut self, handle: StatusHandle, text: &str, _phase: StatusPhase) {
        if self.status == Some(handle) {
            self.emit(format_args!("{CLEAR_LINE}{text}"));
        }
    }

    fn remove_status(&mut self, handle: StatusHandle) {
        if self.status == Some(handle) {
            self.clear_status_line();
        }
    }

    fn render_streaming_message(&mut self, initial_text: &str) -> MessageHandle {
        self.clear_status_line();
        let handle = MessageHandle::new(self.allocate());
        self.live = Some(LiveMessage {
            handle,
            printed: initial_text.to_string(),
        });
        self.emit(format_args!("{BOT_PREFIX}{initial_text}"));
        handle
    }

    fn update_streaming_message(&mut self, handle: MessageHandle, text: &str) {
        if self.live.as_ref().map(|live| live.handle) == Some(handle) {
            self.show_snapshot(text);
        }
    }

    fn finalize_streaming_message(
        &mut self,
        handle: MessageHandle,
        text: &str,
        sources: &[String],
    ) {
        if self.live.as_ref().map(|live| live.handle) != Some(handle) {
            return;
        }
        self.show_snapshot(&compose_final_text(text, sources));
        self.live = None;
        self.emit(format_args!("\n"));
    }

    fn render_message(&mut self, text: &str) {
        self.clear_status_line();
        self.emit(format_args!("{BOT_PREFIX}{text}\n"));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        if !enabled {
            return;
        }
        if let Some(prompt) = self.prompt.clone() {
            self.emit(format_args!("{prompt}"));
        }
    }
}
