//! TUI-less "say" command

use std::error::Error;
use std::io;

use crate::core::chat_stream::HttpChatTransport;
use crate::core::phase::TurnEnd;
use crate::core::turn::{SubmitOutcome, TurnController};
use crate::ui::terminal::TerminalRenderer;

pub async fn run_say(prompt: Vec<String>, server_url: String) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: campus-chat say <question>");
        std::process::exit(1);
    }

    let transport = HttpChatTransport::new(reqwest::Client::new(), server_url);
    let mut controller = TurnController::new(transport, TerminalRenderer::new(io::stdout()));

    match controller.submit(&prompt).await {
        SubmitOutcome::Finished(report) => match report.end {
            TurnEnd::Completed | TurnEnd::StreamClosed => Ok(()),
            TurnEnd::ServerError | TurnEnd::TransportFailed => std::process::exit(1),
        },
        SubmitOutcome::Ignored | SubmitOutcome::Busy => Ok(()),
    }
}
