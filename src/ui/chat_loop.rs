//! Interactive line chat on stdin/stdout.
//!
//! A reader task forwards typed lines over a channel; the session loop owns
//! the [`TurnController`] and runs one turn at a time. The reader claims the
//! shared input gate before forwarding a line, so anything typed or pasted
//! while that line is queued or running is turned away.

use std::error::Error;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::chat_stream::HttpChatTransport;
use crate::core::transport::ChatTransport;
use crate::core::turn::{InputGate, SubmitOutcome, TurnController, TurnGuard};
use crate::ui::renderer::ChatRenderer;
use crate::ui::terminal::TerminalRenderer;
use crate::utils::input::InputLine;

const PROMPT: &str = "> ";
const HELP_TEXT: &str = "Type a question and press Enter. /quit or Ctrl+D leaves the chat.";
const BUSY_NOTICE: &str = "⏳ Still answering the previous question; message not sent.";

/// A typed line together with the gate claim taken for it.
pub type ClaimedLine = (String, TurnGuard);

pub async fn run_chat(server_url: String) -> Result<(), Box<dyn Error>> {
    let transport = HttpChatTransport::new(reqwest::Client::new(), server_url.clone());
    let renderer = TerminalRenderer::new(io::stdout()).with_prompt(PROMPT);
    let mut controller = TurnController::new(transport, renderer);

    println!("💬 Campus chat at {server_url}");
    println!("{HELP_TEXT}");

    let (tx, rx) = mpsc::unbounded_channel();
    let stdin = BufReader::new(tokio::io::stdin());
    tokio::spawn(read_input_lines(stdin, controller.gate(), tx));

    controller.renderer_mut().set_input_enabled(true);
    run_session(&mut controller, rx).await;
    println!();
    Ok(())
}

/// Runs turns for each line until `/quit` or the input closes. Returns the
/// number of turns that ran.
pub async fn run_session<T, R>(
    controller: &mut TurnController<T, R>,
    mut lines: mpsc::UnboundedReceiver<ClaimedLine>,
) -> usize
where
    T: ChatTransport,
    R: ChatRenderer,
{
    let mut turns = 0;
    while let Some((raw, guard)) = lines.recv().await {
        match InputLine::parse(&raw) {
            InputLine::Quit => break,
            InputLine::Help => {
                controller.renderer_mut().render_message(HELP_TEXT);
                controller.renderer_mut().set_input_enabled(true);
            }
            InputLine::Message(text) => match controller.submit_claimed(&text, guard).await {
                SubmitOutcome::Finished(report) => {
                    turns += 1;
                    debug!(end = ?report.end, malformed = report.malformed_records, "Turn done");
                }
                SubmitOutcome::Ignored => controller.renderer_mut().set_input_enabled(true),
                SubmitOutcome::Busy => {}
            },
        }
    }
    turns
}

/// Forwards lines until the input ends or the session goes away. Returns
/// the number of lines rejected because a turn held the gate.
async fn read_input_lines<I>(
    input: I,
    gate: InputGate,
    tx: mpsc::UnboundedSender<ClaimedLine>,
) -> usize
where
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut rejected = 0;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(guard) = gate.try_begin() else {
                    rejected += 1;
                    eprintln!("{BUSY_NOTICE}");
                    continue;
                };
                if tx.send((line, guard)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "Failed to read from stdin");
                break;
            }
        }
    }
    rejected
}
