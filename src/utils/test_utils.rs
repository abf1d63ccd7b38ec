use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::core::transport::{ByteStream, ChatTransport, TransportError};
use crate::ui::renderer::{
    compose_final_text, ChatRenderer, MessageHandle, StatusHandle, StatusPhase,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOp {
    UserMessage(String),
    StatusShown {
        handle: u64,
        text: String,
        phase: StatusPhase,
    },
    StatusUpdated {
        handle: u64,
        text: String,
        phase: StatusPhase,
    },
    StatusRemoved(u64),
    StreamingStarted {
        handle: u64,
        text: String,
    },
    StreamingUpdated {
        handle: u64,
        text: String,
    },
    StreamingFinalized {
        handle: u64,
        content: String,
    },
    Message(String),
    InputEnabled(bool),
}

/// Renderer that records every call. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    ops: Arc<Mutex<Vec<RenderOp>>>,
    next_handle: u64,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&RenderOp) -> bool) -> usize {
        self.ops().iter().filter(|op| predicate(op)).count()
    }

    /// Bot bubbles as they would finally read on screen, in display order.
    pub fn bot_messages(&self) -> Vec<String> {
        let mut bubbles: Vec<(Option<u64>, String)> = Vec::new();
        for op in self.ops() {
            match op {
                RenderOp::StreamingStarted { handle, text } => bubbles.push((Some(handle), text)),
                RenderOp::StreamingUpdated { handle, text }
                | RenderOp::StreamingFinalized {
                    handle,
                    content: text,
                } => {
                    if let Some(bubble) = bubbles.iter_mut().find(|(id, _)| *id == Some(handle)) {
                        bubble.1 = text;
                    }
                }
                RenderOp::Message(text) => bubbles.push((None, text)),
                _ => {}
            }
        }
        bubbles.into_iter().map(|(_, text)| text).collect()
    }

    fn record(&self, op: RenderOp) {
        self.ops.lock().unwrap().push(op);
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl ChatRenderer for RecordingRenderer {
    fn render_user_message(&mut self, text: &str) {
        self.record(RenderOp::UserMessage(text.to_string()));
    }

    fn render_status(&mut self, text: &str, phase: StatusPhase) -> StatusHandle {
        let handle = self.allocate();
        self.record(RenderOp::StatusShown {
            handle,
            text: text.to_string(),
            phase,
        });
        StatusHandle::new(handle)
    }

    fn update_status(&mut self, handle: StatusHandle, text: &str, phase: StatusPhase) {
        self.record(RenderOp::StatusUpdated {
            handle: handle.id(),
            text: text.to_string(),
            phase,
        });
    }

    fn remove_status(&mut self, handle: StatusHandle) {
        self.record(RenderOp::StatusRemoved(handle.id()));
    }

    fn render_streaming_message(&mut self, initial_text: &str) -> MessageHandle {
        let handle = self.allocate();
        self.record(RenderOp::StreamingStarted {
            handle,
            text: initial_text.to_string(),
        });
        MessageHandle::new(handle)
    }

    fn update_streaming_message(&mut self, handle: MessageHandle, text: &str) {
        self.record(RenderOp::StreamingUpdated {
            handle: handle.id(),
            text: text.to_string(),
        });
    }

    fn finalize_streaming_message(
        &mut self,
        handle: MessageHandle,
        text: &str,
        sources: &[String],
    ) {
        self.record(RenderOp::StreamingFinalized {
            handle: handle.id(),
            content: compose_final_text(text, sources),
        });
    }

    fn render_message(&mut self, text: &str) {
        self.record(RenderOp::Message(text.to_string()));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.record(RenderOp::InputEnabled(enabled));
    }
}

/// Transport that replays a fixed body, or refuses to connect.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    outcome: Result<Vec<Result<Vec<u8>, TransportError>>, TransportError>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::items(
            chunks
                .into_iter()
                .map(|chunk| Ok(chunk.as_ref().to_vec()))
                .collect(),
        )
    }

    pub fn items(items: Vec<Result<Vec<u8>, TransportError>>) -> Self {
        Self {
            outcome: Ok(items),
            requests: Arc::default(),
        }
    }

    pub fn refusing(err: TransportError) -> Self {
        Self {
            outcome: Err(err),
            requests: Arc::default(),
        }
    }

    /// Messages passed to `open`, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, message: &str) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(message.to_string());
        let items = self.outcome.clone()?;
        Ok(stream::iter(items).boxed())
    }
}

/// Transport whose body is fed by the test through a channel.
pub struct ChannelTransport {
    body: Mutex<Option<mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>>>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                body: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl ChatTransport for ChannelTransport {
    async fn open(&self, _message: &str) -> Result<ByteStream, TransportError> {
        let rx = self
            .body
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| TransportError::Connect("body already taken".to_string()))?;
        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed())
    }
}

/// One canned HTTP/1.1 response for [`spawn_http_server`].
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub chunks: Vec<Vec<u8>>,
    /// Close the socket mid-body instead of sending the final chunk.
    pub truncate: bool,
}

impl HttpReply {
    pub fn chunked<I, B>(status: u16, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self {
            status,
            headers: Vec::new(),
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            truncate: false,
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::chunked(status, [body]).with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncate = true;
        self
    }
}

/// Serves `replies` in order, one per connection, on a loopback port.
/// Returns the base URL and the raw text of every request received.
pub async fn spawn_http_server(replies: Vec<HttpReply>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        for reply in replies {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);
            write_reply(&mut socket, &reply).await;
        }
    });

    (base_url, requests)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let Ok(n) = socket.read(&mut buf).await else {
            break;
        };
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(header_end) = find_header_end(&raw) {
            let head = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}

async fn write_reply(socket: &mut TcpStream, reply: &HttpReply) {
    let mut head = format!(
        "HTTP/1.1 {} Reply\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n",
        reply.status
    );
    for (name, value) in &reply.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let _ = socket.write_all(head.as_bytes()).await;

    // A zero-length chunk would end the body early.
    for chunk in reply.chunks.iter().filter(|chunk| !chunk.is_empty()) {
        let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
        frame.extend_from_slice(chunk);
        frame.extend_from_slice(b"\r\n");
        let _ = socket.write_all(&frame).await;
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    if reply.truncate {
        let _ = socket.write_all(b"40\r\npartial").await;
    } else {
        let _ = socket.write_all(b"0\r\n\r\n").await;
    }
    let _ = socket.shutdown().await;
}
