//! Interpretation of lines typed at the chat prompt.

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Message(String),
    Help,
    Quit,
}

impl InputLine {
    pub fn parse(raw: &str) -> Self {
        let line = sanitize_text_input(raw);
        match line.trim() {
            "/quit" | "/exit" => InputLine::Quit,
            "/help" => InputLine::Help,
            _ => InputLine::Message(line),
        }
    }
}

/// Strips terminal control characters from a typed line.
///
/// Tabs become a single space; everything else below U+0020 (and DEL) is
/// dropped so escape sequences never reach the server or the screen.
pub fn sanitize_text_input(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\t' => sanitized.push(' '),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }

    sanitized
}
