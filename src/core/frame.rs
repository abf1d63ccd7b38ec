//! Line framing for the chat response body.
//!
//! The server writes one record per line, but the transport hands us bytes in
//! whatever pieces the network produced. [`FrameReassembler`] keeps the
//! unterminated tail of the previous chunk and yields only complete lines.

use memchr::memchr;
use tracing::warn;

/// Turns arbitrarily split byte chunks into complete line records.
///
/// Buffering happens on raw bytes so a multi-byte UTF-8 character split
/// across two chunks is decoded only once both halves have arrived.
#[derive(Debug, Default)]
pub struct FrameReassembler {
    pending: Vec<u8>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every record it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.pending.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = memchr(b'\n', &self.pending[consumed..]) {
            let end = consumed + offset;
            if let Some(record) = decode_record(&self.pending[consumed..end]) {
                records.push(record);
            }
            consumed = end + 1;
        }

        // Compact once per chunk rather than once per line.
        if consumed > 0 {
            self.pending.drain(..consumed);
        }

        records
    }

    /// Flushes the unterminated remainder at end of input.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let remainder = std::mem::take(&mut self.pending);
        decode_record(&remainder)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_record(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_owned()),
        Err(err) => {
            warn!(error = %err, len = bytes.len(), "Dropping stream record with invalid UTF-8");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "data: {\"phase\":\"thinking\"}\n\n\
data: {\"phase\":\"streaming\",\"partial_response\":\"Héllo 📚\"}\n\n\
data: {\"phase\":\"complete\",\"response\":\"Héllo 📚\",\"sources\":[]}\n\n";

    fn reassemble(chunks: &[&[u8]]) -> Vec<String> {
        let mut reassembler = FrameReassembler::new();
        let mut records = Vec::new();
        for chunk in chunks {
            records.extend(reassembler.push(chunk));
        }
        records.extend(reassembler.finish());
        records
    }

    fn unchunked() -> Vec<String> {
        reassemble(&[BODY.as_bytes()])
    }

    #[test]
    fn yields_every_line_of_an_unchunked_body() {
        let records = unchunked();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0], "data: {\"phase\":\"thinking\"}");
        assert_eq!(records[1], "");
        assert!(records[2].contains("Héllo 📚"));
    }

    #[test]
    fn any_two_way_split_matches_unchunked_output() {
        let bytes = BODY.as_bytes();
        let expected = unchunked();
        for split in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(split);
            assert_eq!(reassemble(&[head, tail]), expected, "split at {split}");
        }
    }

    #[test]
    fn three_way_splits_match_unchunked_output() {
        let bytes = BODY.as_bytes();
        let expected = unchunked();
        for first in (0..bytes.len()).step_by(7) {
            for second in (first..=bytes.len()).step_by(5) {
                let chunks = [&bytes[..first], &bytes[first..second], &bytes[second..]];
                assert_eq!(reassemble(&chunks), expected, "splits at {first}/{second}");
            }
        }
    }

    #[test]
    fn single_byte_chunks_reassemble_a_record_spanning_many_reads() {
        let chunks: Vec<&[u8]> = BODY.as_bytes().chunks(1).collect();
        assert_eq!(reassemble(&chunks), unchunked());
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut reassembler = FrameReassembler::new();
        assert!(reassembler.push(b"data: {").is_empty());
        assert!(reassembler.push(b"").is_empty());
        assert_eq!(reassembler.pending_len(), 7);
        assert_eq!(reassembler.push(b"}\n"), vec!["data: {}".to_string()]);
        assert_eq!(reassembler.pending_len(), 0);
    }

    #[test]
    fn chunk_with_several_line_breaks_yields_all_complete_lines() {
        let mut reassembler = FrameReassembler::new();
        let records = reassembler.push(b"one\ntwo\nthree\nfour");
        assert_eq!(records, vec!["one", "two", "three"]);
        assert_eq!(reassembler.finish().as_deref(), Some("four"));
        assert_eq!(reassembler.finish(), None);
    }

    #[test]
    fn finish_without_remainder_yields_nothing() {
        let mut reassembler = FrameReassembler::new();
        assert_eq!(reassembler.push(b"done\n"), vec!["done"]);
        assert_eq!(reassembler.finish(), None);
    }

    #[test]
    fn strips_carriage_returns() {
        let mut reassembler = FrameReassembler::new();
        assert_eq!(reassembler.push(b"data: {}\r\n"), vec!["data: {}"]);
    }

    #[test]
    fn invalid_utf8_record_is_dropped_without_losing_neighbours() {
        let mut reassembler = FrameReassembler::new();
        let records = reassembler.push(b"first\n\xff\xfe\nthird\n");
        assert_eq!(records, vec!["first", "third"]);
    }
}
