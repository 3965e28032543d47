//! Incremental UTF-8 decoding for streaming byte sources.
//!
//! Multi-byte sequences may be split across read chunks; the decoder carries
//! the incomplete suffix forward and makes progress on invalid sequences by
//! emitting U+FFFD.

/// Stateful chunk decoder.
///
/// Invariant: `carry` only ever holds an incomplete UTF-8 suffix (at most 3
/// bytes) left over from the previous chunk.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self { carry: Vec::new() }
    }

    /// Decode a byte chunk, appending the decoded text to `out`.
    ///
    /// Invalid sequences are replaced with U+FFFD and decoding continues; a
    /// trailing incomplete sequence is carried into the next call.
    pub fn push_chunk(&mut self, bytes: &[u8], out: &mut String) {
        if bytes.is_empty() {
            return;
        }

        if self.carry.is_empty() {
            decode_bytes(out, &mut self.carry, bytes);
            return;
        }

        // Resolve the carried suffix by borrowing just enough prefix bytes
        // from this chunk (at most 3), then decode the rest in place.
        let mut remaining = bytes;
        while !self.carry.is_empty() && !remaining.is_empty() {
            let expected_len = utf8_seq_len(self.carry[0]);
            if expected_len == 0 {
                out.push('\u{FFFD}');
                self.carry.clear();
                break;
            }

            let needed = expected_len.saturating_sub(self.carry.len());
            if needed == 0 {
                let tmp = std::mem::take(&mut self.carry);
                decode_bytes(out, &mut self.carry, &tmp);
                continue;
            }

            if remaining.len() < needed {
                self.carry.extend_from_slice(remaining);
                return;
            }

            let mut scratch = [0u8; 8];
            let carry_len = self.carry.len();
            scratch[..carry_len].copy_from_slice(&self.carry);
            scratch[carry_len..carry_len + needed].copy_from_slice(&remaining[..needed]);
            self.carry.clear();

            decode_bytes(out, &mut self.carry, &scratch[..carry_len + needed]);

            remaining = &remaining[needed..];
        }

        if !remaining.is_empty() {
            decode_bytes(out, &mut self.carry, remaining);
        }
    }

    /// Flush any carried bytes into `out` (lossy), so the stream is never
    /// silently truncated at end of input.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.carry));
        self.carry.clear();
    }
}

fn utf8_seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_bytes(out: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                out.push_str(s);
                break;
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    let valid = &bytes[..valid_up_to];
                    out.push_str(std::str::from_utf8(valid).expect("valid UTF-8 prefix"));
                }

                match e.error_len() {
                    Some(len) => {
                        out.push('\u{FFFD}');
                        bytes = &bytes[valid_up_to + len..];
                    }
                    None => {
                        carry.extend_from_slice(&bytes[valid_up_to..]);
                        break;
                    }
                }
            }
        }
    }
}
