use std::fmt::{self, Display};

use super::{ByteChunks, ChunkError};

#[derive(Debug, PartialEq, Eq)]
pub enum SseError {
    Body(ChunkError),
    InvalidUtf8,
}

impl Display for SseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SseError::Body(err) => write!(f, "failed to read body: {}", err.message),
            SseError::InvalidUtf8 => f.write_str("event is not valid UTF-8"),
        }
    }
}

/// Reads the `data` payloads of server-sent events from a chunk stream.
///
/// Only line feeds terminate lines (carriage returns are dropped on the
/// way in). Comments and fields other than `data` are skipped, multiple
/// `data` lines in one event are joined with a line feed.
pub struct EventReader {
    buf: Vec<u8>,
    chunks: ByteChunks,
}

impl EventReader {
    #[inline]
    pub fn new(chunks: ByteChunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, SseError> {
        loop {
            while let Some(block) = self.take_block() {
                if let Some(data) = parse_block(&block)? {
                    return Ok(Some(data));
                }
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(SseError::Body)?
            else {
                // A trailing partial event is dropped.
                return Ok(None);
            };
            self.buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
        }
    }

    fn take_block(&mut self) -> Option<Vec<u8>> {
        let end = self.buf.windows(2).position(|w| w == b"\n\n")?;
        let block = self.buf[..end].to_vec();
        self.buf.drain(..end + 2);
        Some(block)
    }
}

fn parse_block(block: &[u8]) -> Result<Option<String>, SseError> {
    let block = str::from_utf8(block).map_err(|_| SseError::InvalidUtf8)?;
    let mut data: Option<String> = None;
    for line in block.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    Ok(data)
}
