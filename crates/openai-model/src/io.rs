mod chunks;
mod sse;

pub use chunks::{ByteChunks, ChunkError};
pub use sse::{EventReader, SseError};
