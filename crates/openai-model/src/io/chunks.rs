#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// Failure while reading the response body.
#[derive(Debug, PartialEq, Eq)]
pub struct ChunkError {
    pub message: String,
    pub timed_out: bool,
}

/// Source of raw body chunks.
pub enum ByteChunks {
    Response(Response),
    #[cfg(test)]
    Fixed(VecDeque<Bytes>),
}

impl ByteChunks {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        ByteChunks::Response(response)
    }

    #[cfg(test)]
    pub fn fixed<I: IntoIterator<Item = &'static [u8]>>(chunks: I) -> Self {
        ByteChunks::Fixed(chunks.into_iter().map(Bytes::from_static).collect())
    }

    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, ChunkError> {
        match self {
            ByteChunks::Response(response) => {
                response.chunk().await.map_err(|err| ChunkError {
                    message: format!("{err}"),
                    timed_out: err.is_timeout(),
                })
            }
            #[cfg(test)]
            ByteChunks::Fixed(chunks) => Ok(chunks.pop_front()),
        }
    }
}
