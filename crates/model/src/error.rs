use std::fmt::{self, Display};

/// Coarse classification of a model provider failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credentials were rejected.
    Unauthorized,
    /// The provider throttled the request.
    RateLimited,
    /// The request or the produced content was blocked by moderation.
    Moderated,
    /// The provider did not answer in time.
    Timeout,
    /// The provider answered with something that could not be understood.
    Protocol,
    /// Anything else.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::Moderated => "moderated",
            ErrorKind::Timeout => "timed out",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Other => "model error",
        };
        f.write_str(s)
    }
}
