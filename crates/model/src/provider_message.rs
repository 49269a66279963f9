use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-specific assistant message carried through the history.
///
/// Providers that need their own wire representation of an earlier
/// assistant turn (for example one that requested tool calls) hand one of
/// these back after a response completes. The agent stores it as-is and
/// passes it back in the next request, where only the originating provider
/// knows how to unwrap it.
///
/// Two values are equal when their ids are equal.
#[derive(Clone)]
pub struct ProviderMessage {
    id: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ProviderMessage {
    /// Wraps `payload` under a conversation-unique `id`.
    pub fn new<T: Send + Sync + 'static>(id: impl Into<String>, payload: T) -> Self {
        Self {
            id: Arc::from(id.into()),
            payload: Arc::new(payload),
        }
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Borrows the payload if it has type `T`.
    #[inline]
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl Debug for ProviderMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderMessage").field(&self.id).finish()
    }
}

impl PartialEq for ProviderMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProviderMessage {}

impl Hash for ProviderMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
