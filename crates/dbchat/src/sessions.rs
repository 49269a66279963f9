use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dbchat_core::{Agent, QueryAgent};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::session::Session;

/// Sessions untouched for this long are dropped by the sweeper.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration =
    Duration::from_secs(30 * 60);

/// A session shared between requests. The mutex serializes its queries.
pub type SharedSession<A = Agent> = Arc<Mutex<Session<A>>>;

struct Entry<A: QueryAgent> {
    session: SharedSession<A>,
    last_used: Instant,
}

/// All live chat sessions, keyed by a random id.
pub struct SessionRegistry<A: QueryAgent = Agent> {
    sessions: Arc<DashMap<Uuid, Entry<A>>>,
}

impl<A: QueryAgent> SessionRegistry<A> {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Adds `session` under a fresh id.
    pub fn insert(&self, session: Session<A>) -> (Uuid, SharedSession<A>) {
        let id = Uuid::new_v4();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(
            id,
            Entry {
                session: Arc::clone(&shared),
                last_used: Instant::now(),
            },
        );
        debug!("session {id} created, {} live", self.sessions.len());
        (id, shared)
    }

    /// Looks up a session and marks it as used.
    pub fn get(&self, id: &Uuid) -> Option<SharedSession<A>> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_used = Instant::now();
            Arc::clone(&entry.session)
        })
    }

    /// Removes a session, returning whether it existed. Requests already
    /// holding it finish normally.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!("session {id} removed");
        }
        removed
    }

    /// Drops every session unused for at least `idle_timeout`, returning
    /// how many were dropped. A session a request still holds is kept.
    pub fn remove_idle(&self, idle_timeout: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let idle = entry.last_used.elapsed() >= idle_timeout
                && Arc::strong_count(&entry.session) == 1;
            if idle {
                debug!("session {id} expired");
            }
            !idle
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Spawns a task that periodically drops idle sessions. The task runs
    /// until aborted.
    pub fn spawn_sweeper(&self, idle_timeout: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = (idle_timeout / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = registry.remove_idle(idle_timeout);
                if removed > 0 {
                    info!(
                        "expired {removed} idle sessions, {} live",
                        registry.len()
                    );
                }
            }
        })
    }

    /// Returns the number of live sessions.
    #[inline]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns whether there are no sessions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<A: QueryAgent> Clone for SessionRegistry<A> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<A: QueryAgent> Default for SessionRegistry<A> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
