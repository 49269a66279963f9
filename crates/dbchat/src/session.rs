use std::sync::Arc;

use dbchat_core::conversation::{Conversation, Turn};
use dbchat_core::{ProgressSink, QueryAgent};
use serde::Serialize;

/// Default answer size threshold, in characters.
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 1000;

/// Posted instead of answers longer than the threshold.
pub const LARGE_RESULT_ADVISORY: &str =
    "Your query returned a large result set. \
     Consider refining your query or using pagination.";

/// Prefix of the assistant turn recording a failed query.
pub const ERROR_PREFIX: &str = "An error occurred: ";

/// What [`Session::handle_user_query`] did with a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The query was blank; nothing was recorded.
    Ignored,
    /// The agent's answer was recorded verbatim.
    Answered,
    /// The answer was too long and the advisory was recorded instead.
    Oversized,
    /// The agent failed and the error was recorded.
    Failed,
}

/// One user's chat: a conversation and the agent answering in it.
///
/// Queries are handled one at a time (`&mut self`); the user turn is
/// recorded before the agent runs and exactly one assistant turn follows it,
/// whatever the agent does.
pub struct Session<A: QueryAgent> {
    agent: A,
    conversation: Conversation,
    max_output_chars: usize,
}

impl<A: QueryAgent> Session<A> {
    /// Creates a session seeded with the greeting.
    #[inline]
    pub fn new(agent: A) -> Self {
        Self {
            agent,
            conversation: Conversation::default(),
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }

    /// Sets the answer size threshold.
    #[inline]
    pub fn with_max_output_chars(mut self, max_output_chars: usize) -> Self {
        self.max_output_chars = max_output_chars;
        self
    }

    /// Returns the agent.
    #[inline]
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Returns the conversation.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the transcript, oldest turn first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        self.conversation.turns()
    }

    /// Clears the transcript back to the greeting.
    pub fn reset(&mut self) {
        debug!("resetting conversation of {} turns", self.conversation.len());
        self.conversation.reset(Conversation::default_seed());
    }

    /// Records `query`, asks the agent and records its answer, the
    /// size advisory or the error.
    ///
    /// Never fails: agent errors end up in the transcript. `progress`, if
    /// given, is handed to the agent as is.
    pub async fn handle_user_query(
        &mut self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> TurnOutcome {
        if query.trim().is_empty() {
            debug!("ignoring blank query");
            return TurnOutcome::Ignored;
        }

        self.conversation.push(Turn::user(query));

        let answer = self.agent.invoke(query, progress).await;
        let (content, outcome) = match answer {
            Ok(resp) => {
                let chars = resp.output.chars().count();
                if chars > self.max_output_chars {
                    info!("answer of {chars} characters replaced by advisory");
                    (LARGE_RESULT_ADVISORY.to_owned(), TurnOutcome::Oversized)
                } else {
                    (resp.output, TurnOutcome::Answered)
                }
            }
            Err(err) => {
                warn!("query failed: {err}");
                (format!("{ERROR_PREFIX}{err}"), TurnOutcome::Failed)
            }
        };
        self.conversation.push(Turn::assistant(content));
        outcome
    }
}
