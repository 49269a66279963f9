use std::sync::Arc;

use dbchat_core::{Agent, AgentBuilder, DEFAULT_MAX_ITERATIONS, ModelClient};
use dbchat_model::ModelProvider;
use dbchat_sql::{Database, Dialect, SqlToolkit};

/// The built-in system prompt template.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// Default row limit suggested to the agent.
pub const DEFAULT_TOP_K: usize = 10;

/// How the agents handed to sessions are configured.
#[derive(Clone, Debug)]
pub struct AgentSettings {
    /// Prompt template; `{dialect}` and `{top_k}` are substituted.
    pub system_prompt: String,
    /// Model requests allowed per query.
    pub max_iterations: usize,
    /// Row limit the agent is told to apply.
    pub top_k: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Builds SQL agents around one model and a fixed system prompt.
#[derive(Clone)]
pub struct AgentFactory {
    model_client: ModelClient,
    settings: Arc<AgentSettings>,
}

impl AgentFactory {
    /// Creates a factory using `provider` for every agent.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        settings: AgentSettings,
    ) -> Self {
        Self::with_model_client(ModelClient::new(provider), settings)
    }

    /// Creates a factory sharing an existing model client.
    #[inline]
    pub fn with_model_client(
        model_client: ModelClient,
        settings: AgentSettings,
    ) -> Self {
        Self {
            model_client,
            settings: Arc::new(settings),
        }
    }

    /// Returns the settings.
    #[inline]
    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Builds an agent whose tools are bound to `database`.
    pub fn build(&self, database: Database) -> Agent {
        let prompt = render_prompt(
            &self.settings.system_prompt,
            database.dialect(),
            self.settings.top_k,
        );
        let builder = AgentBuilder::with_model_client(self.model_client.clone())
            .with_system_prompt(prompt)
            .with_max_iterations(self.settings.max_iterations);
        SqlToolkit::new(database).register(builder).build()
    }
}

fn render_prompt(template: &str, dialect: Dialect, top_k: usize) -> String {
    template
        .replace("{dialect}", &dialect.to_string())
        .replace("{top_k}", &top_k.to_string())
}
