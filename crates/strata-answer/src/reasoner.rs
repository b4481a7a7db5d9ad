use tracing::{info, warn};

use strata_core::traits::LanguageModel;

use crate::prompts::PromptConfig;
use crate::template::inspect_reasoner_output;

/// Result of the contextless fallback. Every variant carries user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonerOutcome {
    Answer(String),
    /// The backend answered with nothing.
    Sparse(String),
    /// The backend call failed.
    Unavailable(String),
}

impl ReasonerOutcome {
    pub fn into_text(self) -> String {
        match self {
            ReasonerOutcome::Answer(t) | ReasonerOutcome::Sparse(t) | ReasonerOutcome::Unavailable(t) => t,
        }
    }
}

/// Labeled model-prior answers without any retrieved context. Terminal: it
/// never routes anywhere else.
pub struct Reasoner<'a> {
    backend: &'a dyn LanguageModel,
    prompts: &'a PromptConfig,
}

impl<'a> Reasoner<'a> {
    pub fn new(backend: &'a dyn LanguageModel, prompts: &'a PromptConfig) -> Self {
        Self { backend, prompts }
    }

    pub fn reason(&self, question: &str) -> ReasonerOutcome {
        let prompt = self.prompts.reasoner_prompt(question);
        match self.backend.complete(&prompt) {
            Err(e) => {
                warn!(model = self.backend.model_id(), error = %format!("{e:#}"), "reasoner backend failed");
                ReasonerOutcome::Unavailable(self.prompts.reasoner_unavailable_message.clone())
            }
            Ok(text) if text.trim().is_empty() => {
                info!("reasoner returned an empty completion");
                ReasonerOutcome::Sparse(self.prompts.sparse_space_message.clone())
            }
            Ok(text) => {
                let text = text.trim().to_string();
                let report = inspect_reasoner_output(&text, self.prompts);
                if !report.is_compliant() {
                    warn!(?report, "reasoner output does not follow the template");
                }
                ReasonerOutcome::Answer(text)
            }
        }
    }
}
