use tracing::{info, warn};

use strata_core::traits::LanguageModel;

use crate::prompts::{render_context, PromptConfig};
use crate::selector::Evidence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundedOutcome {
    Accepted(String),
    Rejected(Rejection),
}

/// Why a grounded answer was not returned to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyCompletion,
    SelfDeclaredInsufficient,
    BackendFailed,
}

/// Answers strictly from the selected evidence. Never fails: every problem
/// becomes a [`Rejection`] for the arbiter to route.
pub struct GroundedGenerator<'a> {
    backend: &'a dyn LanguageModel,
    prompts: &'a PromptConfig,
}

impl<'a> GroundedGenerator<'a> {
    pub fn new(backend: &'a dyn LanguageModel, prompts: &'a PromptConfig) -> Self {
        Self { backend, prompts }
    }

    pub fn generate(&self, question: &str, evidence: &[Evidence]) -> GroundedOutcome {
        let prompt = self.prompts.grounded_prompt(&render_context(evidence), question);
        let completion = match self.backend.complete(&prompt) {
            Ok(text) => text,
            Err(e) => {
                warn!(model = self.backend.model_id(), error = %format!("{e:#}"), "grounded generation failed");
                return GroundedOutcome::Rejected(Rejection::BackendFailed);
            }
        };
        let text = completion.trim();
        if text.is_empty() {
            info!("grounded completion was empty");
            return GroundedOutcome::Rejected(Rejection::EmptyCompletion);
        }
        if self.prompts.is_refusal(text) {
            info!("grounded completion declared the context insufficient");
            return GroundedOutcome::Rejected(Rejection::SelfDeclaredInsufficient);
        }
        GroundedOutcome::Accepted(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use strata_core::types::{Chunk, Layer};

    struct Canned { reply: anyhow::Result<String>, seen: Mutex<Vec<String>> }

    impl Canned {
        fn ok(reply: &str) -> Self { Self { reply: Ok(reply.to_string()), seen: Mutex::new(Vec::new()) } }
        fn failing() -> Self { Self { reply: Err(anyhow::anyhow!("503 upstream")), seen: Mutex::new(Vec::new()) } }
    }

    impl LanguageModel for Canned {
        fn model_id(&self) -> &str { "canned" }
        fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn evidence() -> Vec<Evidence> {
        vec![Evidence {
            id: 0,
            distance: 0.2,
            chunk: Chunk { text: "Tři tvůrci podepsali exkluzivitu.".into(), source: "raw/a.txt".into(), layer: Layer::Raw },
        }]
    }

    fn run(backend: &Canned) -> GroundedOutcome {
        let prompts = PromptConfig::default();
        GroundedGenerator::new(backend, &prompts).generate("Co bylo zaznamenáno?", &evidence())
    }

    #[test]
    fn accepted_answer_is_trimmed_text() {
        let backend = Canned::ok("  Tři případy exkluzivity.\n");
        assert_eq!(run(&backend), GroundedOutcome::Accepted("Tři případy exkluzivity.".into()));
        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].contains("[LAYER: raw]\nTři tvůrci podepsali exkluzivitu."));
    }

    #[test]
    fn blank_completion_is_rejected() {
        assert_eq!(run(&Canned::ok(" \n ")), GroundedOutcome::Rejected(Rejection::EmptyCompletion));
    }

    #[test]
    fn refusal_token_anywhere_rejects() {
        let backend = Canned::ok("Částečně ano, ale NEDOLOŽENO - odpověď není v datech.");
        assert_eq!(run(&backend), GroundedOutcome::Rejected(Rejection::SelfDeclaredInsufficient));
    }

    #[test]
    fn backend_error_is_rejected_not_raised() {
        assert_eq!(run(&Canned::failing()), GroundedOutcome::Rejected(Rejection::BackendFailed));
    }
}
