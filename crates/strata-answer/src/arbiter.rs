//! Routing between grounded answers and the reasoner.
//!
//! `ask` always produces user-facing text. Nothing is retried: every backend
//! failure is logged and turned into a route.

use std::sync::Arc;

use tracing::{debug, info, warn};

use strata_core::config::{ClassifierSettings, RetrievalSettings};
use strata_core::traits::{LanguageModel, VectorIndex};
use strata_core::types::Chunk;
use strata_embed::CachedEmbedder;

use crate::classifier::LayerClassifier;
use crate::grounded::{GroundedGenerator, GroundedOutcome, Rejection};
use crate::prompts::PromptConfig;
use crate::reasoner::Reasoner;
use crate::selector::{Evidence, EvidenceSelector, Selection};

/// Process-wide state built once at startup, shared read-only by every query.
#[derive(Clone)]
pub struct QueryContext {
    pub embedder: Arc<CachedEmbedder>,
    pub index: Arc<dyn VectorIndex>,
    /// Row `i` of `index` belongs to `chunks[i]`.
    pub chunks: Arc<[Chunk]>,
    pub backend: Arc<dyn LanguageModel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NoCandidates,
    NoAllowedEvidence,
    RetrievalFailed,
    EmptyCompletion,
    SelfDeclaredInsufficient,
    BackendFailed,
}

impl From<Rejection> for FallbackReason {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::EmptyCompletion => FallbackReason::EmptyCompletion,
            Rejection::SelfDeclaredInsufficient => FallbackReason::SelfDeclaredInsufficient,
            Rejection::BackendFailed => FallbackReason::BackendFailed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    EmptyInput,
    Grounded { evidence: Vec<Evidence> },
    Reasoned { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub route: Route,
}

#[derive(Debug, Clone, Default)]
pub struct ArbiterConfig {
    pub prompts: PromptConfig,
    pub retrieval: RetrievalSettings,
    pub classifier: ClassifierSettings,
}

pub struct Arbiter {
    prompts: PromptConfig,
    retrieval: RetrievalSettings,
    classifier: LayerClassifier,
}

impl Arbiter {
    pub fn new(config: ArbiterConfig) -> Self {
        Self {
            classifier: LayerClassifier::new(&config.classifier),
            prompts: config.prompts,
            retrieval: config.retrieval,
        }
    }

    pub fn ask(&self, ctx: &QueryContext, question: &str) -> String {
        self.answer(ctx, question).text
    }

    pub fn answer(&self, ctx: &QueryContext, question: &str) -> Answer {
        if question.trim().is_empty() {
            return Answer { text: self.prompts.empty_input_message.clone(), route: Route::EmptyInput };
        }

        let classification = self.classifier.classify(question);
        debug!(family = ?classification.family, allowed = ?classification.allowed, "question classified");

        let selector = EvidenceSelector::new(&ctx.embedder, ctx.index.as_ref(), &ctx.chunks, &self.retrieval);
        let evidence = match selector.select(question, &classification) {
            Ok(Selection::Evidence(evidence)) => evidence,
            Ok(Selection::NoCandidates) => return self.reason(ctx, question, FallbackReason::NoCandidates),
            Ok(Selection::NoAllowedEvidence) => return self.reason(ctx, question, FallbackReason::NoAllowedEvidence),
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                return self.reason(ctx, question, FallbackReason::RetrievalFailed);
            }
        };

        match GroundedGenerator::new(ctx.backend.as_ref(), &self.prompts).generate(question, &evidence) {
            GroundedOutcome::Accepted(text) => {
                info!(evidence = evidence.len(), "answered from local evidence");
                Answer { text, route: Route::Grounded { evidence } }
            }
            GroundedOutcome::Rejected(rejection) => self.reason(ctx, question, rejection.into()),
        }
    }

    fn reason(&self, ctx: &QueryContext, question: &str, reason: FallbackReason) -> Answer {
        info!(?reason, "falling back to reasoner");
        let outcome = Reasoner::new(ctx.backend.as_ref(), &self.prompts).reason(question);
        Answer { text: outcome.into_text(), route: Route::Reasoned { reason } }
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new(ArbiterConfig::default())
    }
}
