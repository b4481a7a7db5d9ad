//! Query path: classify, retrieve, answer from evidence or fall back to the
//! reasoner.

pub mod arbiter;
pub mod classifier;
pub mod grounded;
pub mod llm;
pub mod prompts;
pub mod reasoner;
pub mod selector;
pub mod template;

pub use arbiter::{Answer, Arbiter, ArbiterConfig, FallbackReason, QueryContext, Route};
pub use classifier::{Classification, CueFamily, LayerClassifier};
pub use llm::{GeminiClient, LlmError};
pub use prompts::PromptConfig;
pub use selector::{Evidence, Selection};
