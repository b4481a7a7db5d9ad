use crate::types::Neighbor;

/// Text to unit-length vector. Implementations must return vectors of `dim()`
/// floats, L2-normalized, for every input.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model, recorded in the index manifest.
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Read-only nearest-neighbour search, ascending by distance, at most `k` hits.
pub trait VectorIndex: Send + Sync {
    fn len(&self) -> usize;
    fn dim(&self) -> usize;
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prompt in, completion out. No streaming, no determinism guarantee.
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
