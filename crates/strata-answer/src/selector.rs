//! Retrieval, layer filtering and ranking of the grounded context.
//!
//! Vector distance decides which chunks are candidates; the layer priority
//! decides their final order. There is no relevance threshold: after
//! filtering, evidence is either present or absent.

use thiserror::Error;
use tracing::{debug, warn};

use strata_core::config::RetrievalSettings;
use strata_core::traits::VectorIndex;
use strata_core::types::{Chunk, ChunkId, Layer};
use strata_embed::CachedEmbedder;

use crate::classifier::Classification;

/// A chunk admitted to the context, with where it came from in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub id: ChunkId,
    pub distance: f32,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Non-empty, layer-compliant, ranked and bounded by `top_k`.
    Evidence(Vec<Evidence>),
    /// The index returned no neighbours at all.
    NoCandidates,
    /// Neighbours exist but none is in an allowed layer.
    NoAllowedEvidence,
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("vector search failed: {0}")]
    Search(String),
}

pub struct EvidenceSelector<'a> {
    embedder: &'a CachedEmbedder,
    index: &'a dyn VectorIndex,
    chunks: &'a [Chunk],
    settings: &'a RetrievalSettings,
}

impl<'a> EvidenceSelector<'a> {
    pub fn new(
        embedder: &'a CachedEmbedder,
        index: &'a dyn VectorIndex,
        chunks: &'a [Chunk],
        settings: &'a RetrievalSettings,
    ) -> Self {
        Self { embedder, index, chunks, settings }
    }

    pub fn select(&self, question: &str, classification: &Classification) -> Result<Selection, RetrievalError> {
        let query = self
            .embedder
            .embed_query(question)
            .map_err(|e| RetrievalError::Embedding(format!("{e:#}")))?;
        let neighbors = self
            .index
            .search(&query, self.settings.faiss_k)
            .map_err(|e| RetrievalError::Search(format!("{e:#}")))?;
        if neighbors.is_empty() {
            return Ok(Selection::NoCandidates);
        }

        let mut candidates: Vec<Evidence> = Vec::with_capacity(neighbors.len());
        for n in neighbors {
            let Some(chunk) = self.chunks.get(n.id) else {
                warn!(id = n.id, chunks = self.chunks.len(), "index returned a row with no chunk record");
                continue;
            };
            if classification.allows(chunk.layer) {
                candidates.push(Evidence { id: n.id, distance: n.distance, chunk: chunk.clone() });
            }
        }
        if candidates.is_empty() {
            return Ok(Selection::NoAllowedEvidence);
        }

        // stable: equal priority keeps distance order
        candidates.sort_by_key(|e| self.priority_rank(e.chunk.layer));
        candidates.truncate(self.settings.top_k);
        debug!(
            selected = candidates.len(),
            layers = ?candidates.iter().map(|e| e.chunk.layer).collect::<Vec<_>>(),
            "evidence selected"
        );
        Ok(Selection::Evidence(candidates))
    }

    /// Layers missing from the priority list rank after all listed ones.
    fn priority_rank(&self, layer: Layer) -> usize {
        self.settings
            .layer_priority
            .iter()
            .position(|&l| l == layer)
            .unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::traits::Embedder;
    use strata_core::types::Neighbor;

    struct Fixed;

    impl Embedder for Fixed {
        fn embedder_id(&self) -> &str { "fixed" }
        fn dim(&self) -> usize { 1 }
        fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    /// Returns the given rows in the given order, whatever the query.
    struct Ranked(Vec<ChunkId>);

    impl VectorIndex for Ranked {
        fn len(&self) -> usize { self.0.len() }
        fn dim(&self) -> usize { 1 }
        fn search(&self, _query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
            Ok(self.0.iter().take(k).enumerate().map(|(i, &id)| Neighbor { distance: i as f32, id }).collect())
        }
    }

    fn chunk(layer: Layer, text: &str) -> Chunk {
        Chunk { text: text.into(), source: format!("{layer}/{text}.txt"), layer }
    }

    fn corpus() -> Vec<Chunk> {
        vec![
            chunk(Layer::Raw, "r0"),
            chunk(Layer::Synth, "s1"),
            chunk(Layer::Meta, "m2"),
            chunk(Layer::Raw, "r3"),
            chunk(Layer::Synth, "s4"),
            chunk(Layer::Meta, "m5"),
        ]
    }

    fn allowed(layers: &[Layer]) -> Classification {
        Classification { family: crate::classifier::CueFamily::Default, allowed: layers.to_vec() }
    }

    fn select(order: Vec<ChunkId>, settings: RetrievalSettings, layers: &[Layer]) -> Selection {
        let embedder = CachedEmbedder::new(Arc::new(Fixed), 4);
        let index = Ranked(order);
        let chunks = corpus();
        EvidenceSelector::new(&embedder, &index, &chunks, &settings).select("q", &allowed(layers)).unwrap()
    }

    fn texts(selection: Selection) -> Vec<String> {
        match selection {
            Selection::Evidence(e) => e.into_iter().map(|e| e.chunk.text).collect(),
            other => panic!("expected evidence, got {other:?}"),
        }
    }

    #[test]
    fn layer_priority_beats_distance() {
        let sel = select(vec![0, 1, 2, 3, 4, 5], RetrievalSettings::default(), &[Layer::Raw, Layer::Synth, Layer::Meta]);
        assert_eq!(texts(sel), vec!["m2", "m5", "s1", "s4"]);
    }

    #[test]
    fn disallowed_layers_never_enter_context() {
        let sel = select(vec![2, 0, 5, 3], RetrievalSettings::default(), &[Layer::Raw, Layer::Synth]);
        assert_eq!(texts(sel), vec!["r0", "r3"]);
    }

    #[test]
    fn only_faiss_k_candidates_are_considered() {
        let settings = RetrievalSettings { faiss_k: 2, ..RetrievalSettings::default() };
        let sel = select(vec![0, 3, 1], settings, &[Layer::Synth]);
        assert_eq!(sel, Selection::NoAllowedEvidence);
    }

    #[test]
    fn empty_index_is_no_candidates() {
        assert_eq!(select(vec![], RetrievalSettings::default(), &[Layer::Synth]), Selection::NoCandidates);
    }

    #[test]
    fn unknown_rows_are_skipped() {
        let sel = select(vec![42, 1], RetrievalSettings::default(), &[Layer::Synth]);
        assert_eq!(texts(sel), vec!["s1"]);
    }

    #[test]
    fn layers_missing_from_priority_rank_last() {
        let settings = RetrievalSettings { layer_priority: vec![Layer::Raw], ..RetrievalSettings::default() };
        let sel = select(vec![2, 1, 0], settings, &[Layer::Raw, Layer::Synth, Layer::Meta]);
        assert_eq!(texts(sel), vec!["r0", "m2", "s1"]);
    }
}
