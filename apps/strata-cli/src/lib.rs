//! Startup wiring shared by the `strata` and `strata-indexer` binaries.

pub mod ux;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use strata_answer::{Arbiter, ArbiterConfig, GeminiClient, PromptConfig, QueryContext};
use strata_core::config::{resolve_with_base, Config, Settings};
use strata_core::data_processor::DataProcessor;
use strata_core::traits::Embedder;
use strata_core::types::Chunk;
use strata_embed::{get_default_embedder, CachedEmbedder};
use strata_vector::{IndexStore, IndexWriter, Manifest};

/// Logs go to stderr so answers on stdout stay clean. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

pub fn base_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("cannot determine working directory")
}

/// `[prompts]` is optional; missing keys fall back to the built-in texts.
pub fn load_prompts(config: &Config) -> anyhow::Result<PromptConfig> {
    if config.contains("prompts") {
        config.get("prompts")
    } else {
        Ok(PromptConfig::default())
    }
}

/// The index directory must not be the corpus or one of its parents.
pub fn check_output_dir(corpus_dir: &Path, out_dir: &Path) -> anyhow::Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }
    let corpus = corpus_dir
        .canonicalize()
        .with_context(|| format!("cannot resolve corpus directory {}", corpus_dir.display()))?;
    let out = out_dir.canonicalize()?;
    if corpus.starts_with(&out) {
        anyhow::bail!("index directory {} contains the corpus {}; choose another --out", out.display(), corpus.display());
    }
    Ok(())
}

/// Offline build: chunk the corpus, embed it and swap the new index in.
pub fn build_index(settings: &Settings, base: &Path, corpus_dir: &Path, out_dir: &Path) -> anyhow::Result<(Vec<Chunk>, Manifest)> {
    check_output_dir(corpus_dir, out_dir)?;
    let processor = DataProcessor::new(settings.chunking)?;
    let chunks = processor
        .process_corpus(corpus_dir, &settings.corpus.layers)
        .with_context(|| format!("failed to read corpus at {}", corpus_dir.display()))?;
    let embedder = get_default_embedder(&settings.embedding, base)?;
    let manifest = IndexWriter::new(embedder.as_ref(), settings.embedding.batch_size).build_replacing(&chunks, out_dir)?;
    Ok((chunks, manifest))
}

/// Everything a query needs, loaded once.
pub struct App {
    pub arbiter: Arbiter,
    pub ctx: QueryContext,
}

impl App {
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        let settings: Settings = config.settings()?;
        let base = base_dir()?;

        let index_dir = resolve_with_base(&base, &settings.index.dir);
        let store = IndexStore::open(&index_dir)
            .with_context(|| format!("failed to open index at {} (run strata-indexer first)", index_dir.display()))?;
        let embedder = get_default_embedder(&settings.embedding, &base)?;
        if embedder.embedder_id() != store.manifest().embedder_id {
            anyhow::bail!(
                "index was built with {} but the configured embedder is {}; rebuild the index",
                store.manifest().embedder_id,
                embedder.embedder_id()
            );
        }
        let (index, chunks, _) = store.into_parts();
        let backend = GeminiClient::from_env(&settings.llm)?;
        info!(rows = chunks.len(), model = %settings.llm.model, "query context ready");

        let ctx = QueryContext {
            embedder: Arc::new(CachedEmbedder::new(Arc::from(embedder), settings.embedding.cache_capacity)),
            index: Arc::new(index),
            chunks: chunks.into(),
            backend: Arc::new(backend),
        };
        let arbiter = Arbiter::new(ArbiterConfig {
            prompts: load_prompts(config)?,
            retrieval: settings.retrieval.clone(),
            classifier: settings.classifier.clone(),
        });
        Ok(Self { arbiter, ctx })
    }

    pub fn ask(&self, question: &str) -> String {
        self.arbiter.ask(&self.ctx, question)
    }
}
