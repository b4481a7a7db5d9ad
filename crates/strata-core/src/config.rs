//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K=6`). Every setting
//! has a default, so an empty figment yields a working [`Settings`].

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::Layer;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.figment.contains(key)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub chunking: ChunkingSettings,
    pub index: IndexSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub classifier: ClassifierSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        if self.corpus.layers.is_empty() {
            return Err(Error::InvalidConfig("corpus.layers must not be empty".into()));
        }
        if self.embedding.cache_capacity == 0 {
            return Err(Error::InvalidConfig("embedding.cache_capacity must be > 0".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be > 0".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be > 0".into()));
        }
        if self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub dir: String,
    pub layers: Vec<Layer>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { dir: "knowledge/3_index_ready".to_string(), layers: Layer::ALL.to_vec() }
    }
}

/// Character-based chunking bounds (counted in Unicode scalar values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
    pub min_length: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { size: 500, overlap: 100, min_length: 50 }
    }
}

impl ChunkingSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("chunking.size must be > 0".into()));
        }
        if self.overlap >= self.size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.size ({})",
                self.overlap, self.size
            )));
        }
        if self.min_length > self.size {
            return Err(Error::InvalidConfig(format!(
                "chunking.min_length ({}) must not exceed chunking.size ({})",
                self.min_length, self.size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { dir: "index".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub max_len: usize,
    pub batch_size: usize,
    pub cache_capacity: usize,
    pub fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            max_len: 256,
            batch_size: 32,
            cache_capacity: 512,
            fake: false,
            fake_dim: 384,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Nearest neighbours fetched before layer filtering.
    pub faiss_k: usize,
    /// Chunks kept in the final context.
    pub top_k: usize,
    /// Final ranking among filtered candidates, first = most preferred.
    pub layer_priority: Vec<Layer>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { faiss_k: 8, top_k: 4, layer_priority: vec![Layer::Meta, Layer::Synth, Layer::Raw] }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.faiss_k == 0 || self.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.faiss_k and retrieval.top_k must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    /// Absent means the HTTP client imposes no timeout of its own.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "models/gemini-3-pro-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: None,
        }
    }
}

/// Lexical cues of the layer classifier, matched as lowercase substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub observation_cues: Vec<String>,
    pub mechanism_cues: Vec<String>,
    pub limits_cues: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        let owned = |cues: &[&str]| cues.iter().map(|c| c.to_string()).collect();
        Self {
            observation_cues: owned(&["pozorováno", "zaznamenáno", "případy", "události"]),
            mechanism_cues: owned(&["jak", "proč", "vzorce"]),
            limits_cues: owned(&["nevíme", "zkreslení", "limity"]),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
