use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{Device, DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use strata_core::config::{resolve_with_base, EmbeddingSettings};
use strata_core::traits::Embedder;

mod cache;
mod device;
mod pool;
mod tokenize;

pub use cache::CachedEmbedder;
pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

/// Sentence-transformers style BERT encoder (e.g. all-MiniLM-L6-v2, 384-d):
/// token states are mean-pooled over the attention mask and L2-normalized.
pub struct SentenceEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize, id: String }

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "bert".to_string());
        let id = format!("local:{}:d{}", name, dim);
        info!(embedder = %id, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
        if emb.len() != self.dim {
            return Err(anyhow!("model produced {} dims, expected {}", emb.len(), self.dim));
        }
        if start.elapsed().as_millis() > 100 { debug!(ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for SentenceEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let tensors = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let pickle = model_dir.join("pytorch_model.bin");
        if !pickle.exists() {
            return Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()));
        }
        warn!("model.safetensors missing, reading pytorch_model.bin");
        candle_core::pickle::read_all(&pickle)?.into_iter().collect()
    };
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

/// Deterministic bag-of-tokens embedder for tests and offline development.
/// Same text always maps to the same unit vector; no model files needed.
pub struct HashEmbedder { dim: usize, id: String }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("hash:xxh64:d{}", dim) } }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

impl HashEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() { let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish(); let idx = (h as usize) % self.dim; let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32); v[idx] += val + (i as f32 % 3.0) * 0.01 + 0.01; }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt();
        if norm < 1e-6 { v[0] = 1.0; return v; }
        for x in &mut v { *x /= norm; }
        v
    }
}

fn use_fake_from_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Pick the embedder described by `settings`; relative model paths resolve against `base`.
pub fn get_default_embedder(settings: &EmbeddingSettings, base: &Path) -> Result<Box<dyn Embedder>> {
    if settings.fake || use_fake_from_env() {
        if settings.fake_dim == 0 {
            return Err(anyhow!("embedding.fake_dim must be > 0"));
        }
        info!(dim = settings.fake_dim, "using HashEmbedder");
        return Ok(Box::new(HashEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings, base)?;
    Ok(Box::new(SentenceEmbedder::load(&model_dir, settings.max_len)?))
}

fn resolve_model_dir(settings: &EmbeddingSettings, base: &Path) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    let configured = resolve_with_base(base, &settings.model_dir);
    if configured.exists() { return Ok(configured); }
    Err(anyhow!("Could not locate embedding model directory {}", configured.display()))
}
