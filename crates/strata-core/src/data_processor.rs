//! Offline corpus loading and chunking.
//!
//! The corpus root holds one directory per layer (`raw/`, `synth/`, `meta/`),
//! each with plain `.txt` files. Chunking is purely length and boundary based:
//! paragraphs first, then a fixed character window for long paragraphs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, Layer};

pub struct DataProcessor {
    chunking: ChunkingSettings,
}

impl DataProcessor {
    pub fn new(chunking: ChunkingSettings) -> Result<Self> {
        chunking.validate()?;
        Ok(Self { chunking })
    }

    /// Load and chunk the whole corpus. Fails if a layer directory is
    /// missing or nothing indexable remains.
    pub fn process_corpus(&self, root: &Path, layers: &[Layer]) -> Result<Vec<Chunk>> {
        let documents = self.load_documents(root, layers)?;
        self.chunk_documents(&documents)
    }

    pub fn load_documents(&self, root: &Path, layers: &[Layer]) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for &layer in layers {
            let layer_dir = root.join(layer.as_str());
            if !layer_dir.is_dir() {
                return Err(Error::MissingLayer(layer_dir.display().to_string()));
            }
            for file_path in self.list_txt_files(&layer_dir) {
                let text = self.read_file_content(&file_path)?;
                let text = text.trim();
                let file_name = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if text.is_empty() {
                    warn!(layer = %layer, file = %file_name, "skipping empty file");
                    continue;
                }
                documents.push(Document {
                    source: format!("{}/{}", layer, file_name),
                    text: text.to_string(),
                    layer,
                });
            }
        }
        if documents.is_empty() {
            return Err(Error::EmptyCorpus(format!("no indexable documents under {}", root.display())));
        }
        info!(documents = documents.len(), "loaded layered documents");
        Ok(documents)
    }

    /// Chunks inherit source and layer from their document; order is
    /// document order, then position within the document.
    pub fn chunk_documents(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for doc in documents {
            let parts = self.chunk_text(&doc.text);
            debug!(source = %doc.source, chunks = parts.len(), "chunked document");
            chunks.extend(parts.into_iter().map(|text| Chunk {
                text,
                source: doc.source.clone(),
                layer: doc.layer,
            }));
        }
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus("chunking produced no valid chunk".into()));
        }
        info!(chunks = chunks.len(), "created text chunks");
        Ok(chunks)
    }

    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let ChunkingSettings { size, overlap, min_length } = self.chunking;
        let normalized = text.replace("\r\n", "\n");
        let mut chunks = Vec::new();
        for paragraph in normalized.split("\n\n").map(str::trim) {
            let chars: Vec<char> = paragraph.chars().collect();
            if chars.len() < min_length {
                continue;
            }
            if chars.len() <= size {
                chunks.push(paragraph.to_string());
                continue;
            }
            let step = size - overlap;
            let mut start = 0;
            while start < chars.len() {
                let end = (start + size).min(chars.len());
                let window: String = chars[start..end].iter().collect();
                let part = window.trim();
                if part.chars().count() >= min_length {
                    chunks.push(part.to_string());
                }
                start += step;
            }
        }
        chunks
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn list_txt_files(&self, layer_dir: &Path) -> Vec<PathBuf> {
        let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(layer_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
            .collect();
        txt_files.sort();
        txt_files
    }
}
