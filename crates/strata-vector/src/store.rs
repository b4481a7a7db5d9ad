use std::fs;
use std::path::Path;

use tracing::info;

use strata_core::error::{Error, Result};
use strata_core::types::Chunk;

use crate::flat::FlatIndex;
use crate::schema::{checksum, Manifest, CHUNKS_FILE, INDEX_FILE, MANIFEST_FILE};

/// A built index loaded for serving. Immutable after `open`.
#[derive(Debug)]
pub struct IndexStore {
	index: FlatIndex,
	chunks: Vec<Chunk>,
	manifest: Manifest,
}

impl IndexStore {
	/// Load and cross-check `index.bin`, `chunks.json` and `manifest.json`.
	/// Any disagreement between them is fatal: rows are only linked to chunk
	/// records by position.
	pub fn open(dir: &Path) -> Result<Self> {
		let manifest_path = dir.join(MANIFEST_FILE);
		if !manifest_path.exists() {
			return Err(Error::NotFound(format!("{} (has the index been built?)", manifest_path.display())));
		}
		let manifest: Manifest = serde_json::from_slice(&fs::read(&manifest_path)?)?;
		let chunks_bytes = fs::read(dir.join(CHUNKS_FILE))?;
		if checksum(&chunks_bytes) != manifest.chunks_blake3 {
			return Err(Error::IndexMismatch("chunks.json was modified after the index was built".into()));
		}
		let chunks: Vec<Chunk> = serde_json::from_slice(&chunks_bytes)?;
		let index = FlatIndex::read_from_path(&dir.join(INDEX_FILE))?;
		if index.rows() != chunks.len() || manifest.rows != chunks.len() {
			return Err(Error::IndexMismatch(format!(
				"index has {} rows, chunks.json has {} records, manifest says {}",
				index.rows(), chunks.len(), manifest.rows
			)));
		}
		if manifest.dim != strata_core::traits::VectorIndex::dim(&index) {
			return Err(Error::IndexMismatch(format!("manifest dim {} differs from index dim", manifest.dim)));
		}
		info!(rows = chunks.len(), embedder = %manifest.embedder_id, "index loaded");
		Ok(Self { index, chunks, manifest })
	}

	pub fn index(&self) -> &FlatIndex { &self.index }
	pub fn chunks(&self) -> &[Chunk] { &self.chunks }
	pub fn manifest(&self) -> &Manifest { &self.manifest }

	pub fn into_parts(self) -> (FlatIndex, Vec<Chunk>, Manifest) {
		(self.index, self.chunks, self.manifest)
	}
}
