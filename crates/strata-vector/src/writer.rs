use anyhow::{Context, Result, bail};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use strata_core::traits::Embedder;
use strata_core::types::Chunk;

use crate::flat::FlatIndex;
use crate::schema::{checksum, Manifest, CHUNKS_FILE, INDEX_FILE, MANIFEST_FILE};

/// Offline index builder: embeds every chunk in emission order and persists
/// the vectors and the chunk sidecar so that row `i` describes chunk `i`.
pub struct IndexWriter<'a> { embedder: &'a dyn Embedder, batch_size: usize }

impl<'a> IndexWriter<'a> {
	pub fn new(embedder: &'a dyn Embedder, batch_size: usize) -> Self {
		Self { embedder, batch_size: batch_size.max(1) }
	}

	pub fn build(&self, chunks: &[Chunk], out_dir: &Path) -> Result<Manifest> {
		if chunks.is_empty() { bail!("refusing to build an index from zero chunks"); }
		let index = self.embed_all(chunks)?;
		fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
		index.write_to_path(&out_dir.join(INDEX_FILE))?;
		let chunks_json = serde_json::to_vec_pretty(chunks)?;
		fs::write(out_dir.join(CHUNKS_FILE), &chunks_json)?;
		let manifest = Manifest {
			embedder_id: self.embedder.embedder_id().to_string(),
			dim: self.embedder.dim(),
			rows: chunks.len(),
			chunks_blake3: checksum(&chunks_json),
			built_at: Utc::now(),
		};
		// written last: a directory without a manifest is an unfinished build
		fs::write(out_dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;
		info!(rows = manifest.rows, dim = manifest.dim, dir = %out_dir.display(), "index written");
		Ok(manifest)
	}

	/// Build into a sibling `<out>.tmp` directory and swap it in only once the
	/// manifest is written, so a failed build leaves the previous index
	/// serving. Refuses to replace a directory holding anything other than
	/// index files.
	pub fn build_replacing(&self, chunks: &[Chunk], out_dir: &Path) -> Result<Manifest> {
		ensure_replaceable(out_dir)?;
		let staging = sibling(out_dir, "tmp")?;
		ensure_replaceable(&staging)?;
		if staging.exists() { fs::remove_dir_all(&staging)?; }

		let manifest = match self.build(chunks, &staging) {
			Ok(m) => m,
			Err(e) => {
				let _ = fs::remove_dir_all(&staging);
				return Err(e);
			}
		};

		if out_dir.exists() {
			let retired = sibling(out_dir, "old")?;
			ensure_replaceable(&retired)?;
			if retired.exists() { fs::remove_dir_all(&retired)?; }
			fs::rename(out_dir, &retired).with_context(|| format!("moving aside {}", out_dir.display()))?;
			fs::rename(&staging, out_dir).with_context(|| format!("installing {}", out_dir.display()))?;
			fs::remove_dir_all(&retired)?;
		} else {
			fs::rename(&staging, out_dir).with_context(|| format!("installing {}", out_dir.display()))?;
		}
		Ok(manifest)
	}

	fn embed_all(&self, chunks: &[Chunk]) -> Result<FlatIndex> {
		info!(chunks = chunks.len(), embedder = self.embedder.embedder_id(), "embedding chunks");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
		let mut index = FlatIndex::new(self.embedder.dim());
		for batch in chunks.chunks(self.batch_size) {
			let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
			let vectors = self.embedder.embed_batch(&texts)?;
			if vectors.len() != batch.len() { bail!("embedder returned {} vectors for {} texts", vectors.len(), batch.len()); }
			for v in &vectors { index.add(v)?; }
			pb.inc(batch.len() as u64);
		}
		pb.finish_with_message("embedded");
		Ok(index)
	}
}

const INDEX_FILES: [&str; 3] = [INDEX_FILE, CHUNKS_FILE, MANIFEST_FILE];

/// Absent, empty, or holding nothing but index files.
fn ensure_replaceable(dir: &Path) -> Result<()> {
	if !dir.exists() { return Ok(()); }
	if !dir.is_dir() { bail!("{} exists and is not a directory", dir.display()); }
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let name = entry.file_name();
		let known = name.to_str().is_some_and(|n| INDEX_FILES.contains(&n));
		if !known || !entry.file_type()?.is_file() {
			bail!("{} is not an index directory (found {:?}); refusing to replace it", dir.display(), name);
		}
	}
	Ok(())
}

fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf> {
	let name = dir.file_name().with_context(|| format!("{} has no directory name", dir.display()))?;
	Ok(dir.with_file_name(format!("{}.{suffix}", name.to_string_lossy())))
}
