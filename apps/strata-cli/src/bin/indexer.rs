use std::path::PathBuf;

use clap::Parser;

use strata_cli::{base_dir, build_index, init_tracing};
use strata_core::config::{resolve_with_base, Config};

/// Chunk the layered corpus, embed it and write the flat index.
#[derive(Parser)]
#[command(name = "strata-indexer")]
struct Args {
    /// Corpus root containing one directory per layer (overrides corpus.dir)
    corpus_dir: Option<PathBuf>,
    /// Output directory (overrides index.dir)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let base = base_dir()?;

    let corpus_dir = args.corpus_dir.unwrap_or_else(|| resolve_with_base(&base, &settings.corpus.dir));
    let out_dir = args.out.unwrap_or_else(|| resolve_with_base(&base, &settings.index.dir));
    println!("Strata Indexer\n==============");
    println!("Corpus directory: {}", corpus_dir.display());

    let (chunks, manifest) = build_index(&settings, &base, &corpus_dir, &out_dir)?;
    for layer in &settings.corpus.layers {
        let n = chunks.iter().filter(|c| c.layer == *layer).count();
        println!("  {layer}: {n} chunks");
    }

    println!("\n✅ Indexing completed successfully!");
    println!("📊 {} chunks, dim {}, embedder {}", manifest.rows, manifest.dim, manifest.embedder_id);
    println!("📁 Index written to {}", out_dir.display());
    println!("\n💡 To ask a question, use: cargo run --bin strata -- ask '<question>'");
    Ok(())
}
