//! Domain types shared by ingestion, the index and the query path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Epistemic tier of a piece of evidence.
///
/// - `Raw`: directly observed events, no interpretation
/// - `Synth`: patterns repeated across observations, no evaluation
/// - `Meta`: limits of knowledge, known biases, interpretive caveats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Raw,
    Synth,
    Meta,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Raw, Layer::Synth, Layer::Meta];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Raw => "raw",
            Layer::Synth => "synth",
            Layer::Meta => "meta",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Layer::Raw),
            "synth" => Ok(Layer::Synth),
            "meta" => Ok(Layer::Meta),
            other => Err(Error::InvalidConfig(format!("unknown layer '{other}'"))),
        }
    }
}

/// A source file of the layered corpus. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// `<layer>/<filename>`
    pub source: String,
    pub text: String,
    pub layer: Layer,
}

/// A bounded fragment of one document; one record of `chunks.json`.
///
/// A chunk has no id of its own: its position in the chunk list is the
/// row of its vector in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub layer: Layer,
}

/// Row position shared by the vector index and the chunk list.
pub type ChunkId = usize;

/// One nearest-neighbour result. `distance` is squared L2, lower is closer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub id: ChunkId,
}
