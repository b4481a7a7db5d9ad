//! On-disk layout of a built index directory.
//!
//! - `index.bin`: magic, version, dim, rows, then `rows * dim` f32 (all LE)
//! - `chunks.json`: array of chunk records, element `i` describes row `i`
//! - `manifest.json`: build metadata tying the two together

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_core::error::{Error, Result};

pub const INDEX_FILE: &str = "index.bin";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const MANIFEST_FILE: &str = "manifest.json";

pub const MAGIC: &[u8; 8] = b"STRATAFX";
pub const FORMAT_VERSION: u32 = 1;

/// Fixed-size prefix of `index.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub dim: u32,
    pub rows: u64,
}

impl IndexHeader {
    pub const LEN: usize = 8 + 4 + 4 + 8;

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        w.write_all(&self.dim.to_le_bytes())?;
        w.write_all(&self.rows.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::LEN];
        r.read_exact(&mut buf)?;
        if &buf[0..8] != MAGIC {
            return Err(Error::IndexMismatch("index.bin has an unknown magic".into()));
        }
        let version = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        if version != FORMAT_VERSION {
            return Err(Error::IndexMismatch(format!("unsupported index format version {version}")));
        }
        let dim = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let mut rows = [0u8; 8];
        rows.copy_from_slice(&buf[16..24]);
        Ok(Self { dim, rows: u64::from_le_bytes(rows) })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub embedder_id: String,
    pub dim: usize,
    pub rows: usize,
    /// blake3 hex digest of the exact `chunks.json` bytes.
    pub chunks_blake3: String,
    pub built_at: DateTime<Utc>,
}

pub fn checksum(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
