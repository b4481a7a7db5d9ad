//! Exhaustive (non-approximate) L2 index.
//!
//! Row `i` is the `i`-th vector added. Distances are squared L2, which ranks
//! identically to L2 and matches what flat FAISS indexes report.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::bail;

use strata_core::error::{Error, Result};
use strata_core::traits::VectorIndex;
use strata_core::types::Neighbor;

use crate::schema::IndexHeader;

#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::IndexMismatch(format!(
                "vector has {} dims, index has {}",
                vector.len(),
                self.dim
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn row(&self, id: usize) -> Option<&[f32]> {
        if self.dim == 0 {
            return None;
        }
        self.data.chunks_exact(self.dim).nth(id)
    }

    pub fn rows(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        IndexHeader { dim: self.dim as u32, rows: self.rows() as u64 }.write_to(&mut w)?;
        for value in &self.data {
            w.write_all(&value.to_le_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn read_from_path(path: &Path) -> Result<Self> {
        let mut r = BufReader::new(File::open(path)?);
        let header = IndexHeader::read_from(&mut r)?;
        let mut body = Vec::new();
        r.read_to_end(&mut body)?;
        let expected = usize::try_from(header.rows)
            .ok()
            .and_then(|rows| rows.checked_mul(header.dim as usize))
            .and_then(|values| values.checked_mul(4))
            .ok_or_else(|| {
                Error::IndexMismatch(format!("index.bin header is implausible: {} rows of {} dims", header.rows, header.dim))
            })?;
        if body.len() != expected {
            return Err(Error::IndexMismatch(format!(
                "index.bin body has {} bytes, header promises {}",
                body.len(),
                expected
            )));
        }
        let data = body
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { dim: header.dim as usize, data })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.rows()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
        if self.rows() == 0 || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            bail!("query has {} dims, index has {}", query.len(), self.dim);
        }
        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, row)| Neighbor { distance: squared_l2(query, row), id })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }
}
