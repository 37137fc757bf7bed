//! Exact (brute force) index using squared Euclidean distance

use super::VectorIndex;
use paperdigest_common::errors::{AppError, Result};

/// Flat index comparing the query against every stored vector
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    /// Build from vectors that must all share one non-zero dimension
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(AppError::Validation {
                message: "cannot build an index from empty vectors".to_string(),
                field: Some("vectors".to_string()),
            });
        }

        if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(AppError::Validation {
                message: format!(
                    "vector {} has dimension {}, expected {}",
                    position,
                    vectors[position].len(),
                    dimension
                ),
                field: Some("vectors".to_string()),
            });
        }

        Ok(Self { dimension, vectors })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(AppError::Validation {
                message: format!(
                    "query has dimension {}, index expects {}",
                    query.len(),
                    self.dimension
                ),
                field: Some("query".to_string()),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(vector, query)))
            .collect();

        // sort_by is stable: ties stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }
}
