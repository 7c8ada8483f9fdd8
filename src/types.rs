use serde::{Deserialize, Serialize};

use crate::error::InvalidModelError;

/// A category of plant, with inclusive bounds on how many slots it may occupy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantKind {
    pub name: String,
    #[serde(default)]
    pub min: u32,
    pub max: u32,
}

impl PlantKind {
    pub fn new(name: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }
}

/// `costs[p][q]` is charged when kind `p` sits immediately before kind `q`.
/// Negative entries are companions, positive entries antagonists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostMatrix(Vec<Vec<f64>>);

impl CostMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self(rows)
    }

    /// A `kinds` × `kinds` matrix of zeros.
    pub fn zeros(kinds: usize) -> Self {
        Self(vec![vec![0.0; kinds]; kinds])
    }

    pub fn with(mut self, before: usize, after: usize, cost: f64) -> Self {
        self.0[before][after] = cost;
        self
    }

    pub fn get(&self, before: usize, after: usize) -> f64 {
        self.0[before][after]
    }

    /// Sum of the costs of consecutive planted pairs in `sequence`. A
    /// boundary next to an empty slot costs nothing.
    pub fn sequence_cost(&self, sequence: &[Option<usize>]) -> f64 {
        sequence
            .windows(2)
            .filter_map(|pair| Some(self.get(pair[0]?, pair[1]?)))
            .sum()
    }

    pub(crate) fn check_shape(&self, kinds: usize) -> Result<(), InvalidModelError> {
        if self.0.len() != kinds {
            return Err(InvalidModelError::CostRows {
                expected: kinds,
                found: self.0.len(),
            });
        }
        for (row, entries) in self.0.iter().enumerate() {
            if entries.len() != kinds {
                return Err(InvalidModelError::CostColumns {
                    row,
                    expected: kinds,
                    found: entries.len(),
                });
            }
            if let Some(column) = entries.iter().position(|c| !c.is_finite()) {
                return Err(InvalidModelError::NonFiniteCost { row, column });
            }
        }
        Ok(())
    }
}

/// Whether every slot of the bed has to be planted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Coverage {
    #[default]
    Full,
    Partial,
}

/// How adjacency indicators are tied to slot assignments.
///
/// `UpperBound` only forces an indicator on when its pair occurs and relies on
/// minimisation to keep the rest off. `Exact` also forces it off when the pair
/// does not occur, which matters once empty slots are allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Linkage {
    #[default]
    UpperBound,
    Exact,
}
