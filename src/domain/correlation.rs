//! Pairwise Pearson correlation across indicator columns.
//!
//! Rows missing every indicator are dropped first. Each pair of columns is
//! then correlated over the rows where both values are present. A pair with
//! fewer than two shared observations, or with zero variance on either side,
//! has no coefficient.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `values[i][j]` correlates `labels[i]` with `labels[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i)?.get(j).copied().flatten()
    }
}

/// `columns` are `(name, values)` pairs of equal length.
pub fn correlation(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    if columns.is_empty() {
        return CorrelationMatrix::empty();
    }

    let rows = columns.iter().map(|(_, v)| v.len()).min().unwrap_or(0);
    let kept: Vec<usize> = (0..rows)
        .filter(|&r| columns.iter().any(|(_, v)| v[r].is_some()))
        .collect();
    if kept.is_empty() {
        return CorrelationMatrix::empty();
    }

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = kept
                .iter()
                .filter_map(|&r| Some((columns[i].1[r]?, columns[j].1[r]?)))
                .collect();
            let coefficient = pearson(&pairs);
            values[i][j] = coefficient;
            values[j][i] = coefficient;
        }
    }

    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut num = 0.0;
    let mut denom_a = 0.0;
    let mut denom_b = 0.0;

    for &(a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        num += da * db;
        denom_a += da * da;
        denom_b += db * db;
    }

    let denom = (denom_a * denom_b).sqrt();
    if denom > 0.0 {
        Some((num / denom).clamp(-1.0, 1.0))
    } else {
        None
    }
}
