//! Sparse-to-dense reshaping of grouped counts.
//!
//! A `GROUP BY row, column` query never emits combinations with no
//! matching rows, so the dense grid is rebuilt explicitly: both key sets
//! are collected and sorted first, then every cell is looked up with a
//! default of zero.

use std::collections::{BTreeMap, BTreeSet};

/// One row of a [`DenseGrid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow<R> {
    /// Row key.
    pub key: R,
    /// One count per grid column, in column order.
    pub values: Vec<u64>,
}

/// A fully dense matrix of counts keyed by sorted row and column keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseGrid<R, C> {
    /// Distinct column keys, ascending.
    pub columns: Vec<C>,
    /// Distinct row keys, ascending, each with `columns.len()` values.
    pub rows: Vec<GridRow<R>>,
}

impl<R, C> Default for DenseGrid<R, C> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Builds a dense grid from `(row, column, count)` triples.
///
/// Missing `(row, column)` combinations become `0`. Repeated combinations
/// are summed.
pub fn densify<R, C>(cells: impl IntoIterator<Item = (R, C, u64)>) -> DenseGrid<R, C>
where
    R: Ord,
    C: Ord + Clone,
{
    let mut columns = BTreeSet::new();
    let mut counts: BTreeMap<R, BTreeMap<C, u64>> = BTreeMap::new();

    for (row, column, count) in cells {
        columns.insert(column.clone());
        *counts.entry(row).or_default().entry(column).or_insert(0) += count;
    }

    let rows = counts
        .into_iter()
        .map(|(key, cells)| GridRow {
            key,
            values: columns
                .iter()
                .map(|column| cells.get(column).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    DenseGrid {
        columns: columns.into_iter().collect(),
        rows,
    }
}
