//! Column resolution: mapping semantic fields to concrete sheet columns.

use crate::error::{Error, Result};
use crate::grid::CellGrid;
use crate::header::{normalized_row, HeaderBlock};
use crate::model::Warning;
use crate::schema::{FieldKey, FieldMatcher, Schema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Where a field's value lives in each data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnBinding {
    /// The first matching column
    Single(u32),
    /// Every matching column, summed per row
    Aggregate(BTreeSet<u32>),
}

impl ColumnBinding {
    /// The bound columns in ascending order.
    pub fn columns(&self) -> Vec<u32> {
        match self {
            ColumnBinding::Single(col) => vec![*col],
            ColumnBinding::Aggregate(cols) => cols.iter().copied().collect(),
        }
    }

    /// The leftmost bound column.
    pub fn first_column(&self) -> Option<u32> {
        match self {
            ColumnBinding::Single(col) => Some(*col),
            ColumnBinding::Aggregate(cols) => cols.first().copied(),
        }
    }
}

/// Field-to-column assignments for one sheet. Immutable once resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap {
    bindings: BTreeMap<FieldKey, ColumnBinding>,
}

impl ColumnMap {
    pub fn get(&self, key: FieldKey) -> Option<&ColumnBinding> {
        self.bindings.get(&key)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.bindings.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &ColumnBinding)> {
        self.bindings.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Columns claimed by more than one field, with the claiming fields.
    fn conflicts(&self) -> Vec<(u32, Vec<FieldKey>)> {
        let mut by_column: BTreeMap<u32, Vec<FieldKey>> = BTreeMap::new();
        for (key, binding) in &self.bindings {
            for col in binding.columns() {
                by_column.entry(col).or_default().push(*key);
            }
        }
        by_column
            .into_iter()
            .filter(|(_, fields)| fields.len() > 1)
            .collect()
    }
}

/// A resolved column map plus the warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub columns: ColumnMap,
    pub warnings: Vec<Warning>,
}

/// Resolve every configured field against the header block.
///
/// Single-column fields take the first cell, in row-then-column order, that
/// matches their highest-priority target. Multi-column fields collect every
/// cell whose label literally contains any target. Columns claimed twice are reported as warnings,
/// not corrected. Fails if a required field has no column.
pub fn resolve_columns(
    grid: &dyn CellGrid,
    header: &HeaderBlock,
    schema: &Schema,
    threshold: f64,
) -> Result<Resolution> {
    let Some(range) = grid.used_range() else {
        return Err(Error::MissingColumns(FieldKey::REQUIRED.to_vec()));
    };

    let cells: Vec<(u32, String)> = header
        .rows()
        .flat_map(|row| normalized_row(grid, row, &range))
        .collect();

    let mut bindings = BTreeMap::new();
    for matcher in schema.fields() {
        let binding = if matcher.multi_column {
            resolve_aggregate(matcher, &cells)
        } else {
            resolve_single(matcher, &cells, threshold)
        };
        if let Some(binding) = binding {
            tracing::debug!(field = %matcher.key, columns = ?binding.columns(), "field resolved");
            bindings.insert(matcher.key, binding);
        }
    }
    let columns = ColumnMap { bindings };

    let warnings: Vec<Warning> = columns
        .conflicts()
        .into_iter()
        .map(|(column, fields)| Warning::DuplicateColumn { column, fields })
        .collect();
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let missing: Vec<FieldKey> = FieldKey::REQUIRED
        .into_iter()
        .filter(|key| !columns.contains(*key))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    tracing::info!(fields = columns.len(), "columns resolved");
    Ok(Resolution { columns, warnings })
}

fn resolve_single(
    matcher: &FieldMatcher,
    cells: &[(u32, String)],
    threshold: f64,
) -> Option<ColumnBinding> {
    matcher.rules().iter().find_map(|rule| {
        cells
            .iter()
            .find(|(_, text)| !matcher.is_excluded(text) && rule.matches(text, threshold))
            .map(|(col, _)| ColumnBinding::Single(*col))
    })
}

/// Aggregates only take literal label hits: a near miss such as "bonificacion
/// anual" would otherwise be summed into the field.
fn resolve_aggregate(matcher: &FieldMatcher, cells: &[(u32, String)]) -> Option<ColumnBinding> {
    let cols: BTreeSet<u32> = cells
        .iter()
        .filter(|(_, text)| matcher.matches_literal(text))
        .map(|(col, _)| *col)
        .collect();
    (!cols.is_empty()).then_some(ColumnBinding::Aggregate(cols))
}
