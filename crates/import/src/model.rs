use std::collections::BTreeMap;

use rowsync_store::{Record, RecordId, Value};
use serde::Serialize;

use crate::error::ImportError;
use crate::row::Row;

// ---------------------------------------------------------------------------
// Per-row outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RowResult {
    Created(Record),
    Updated(Record),
    /// `partial` holds the schema-recognized attributes of the failed row,
    /// for diagnostics only. Nothing was persisted for this row.
    Failed {
        error: ImportError,
        partial: BTreeMap<String, Value>,
    },
}

impl RowResult {
    /// The persisted record, for successful outcomes.
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Created(record) | Self::Updated(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ImportError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One row's result paired with the original (pre-normalization) row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub row: Row,
    pub result: RowResult,
}

// ---------------------------------------------------------------------------
// Batch result
// ---------------------------------------------------------------------------

/// Ordered outcomes for one batch, one per input row, plus the identities
/// removed by the deletion sweep. Never mutated after the run returns.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub outcomes: Vec<ImportOutcome>,
    pub deleted: Vec<RecordId>,
}

impl BatchResult {
    pub fn successful(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_failed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_failed())
    }

    /// Records persisted by this batch, in input order.
    pub fn records(&self) -> Vec<&Record> {
        self.outcomes.iter().filter_map(|o| o.result.record()).collect()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            deleted: self.deleted.len(),
            ..BatchSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome.result {
                RowResult::Created(_) => summary.created += 1,
                RowResult::Updated(_) => summary.updated += 1,
                RowResult::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub deleted: usize,
}
