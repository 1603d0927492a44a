//! `rowsync-import`: row import and reconciliation engine.
//!
//! Reconciles an ordered sequence of rows (CSV text, files, or in-memory)
//! against a record store: finds existing records by configured uid fields,
//! creates or updates them, resolves `relation.attribute` key paths to
//! existing related records, and optionally deletes in-scope records absent
//! from the import. Pure engine crate over the `rowsync-store` seam; no CLI
//! or terminal dependencies.

pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod options;
pub mod resolve;
pub mod row;
pub mod session;
pub mod source;
pub mod upsert;

pub use error::ImportError;
pub use model::{BatchResult, BatchSummary, ImportOutcome, RowResult};
pub use options::ImportOptions;
pub use row::{FieldValue, Row};
pub use session::{run, Session};
pub use source::{rows_from_csv_file, rows_from_csv_text};
