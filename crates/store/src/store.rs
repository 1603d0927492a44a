use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::record::{Filter, Record, RecordId};
use crate::schema::Schema;
use crate::value::Value;

/// Persistence seam the import engine drives. One store round trip per
/// call; the store's own consistency guarantees are the only ones assumed.
pub trait Store {
    fn schema(&self) -> &Schema;

    /// All records of `entity` satisfying `filter`, in id order.
    fn query(&self, entity: &str, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    /// Create a record. An explicit `id` attribute pins the identity;
    /// otherwise the store assigns the next one.
    fn create(
        &mut self,
        entity: &str,
        attrs: BTreeMap<String, Value>,
    ) -> Result<Record, StoreError>;

    /// Merge `attrs` into an existing record and re-validate.
    fn update(
        &mut self,
        entity: &str,
        id: RecordId,
        attrs: BTreeMap<String, Value>,
    ) -> Result<Record, StoreError>;

    /// Delete by id; ids not present are ignored. Returns the count removed.
    fn delete(&mut self, entity: &str, ids: &[RecordId]) -> Result<usize, StoreError>;
}
