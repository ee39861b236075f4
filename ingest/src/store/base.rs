use config::shared::CustomColumnsConfig;

use crate::error::IngestResult;
use crate::types::Transaction;

/// Outcome of writing one feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventWrite {
    /// The event was new and all of its rows were committed.
    Inserted,
    /// The event had already been imported; nothing was changed.
    AlreadyImported,
}

/// Destination for imported events.
///
/// An implementation must write each event atomically: either the transaction row,
/// every input and output row, and the spent-flag updates it implies are all
/// persisted, or none of them are. Re-delivery of an already written event must
/// report [`EventWrite::AlreadyImported`] without modifying anything.
pub trait EventStore {
    /// Writes one transaction and everything it implies.
    fn write_event(
        &self,
        transaction: &Transaction,
        columns: &CustomColumnsConfig,
    ) -> impl Future<Output = IngestResult<EventWrite>> + Send;
}
