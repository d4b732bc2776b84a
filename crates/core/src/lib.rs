//! `treesync-core`: record types shared by loaders, the reconciliation
//! engine and the snapshot store.

pub mod geo;
pub mod record;
pub mod taxonomy;

pub use geo::CoordinateOrder;
pub use record::{CanonicalTreeRecord, RecordKey, TreeField, TreeId, TreeRecord};
pub use taxonomy::TreeClassification;
