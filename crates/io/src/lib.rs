// Tree inventory I/O: loaders, botanical classification, conversion to the
// stored layout, and the SQLite snapshot store.

pub mod classify;
pub mod convert;
pub mod csv;
pub mod error;
pub mod fixture;
pub mod genera;
pub mod loader;
pub mod locations;
pub mod magdeburg;
pub mod sheet;
pub mod store;

pub use classify::classify;
pub use convert::{ClassificationWarning, Conversion, Converter};
pub use error::LoadError;
pub use loader::LoadingStrategy;
pub use store::{SqliteStore, SqliteTransaction};
