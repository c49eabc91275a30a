//! tractatus-inventory: source-agnostic inventory core
//!
//! Defines the normalized resource model, the `DataSource` capability every
//! backend implements, and the collector that fans collection out across
//! targets and merges the results.

pub mod collector;
pub mod error;
pub mod source;
pub mod types;

pub use collector::{CancelSignal, CollectionReport, Collector, merge_inventories};
pub use error::InventoryError;
pub use source::{DataSource, SourceKind};
pub use types::{Inventory, NONE, ResourceInfo, UNKNOWN};
