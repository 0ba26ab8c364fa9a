//! Race ledgers: batch load and incremental replay

pub mod historical;
pub mod registry;
pub mod system;

pub use historical::HistoricalRaceLedger;
pub use registry::MouseRegistry;
pub use system::{LedgerConfig, RaceLedger, RaceSystem};
