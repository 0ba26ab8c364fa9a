//! Micerace - incremental race statistics engine
//!
//! This library provides:
//! - Race and mouse entities built from the race feed
//! - Batch and step-by-step replay ledgers
//! - Count-windowed, time-windowed, lane and streak statistics per mouse
//! - Feature vectors and leakage-free training datasets
//!
//! # Example
//!
//! ```no_run
//! use micerace::data::{load_mice, load_races};
//! use micerace::ledger::{LedgerConfig, RaceLedger};
//! use micerace::stats::SnapshotBuilder;
//!
//! let mice = load_mice("mice.json")?;
//! let races = load_races("races.json")?;
//! let ledger = RaceLedger::new(&mice, &races, LedgerConfig::default())?;
//!
//! let snapshot = SnapshotBuilder::default().build(&ledger, None)?;
//! for record in &snapshot.records {
//!     println!("{}: {:.3}", record.name, record.lifetime_win_ratio);
//! }
//! # Ok::<(), micerace::Error>(())
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod ledger;
pub mod models;
pub mod stats;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::Config;
pub use core::{EscalationPolicy, Mouse, MouseColor, Race};
pub use error::{Error, Result};
pub use ledger::{HistoricalRaceLedger, LedgerConfig, RaceLedger, RaceSystem};
pub use models::{MouseRecord, RawRace};
pub use stats::{MouseSnapshot, Snapshot, SnapshotBuilder, SnapshotConfig};
