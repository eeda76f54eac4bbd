#![warn(clippy::uninlined_format_args)]

pub mod optimizer;
pub mod snapshot;
pub mod store;

pub use optimizer::GreedySettlementOptimizer;
pub use snapshot::{DocumentError, LedgerDocument};
pub use store::InMemoryLedgerStore;
