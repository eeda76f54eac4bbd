#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod ledger_service;
pub mod model;
pub mod ports;
pub mod settings;

pub use error::{LedgerServiceError, SettlementOptimizationError, StoreError};
pub use ledger_service::LedgerService;
pub use model::{TripLedgerReport, TripSnapshot};
pub use ports::{LedgerRecordStore, RefundScope, SettlementOptimizer};
pub use settings::LedgerSettings;
