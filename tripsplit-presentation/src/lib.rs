#![warn(clippy::uninlined_format_args)]

pub mod error_presenter;
pub mod ledger_presenter;
pub mod text_table;

pub use error_presenter::format_service_error;
pub use ledger_presenter::{LedgerPresenter, LedgerView, format_amount};
