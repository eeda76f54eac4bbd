use tripsplit_application::{LedgerServiceError, StoreError};
use tripsplit_domain::LedgerError;

/// One-line message for the CLI; the full error chain goes to the log.
pub fn format_service_error(error: &LedgerServiceError) -> String {
    match error {
        LedgerServiceError::Store(
            err @ (StoreError::TripNotFound(_)
            | StoreError::ExpenseNotFound(_)
            | StoreError::RefundNotFound(_)
            | StoreError::SettlementNotFound(_)
            | StoreError::MemberNotFound { .. }),
        ) => format!("Not found: {err}"),
        LedgerServiceError::Store(err) => format!("Record store error: {err}"),
        LedgerServiceError::Ledger(LedgerError::Data(err)) => {
            format!("Invalid record ({}): {err}", err.record())
        }
        LedgerServiceError::Ledger(LedgerError::Consistency(err)) => {
            format!("Internal error, please report it: {err}")
        }
        LedgerServiceError::Optimization(err) => {
            format!("Internal error, please report it: {err}")
        }
    }
}
