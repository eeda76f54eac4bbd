use std::fmt;

use crate::{
    model::{ExpenseId, Money, RefundId, SettlementId},
    services::{SettlementPlanError, SettlementRoundingError},
};

/// Which ledger record a data error was raised for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordRef {
    Expense(ExpenseId),
    Refund {
        expense_id: ExpenseId,
        refund_id: RefundId,
    },
    Settlement(SettlementId),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Expense(id) => write!(f, "expense {id}"),
            RecordRef::Refund {
                expense_id,
                refund_id,
            } => write!(f, "refund {refund_id} of expense {expense_id}"),
            RecordRef::Settlement(id) => write!(f, "settlement {id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountField {
    Total,
    Payer,
    Split,
    Refund,
    Settlement,
}

impl fmt::Display for AmountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AmountField::Total => "total",
            AmountField::Payer => "payer",
            AmountField::Split => "split",
            AmountField::Refund => "refund",
            AmountField::Settlement => "settlement",
        };
        f.write_str(label)
    }
}

/// Caller-correctable problems with a single record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerDataError {
    #[error("{record}: {field} amount {amount} is negative")]
    NegativeAmount {
        record: RecordRef,
        field: AmountField,
        amount: Money,
    },
    #[error("{record}: total amount must be positive (found {total})")]
    NonPositiveTotal { record: RecordRef, total: Money },
    #[error("{record}: expense has no payers")]
    MissingPayers { record: RecordRef },
    #[error("{record}: expense has no splits")]
    MissingSplits { record: RecordRef },
    #[error("{record}: {field} shares sum to {sum} but the total is {total}")]
    ShareTotalMismatch {
        record: RecordRef,
        field: AmountField,
        sum: Money,
        total: Money,
    },
    #[error("{record}: refund has no recipients")]
    MissingRefundRecipients { record: RecordRef },
    #[error("{record}: refund is recorded against expense {actual}")]
    ForeignRefund { record: RecordRef, actual: ExpenseId },
    #[error("{record}: refunds reach {refunded}, more than the expense total {total}")]
    OverRefunded {
        record: RecordRef,
        refunded: Money,
        total: Money,
    },
    #[error("{record}: amounts exceed the representable range")]
    AmountOutOfRange { record: RecordRef },
}

impl LedgerDataError {
    pub fn record(&self) -> &RecordRef {
        match self {
            LedgerDataError::NegativeAmount { record, .. }
            | LedgerDataError::NonPositiveTotal { record, .. }
            | LedgerDataError::MissingPayers { record }
            | LedgerDataError::MissingSplits { record }
            | LedgerDataError::ShareTotalMismatch { record, .. }
            | LedgerDataError::MissingRefundRecipients { record }
            | LedgerDataError::ForeignRefund { record, .. }
            | LedgerDataError::OverRefunded { record, .. }
            | LedgerDataError::AmountOutOfRange { record } => record,
        }
    }
}

/// Internal failures that no caller input can fix.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("balance rounding failed: {0}")]
    Rounding(#[from] SettlementRoundingError),
    #[error("settlement planning failed: {0}")]
    Planner(#[from] SettlementPlanError),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Data(#[from] LedgerDataError),
    #[error("internal consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
}

impl From<SettlementRoundingError> for LedgerError {
    fn from(err: SettlementRoundingError) -> Self {
        LedgerError::Consistency(err.into())
    }
}

impl From<SettlementPlanError> for LedgerError {
    fn from(err: SettlementPlanError) -> Self {
        LedgerError::Consistency(err.into())
    }
}
