use tripsplit_domain::{
    ExpenseId, LedgerError, MemberId, RefundId, SettlementId, SettlementPlanError, TripId,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("trip {0} not found")]
    TripNotFound(TripId),
    #[error("expense {0} not found")]
    ExpenseNotFound(ExpenseId),
    #[error("refund {0} not found")]
    RefundNotFound(RefundId),
    #[error("settlement {0} not found")]
    SettlementNotFound(SettlementId),
    #[error("member {member_id} not found in trip {trip_id}")]
    MemberNotFound { trip_id: TripId, member_id: MemberId },
    #[error("expense {expense_id} already belongs to trip {owner}")]
    ExpenseOwnedElsewhere { expense_id: ExpenseId, owner: TripId },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettlementOptimizationError {
    #[error(transparent)]
    Plan(#[from] SettlementPlanError),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("settlement optimization failed: {0}")]
    Optimization(#[from] SettlementOptimizationError),
}

impl LedgerServiceError {
    /// Whether the caller can fix the problem by correcting input records.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            LedgerServiceError::Store(_) | LedgerServiceError::Ledger(LedgerError::Data(_))
        )
    }
}
