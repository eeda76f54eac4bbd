use crate::error::{SettlementOptimizationError, StoreError};
use tripsplit_domain::{
    Balance, Expense, ExpenseId, Member, Refund, SettlementContext, SettlementRecord,
    SettlementSuggestion, Trip, TripId,
};

/// Which refunds to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefundScope<'a> {
    /// Every refund recorded against any expense of the trip.
    Trip(&'a TripId),
    Expense(&'a ExpenseId),
}

/// Read side of the record store for one trip.
///
/// Implementations hand out owned copies; callers recompute from a fresh
/// snapshot on every request.
pub trait LedgerRecordStore: Send + Sync {
    fn fetch_trip(&self, trip_id: &TripId) -> Result<Trip, StoreError>;

    fn fetch_members(&self, trip_id: &TripId) -> Result<Vec<Member>, StoreError>;

    /// Expenses of the trip in recording order. Refunds are fetched
    /// separately with [`Self::fetch_refunds`].
    fn fetch_expenses(&self, trip_id: &TripId) -> Result<Vec<Expense>, StoreError>;

    fn fetch_refunds(&self, scope: RefundScope<'_>) -> Result<Vec<Refund>, StoreError>;

    fn fetch_settlements(&self, trip_id: &TripId) -> Result<Vec<SettlementRecord>, StoreError>;
}

pub trait SettlementOptimizer: Send + Sync {
    fn optimize(
        &self,
        balances: &[Balance],
        currency: &str,
        context: SettlementContext,
    ) -> Result<Vec<SettlementSuggestion>, SettlementOptimizationError>;
}
