use crate::{
    error::LedgerServiceError,
    model::{TripLedgerReport, TripSnapshot},
    ports::{LedgerRecordStore, RefundScope, SettlementOptimizer},
    settings::LedgerSettings,
};
use fxhash::FxHashMap;
use tripsplit_domain::{
    BalanceCalculator, BalanceReport, Expense, ExpenseId, MemberId, Money, Refund, TripId,
};

/// Fetches a trip's records, derives balances and a settlement plan.
///
/// Holds no state between calls; every report is computed from a fresh
/// snapshot of the store.
#[derive(Clone, Copy)]
pub struct LedgerService<'a> {
    store: &'a dyn LedgerRecordStore,
    optimizer: &'a dyn SettlementOptimizer,
    settings: LedgerSettings,
}

impl<'a> LedgerService<'a> {
    pub fn new(
        store: &'a dyn LedgerRecordStore,
        optimizer: &'a dyn SettlementOptimizer,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            store,
            optimizer,
            settings,
        }
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    pub fn load_snapshot(&self, trip_id: &TripId) -> Result<TripSnapshot, LedgerServiceError> {
        let mut trip = self.store.fetch_trip(trip_id)?;
        trip.members = self.store.fetch_members(trip_id)?;
        let mut expenses = self.store.fetch_expenses(trip_id)?;
        let refunds = self.store.fetch_refunds(RefundScope::Trip(trip_id))?;
        attach_refunds(&mut expenses, refunds);
        let settlements = self.store.fetch_settlements(trip_id)?;

        Ok(TripSnapshot {
            trip,
            expenses,
            settlements,
        })
    }

    pub fn build_report(&self, trip_id: &TripId) -> Result<TripLedgerReport, LedgerServiceError> {
        let snapshot = self.load_snapshot(trip_id)?;
        self.report_for(snapshot)
    }

    pub fn report_for(&self, snapshot: TripSnapshot) -> Result<TripLedgerReport, LedgerServiceError> {
        let calculator = BalanceCalculator::new(self.settings.balance_options());
        let BalanceReport { balances, skipped } = calculator.compute(
            &snapshot.trip.members,
            &snapshot.expenses,
            &snapshot.settlements,
        )?;
        let suggestions = self.optimizer.optimize(
            &balances,
            &snapshot.trip.currency,
            self.settings.settlement_context(),
        )?;

        let total_expenses = snapshot.total_expenses();
        let TripSnapshot { trip, expenses, .. } = snapshot;
        tracing::info!(
            trip_id = %trip.id,
            expense_count = expenses.len(),
            balance_count = balances.len(),
            suggestion_count = suggestions.len(),
            skipped_count = skipped.len(),
            "Trip ledger computed"
        );

        Ok(TripLedgerReport {
            trip_id: trip.id,
            trip_name: trip.name,
            trip_description: trip.description,
            currency: trip.currency,
            total_expenses,
            expenses: expenses.iter().map(Expense::summary).collect(),
            balances,
            suggestions,
            skipped,
        })
    }

    /// The member's rounded balance; zero when no record references them.
    pub fn balance_for(
        &self,
        trip_id: &TripId,
        member_id: &MemberId,
    ) -> Result<Money, LedgerServiceError> {
        let report = self.build_report(trip_id)?;
        Ok(report
            .balance_of(member_id)
            .map_or(Money::ZERO, |balance| balance.amount))
    }

    pub fn expense_refunds(&self, expense_id: &ExpenseId) -> Result<Vec<Refund>, LedgerServiceError> {
        Ok(self.store.fetch_refunds(RefundScope::Expense(expense_id))?)
    }
}

fn attach_refunds(expenses: &mut [Expense], refunds: Vec<Refund>) {
    let mut by_expense: FxHashMap<ExpenseId, Vec<Refund>> = FxHashMap::default();
    for refund in refunds {
        by_expense
            .entry(refund.expense_id.clone())
            .or_default()
            .push(refund);
    }

    for expense in expenses.iter_mut() {
        expense.refunds = by_expense.remove(&expense.id).unwrap_or_default();
    }

    for (expense_id, orphans) in by_expense {
        tracing::warn!(
            expense_id = %expense_id,
            refund_count = orphans.len(),
            "Ignoring refunds whose expense is not part of the trip"
        );
    }
}
