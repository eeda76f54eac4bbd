use serde::{Serialize, Serializer};
use tripsplit_domain::{
    Balance, Expense, ExpenseSummary, LedgerDataError, MemberId, Money, SettlementRecord,
    SettlementSuggestion, Trip, TripId,
};

/// Every record of one trip, with refunds attached to their expenses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripSnapshot {
    pub trip: Trip,
    pub expenses: Vec<Expense>,
    pub settlements: Vec<SettlementRecord>,
}

impl TripSnapshot {
    /// Sum of every expense's gross total, before refunds.
    pub fn total_expenses(&self) -> Money {
        self.expenses.iter().map(|expense| expense.total_amount).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TripLedgerReport {
    pub trip_id: TripId,
    pub trip_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_description: Option<String>,
    pub currency: String,
    pub total_expenses: Money,
    pub expenses: Vec<ExpenseSummary>,
    pub balances: Vec<Balance>,
    pub suggestions: Vec<SettlementSuggestion>,
    #[serde(serialize_with = "serialize_skipped")]
    pub skipped: Vec<LedgerDataError>,
}

impl TripLedgerReport {
    pub fn balance_of(&self, member_id: &MemberId) -> Option<&Balance> {
        self.balances
            .iter()
            .find(|balance| &balance.member_id == member_id)
    }
}

fn serialize_skipped<S>(skipped: &[LedgerDataError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(skipped.iter().map(ToString::to_string))
}
