use fxhash::FxHashMap;
use tripsplit_application::{LedgerRecordStore, RefundScope, StoreError};
use tripsplit_domain::{
    Expense, ExpenseId, Member, MemberId, PayerShare, Refund, RefundId, SettlementId,
    SettlementRecord, SplitShare, Trip, TripId,
};

struct TripRecords {
    trip: Trip,
    expenses: Vec<Expense>,
    refunds: Vec<Refund>,
    settlements: Vec<SettlementRecord>,
}

impl TripRecords {
    fn new(trip: Trip) -> Self {
        Self {
            trip,
            expenses: Vec::new(),
            refunds: Vec::new(),
            settlements: Vec::new(),
        }
    }

    fn expense_position(&self, expense_id: &ExpenseId) -> Option<usize> {
        self.expenses
            .iter()
            .position(|expense| &expense.id == expense_id)
    }
}

/// Record store kept entirely in memory.
///
/// Expenses are stored without their refunds; refunds live in a per-trip list
/// and are joined back by the application layer.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    trips: FxHashMap<TripId, TripRecords>,
    // expense id -> owning trip
    expense_trips: FxHashMap<ExpenseId, TripId>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trip, or replaces the header (name, currency, members) of an
    /// existing one while keeping its records.
    pub fn insert_trip(&mut self, trip: Trip) -> Option<Trip> {
        match self.trips.get_mut(&trip.id) {
            Some(records) => Some(std::mem::replace(&mut records.trip, trip)),
            None => {
                self.trips.insert(trip.id.clone(), TripRecords::new(trip));
                None
            }
        }
    }

    pub fn add_member(&mut self, trip_id: &TripId, member: Member) -> Result<(), StoreError> {
        let records = self.trip_mut(trip_id)?;
        if !records.trip.is_member(&member.id) {
            records.trip.members.push(member);
        }
        Ok(())
    }

    /// Drops the member from the trip roster. Expenses, refunds and
    /// settlements that mention the member are kept as recorded.
    pub fn remove_member(
        &mut self,
        trip_id: &TripId,
        member_id: &MemberId,
    ) -> Result<Member, StoreError> {
        let records = self.trip_mut(trip_id)?;
        let position = records
            .trip
            .members
            .iter()
            .position(|member| &member.id == member_id)
            .ok_or_else(|| StoreError::MemberNotFound {
                trip_id: trip_id.clone(),
                member_id: member_id.clone(),
            })?;
        let member = records.trip.members.remove(position);
        tracing::debug!(
            trip_id = %trip_id,
            member_id = %member_id,
            "Member removed from trip roster"
        );
        Ok(member)
    }

    /// Records an expense, replacing a previous version with the same id.
    /// Refunds nested in `expense` are moved into the refund list.
    pub fn record_expense(&mut self, mut expense: Expense) -> Result<(), StoreError> {
        if let Some(owner) = self.expense_trips.get(&expense.id)
            && owner != &expense.trip_id
        {
            return Err(StoreError::ExpenseOwnedElsewhere {
                expense_id: expense.id,
                owner: owner.clone(),
            });
        }

        let nested = std::mem::take(&mut expense.refunds);
        let expense_id = expense.id.clone();
        let trip_id = expense.trip_id.clone();
        let records = self.trip_mut(&trip_id)?;
        match records.expense_position(&expense_id) {
            Some(position) => records.expenses[position] = expense,
            None => records.expenses.push(expense),
        }
        self.expense_trips.insert(expense_id, trip_id);

        for refund in nested {
            self.record_refund(refund)?;
        }
        Ok(())
    }

    /// Replaces the payer and split lists of an existing expense.
    pub fn update_expense_shares(
        &mut self,
        expense_id: &ExpenseId,
        payers: Vec<PayerShare>,
        splits: Vec<SplitShare>,
    ) -> Result<(), StoreError> {
        let expense = self.expense_mut(expense_id)?;
        expense.payers = payers;
        expense.splits = splits;
        Ok(())
    }

    pub fn record_refund(&mut self, refund: Refund) -> Result<(), StoreError> {
        let trip_id = self.owning_trip(&refund.expense_id)?.clone();
        let records = self.trip_mut(&trip_id)?;
        match records
            .refunds
            .iter()
            .position(|existing| existing.id == refund.id)
        {
            Some(position) => records.refunds[position] = refund,
            None => records.refunds.push(refund),
        }
        Ok(())
    }

    pub fn record_settlement(&mut self, settlement: SettlementRecord) -> Result<(), StoreError> {
        let records = self.trip_mut(&settlement.trip_id)?;
        match records
            .settlements
            .iter()
            .position(|existing| existing.id == settlement.id)
        {
            Some(position) => records.settlements[position] = settlement,
            None => records.settlements.push(settlement),
        }
        Ok(())
    }

    /// Removes the trip together with all of its expenses, refunds and
    /// settlements.
    pub fn delete_trip(&mut self, trip_id: &TripId) -> Result<Trip, StoreError> {
        let records = self
            .trips
            .remove(trip_id)
            .ok_or_else(|| StoreError::TripNotFound(trip_id.clone()))?;
        for expense in &records.expenses {
            self.expense_trips.remove(&expense.id);
        }
        tracing::debug!(
            trip_id = %trip_id,
            expense_count = records.expenses.len(),
            refund_count = records.refunds.len(),
            settlement_count = records.settlements.len(),
            "Trip deleted with its records"
        );
        Ok(records.trip)
    }

    /// Removes the expense and every refund recorded against it.
    pub fn delete_expense(&mut self, expense_id: &ExpenseId) -> Result<Expense, StoreError> {
        let trip_id = self.owning_trip(expense_id)?.clone();
        let records = self.trip_mut(&trip_id)?;
        let position = records
            .expense_position(expense_id)
            .ok_or_else(|| StoreError::ExpenseNotFound(expense_id.clone()))?;
        let mut expense = records.expenses.remove(position);

        let (removed, kept): (Vec<Refund>, Vec<Refund>) = std::mem::take(&mut records.refunds)
            .into_iter()
            .partition(|refund| &refund.expense_id == expense_id);
        records.refunds = kept;
        expense.refunds = removed;
        self.expense_trips.remove(expense_id);
        Ok(expense)
    }

    pub fn delete_refund(&mut self, refund_id: &RefundId) -> Result<Refund, StoreError> {
        for records in self.trips.values_mut() {
            if let Some(position) = records.refunds.iter().position(|refund| &refund.id == refund_id)
            {
                return Ok(records.refunds.remove(position));
            }
        }
        Err(StoreError::RefundNotFound(refund_id.clone()))
    }

    pub fn delete_settlement(
        &mut self,
        settlement_id: &SettlementId,
    ) -> Result<SettlementRecord, StoreError> {
        for records in self.trips.values_mut() {
            if let Some(position) = records
                .settlements
                .iter()
                .position(|settlement| &settlement.id == settlement_id)
            {
                return Ok(records.settlements.remove(position));
            }
        }
        Err(StoreError::SettlementNotFound(settlement_id.clone()))
    }

    /// Trip ids in ascending order.
    pub fn trip_ids(&self) -> Vec<TripId> {
        let mut ids: Vec<TripId> = self.trips.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn trip(&self, trip_id: &TripId) -> Result<&TripRecords, StoreError> {
        self.trips
            .get(trip_id)
            .ok_or_else(|| StoreError::TripNotFound(trip_id.clone()))
    }

    fn trip_mut(&mut self, trip_id: &TripId) -> Result<&mut TripRecords, StoreError> {
        self.trips
            .get_mut(trip_id)
            .ok_or_else(|| StoreError::TripNotFound(trip_id.clone()))
    }

    fn owning_trip(&self, expense_id: &ExpenseId) -> Result<&TripId, StoreError> {
        self.expense_trips
            .get(expense_id)
            .ok_or_else(|| StoreError::ExpenseNotFound(expense_id.clone()))
    }

    fn expense_mut(&mut self, expense_id: &ExpenseId) -> Result<&mut Expense, StoreError> {
        let trip_id = self.owning_trip(expense_id)?.clone();
        let records = self.trip_mut(&trip_id)?;
        let position = records
            .expense_position(expense_id)
            .ok_or_else(|| StoreError::ExpenseNotFound(expense_id.clone()))?;
        Ok(&mut records.expenses[position])
    }
}

impl LedgerRecordStore for InMemoryLedgerStore {
    fn fetch_trip(&self, trip_id: &TripId) -> Result<Trip, StoreError> {
        Ok(self.trip(trip_id)?.trip.clone())
    }

    fn fetch_members(&self, trip_id: &TripId) -> Result<Vec<Member>, StoreError> {
        Ok(self.trip(trip_id)?.trip.members.clone())
    }

    fn fetch_expenses(&self, trip_id: &TripId) -> Result<Vec<Expense>, StoreError> {
        Ok(self.trip(trip_id)?.expenses.clone())
    }

    fn fetch_refunds(&self, scope: RefundScope<'_>) -> Result<Vec<Refund>, StoreError> {
        match scope {
            RefundScope::Trip(trip_id) => Ok(self.trip(trip_id)?.refunds.clone()),
            RefundScope::Expense(expense_id) => {
                let records = self.trip(self.owning_trip(expense_id)?)?;
                Ok(records
                    .refunds
                    .iter()
                    .filter(|refund| &refund.expense_id == expense_id)
                    .cloned()
                    .collect())
            }
        }
    }

    fn fetch_settlements(&self, trip_id: &TripId) -> Result<Vec<SettlementRecord>, StoreError> {
        Ok(self.trip(trip_id)?.settlements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tripsplit_domain::Money;

    fn expense(id: &str, trip: &str, total: i64) -> Expense {
        Expense {
            id: ExpenseId::from(id),
            trip_id: TripId::from(trip),
            description: format!("{id} description"),
            total_amount: Money::from_i64(total),
            payers: vec![PayerShare {
                member_id: MemberId::from("a"),
                amount: Money::from_i64(total),
            }],
            splits: vec![SplitShare {
                member_id: MemberId::from("b"),
                amount: Money::from_i64(total),
            }],
            refunds: Vec::new(),
            category: None,
            date: None,
        }
    }

    fn refund(id: &str, expense_id: &str) -> Refund {
        Refund {
            id: RefundId::from(id),
            expense_id: ExpenseId::from(expense_id),
            amount: Money::from_i64(5),
            reason: "cancelled".to_string(),
            refunded_to: vec![MemberId::from("b")],
        }
    }

    #[fixture]
    fn store() -> InMemoryLedgerStore {
        let mut store = InMemoryLedgerStore::new();
        store.insert_trip(Trip {
            id: TripId::from("goa"),
            name: "Goa".to_string(),
            description: Some("Beach week".to_string()),
            currency: "INR".to_string(),
            members: vec![Member::new("a", "Aniket"), Member::new("b", "Ritaban")],
        });
        store.record_expense(expense("e1", "goa", 100)).expect("trip exists");
        store.record_expense(expense("e2", "goa", 40)).expect("trip exists");
        store.record_refund(refund("r1", "e1")).expect("expense exists");
        store.record_refund(refund("r2", "e2")).expect("expense exists");
        store
            .record_settlement(SettlementRecord {
                id: SettlementId::from("s1"),
                trip_id: TripId::from("goa"),
                from_user_id: MemberId::from("b"),
                to_user_id: MemberId::from("a"),
                amount: Money::from_i64(10),
                note: None,
            })
            .expect("trip exists");
        store
    }

    #[rstest]
    fn fetches_refunds_by_scope(store: InMemoryLedgerStore) {
        let goa = TripId::from("goa");
        let e2 = ExpenseId::from("e2");

        assert_eq!(store.fetch_refunds(RefundScope::Trip(&goa)).map(|r| r.len()), Ok(2));
        let for_e2 = store
            .fetch_refunds(RefundScope::Expense(&e2))
            .expect("expense exists");
        assert_eq!(for_e2, vec![refund("r2", "e2")]);
    }

    #[rstest]
    fn unknown_ids_are_reported(mut store: InMemoryLedgerStore) {
        let nowhere = TripId::from("nowhere");
        assert_eq!(
            store.fetch_trip(&nowhere),
            Err(StoreError::TripNotFound(nowhere.clone()))
        );
        assert_eq!(
            store.record_refund(refund("r9", "e9")),
            Err(StoreError::ExpenseNotFound(ExpenseId::from("e9")))
        );
        assert_eq!(
            store.record_expense(expense("e9", "nowhere", 1)),
            Err(StoreError::TripNotFound(nowhere))
        );
    }

    #[rstest]
    fn deleting_expense_removes_its_refunds(mut store: InMemoryLedgerStore) {
        let removed = store
            .delete_expense(&ExpenseId::from("e1"))
            .expect("expense exists");
        assert_eq!(removed.refunds, vec![refund("r1", "e1")]);

        let goa = TripId::from("goa");
        let remaining = store
            .fetch_refunds(RefundScope::Trip(&goa))
            .expect("trip exists");
        assert_eq!(remaining, vec![refund("r2", "e2")]);
        assert_eq!(
            store.fetch_refunds(RefundScope::Expense(&ExpenseId::from("e1"))),
            Err(StoreError::ExpenseNotFound(ExpenseId::from("e1")))
        );
    }

    #[rstest]
    fn deleting_trip_cascades(mut store: InMemoryLedgerStore) {
        let goa = TripId::from("goa");
        let trip = store.delete_trip(&goa).expect("trip exists");

        assert_eq!(trip.name, "Goa");
        assert!(store.trip_ids().is_empty());
        assert_eq!(
            store.record_refund(refund("r3", "e2")),
            Err(StoreError::ExpenseNotFound(ExpenseId::from("e2")))
        );
    }

    #[rstest]
    fn editing_shares_replaces_lists(mut store: InMemoryLedgerStore) {
        let e1 = ExpenseId::from("e1");
        let shares = vec![
            SplitShare {
                member_id: MemberId::from("a"),
                amount: Money::from_i64(50),
            },
            SplitShare {
                member_id: MemberId::from("b"),
                amount: Money::from_i64(50),
            },
        ];
        store
            .update_expense_shares(&e1, Vec::new(), shares.clone())
            .expect("expense exists");

        let expenses = store
            .fetch_expenses(&TripId::from("goa"))
            .expect("trip exists");
        assert!(expenses[0].payers.is_empty());
        assert_eq!(expenses[0].splits, shares);
    }

    #[rstest]
    fn nested_refunds_are_moved_to_refund_list(mut store: InMemoryLedgerStore) {
        let mut taxi = expense("e3", "goa", 20);
        taxi.refunds = vec![refund("r3", "e3")];
        store.record_expense(taxi).expect("trip exists");

        let expenses = store
            .fetch_expenses(&TripId::from("goa"))
            .expect("trip exists");
        assert!(expenses.iter().all(|expense| expense.refunds.is_empty()));
        assert_eq!(
            store.fetch_refunds(RefundScope::Expense(&ExpenseId::from("e3"))),
            Ok(vec![refund("r3", "e3")])
        );
    }

    #[rstest]
    fn deletes_single_records(mut store: InMemoryLedgerStore) {
        assert!(store.delete_refund(&RefundId::from("r1")).is_ok());
        assert_eq!(
            store.delete_refund(&RefundId::from("r1")),
            Err(StoreError::RefundNotFound(RefundId::from("r1")))
        );
        assert!(store.delete_settlement(&SettlementId::from("s1")).is_ok());
        assert_eq!(
            store.fetch_settlements(&TripId::from("goa")).map(|s| s.len()),
            Ok(0)
        );
    }

    #[rstest]
    fn removing_member_keeps_their_records(mut store: InMemoryLedgerStore) {
        let goa = TripId::from("goa");
        let removed = store
            .remove_member(&goa, &MemberId::from("b"))
            .expect("member exists");
        assert_eq!(removed.name, "Ritaban");

        let members = store.fetch_members(&goa).expect("trip exists");
        assert_eq!(members, vec![Member::new("a", "Aniket")]);
        assert_eq!(store.fetch_expenses(&goa).map(|e| e.len()), Ok(2));
        assert_eq!(store.fetch_refunds(RefundScope::Trip(&goa)).map(|r| r.len()), Ok(2));
        assert_eq!(store.fetch_settlements(&goa).map(|s| s.len()), Ok(1));

        assert_eq!(
            store.remove_member(&goa, &MemberId::from("b")),
            Err(StoreError::MemberNotFound {
                trip_id: goa,
                member_id: MemberId::from("b"),
            })
        );
    }

    #[rstest]
    fn add_member_ignores_duplicates(mut store: InMemoryLedgerStore) {
        let goa = TripId::from("goa");
        store
            .add_member(&goa, Member::new("a", "Someone Else"))
            .expect("trip exists");
        store
            .add_member(&goa, Member::new("c", "Chitra"))
            .expect("trip exists");

        let names: Vec<String> = store
            .fetch_members(&goa)
            .expect("trip exists")
            .into_iter()
            .map(|member| member.name)
            .collect();
        assert_eq!(names, vec!["Aniket", "Ritaban", "Chitra"]);
    }
}
