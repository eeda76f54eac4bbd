use crate::{
    error::{LedgerDataError, RecordRef},
    model::{Expense, Member, MemberBalances, MemberId, Money, SettlementRecord},
    services::{
        MemberRoster,
        record_validator::{validate_expense, validate_settlement},
    },
};
use indexmap::IndexMap;

/// Folds expenses, their refunds, and direct settlements into one running
/// balance per member.
///
/// Every record is validated before it touches the running totals, so a
/// rejected record contributes nothing.
pub struct BalanceAccumulator<'a> {
    roster: MemberRoster<'a>,
    balances: MemberBalances,
}

impl<'a> BalanceAccumulator<'a> {
    pub fn new(members: &'a [Member]) -> Self {
        Self {
            roster: MemberRoster::new(members),
            balances: MemberBalances::default(),
        }
    }

    /// Starts every roster member at zero, so members without any record
    /// still get a balance row.
    pub fn new_with_members(members: &'a [Member]) -> Self {
        let mut accumulator = Self::new(members);
        for member in members {
            accumulator.entry(&member.id);
        }
        accumulator
    }

    /// Applies one expense:
    /// payers are credited what they paid, refund recipients are debited
    /// their equal part of each refund, and split members are debited their
    /// share rescaled from the total to the net amount.
    pub fn apply_expense(&mut self, expense: &Expense) -> Result<(), LedgerDataError> {
        validate_expense(expense)?;
        let out_of_range = || LedgerDataError::AmountOutOfRange {
            record: RecordRef::Expense(expense.id.clone()),
        };

        let total = expense.total_amount;
        let net = expense.net_amount();
        let mut deltas: Vec<(&MemberId, Money)> = Vec::new();

        for payer in &expense.payers {
            deltas.push((&payer.member_id, payer.amount));
        }

        for refund in &expense.refunds {
            let part = refund.amount.per_share(refund.refunded_to.len());
            for recipient in &refund.refunded_to {
                deltas.push((recipient, -part));
            }
        }

        for split in &expense.splits {
            let adjusted = if net.is_zero() {
                Money::ZERO
            } else {
                split
                    .amount
                    .checked_rescale(net, total)
                    .ok_or_else(out_of_range)?
            };
            deltas.push((&split.member_id, -adjusted));
        }

        self.commit(deltas).ok_or_else(out_of_range)?;

        tracing::trace!(
            expense_id = %expense.id,
            total = %total,
            net = %net,
            refund_count = expense.refunds.len(),
            "Expense applied to balances"
        );

        Ok(())
    }

    /// A recorded payment discharges the payer's debt and reduces what the
    /// receiver is still owed.
    pub fn apply_settlement(
        &mut self,
        settlement: &SettlementRecord,
    ) -> Result<(), LedgerDataError> {
        validate_settlement(settlement)?;
        self.commit(vec![
            (&settlement.from_user_id, settlement.amount),
            (&settlement.to_user_id, -settlement.amount),
        ])
        .ok_or_else(|| LedgerDataError::AmountOutOfRange {
            record: RecordRef::Settlement(settlement.id.clone()),
        })
    }

    pub fn balances(&self) -> &MemberBalances {
        &self.balances
    }

    /// Unrounded balances ordered by roster position, followed by ids
    /// missing from the roster in first-reference order.
    pub fn into_balances(self) -> MemberBalances {
        self.into_parts().1
    }

    pub fn into_parts(self) -> (MemberRoster<'a>, MemberBalances) {
        let Self { roster, balances } = self;
        let mut ranked: Vec<(usize, MemberId, Money)> = balances
            .into_iter()
            .enumerate()
            .map(|(seen, (id, amount))| {
                let rank = roster.position(&id).unwrap_or(roster.len() + seen);
                (rank, id, amount)
            })
            .collect();
        ranked.sort_by_key(|(rank, _, _)| *rank);

        let ordered = ranked
            .into_iter()
            .map(|(_, id, amount)| (id, amount))
            .collect();
        (roster, ordered)
    }

    fn entry(&mut self, member: &MemberId) -> &mut Money {
        self.balances.entry(member.clone()).or_insert(Money::ZERO)
    }

    /// Applies all deltas or none of them. `None` when a running balance
    /// would leave the decimal range.
    fn commit(&mut self, deltas: Vec<(&MemberId, Money)>) -> Option<()> {
        let mut staged: IndexMap<&MemberId, Money> = IndexMap::new();
        for (member, delta) in deltas {
            let current = match staged.get(member) {
                Some(amount) => *amount,
                None => self.balances.get(member).copied().unwrap_or(Money::ZERO),
            };
            staged.insert(member, current.checked_add(delta)?);
        }
        for (member, amount) in staged {
            *self.entry(member) = amount;
        }
        Some(())
    }
}
