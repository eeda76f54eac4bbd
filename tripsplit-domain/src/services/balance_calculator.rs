use crate::{
    error::{LedgerDataError, LedgerError},
    model::{Balance, Expense, Member, SettlementRecord},
    services::{BalanceAccumulator, SettlementContext, quantize_balances},
};
use std::str::FromStr;

/// What to do with a record that fails validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidRecordPolicy {
    /// Fail the whole computation on the first invalid record.
    #[default]
    Abort,
    /// Drop the record, log it, and report it in [`BalanceReport::skipped`].
    Skip,
}

impl FromStr for InvalidRecordPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(InvalidRecordPolicy::Abort),
            "skip" => Ok(InvalidRecordPolicy::Skip),
            other => Err(format!("unknown invalid-record policy '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceOptions {
    pub invalid_records: InvalidRecordPolicy,
    /// Emit zero rows for trip members no record references.
    pub include_idle_members: bool,
    pub context: SettlementContext,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub balances: Vec<Balance>,
    /// Records dropped under [`InvalidRecordPolicy::Skip`], in input order.
    pub skipped: Vec<LedgerDataError>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BalanceCalculator {
    options: BalanceOptions,
}

impl BalanceCalculator {
    pub fn new(options: BalanceOptions) -> Self {
        Self { options }
    }

    /// Folds every expense (with its refunds) and then every settlement into
    /// per-member balances rounded to the context's minor unit.
    ///
    /// The rounded balances always sum to exactly zero.
    pub fn compute(
        &self,
        members: &[Member],
        expenses: &[Expense],
        settlements: &[SettlementRecord],
    ) -> Result<BalanceReport, LedgerError> {
        let mut accumulator = if self.options.include_idle_members {
            BalanceAccumulator::new_with_members(members)
        } else {
            BalanceAccumulator::new(members)
        };
        let mut skipped = Vec::new();

        for expense in expenses {
            if let Err(err) = accumulator.apply_expense(expense) {
                self.reject(err, &mut skipped)?;
            }
        }
        for settlement in settlements {
            if let Err(err) = accumulator.apply_settlement(settlement) {
                self.reject(err, &mut skipped)?;
            }
        }

        let (roster, unrounded) = accumulator.into_parts();
        let rounded = quantize_balances(&unrounded, self.options.context)?;
        let balances = rounded
            .into_iter()
            .map(|(member_id, amount)| {
                let name = roster.display_name(&member_id).to_string();
                Balance {
                    member_id,
                    name,
                    amount,
                }
            })
            .collect();

        Ok(BalanceReport { balances, skipped })
    }

    fn reject(
        &self,
        err: LedgerDataError,
        skipped: &mut Vec<LedgerDataError>,
    ) -> Result<(), LedgerDataError> {
        match self.options.invalid_records {
            InvalidRecordPolicy::Abort => Err(err),
            InvalidRecordPolicy::Skip => {
                tracing::warn!(
                    record = %err.record(),
                    error = %err,
                    "Skipping invalid ledger record"
                );
                skipped.push(err);
                Ok(())
            }
        }
    }
}

/// Balances for one trip with default options: invalid records abort,
/// two-decimal banker's rounding, only referenced members.
pub fn compute_balances(
    members: &[Member],
    expenses: &[Expense],
    settlements: &[SettlementRecord],
) -> Result<Vec<Balance>, LedgerError> {
    BalanceCalculator::default()
        .compute(members, expenses, settlements)
        .map(|report| report.balances)
}
