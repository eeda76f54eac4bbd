use crate::{
    error::{AmountField, LedgerDataError, RecordRef},
    model::{Expense, Money, Refund, SettlementRecord},
};

/// Checks an expense and all of its refunds before anything is accumulated.
///
/// Share lists must add up to the total exactly; anything else would break
/// the zero-sum property of the resulting balances.
pub fn validate_expense(expense: &Expense) -> Result<(), LedgerDataError> {
    let record = RecordRef::Expense(expense.id.clone());
    let total = expense.total_amount;

    if total.is_negative() {
        return Err(LedgerDataError::NegativeAmount {
            record,
            field: AmountField::Total,
            amount: total,
        });
    }
    if total.is_zero() {
        return Err(LedgerDataError::NonPositiveTotal { record, total });
    }
    if expense.payers.is_empty() {
        return Err(LedgerDataError::MissingPayers { record });
    }
    if expense.splits.is_empty() {
        return Err(LedgerDataError::MissingSplits { record });
    }

    let payer_amounts = expense.payers.iter().map(|payer| payer.amount);
    check_shares(&record, AmountField::Payer, payer_amounts, total)?;
    let split_amounts = expense.splits.iter().map(|split| split.amount);
    check_shares(&record, AmountField::Split, split_amounts, total)?;

    let mut refunded = Money::ZERO;
    for refund in &expense.refunds {
        validate_refund(expense, refund)?;
        refunded = refunded.checked_add(refund.amount).ok_or_else(|| {
            LedgerDataError::AmountOutOfRange {
                record: refund_ref(expense, refund),
            }
        })?;
        if refunded > total {
            return Err(LedgerDataError::OverRefunded {
                record: refund_ref(expense, refund),
                refunded,
                total,
            });
        }
    }

    Ok(())
}

fn validate_refund(expense: &Expense, refund: &Refund) -> Result<(), LedgerDataError> {
    let record = refund_ref(expense, refund);
    if refund.expense_id != expense.id {
        return Err(LedgerDataError::ForeignRefund {
            record,
            actual: refund.expense_id.clone(),
        });
    }
    if refund.amount.is_negative() {
        return Err(LedgerDataError::NegativeAmount {
            record,
            field: AmountField::Refund,
            amount: refund.amount,
        });
    }
    if refund.refunded_to.is_empty() {
        return Err(LedgerDataError::MissingRefundRecipients { record });
    }
    Ok(())
}

pub fn validate_settlement(settlement: &SettlementRecord) -> Result<(), LedgerDataError> {
    if settlement.amount.is_negative() {
        return Err(LedgerDataError::NegativeAmount {
            record: RecordRef::Settlement(settlement.id.clone()),
            field: AmountField::Settlement,
            amount: settlement.amount,
        });
    }
    Ok(())
}

fn check_shares(
    record: &RecordRef,
    field: AmountField,
    amounts: impl Iterator<Item = Money>,
    total: Money,
) -> Result<(), LedgerDataError> {
    let mut sum = Money::ZERO;
    for amount in amounts {
        if amount.is_negative() {
            return Err(LedgerDataError::NegativeAmount {
                record: record.clone(),
                field,
                amount,
            });
        }
        sum = sum
            .checked_add(amount)
            .ok_or_else(|| LedgerDataError::AmountOutOfRange {
                record: record.clone(),
            })?;
    }
    if sum != total {
        return Err(LedgerDataError::ShareTotalMismatch {
            record: record.clone(),
            field,
            sum,
            total,
        });
    }
    Ok(())
}

fn refund_ref(expense: &Expense, refund: &Refund) -> RecordRef {
    RecordRef::Refund {
        expense_id: expense.id.clone(),
        refund_id: refund.id.clone(),
    }
}
