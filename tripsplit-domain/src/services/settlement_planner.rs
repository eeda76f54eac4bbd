use crate::{
    model::{Balance, Money, SettlementSuggestion},
    services::SettlementContext,
};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanSide {
    Creditors,
    Debtors,
}

impl fmt::Display for PlanSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSide::Creditors => f.write_str("creditors"),
            PlanSide::Debtors => f.write_str("debtors"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettlementPlanError {
    /// One side ran out while the other still held more than the
    /// tolerance band can explain. Only reachable with non-zero-sum input.
    #[error("{side} still hold {remaining} after matching, more than the {slack} tolerance slack")]
    Unbalanced {
        side: PlanSide,
        remaining: Money,
        slack: Money,
    },
}

struct Party<'a> {
    balance: &'a Balance,
    remaining: Money,
}

/// Greedy largest-creditor / largest-debtor matching.
///
/// Produces at most `creditors + debtors - 1` transfers. Not guaranteed to be
/// the minimum transfer count.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettlementPlanner {
    context: SettlementContext,
}

impl SettlementPlanner {
    pub fn new(context: SettlementContext) -> Self {
        Self { context }
    }

    /// Plans transfers that bring every balance back inside the tolerance
    /// band of one minor unit.
    pub fn plan(
        &self,
        balances: &[Balance],
        currency: &str,
    ) -> Result<Vec<SettlementSuggestion>, SettlementPlanError> {
        let tolerance = self.context.atomic_unit();
        // balances inside the band are left alone; whatever they hold may
        // legitimately remain on the other side after matching
        let mut slack = tolerance;
        let mut creditors = Vec::new();
        let mut debtors = Vec::new();
        for balance in balances {
            if balance.amount > tolerance {
                creditors.push(Party {
                    balance,
                    remaining: balance.amount,
                });
            } else if balance.amount < -tolerance {
                debtors.push(Party {
                    balance,
                    remaining: -balance.amount,
                });
            } else {
                slack += balance.amount.abs();
            }
        }

        // sort_by is stable: equal amounts keep input order
        creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
        debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

        let mut suggestions = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < creditors.len() && j < debtors.len() {
            let creditor = &mut creditors[i];
            let debtor = &mut debtors[j];
            let amount = creditor.remaining.min(debtor.remaining);

            if amount > tolerance {
                suggestions.push(SettlementSuggestion {
                    from_user_id: debtor.balance.member_id.clone(),
                    from_user_name: debtor.balance.name.clone(),
                    to_user_id: creditor.balance.member_id.clone(),
                    to_user_name: creditor.balance.name.clone(),
                    amount: self.context.round(amount),
                    currency: currency.to_string(),
                });
            }

            creditor.remaining -= amount;
            debtor.remaining -= amount;
            if creditor.remaining < tolerance {
                i += 1;
            }
            if debtor.remaining < tolerance {
                j += 1;
            }
        }

        let leftover_credit: Money = creditors[i..].iter().map(|party| party.remaining).sum();
        let leftover_debt: Money = debtors[j..].iter().map(|party| party.remaining).sum();
        for (side, remaining) in [
            (PlanSide::Creditors, leftover_credit),
            (PlanSide::Debtors, leftover_debt),
        ] {
            if remaining > slack {
                tracing::error!(
                    side = %side,
                    remaining = %remaining,
                    slack = %slack,
                    suggestion_count = suggestions.len(),
                    "Settlement planning left an unmatched balance"
                );
                return Err(SettlementPlanError::Unbalanced {
                    side,
                    remaining,
                    slack,
                });
            }
        }

        tracing::debug!(
            creditor_count = creditors.len(),
            debtor_count = debtors.len(),
            suggestion_count = suggestions.len(),
            "Settlement plan computed"
        );
        Ok(suggestions)
    }
}

/// Plans settlements for already-rounded balances with two-decimal tolerance.
pub fn suggest_settlements(
    balances: &[Balance],
    currency: &str,
) -> Result<Vec<SettlementSuggestion>, SettlementPlanError> {
    SettlementPlanner::default().plan(balances, currency)
}
