use tripsplit_application::{SettlementOptimizationError, SettlementOptimizer};
use tripsplit_domain::{Balance, SettlementContext, SettlementPlanner, SettlementSuggestion};

/// Largest-creditor / largest-debtor matching from the domain planner.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedySettlementOptimizer;

impl SettlementOptimizer for GreedySettlementOptimizer {
    fn optimize(
        &self,
        balances: &[Balance],
        currency: &str,
        context: SettlementContext,
    ) -> Result<Vec<SettlementSuggestion>, SettlementOptimizationError> {
        Ok(SettlementPlanner::new(context).plan(balances, currency)?)
    }
}
