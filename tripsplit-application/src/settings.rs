use tripsplit_domain::{
    BalanceOptions, InvalidRecordPolicy, RoundingMode, SettlementContext,
};

/// Knobs for one [`crate::LedgerService`]; built by the caller and passed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerSettings {
    pub invalid_records: InvalidRecordPolicy,
    pub include_idle_members: bool,
    pub rounding_mode: RoundingMode,
}

impl LedgerSettings {
    pub fn settlement_context(&self) -> SettlementContext {
        SettlementContext {
            rounding_mode: self.rounding_mode,
            ..SettlementContext::minor_units()
        }
    }

    pub fn balance_options(&self) -> BalanceOptions {
        BalanceOptions {
            invalid_records: self.invalid_records,
            include_idle_members: self.include_idle_members,
            context: self.settlement_context(),
        }
    }
}
