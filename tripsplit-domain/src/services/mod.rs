pub mod balance_accumulator;
pub mod balance_calculator;
pub mod member_roster;
pub mod record_validator;
pub mod settlement_planner;
pub mod settlement_rounding;

pub use balance_accumulator::BalanceAccumulator;
pub use balance_calculator::{
    BalanceCalculator, BalanceOptions, BalanceReport, InvalidRecordPolicy, compute_balances,
};
pub use member_roster::{MemberRoster, UNKNOWN_MEMBER_NAME};
pub use record_validator::{validate_expense, validate_settlement};
pub use settlement_planner::{PlanSide, SettlementPlanError, SettlementPlanner, suggest_settlements};
pub use settlement_rounding::{
    RoundingMode, SettlementContext, SettlementRoundingError, quantize_balances,
};
