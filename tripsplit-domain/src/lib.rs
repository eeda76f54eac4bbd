#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod services;

pub use error::{AmountField, ConsistencyError, LedgerDataError, LedgerError, RecordRef};
pub use model::{
    Balance, Expense, ExpenseId, ExpenseSummary, Member, MemberBalances, MemberId, Money,
    PayerShare, Refund, RefundId, SettlementId, SettlementRecord, SettlementSuggestion,
    SplitShare, Trip, TripId,
};
pub use services::{
    BalanceCalculator, BalanceOptions, BalanceReport, InvalidRecordPolicy, PlanSide,
    RoundingMode, SettlementContext, SettlementPlanError, SettlementPlanner,
    SettlementRoundingError, compute_balances, suggest_settlements,
};
