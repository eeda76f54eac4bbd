use crate::text_table::{Alignment, TextTableBuilder, combine_sections};
use std::borrow::Cow;
use tripsplit_application::TripLedgerReport;
use tripsplit_domain::{Balance, ExpenseSummary, Money, SettlementContext, SettlementSuggestion};

const MEMBER: &str = "Member";
const BALANCE: &str = "Balance";
const FROM: &str = "From";
const TO: &str = "To";
const AMOUNT: &str = "Amount";
const EXPENSE: &str = "Expense";
const DATE: &str = "Date";
const CATEGORY: &str = "Category";
const TOTAL: &str = "Total";
const REFUNDED: &str = "Refunded";
const NET: &str = "Net";
const ALL_SETTLED: &str = "Everyone is settled up.";

/// Renders trip reports as text, printing amounts at the context's scale.
#[derive(Clone, Copy, Debug, Default)]
pub struct LedgerPresenter {
    context: SettlementContext,
}

pub struct LedgerView {
    pub heading: String,
    pub expense_table: Option<String>,
    pub balance_table: String,
    /// `None` when nobody owes anything.
    pub suggestion_table: Option<String>,
    pub skipped: Vec<String>,
}

impl LedgerView {
    pub fn to_text(&self) -> String {
        let skipped = (!self.skipped.is_empty()).then(|| {
            let mut lines = format!("Skipped {} invalid record(s):", self.skipped.len());
            for reason in &self.skipped {
                lines.push_str("\n  - ");
                lines.push_str(reason);
            }
            lines
        });
        let suggestions = self.suggestion_table.as_deref().unwrap_or(ALL_SETTLED);

        let mut sections = vec![self.heading.as_str()];
        sections.extend(self.expense_table.as_deref());
        sections.push(&self.balance_table);
        sections.push(suggestions);
        sections.extend(skipped.as_deref());
        combine_sections(&sections).unwrap_or_default()
    }
}

impl LedgerPresenter {
    pub fn new(context: SettlementContext) -> Self {
        Self { context }
    }

    pub fn render(&self, report: &TripLedgerReport) -> LedgerView {
        let mut heading = format!(
            "{} ({}) | total expenses {} {}",
            trip_label(report),
            report.currency,
            self.amount(report.total_expenses),
            report.currency
        );
        if let Some(description) = report.trip_description.as_deref()
            && !description.is_empty()
        {
            heading.push('\n');
            heading.push_str(description);
        }

        LedgerView {
            heading,
            expense_table: (!report.expenses.is_empty())
                .then(|| self.build_expense_table(&report.expenses)),
            balance_table: self.build_balance_table(&report.balances),
            suggestion_table: (!report.suggestions.is_empty())
                .then(|| self.build_suggestion_table(&report.suggestions)),
            skipped: report.skipped.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn build_balance_table(&self, balances: &[Balance]) -> String {
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right])
            .headers(&[Cow::Borrowed(MEMBER), Cow::Borrowed(BALANCE)]);

        for balance in balances {
            let sign = if balance.amount.is_negative() { "" } else { "+" };
            builder = builder.row([
                Cow::Borrowed(balance.name.as_str()),
                Cow::Owned(format!("{sign}{}", self.amount(balance.amount))),
            ]);
        }

        builder.build()
    }

    pub fn build_suggestion_table(&self, suggestions: &[SettlementSuggestion]) -> String {
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Left, Alignment::Right])
            .headers(&[
                Cow::Borrowed(FROM),
                Cow::Borrowed(TO),
                Cow::Borrowed(AMOUNT),
            ]);

        for suggestion in suggestions {
            builder = builder.row([
                Cow::Borrowed(suggestion.from_user_name.as_str()),
                Cow::Borrowed(suggestion.to_user_name.as_str()),
                Cow::Owned(format!(
                    "{} {}",
                    self.amount(suggestion.amount),
                    suggestion.currency
                )),
            ]);
        }

        builder.build()
    }

    pub fn build_expense_table(&self, expenses: &[ExpenseSummary]) -> String {
        let mut builder = TextTableBuilder::new()
            .alignments(&[
                Alignment::Left,
                Alignment::Left,
                Alignment::Left,
                Alignment::Right,
                Alignment::Right,
                Alignment::Right,
            ])
            .headers(&[
                Cow::Borrowed(EXPENSE),
                Cow::Borrowed(DATE),
                Cow::Borrowed(CATEGORY),
                Cow::Borrowed(TOTAL),
                Cow::Borrowed(REFUNDED),
                Cow::Borrowed(NET),
            ]);

        for expense in expenses {
            let label = if expense.description.is_empty() {
                Cow::Owned(expense.expense_id.to_string())
            } else {
                Cow::Borrowed(expense.description.as_str())
            };
            builder = builder.row([
                label,
                Cow::Borrowed(expense.date.as_deref().unwrap_or_default()),
                Cow::Borrowed(expense.category.as_deref().unwrap_or_default()),
                Cow::Owned(self.amount(expense.total_amount)),
                Cow::Owned(self.amount(expense.refunded_amount)),
                Cow::Owned(self.amount(expense.net_amount)),
            ]);
        }

        builder.build()
    }

    fn amount(&self, amount: Money) -> String {
        format_amount(amount, self.context)
    }
}

fn trip_label(report: &TripLedgerReport) -> Cow<'_, str> {
    if report.trip_name.is_empty() {
        Cow::Owned(report.trip_id.to_string())
    } else {
        Cow::Borrowed(&report.trip_name)
    }
}

/// Rounds with the context's mode, then prints exactly `context.scale`
/// decimal places whatever scale the amount was recorded with.
pub fn format_amount(amount: Money, context: SettlementContext) -> String {
    let rounded = context.round(amount);
    let scale = context.scale as usize;
    format!("{rounded:.scale$}")
}
