use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub SmolStr);

        impl $name {
            pub fn new(value: impl Into<SmolStr>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a trip member (a user id in the record store).
    MemberId
);
string_id!(TripId);
string_id!(ExpenseId);
string_id!(RefundId);
string_id!(SettlementId);

/// Balance table keyed by member, in first-reference order.
pub type MemberBalances = IndexMap<MemberId, Money>;

/// Decimal money amount in the trip's settlement currency.
///
/// Arithmetic never rounds; rounding happens only through [`Money::round_dp`]
/// at the output boundary.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// `Money::new(12345, 2)` is `123.45`.
    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Equal parts of `self` for `parts` recipients. `parts` must be non-zero.
    pub fn per_share(self, parts: usize) -> Self {
        Self(self.0 / Decimal::from(parts))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `self * numerator / denominator`, multiplying first to keep precision.
    ///
    /// When the intermediate product does not fit, falls back to
    /// `(self / denominator) * numerator`. `None` if neither order fits or
    /// `denominator` is zero.
    pub fn checked_rescale(self, numerator: Money, denominator: Money) -> Option<Self> {
        self.0
            .checked_mul(numerator.0)
            .and_then(|product| product.checked_div(denominator.0))
            .or_else(|| {
                self.0
                    .checked_div(denominator.0)
                    .and_then(|ratio| ratio.checked_mul(numerator.0))
            })
            .map(Self)
    }

    pub fn round_dp(self, scale: u32, strategy: RoundingStrategy) -> Self {
        Self(self.0.round_dp_with_strategy(scale, strategy))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    pub fn new(id: impl Into<SmolStr>, name: impl Into<String>) -> Self {
        Self {
            id: MemberId::new(id),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Settlement currency code, e.g. `INR`.
    pub currency: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Trip {
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|member| &member.id == id)
    }

    pub fn is_member(&self, id: &MemberId) -> bool {
        self.member(id).is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerShare {
    #[serde(alias = "user_id")]
    pub member_id: MemberId,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShare {
    #[serde(alias = "user_id")]
    pub member_id: MemberId,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub id: RefundId,
    pub expense_id: ExpenseId,
    pub amount: Money,
    #[serde(default)]
    pub reason: String,
    /// Members who received the cash back, each taking an equal part.
    pub refunded_to: Vec<MemberId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub trip_id: TripId,
    #[serde(default)]
    pub description: String,
    pub total_amount: Money,
    pub payers: Vec<PayerShare>,
    pub splits: Vec<SplitShare>,
    #[serde(default)]
    pub refunds: Vec<Refund>,
    /// Free-form label such as `food` or `lodging`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Day the expense happened, as written by the caller (ISO 8601 date).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Expense {
    /// Saturates instead of overflowing; only validated expenses are
    /// guaranteed to stay in range.
    pub fn refunded_amount(&self) -> Money {
        self.refunds
            .iter()
            .fold(Money::ZERO, |acc, refund| Money(acc.0.saturating_add(refund.amount.0)))
    }

    /// Total minus every refund recorded against the expense.
    pub fn net_amount(&self) -> Money {
        Money(self.total_amount.0.saturating_sub(self.refunded_amount().0))
    }

    pub fn summary(&self) -> ExpenseSummary {
        let refunded_amount = self.refunded_amount();
        ExpenseSummary {
            expense_id: self.id.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            date: self.date.clone(),
            total_amount: self.total_amount,
            refunded_amount,
            refund_count: self.refunds.len(),
            net_amount: Money(self.total_amount.0.saturating_sub(refunded_amount.0)),
        }
    }
}

/// A payment that already happened outside the app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: SettlementId,
    pub trip_id: TripId,
    pub from_user_id: MemberId,
    pub to_user_id: MemberId,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Net position of one member. Positive means the trip owes the member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub member_id: MemberId,
    pub name: String,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSuggestion {
    pub from_user_id: MemberId,
    pub from_user_name: String,
    pub to_user_id: MemberId,
    pub to_user_name: String,
    pub amount: Money,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub expense_id: ExpenseId,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub total_amount: Money,
    pub refunded_amount: Money,
    pub refund_count: usize,
    pub net_amount: Money,
}
