use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Income,
    Expense,
    Investment,
    Withdrawal,
    Bonus,
    Inheritance,
    Loan,
}

impl EventKind {
    /// +1.0 for inflows into the portfolio, -1.0 for outflows.
    pub fn sign(self) -> f64 {
        match self {
            EventKind::Income
            | EventKind::Bonus
            | EventKind::Inheritance
            | EventKind::Investment => 1.0,
            EventKind::Expense | EventKind::Withdrawal | EventKind::Loan => -1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Once,
    Monthly,
    Quarterly,
    Annually,
}

/// Calendar month used as the resolution of the projection loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(self, earlier: YearMonth) -> i64 {
        (self.year as i64 - earlier.year as i64) * 12 + (self.month as i64 - earlier.month as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEvent {
    pub kind: EventKind,
    pub amount: f64,
    pub recurrence: Recurrence,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CashFlowEvent {
    pub fn new(
        kind: EventKind,
        amount: f64,
        recurrence: Recurrence,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            amount,
            recurrence,
            start_date,
            end_date: None,
            description: None,
        }
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Amount with the sign implied by the event kind.
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParameters {
    pub initial_value: f64,
    /// Fractional annual rate, e.g. `0.04` for 4%.
    pub annual_interest_rate: f64,
    pub events: Vec<CashFlowEvent>,
    pub projection_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year: i32,
    pub projected_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub final_value: f64,
    pub total_gain: f64,
    pub total_gain_percent: f64,
    /// Percentage, e.g. `10.0` for 10% a year.
    pub cagr: f64,
    pub projection_years: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionType {
    Congratulations,
    IncreaseContribution,
    AdjustAllocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSuggestion {
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub description: String,
    pub suggested_value: Option<f64>,
    pub suggested_period: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionReport {
    pub anchor_year: i32,
    pub points: Vec<ProjectionPoint>,
    pub metrics: Option<PortfolioMetrics>,
}
