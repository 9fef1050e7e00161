//! Mortgage payoff optimizer: amortization, payment recording and
//! refinance break-even analysis.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_cents;
use crate::common::error::{ensure, Result, TrackerError};
use crate::entity::{Entity, ParentRef, RecordMeta};

/// Upper bound for month-by-month projections (100 years).
pub const MAX_PROJECTION_MONTHS: u32 = 1200;
/// Longest loan term accepted for a mortgage or a refinance scenario.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MortgageType {
    Fixed = 0,
    ARM = 1,
    FHA = 2,
    VA = 3,
    USDA = 4,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mortgage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub property_address: String,
    pub lender: String,
    pub original_loan_amount: f64,
    pub current_balance: f64,
    /// Annual rate in percent, e.g. `4.5`.
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub monthly_payment: f64,
    pub start_date: NaiveDate,
    pub mortgage_type: MortgageType,
}

/// How a single payment was applied to the loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentSplit {
    pub interest: f64,
    pub principal: f64,
    pub remaining_balance: f64,
}

/// Outcome of paying the loan down month by month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoffProjection {
    pub months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub payoff_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoffComparison {
    pub extra_monthly_principal: f64,
    pub baseline: PayoffProjection,
    pub accelerated: PayoffProjection,
    pub months_saved: u32,
    pub interest_saved: f64,
}

impl Mortgage {
    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }

    pub fn monthly_interest(&self) -> f64 {
        round_cents(self.current_balance * self.monthly_rate())
    }

    /// Applies a payment: interest is covered first, the remainder reduces
    /// the balance, which never drops below zero.
    pub fn apply_payment(&mut self, amount: f64) -> Result<PaymentSplit> {
        ensure(amount > 0.0, "payment amount must be positive")?;
        let interest = self.monthly_interest().min(amount);
        let principal = round_cents((amount - interest).min(self.current_balance));
        self.current_balance = round_cents((self.current_balance - principal).max(0.0));
        Ok(PaymentSplit {
            interest,
            principal,
            remaining_balance: self.current_balance,
        })
    }

    /// Extra principal goes straight to the balance. Returns the amount
    /// actually applied.
    pub fn apply_extra_principal(&mut self, amount: f64) -> Result<f64> {
        ensure(amount >= 0.0, "extra principal cannot be negative")?;
        let applied = round_cents(amount.min(self.current_balance));
        self.current_balance = round_cents(self.current_balance - applied);
        Ok(applied)
    }

    /// Months left at the current payment, from the closed-form amortization
    /// formula. `None` when the payment never covers the monthly interest.
    pub fn months_remaining(&self) -> Option<u32> {
        if self.current_balance <= 0.0 {
            return Some(0);
        }
        if self.monthly_payment <= 0.0 {
            return None;
        }
        let r = self.monthly_rate();
        let n = if r == 0.0 {
            self.current_balance / self.monthly_payment
        } else {
            let ratio = r * self.current_balance / self.monthly_payment;
            if ratio >= 1.0 {
                return None;
            }
            -(1.0 - ratio).ln() / (1.0 + r).ln()
        };
        Some((n - 1e-9).ceil().max(1.0) as u32)
    }

    pub fn payoff_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_months(Months::new(self.months_remaining()?))
    }

    /// Simulates the loan month by month with `extra` principal added to
    /// every payment.
    pub fn payoff_projection(&self, extra: f64, today: NaiveDate) -> Result<PayoffProjection> {
        ensure(extra >= 0.0, "extra principal cannot be negative")?;
        let r = self.monthly_rate();
        let payment = self.monthly_payment + extra;
        let mut balance = self.current_balance;
        let mut months = 0u32;
        let mut total_interest = 0.0;
        let mut total_paid = 0.0;

        while balance > 0.0 {
            if months >= MAX_PROJECTION_MONTHS {
                return Err(TrackerError::validation(
                    "loan is not paid off within 100 years at this payment",
                ));
            }
            let interest = round_cents(balance * r);
            if payment <= interest {
                return Err(TrackerError::validation(
                    "payment does not cover the monthly interest",
                ));
            }
            let principal = (payment - interest).min(balance);
            balance = round_cents(balance - principal);
            total_interest += interest;
            total_paid += interest + principal;
            months += 1;
        }

        Ok(PayoffProjection {
            months,
            total_interest: round_cents(total_interest),
            total_paid: round_cents(total_paid),
            payoff_date: today.checked_add_months(Months::new(months)),
        })
    }

    pub fn compare_extra_payment(&self, extra: f64, today: NaiveDate) -> Result<PayoffComparison> {
        let baseline = self.payoff_projection(0.0, today)?;
        let accelerated = self.payoff_projection(extra, today)?;
        Ok(PayoffComparison {
            extra_monthly_principal: extra,
            months_saved: baseline.months.saturating_sub(accelerated.months),
            interest_saved: round_cents(baseline.total_interest - accelerated.total_interest),
            baseline,
            accelerated,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MortgageDraft {
    pub property_address: String,
    pub lender: String,
    pub original_loan_amount: f64,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub monthly_payment: f64,
    pub start_date: NaiveDate,
    #[serde(default = "default_mortgage_type")]
    pub mortgage_type: MortgageType,
}

fn default_mortgage_type() -> MortgageType {
    MortgageType::Fixed
}

#[derive(Debug, Clone, Serialize)]
pub struct MortgageDto {
    pub mortgage_id: Uuid,
    pub property_address: String,
    pub lender: String,
    pub original_loan_amount: f64,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub monthly_payment: f64,
    pub start_date: NaiveDate,
    pub mortgage_type: MortgageType,
    pub months_remaining: Option<u32>,
    pub payoff_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Mortgage> for MortgageDto {
    fn from(m: Mortgage) -> Self {
        let months_remaining = m.months_remaining();
        let payoff_date = m.payoff_date(Utc::now().date_naive());
        Self {
            mortgage_id: m.meta.id,
            property_address: m.property_address,
            lender: m.lender,
            original_loan_amount: m.original_loan_amount,
            current_balance: m.current_balance,
            interest_rate: m.interest_rate,
            loan_term_years: m.loan_term_years,
            monthly_payment: m.monthly_payment,
            start_date: m.start_date,
            mortgage_type: m.mortgage_type,
            months_remaining,
            payoff_date,
            created_at: m.meta.created_at,
            updated_at: m.meta.updated_at,
        }
    }
}

impl Entity for Mortgage {
    const KIND: &'static str = "mortgage";
    const COLLECTION: &'static str = "mortgages";
    const CHILDREN: &'static [&'static str] = &[Payment::KIND, RefinanceScenario::KIND];

    type Draft = MortgageDraft;
    type Dto = MortgageDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: MortgageDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.property_address.trim().is_empty(), "property address is required")?;
        ensure(draft.original_loan_amount > 0.0, "original loan amount must be positive")?;
        ensure(draft.current_balance >= 0.0, "current balance cannot be negative")?;
        ensure(
            (0.0..100.0).contains(&draft.interest_rate),
            "interest rate must be between 0 and 100 percent",
        )?;
        ensure(
            (1..=MAX_LOAN_TERM_YEARS).contains(&draft.loan_term_years),
            "loan term must be between 1 and 50 years",
        )?;
        ensure(draft.monthly_payment >= 0.0, "monthly payment cannot be negative")?;
        Ok(Self {
            meta,
            property_address: draft.property_address,
            lender: draft.lender,
            original_loan_amount: round_cents(draft.original_loan_amount),
            current_balance: round_cents(draft.current_balance),
            interest_rate: draft.interest_rate,
            loan_term_years: draft.loan_term_years,
            monthly_payment: round_cents(draft.monthly_payment),
            start_date: draft.start_date,
            mortgage_type: draft.mortgage_type,
        })
    }
}

const MORTGAGE_PARENT: ParentRef = ParentRef {
    kind: Mortgage::KIND,
    field: "mortgage_id",
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub mortgage_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub principal_amount: f64,
    pub interest_amount: f64,
    pub extra_principal: Option<f64>,
}

impl Payment {
    pub fn total_payment(&self) -> f64 {
        round_cents(self.amount + self.extra_principal.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDraft {
    pub mortgage_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub principal_amount: f64,
    pub interest_amount: f64,
    #[serde(default)]
    pub extra_principal: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDto {
    pub payment_id: Uuid,
    pub mortgage_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub principal_amount: f64,
    pub interest_amount: f64,
    pub extra_principal: Option<f64>,
    pub total_payment: f64,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.meta.id,
            total_payment: p.total_payment(),
            mortgage_id: p.mortgage_id,
            payment_date: p.payment_date,
            amount: p.amount,
            principal_amount: p.principal_amount,
            interest_amount: p.interest_amount,
            extra_principal: p.extra_principal,
        }
    }
}

impl Entity for Payment {
    const KIND: &'static str = "payment";
    const COLLECTION: &'static str = "payments";
    const PARENT: Option<ParentRef> = Some(MORTGAGE_PARENT);

    type Draft = PaymentDraft;
    type Dto = PaymentDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.mortgage_id)
    }

    fn from_draft(draft: PaymentDraft, meta: RecordMeta) -> Result<Self> {
        ensure(draft.amount > 0.0, "payment amount must be positive")?;
        ensure(
            draft.principal_amount >= 0.0 && draft.interest_amount >= 0.0,
            "principal and interest cannot be negative",
        )?;
        ensure(
            draft.extra_principal.map_or(true, |e| e >= 0.0),
            "extra principal cannot be negative",
        )?;
        Ok(Self {
            meta,
            mortgage_id: draft.mortgage_id,
            payment_date: draft.payment_date,
            amount: round_cents(draft.amount),
            principal_amount: round_cents(draft.principal_amount),
            interest_amount: round_cents(draft.interest_amount),
            extra_principal: draft.extra_principal.map(round_cents),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceScenario {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub mortgage_id: Uuid,
    pub name: String,
    pub new_interest_rate: f64,
    pub new_loan_term_years: u32,
    pub refinancing_costs: f64,
    pub monthly_savings: f64,
    pub break_even_months: u32,
}

impl RefinanceScenario {
    /// Months of savings needed to recoup the refinancing costs; zero when
    /// the scenario saves nothing.
    pub fn calculate_break_even(&mut self) {
        self.break_even_months = if self.monthly_savings > 0.0 {
            (self.refinancing_costs / self.monthly_savings).ceil() as u32
        } else {
            0
        };
    }

    pub fn is_refinancing_recommended(&self) -> bool {
        self.monthly_savings > 0.0
            && self.break_even_months > 0
            && self.break_even_months < self.new_loan_term_years.saturating_mul(12)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefinanceScenarioDraft {
    pub mortgage_id: Uuid,
    pub name: String,
    pub new_interest_rate: f64,
    pub new_loan_term_years: u32,
    #[serde(default)]
    pub refinancing_costs: f64,
    pub monthly_savings: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinanceScenarioDto {
    pub refinance_scenario_id: Uuid,
    pub mortgage_id: Uuid,
    pub name: String,
    pub new_interest_rate: f64,
    pub new_loan_term_years: u32,
    pub refinancing_costs: f64,
    pub monthly_savings: f64,
    pub break_even_months: u32,
    pub is_recommended: bool,
}

impl From<RefinanceScenario> for RefinanceScenarioDto {
    fn from(s: RefinanceScenario) -> Self {
        Self {
            refinance_scenario_id: s.meta.id,
            is_recommended: s.is_refinancing_recommended(),
            mortgage_id: s.mortgage_id,
            name: s.name,
            new_interest_rate: s.new_interest_rate,
            new_loan_term_years: s.new_loan_term_years,
            refinancing_costs: s.refinancing_costs,
            monthly_savings: s.monthly_savings,
            break_even_months: s.break_even_months,
        }
    }
}

impl Entity for RefinanceScenario {
    const KIND: &'static str = "refinance_scenario";
    const COLLECTION: &'static str = "refinance-scenarios";
    const PARENT: Option<ParentRef> = Some(MORTGAGE_PARENT);

    type Draft = RefinanceScenarioDraft;
    type Dto = RefinanceScenarioDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.mortgage_id)
    }

    fn from_draft(draft: RefinanceScenarioDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.name.trim().is_empty(), "scenario name is required")?;
        ensure(
            (1..=MAX_LOAN_TERM_YEARS).contains(&draft.new_loan_term_years),
            "new loan term must be between 1 and 50 years",
        )?;
        ensure(draft.refinancing_costs >= 0.0, "refinancing costs cannot be negative")?;
        ensure(draft.new_interest_rate >= 0.0, "interest rate cannot be negative")?;
        let mut scenario = Self {
            meta,
            mortgage_id: draft.mortgage_id,
            name: draft.name,
            new_interest_rate: draft.new_interest_rate,
            new_loan_term_years: draft.new_loan_term_years,
            refinancing_costs: round_cents(draft.refinancing_costs),
            monthly_savings: round_cents(draft.monthly_savings),
            break_even_months: 0,
        };
        scenario.calculate_break_even();
        Ok(scenario)
    }
}
