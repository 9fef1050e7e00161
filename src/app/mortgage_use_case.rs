use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracker_core::domain::mortgage::{Mortgage, Payment, PaymentDraft, PayoffComparison};
use tracker_core::{Result, TenantId};
use uuid::Uuid;

use super::TrackerService;

/// Body of `POST /api/mortgages/:id/payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub amount: f64,
    /// Defaults to today
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub extra_principal: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub mortgage: Mortgage,
    pub payment: Payment,
}

impl TrackerService {
    /// Splits the payment into interest and principal against the current
    /// balance, applies any extra principal, and stores both changes.
    pub async fn record_payment(
        &self,
        tenant: TenantId,
        mortgage_id: Uuid,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome> {
        let mut mortgage: Mortgage = self.require(tenant, mortgage_id).await?;
        let split = mortgage.apply_payment(request.amount)?;
        let extra = match request.extra_principal {
            Some(extra) => Some(mortgage.apply_extra_principal(extra)?),
            None => None,
        };

        let payment: Payment = self
            .create(
                tenant,
                PaymentDraft {
                    mortgage_id,
                    payment_date: request
                        .payment_date
                        .unwrap_or_else(|| Utc::now().date_naive()),
                    amount: request.amount,
                    principal_amount: split.principal,
                    interest_amount: split.interest,
                    extra_principal: extra,
                },
            )
            .await?;

        mortgage.meta = mortgage.meta.touched();
        self.persist(tenant, &mortgage).await?;
        Ok(PaymentOutcome { mortgage, payment })
    }

    /// Payoff with and without `extra` monthly principal, starting `today`.
    pub async fn payoff_projection(
        &self,
        tenant: TenantId,
        mortgage_id: Uuid,
        extra: f64,
        today: NaiveDate,
    ) -> Result<PayoffComparison> {
        let mortgage: Mortgage = self.require(tenant, mortgage_id).await?;
        mortgage.compare_extra_payment(extra, today)
    }
}
