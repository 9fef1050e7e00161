use chrono::{DateTime, NaiveDate, Utc};
use tracker_core::domain::health_screening::{Reminder, Screening};
use tracker_core::{ListQuery, Result, TenantId};
use uuid::Uuid;

use super::TrackerService;

impl TrackerService {
    /// Records a completed screening on `on` and reschedules the next one.
    pub async fn complete_screening(
        &self,
        tenant: TenantId,
        id: Uuid,
        on: NaiveDate,
    ) -> Result<Screening> {
        let mut screening: Screening = self.require(tenant, id).await?;
        screening.record_completion(on)?;
        screening.meta = screening.meta.touched();
        self.persist(tenant, &screening).await?;
        Ok(screening)
    }

    /// Screenings whose next due date is on or before `on`, soonest first.
    pub async fn due_screenings(&self, tenant: TenantId, on: NaiveDate) -> Result<Vec<Screening>> {
        let mut due: Vec<Screening> = self
            .list::<Screening>(tenant, &ListQuery::all())
            .await?
            .into_iter()
            .filter(|s| s.is_due(on))
            .collect();
        due.sort_by_key(|s| s.next_due_date);
        Ok(due)
    }

    pub async fn pending_reminders(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>> {
        Ok(self
            .list::<Reminder>(tenant, &ListQuery::all())
            .await?
            .into_iter()
            .filter(|r| r.is_pending(now))
            .collect())
    }

    /// Marks a reminder as sent. Sending twice is a no-op.
    pub async fn send_reminder(&self, tenant: TenantId, id: Uuid) -> Result<Reminder> {
        let mut reminder: Reminder = self.require(tenant, id).await?;
        if reminder.is_sent {
            return Ok(reminder);
        }
        reminder.mark_sent();
        reminder.meta = reminder.meta.touched();
        self.persist(tenant, &reminder).await?;
        Ok(reminder)
    }
}
