//! Annual health screenings, the appointments booked for them and the
//! reminders sent ahead of them.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::{ensure, Result, TrackerError};
use crate::entity::{Entity, ParentRef, RecordMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningType {
    PhysicalExam,
    DentalCheckup,
    VisionTest,
    BloodWork,
    Mammogram,
    Colonoscopy,
    SkinCheck,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screening {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub screening_type: ScreeningType,
    pub name: String,
    pub recommended_frequency_months: u32,
    pub last_screening_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub provider: Option<String>,
    pub notes: Option<String>,
}

impl Screening {
    fn due_after(&self, date: NaiveDate) -> Result<NaiveDate> {
        date.checked_add_months(Months::new(self.recommended_frequency_months))
            .ok_or_else(|| TrackerError::validation("next due date out of range"))
    }

    /// Records a completed screening and schedules the next one.
    pub fn record_completion(&mut self, completed_on: NaiveDate) -> Result<()> {
        let next = self.due_after(completed_on)?;
        self.last_screening_date = Some(completed_on);
        self.next_due_date = Some(next);
        Ok(())
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_due_date.map_or(false, |due| due <= today)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreeningDraft {
    pub screening_type: ScreeningType,
    pub name: String,
    pub recommended_frequency_months: u32,
    #[serde(default)]
    pub last_screening_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningDto {
    pub screening_id: Uuid,
    pub screening_type: ScreeningType,
    pub name: String,
    pub recommended_frequency_months: u32,
    pub last_screening_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub provider: Option<String>,
    pub notes: Option<String>,
    pub is_due: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Screening> for ScreeningDto {
    fn from(s: Screening) -> Self {
        let is_due = s.is_due(Utc::now().date_naive());
        Self {
            screening_id: s.meta.id,
            screening_type: s.screening_type,
            name: s.name,
            recommended_frequency_months: s.recommended_frequency_months,
            last_screening_date: s.last_screening_date,
            next_due_date: s.next_due_date,
            provider: s.provider,
            notes: s.notes,
            is_due,
            created_at: s.meta.created_at,
            updated_at: s.meta.updated_at,
        }
    }
}

impl Entity for Screening {
    const KIND: &'static str = "screening";
    const COLLECTION: &'static str = "screenings";
    const CHILDREN: &'static [&'static str] = &[Appointment::KIND, Reminder::KIND];

    type Draft = ScreeningDraft;
    type Dto = ScreeningDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: ScreeningDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.name.trim().is_empty(), "screening name is required")?;
        ensure(
            draft.recommended_frequency_months > 0,
            "recommended frequency must be at least one month",
        )?;
        let mut screening = Self {
            meta,
            screening_type: draft.screening_type,
            name: draft.name.trim().to_string(),
            recommended_frequency_months: draft.recommended_frequency_months,
            last_screening_date: draft.last_screening_date,
            next_due_date: draft.next_due_date,
            provider: draft.provider,
            notes: draft.notes,
        };
        if let (Some(last), None) = (screening.last_screening_date, screening.next_due_date) {
            screening.next_due_date = Some(screening.due_after(last)?);
        }
        Ok(screening)
    }
}

const SCREENING_PARENT: ParentRef = ParentRef {
    kind: Screening::KIND,
    field: "screening_id",
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub screening_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub location: Option<String>,
    pub provider: Option<String>,
    pub is_completed: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentDraft {
    pub screening_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDto {
    pub appointment_id: Uuid,
    pub screening_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub location: Option<String>,
    pub provider: Option<String>,
    pub is_completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentDto {
    fn from(a: Appointment) -> Self {
        Self {
            appointment_id: a.meta.id,
            screening_id: a.screening_id,
            appointment_date: a.appointment_date,
            location: a.location,
            provider: a.provider,
            is_completed: a.is_completed,
            notes: a.notes,
            created_at: a.meta.created_at,
        }
    }
}

impl Entity for Appointment {
    const KIND: &'static str = "appointment";
    const COLLECTION: &'static str = "appointments";
    const PARENT: Option<ParentRef> = Some(SCREENING_PARENT);

    type Draft = AppointmentDraft;
    type Dto = AppointmentDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.screening_id)
    }

    fn from_draft(draft: AppointmentDraft, meta: RecordMeta) -> Result<Self> {
        Ok(Self {
            meta,
            screening_id: draft.screening_id,
            appointment_date: draft.appointment_date,
            location: draft.location,
            provider: draft.provider,
            is_completed: draft.is_completed,
            notes: draft.notes,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub screening_id: Uuid,
    pub reminder_date: DateTime<Utc>,
    pub message: String,
    pub is_sent: bool,
}

impl Reminder {
    pub fn mark_sent(&mut self) {
        self.is_sent = true;
    }

    /// Not yet sent and its time has come.
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        !self.is_sent && self.reminder_date <= now
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderDraft {
    pub screening_id: Uuid,
    pub reminder_date: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub is_sent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderDto {
    pub reminder_id: Uuid,
    pub screening_id: Uuid,
    pub reminder_date: DateTime<Utc>,
    pub message: String,
    pub is_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Reminder> for ReminderDto {
    fn from(r: Reminder) -> Self {
        Self {
            reminder_id: r.meta.id,
            screening_id: r.screening_id,
            reminder_date: r.reminder_date,
            message: r.message,
            is_sent: r.is_sent,
            created_at: r.meta.created_at,
        }
    }
}

impl Entity for Reminder {
    const KIND: &'static str = "reminder";
    const COLLECTION: &'static str = "reminders";
    const PARENT: Option<ParentRef> = Some(SCREENING_PARENT);

    type Draft = ReminderDraft;
    type Dto = ReminderDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.screening_id)
    }

    fn from_draft(draft: ReminderDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.message.trim().is_empty(), "reminder message is required")?;
        Ok(Self {
            meta,
            screening_id: draft.screening_id,
            reminder_date: draft.reminder_date,
            message: draft.message,
            is_sent: draft.is_sent,
        })
    }
}
