//! Time audit: tracked activity blocks, weekly hour goals and audit reports.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_cents;
use crate::common::error::{ensure, Result};
use crate::entity::{Entity, RecordMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    Work,
    PersonalDevelopment,
    Learning,
    Exercise,
    Social,
    SocialMedia,
    Entertainment,
    Household,
    Sleep,
    Meals,
    Commute,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBlock {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub category: ActivityCategory,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub is_productive: bool,
}

impl TimeBlock {
    /// Elapsed minutes, `None` while the activity is still running.
    pub fn duration_minutes(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds() as f64 / 60.0)
    }

    pub fn end_activity(&mut self, end: DateTime<Utc>) -> Result<()> {
        ensure(end > self.start_time, "End time must be after start time")?;
        self.end_time = Some(end);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeBlockDraft {
    pub category: ActivityCategory,
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_productive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeBlockDto {
    pub time_block_id: Uuid,
    pub category: ActivityCategory,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub is_productive: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TimeBlock> for TimeBlockDto {
    fn from(b: TimeBlock) -> Self {
        Self {
            time_block_id: b.meta.id,
            duration_minutes: b.duration_minutes(),
            is_active: b.is_active(),
            category: b.category,
            description: b.description,
            start_time: b.start_time,
            end_time: b.end_time,
            notes: b.notes,
            tags: b.tags,
            is_productive: b.is_productive,
            created_at: b.meta.created_at,
        }
    }
}

impl Entity for TimeBlock {
    const KIND: &'static str = "time_block";
    const COLLECTION: &'static str = "time-blocks";

    type Draft = TimeBlockDraft;
    type Dto = TimeBlockDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: TimeBlockDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.description.trim().is_empty(), "description is required")?;
        let mut block = Self {
            meta,
            category: draft.category,
            description: draft.description,
            start_time: draft.start_time,
            end_time: None,
            notes: draft.notes,
            tags: draft.tags,
            is_productive: draft.is_productive,
        };
        if let Some(end) = draft.end_time {
            block.end_activity(end)?;
        }
        Ok(block)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeGoal {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub category: ActivityCategory,
    pub target_hours_per_week: f64,
    pub minimum_hours_per_week: Option<f64>,
    pub description: String,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Latest week (by its first day) in which the target was met
    #[serde(default)]
    pub last_achieved_week: Option<NaiveDate>,
}

impl TimeGoal {
    pub fn target_hours_per_day(&self) -> f64 {
        self.target_hours_per_week / 7.0
    }

    pub fn is_goal_met(&self, actual_hours: f64) -> bool {
        actual_hours >= self.target_hours_per_week
    }

    /// Not capped: exceeding the weekly target reports over 100.
    pub fn progress_percentage(&self, actual_hours: f64) -> f64 {
        if self.target_hours_per_week == 0.0 {
            return 0.0;
        }
        actual_hours / self.target_hours_per_week * 100.0
    }

    pub fn deactivate(&mut self, today: NaiveDate) {
        self.is_active = false;
        self.end_date = Some(today);
    }

    /// Records the week starting at `week_start` as achieved. Returns `false`
    /// when that week, or a later one, was already recorded.
    pub fn mark_achieved(&mut self, week_start: NaiveDate) -> bool {
        if self.last_achieved_week.map_or(false, |week| week >= week_start) {
            return false;
        }
        self.last_achieved_week = Some(week_start);
        true
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeGoalDraft {
    pub category: ActivityCategory,
    pub target_hours_per_week: f64,
    #[serde(default)]
    pub minimum_hours_per_week: Option<f64>,
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeGoalDto {
    pub time_goal_id: Uuid,
    pub category: ActivityCategory,
    pub target_hours_per_week: f64,
    pub target_hours_per_day: f64,
    pub minimum_hours_per_week: Option<f64>,
    pub description: String,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub last_achieved_week: Option<NaiveDate>,
}

impl From<TimeGoal> for TimeGoalDto {
    fn from(g: TimeGoal) -> Self {
        Self {
            time_goal_id: g.meta.id,
            target_hours_per_day: g.target_hours_per_day(),
            category: g.category,
            target_hours_per_week: g.target_hours_per_week,
            minimum_hours_per_week: g.minimum_hours_per_week,
            description: g.description,
            is_active: g.is_active,
            start_date: g.start_date,
            end_date: g.end_date,
            last_achieved_week: g.last_achieved_week,
        }
    }
}

impl Entity for TimeGoal {
    const KIND: &'static str = "time_goal";
    const COLLECTION: &'static str = "time-goals";

    type Draft = TimeGoalDraft;
    type Dto = TimeGoalDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: TimeGoalDraft, meta: RecordMeta) -> Result<Self> {
        ensure(
            (0.0..=168.0).contains(&draft.target_hours_per_week),
            "weekly target must be between 0 and 168 hours",
        )?;
        ensure(
            draft.minimum_hours_per_week.map_or(true, |m| m >= 0.0),
            "weekly minimum cannot be negative",
        )?;
        ensure(
            draft.end_date.map_or(true, |end| end >= draft.start_date),
            "end date cannot precede start date",
        )?;
        Ok(Self {
            meta,
            category: draft.category,
            target_hours_per_week: draft.target_hours_per_week,
            minimum_hours_per_week: draft.minimum_hours_per_week,
            description: draft.description,
            is_active: draft.is_active,
            start_date: draft.start_date,
            end_date: draft.end_date,
            last_achieved_week: None,
        })
    }

    fn apply_update(existing: &Self, draft: TimeGoalDraft) -> Result<Self> {
        Ok(Self {
            last_achieved_week: existing.last_achieved_week,
            ..Self::from_draft(draft, existing.meta.touched())?
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_tracked_hours: f64,
    pub productive_hours: f64,
    pub summary: Option<String>,
    pub insights: Option<String>,
    pub recommendations: Option<String>,
}

impl AuditReport {
    pub fn productivity_percentage(&self) -> f64 {
        if self.total_tracked_hours == 0.0 {
            return 0.0;
        }
        self.productive_hours / self.total_tracked_hours * 100.0
    }

    pub fn is_current_week(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }

    /// Days covered, counting both ends.
    pub fn period_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditReportDraft {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub total_tracked_hours: f64,
    #[serde(default)]
    pub productive_hours: f64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub insights: Option<String>,
    #[serde(default)]
    pub recommendations: Option<String>,
}

impl AuditReportDraft {
    /// Builds a report from the finished blocks that started inside
    /// `start..=end`. Running blocks are ignored.
    pub fn from_blocks(
        title: String,
        start: NaiveDate,
        end: NaiveDate,
        blocks: &[TimeBlock],
    ) -> Self {
        let mut total_minutes = 0.0;
        let mut productive_minutes = 0.0;
        let mut by_category: HashMap<ActivityCategory, f64> = HashMap::new();
        let mut counted = 0usize;

        for block in blocks {
            let day = block.start_time.date_naive();
            if day < start || day > end {
                continue;
            }
            let Some(minutes) = block.duration_minutes() else {
                continue;
            };
            counted += 1;
            total_minutes += minutes;
            if block.is_productive {
                productive_minutes += minutes;
            }
            *by_category.entry(block.category).or_default() += minutes;
        }

        let total_tracked_hours = round_cents(total_minutes / 60.0);
        let productive_hours = round_cents(productive_minutes / 60.0);
        let productivity = if total_minutes > 0.0 {
            productive_minutes / total_minutes * 100.0
        } else {
            0.0
        };

        let summary = format!(
            "Tracked {total_tracked_hours:.1} hours across {counted} activities, {productivity:.0}% productive"
        );
        let insights = by_category
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(category, minutes)| {
                format!("Most time went to {category:?} ({:.1} hours)", minutes / 60.0)
            });
        let recommendations = (counted > 0 && productivity < 50.0).then(|| {
            "Less than half of tracked time was productive; review unproductive blocks".to_string()
        });

        Self {
            title,
            start_date: start,
            end_date: end,
            total_tracked_hours,
            productive_hours,
            summary: Some(summary),
            insights,
            recommendations,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReportDto {
    pub audit_report_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period_days: i64,
    pub total_tracked_hours: f64,
    pub productive_hours: f64,
    pub productivity_percentage: f64,
    pub summary: Option<String>,
    pub insights: Option<String>,
    pub recommendations: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditReport> for AuditReportDto {
    fn from(r: AuditReport) -> Self {
        Self {
            audit_report_id: r.meta.id,
            period_days: r.period_days(),
            productivity_percentage: r.productivity_percentage(),
            title: r.title,
            start_date: r.start_date,
            end_date: r.end_date,
            total_tracked_hours: r.total_tracked_hours,
            productive_hours: r.productive_hours,
            summary: r.summary,
            insights: r.insights,
            recommendations: r.recommendations,
            created_at: r.meta.created_at,
        }
    }
}

impl Entity for AuditReport {
    const KIND: &'static str = "audit_report";
    const COLLECTION: &'static str = "audit-reports";

    type Draft = AuditReportDraft;
    type Dto = AuditReportDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: AuditReportDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.title.trim().is_empty(), "report title is required")?;
        ensure(draft.end_date >= draft.start_date, "end date cannot precede start date")?;
        ensure(
            draft.total_tracked_hours >= 0.0 && draft.productive_hours >= 0.0,
            "hours cannot be negative",
        )?;
        ensure(
            draft.productive_hours <= draft.total_tracked_hours,
            "productive hours cannot exceed tracked hours",
        )?;
        Ok(Self {
            meta,
            title: draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            total_tracked_hours: draft.total_tracked_hours,
            productive_hours: draft.productive_hours,
            summary: draft.summary,
            insights: draft.insights,
            recommendations: draft.recommendations,
        })
    }
}
