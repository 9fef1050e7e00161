use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracker_core::domain::time_audit::{AuditReport, AuditReportDraft, TimeBlock, TimeGoal};
use tracker_core::{Entity, ListQuery, Result, TenantId, TrackerError};
use uuid::Uuid;

use super::TrackerService;
use crate::events::EventAction;

/// Body of `POST /api/audit-reports/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub time_goal_id: Uuid,
    pub week_start: NaiveDate,
    pub actual_hours: f64,
    pub target_hours: f64,
    pub progress_percentage: f64,
    pub is_goal_met: bool,
}

/// Payload of `TimeBlockEnded`.
#[derive(Debug, Clone, Serialize)]
struct TimeBlockEnded {
    time_block_id: Uuid,
    end_time: DateTime<Utc>,
    duration_minutes: Option<f64>,
}

impl TrackerService {
    /// Stops a running block and publishes `TimeBlockEnded` with its duration.
    pub async fn end_time_block(
        &self,
        tenant: TenantId,
        id: Uuid,
        end: DateTime<Utc>,
    ) -> Result<TimeBlock> {
        let mut block: TimeBlock = self.require(tenant, id).await?;
        if !block.is_active() {
            return Err(TrackerError::validation("time block has already ended"));
        }
        block.end_activity(end)?;
        block.meta = block.meta.touched();
        self.persist(tenant, &block).await?;
        let ended = TimeBlockEnded {
            time_block_id: block.id(),
            end_time: end,
            duration_minutes: block.duration_minutes(),
        };
        self.emit_with(EventAction::Ended, tenant, &block, &ended).await;
        Ok(block)
    }

    /// Summarizes the finished time blocks in the range into a stored report.
    pub async fn generate_audit_report(
        &self,
        tenant: TenantId,
        request: GenerateReportRequest,
    ) -> Result<AuditReport> {
        if request.end_date < request.start_date {
            return Err(TrackerError::validation("end date cannot precede start date"));
        }
        let blocks = self.list::<TimeBlock>(tenant, &ListQuery::all()).await?;
        let title = request.title.unwrap_or_else(|| {
            format!("Time Audit {} to {}", request.start_date, request.end_date)
        });
        let draft =
            AuditReportDraft::from_blocks(title, request.start_date, request.end_date, &blocks);
        self.create(tenant, draft).await
    }

    pub async fn deactivate_time_goal(
        &self,
        tenant: TenantId,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<TimeGoal> {
        let mut goal: TimeGoal = self.require(tenant, id).await?;
        goal.deactivate(today);
        goal.meta = goal.meta.touched();
        self.persist(tenant, &goal).await?;
        Ok(goal)
    }

    /// Hours logged in the goal's category during the seven days starting
    /// at `week_start`, measured against the weekly target. The first time an
    /// active goal meets its target for a week, `TimeGoalAchieved` is published.
    pub async fn time_goal_progress(
        &self,
        tenant: TenantId,
        id: Uuid,
        week_start: NaiveDate,
    ) -> Result<GoalProgress> {
        let mut goal: TimeGoal = self.require(tenant, id).await?;
        let week_end = week_start + Duration::days(6);
        let minutes: f64 = self
            .list::<TimeBlock>(tenant, &ListQuery::all())
            .await?
            .iter()
            .filter(|b| b.category == goal.category)
            .filter(|b| (week_start..=week_end).contains(&b.start_time.date_naive()))
            .filter_map(TimeBlock::duration_minutes)
            .sum();
        let actual_hours = minutes / 60.0;
        let progress = GoalProgress {
            time_goal_id: id,
            week_start,
            actual_hours,
            target_hours: goal.target_hours_per_week,
            progress_percentage: goal.progress_percentage(actual_hours),
            is_goal_met: goal.is_goal_met(actual_hours),
        };
        if progress.is_goal_met && goal.is_active && goal.mark_achieved(week_start) {
            goal.meta = goal.meta.touched();
            self.persist(tenant, &goal).await?;
            self.emit_with(EventAction::Achieved, tenant, &goal, &progress).await;
        }
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryPublisher;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tracker_core::domain::time_audit::{ActivityCategory, TimeBlockDraft, TimeGoalDraft};
    use tracker_core::InMemoryStorage;

    fn service() -> (TrackerService, MemoryPublisher) {
        let publisher = MemoryPublisher::new();
        let service =
            TrackerService::new(Arc::new(InMemoryStorage::new()), Arc::new(publisher.clone()));
        (service, publisher)
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    fn block(category: ActivityCategory, start: DateTime<Utc>, hours: Option<i64>) -> TimeBlockDraft {
        TimeBlockDraft {
            category,
            description: "Tracked activity".to_string(),
            start_time: start,
            end_time: hours.map(|h| start + Duration::hours(h)),
            notes: None,
            tags: None,
            is_productive: category == ActivityCategory::Work,
        }
    }

    #[tokio::test]
    async fn ending_a_block_publishes_ended_with_duration() {
        let (service, publisher) = service();
        let tenant = TenantId::random();
        let running: TimeBlock = service
            .create(tenant, block(ActivityCategory::Work, at(11, 9), None))
            .await
            .unwrap();

        let ended = service.end_time_block(tenant, running.id(), at(11, 11)).await.unwrap();
        assert_eq!(ended.duration_minutes(), Some(120.0));
        assert!(service.end_time_block(tenant, running.id(), at(11, 12)).await.is_err());

        let events = publisher.events();
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["TimeBlockCreated", "TimeBlockUpdated", "TimeBlockEnded"]);
        let ended = &events[2];
        assert_eq!(ended.entity_id, running.id());
        assert_eq!(ended.payload["duration_minutes"], 120.0);
        assert_eq!(ended.payload["time_block_id"], running.id().to_string());
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let (service, _) = service();
        let tenant = TenantId::random();
        let running: TimeBlock = service
            .create(tenant, block(ActivityCategory::Work, at(11, 9), None))
            .await
            .unwrap();
        let err = service.end_time_block(tenant, running.id(), at(11, 8)).await.unwrap_err();
        assert!(err.to_string().contains("End time must be after start time"));
    }

    #[tokio::test]
    async fn report_is_generated_from_blocks() {
        let (service, _) = service();
        let tenant = TenantId::random();
        service.create::<TimeBlock>(tenant, block(ActivityCategory::Work, at(11, 9), Some(4))).await.unwrap();
        service
            .create::<TimeBlock>(tenant, block(ActivityCategory::Entertainment, at(12, 20), Some(2)))
            .await
            .unwrap();
        // another tenant's time is invisible
        service
            .create::<TimeBlock>(TenantId::random(), block(ActivityCategory::Work, at(12, 9), Some(8)))
            .await
            .unwrap();

        let report = service
            .generate_audit_report(
                tenant,
                GenerateReportRequest {
                    title: None,
                    start_date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 3, 17).unwrap(),
                },
            )
            .await
            .unwrap();
        assert_eq!(report.total_tracked_hours, 6.0);
        assert_eq!(report.productive_hours, 4.0);
        assert_eq!(report.title, "Time Audit 2024-03-11 to 2024-03-17");
        assert!(service.get::<AuditReport>(tenant, report.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn goal_progress_counts_category_hours_in_week() {
        let (service, _) = service();
        let tenant = TenantId::random();
        let goal: TimeGoal = service
            .create(
                tenant,
                TimeGoalDraft {
                    category: ActivityCategory::Work,
                    target_hours_per_week: 10.0,
                    minimum_hours_per_week: None,
                    description: "Deep work".to_string(),
                    is_active: true,
                    start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    end_date: None,
                },
            )
            .await
            .unwrap();
        service.create::<TimeBlock>(tenant, block(ActivityCategory::Work, at(11, 9), Some(3))).await.unwrap();
        service.create::<TimeBlock>(tenant, block(ActivityCategory::Work, at(17, 9), Some(2))).await.unwrap();
        service.create::<TimeBlock>(tenant, block(ActivityCategory::Work, at(18, 9), Some(6))).await.unwrap();
        service.create::<TimeBlock>(tenant, block(ActivityCategory::Exercise, at(12, 6), Some(1))).await.unwrap();

        let week = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let progress = service.time_goal_progress(tenant, goal.id(), week).await.unwrap();
        assert_eq!(progress.actual_hours, 5.0);
        assert_eq!(progress.progress_percentage, 50.0);
        assert!(!progress.is_goal_met);

        let deactivated = service
            .deactivate_time_goal(tenant, goal.id(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
            .await
            .unwrap();
        assert!(!deactivated.is_active);
    }

    #[tokio::test]
    async fn meeting_a_goal_publishes_achieved_once() {
        let (service, publisher) = service();
        let tenant = TenantId::random();
        let goal: TimeGoal = service
            .create(
                tenant,
                TimeGoalDraft {
                    category: ActivityCategory::Exercise,
                    target_hours_per_week: 3.0,
                    minimum_hours_per_week: None,
                    description: "Move more".to_string(),
                    is_active: true,
                    start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    end_date: None,
                },
            )
            .await
            .unwrap();
        let week = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        service.create::<TimeBlock>(tenant, block(ActivityCategory::Exercise, at(11, 6), Some(2))).await.unwrap();

        assert!(!service.time_goal_progress(tenant, goal.id(), week).await.unwrap().is_goal_met);
        let achieved = |publisher: &MemoryPublisher| {
            publisher
                .events()
                .into_iter()
                .filter(|e| e.event_type == "TimeGoalAchieved")
                .collect::<Vec<_>>()
        };
        assert!(achieved(&publisher).is_empty());

        service.create::<TimeBlock>(tenant, block(ActivityCategory::Exercise, at(13, 6), Some(1))).await.unwrap();
        assert!(service.time_goal_progress(tenant, goal.id(), week).await.unwrap().is_goal_met);
        assert!(service.time_goal_progress(tenant, goal.id(), week).await.unwrap().is_goal_met);

        let events = achieved(&publisher);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_id, goal.id());
        assert_eq!(events[0].payload["actual_hours"], 3.0);
        assert_eq!(events[0].payload["target_hours"], 3.0);

        let stored: TimeGoal = service.require(tenant, goal.id()).await.unwrap();
        assert_eq!(stored.last_achieved_week, Some(week));
    }
}
