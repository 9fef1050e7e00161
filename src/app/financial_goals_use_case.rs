use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracker_core::domain::financial_goals::{Contribution, ContributionDraft, Goal, Milestone};
use tracker_core::{ListQuery, Result, TenantId};
use uuid::Uuid;

use super::TrackerService;

/// Body of `POST /api/goals/:id/contributions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContributionRequest {
    pub amount: f64,
    /// Defaults to today
    #[serde(default)]
    pub contribution_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContributionOutcome {
    pub goal: Goal,
    pub contribution: Contribution,
    pub milestones_reached: usize,
}

impl TrackerService {
    /// Stores a contribution, advances the goal and completes any milestone
    /// the new balance reaches.
    pub async fn record_contribution(
        &self,
        tenant: TenantId,
        goal_id: Uuid,
        request: ContributionRequest,
    ) -> Result<ContributionOutcome> {
        let mut goal: Goal = self.require(tenant, goal_id).await?;
        let on = request
            .contribution_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let contribution: Contribution = self
            .create(
                tenant,
                ContributionDraft {
                    goal_id,
                    amount: request.amount,
                    contribution_date: on,
                    notes: request.notes,
                },
            )
            .await?;

        goal.apply_contribution(contribution.amount);
        goal.meta = goal.meta.touched();
        self.persist(tenant, &goal).await?;

        let mut milestones_reached = 0;
        for mut milestone in self
            .list::<Milestone>(tenant, &ListQuery::children_of(goal_id))
            .await?
        {
            if !milestone.is_completed && milestone.is_reached_by(&goal) {
                milestone.complete(on);
                milestone.meta = milestone.meta.touched();
                self.persist(tenant, &milestone).await?;
                milestones_reached += 1;
            }
        }

        Ok(ContributionOutcome {
            goal,
            contribution,
            milestones_reached,
        })
    }

    pub async fn complete_milestone(
        &self,
        tenant: TenantId,
        id: Uuid,
        on: NaiveDate,
    ) -> Result<Milestone> {
        let mut milestone: Milestone = self.require(tenant, id).await?;
        milestone.complete(on);
        milestone.meta = milestone.meta.touched();
        self.persist(tenant, &milestone).await?;
        Ok(milestone)
    }
}
