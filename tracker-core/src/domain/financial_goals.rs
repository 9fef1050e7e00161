//! Savings and debt-payoff goals with their milestones and contributions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_cents;
use crate::common::error::{ensure, Result};
use crate::entity::{Entity, ParentRef, RecordMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    Savings,
    Emergency,
    Retirement,
    Investment,
    Purchase,
    DebtPayoff,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
}

impl Goal {
    /// Share of the target already saved, capped at 100.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }

    pub fn remaining_amount(&self) -> f64 {
        round_cents((self.target_amount - self.current_amount).max(0.0))
    }

    pub fn apply_contribution(&mut self, amount: f64) {
        self.current_amount = round_cents(self.current_amount + amount);
        if self.current_amount >= self.target_amount {
            self.is_completed = true;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalDto {
    pub goal_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_amount: f64,
    pub current_amount: f64,
    pub remaining_amount: f64,
    pub progress_percentage: f64,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Goal> for GoalDto {
    fn from(g: Goal) -> Self {
        Self {
            goal_id: g.meta.id,
            remaining_amount: g.remaining_amount(),
            progress_percentage: g.progress_percentage(),
            name: g.name,
            description: g.description,
            goal_type: g.goal_type,
            target_amount: g.target_amount,
            current_amount: g.current_amount,
            target_date: g.target_date,
            is_completed: g.is_completed,
            created_at: g.meta.created_at,
            updated_at: g.meta.updated_at,
        }
    }
}

impl Entity for Goal {
    const KIND: &'static str = "goal";
    const COLLECTION: &'static str = "goals";
    const CHILDREN: &'static [&'static str] = &[Milestone::KIND, Contribution::KIND];

    type Draft = GoalDraft;
    type Dto = GoalDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: GoalDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.name.trim().is_empty(), "goal name is required")?;
        ensure(draft.target_amount > 0.0, "target amount must be positive")?;
        ensure(draft.current_amount >= 0.0, "current amount cannot be negative")?;
        Ok(Self {
            meta,
            name: draft.name,
            description: draft.description,
            goal_type: draft.goal_type,
            target_amount: round_cents(draft.target_amount),
            current_amount: round_cents(draft.current_amount),
            target_date: draft.target_date,
            is_completed: draft.is_completed,
        })
    }
}

const GOAL_PARENT: ParentRef = ParentRef {
    kind: Goal::KIND,
    field: "goal_id",
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub goal_id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub completed_date: Option<NaiveDate>,
}

impl Milestone {
    pub fn complete(&mut self, on: NaiveDate) {
        self.is_completed = true;
        self.completed_date = Some(on);
    }

    /// Whether the goal's saved amount already covers this milestone.
    pub fn is_reached_by(&self, goal: &Goal) -> bool {
        goal.current_amount >= self.target_amount
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneDraft {
    pub goal_id: Uuid,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneDto {
    pub milestone_id: Uuid,
    pub goal_id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub completed_date: Option<NaiveDate>,
}

impl From<Milestone> for MilestoneDto {
    fn from(m: Milestone) -> Self {
        Self {
            milestone_id: m.meta.id,
            goal_id: m.goal_id,
            name: m.name,
            target_amount: m.target_amount,
            target_date: m.target_date,
            is_completed: m.is_completed,
            completed_date: m.completed_date,
        }
    }
}

impl Entity for Milestone {
    const KIND: &'static str = "milestone";
    const COLLECTION: &'static str = "milestones";
    const PARENT: Option<ParentRef> = Some(GOAL_PARENT);

    type Draft = MilestoneDraft;
    type Dto = MilestoneDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.goal_id)
    }

    fn from_draft(draft: MilestoneDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.name.trim().is_empty(), "milestone name is required")?;
        ensure(draft.target_amount >= 0.0, "milestone amount cannot be negative")?;
        let completed_date = if draft.is_completed { draft.completed_date } else { None };
        Ok(Self {
            meta,
            goal_id: draft.goal_id,
            name: draft.name,
            target_amount: round_cents(draft.target_amount),
            target_date: draft.target_date,
            is_completed: draft.is_completed,
            completed_date,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub goal_id: Uuid,
    pub amount: f64,
    pub contribution_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributionDraft {
    pub goal_id: Uuid,
    pub amount: f64,
    pub contribution_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionDto {
    pub contribution_id: Uuid,
    pub goal_id: Uuid,
    pub amount: f64,
    pub contribution_date: NaiveDate,
    pub notes: Option<String>,
}

impl From<Contribution> for ContributionDto {
    fn from(c: Contribution) -> Self {
        Self {
            contribution_id: c.meta.id,
            goal_id: c.goal_id,
            amount: c.amount,
            contribution_date: c.contribution_date,
            notes: c.notes,
        }
    }
}

impl Entity for Contribution {
    const KIND: &'static str = "contribution";
    const COLLECTION: &'static str = "contributions";
    const PARENT: Option<ParentRef> = Some(GOAL_PARENT);

    type Draft = ContributionDraft;
    type Dto = ContributionDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.goal_id)
    }

    fn from_draft(draft: ContributionDraft, meta: RecordMeta) -> Result<Self> {
        ensure(draft.amount > 0.0, "contribution amount must be positive")?;
        Ok(Self {
            meta,
            goal_id: draft.goal_id,
            amount: round_cents(draft.amount),
            contribution_date: draft.contribution_date,
            notes: draft.notes,
        })
    }
}
