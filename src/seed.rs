//! Demo rows for a fresh install, all owned by [`DEMO_TENANT`].

use chrono::{Duration, NaiveDate, Utc};
use tracing::info;
use tracker_core::domain::financial_goals::{
    Contribution, ContributionDraft, Goal, GoalDraft, GoalType, Milestone, MilestoneDraft,
};
use tracker_core::domain::health_screening::{
    Reminder, ReminderDraft, Screening, ScreeningDraft, ScreeningType,
};
use tracker_core::domain::mortgage::{
    Mortgage, MortgageDraft, MortgageType, RefinanceScenario, RefinanceScenarioDraft,
};
use tracker_core::domain::time_audit::{
    ActivityCategory, AuditReport, AuditReportDraft, TimeBlock, TimeBlockDraft, TimeGoal,
    TimeGoalDraft,
};
use tracker_core::domain::vehicle_maintenance::{
    MaintenanceSchedule, MaintenanceScheduleDraft, ServiceRecordDraft, ServiceType, Vehicle,
    VehicleDraft, VehicleType,
};
use tracker_core::{Entity, Result, TenantId};
use uuid::Uuid;

use crate::app::TrackerService;

pub const DEMO_TENANT: TenantId =
    TenantId::new(Uuid::from_u128(0x11111111_1111_1111_1111_111111111111));

/// Domains that received rows on this run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Seeds every domain whose root kind has no rows for the demo tenant.
pub async fn seed_demo_data(service: &TrackerService) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let tenant = DEMO_TENANT;

    macro_rules! seed_domain {
        ($root:ty, $name:literal, $seed:ident) => {
            if service.repository::<$root>().count(tenant).await? == 0 {
                $seed(service, tenant).await?;
                report.seeded.push($name);
            } else {
                report.skipped.push($name);
            }
        };
    }

    seed_domain!(Screening, "health_screening", seed_health_screening);
    seed_domain!(Goal, "financial_goals", seed_financial_goals);
    seed_domain!(Vehicle, "vehicle_maintenance", seed_vehicle_maintenance);
    seed_domain!(Mortgage, "mortgage", seed_mortgage);
    seed_domain!(TimeBlock, "time_audit", seed_time_audit);

    info!(seeded = ?report.seeded, skipped = ?report.skipped, "Seed complete");
    Ok(report)
}

async fn seed_health_screening(service: &TrackerService, tenant: TenantId) -> Result<()> {
    let screenings = [
        (
            ScreeningType::PhysicalExam,
            "Annual Physical Exam",
            12,
            date(2024, 1, 15),
            "Dr. Smith",
            "Check blood pressure and cholesterol",
        ),
        (
            ScreeningType::DentalCheckup,
            "Dental Cleaning & Checkup",
            6,
            date(2024, 6, 20),
            "Dr. Johnson (Dentist)",
            "Regular cleaning",
        ),
        (
            ScreeningType::VisionTest,
            "Eye Exam",
            24,
            date(2023, 3, 10),
            "Vision Center",
            "Update glasses prescription",
        ),
    ];
    for (screening_type, name, months, last, provider, notes) in screenings {
        let screening: Screening = service
            .create(
                tenant,
                ScreeningDraft {
                    screening_type,
                    name: name.to_string(),
                    recommended_frequency_months: months,
                    last_screening_date: Some(last),
                    next_due_date: None,
                    provider: Some(provider.to_string()),
                    notes: Some(notes.to_string()),
                },
            )
            .await?;
        if let Some(due) = screening.next_due_date {
            let remind_on = (due - Duration::days(14)).and_hms_opt(9, 0, 0).unwrap_or_default();
            service
                .create::<Reminder>(
                    tenant,
                    ReminderDraft {
                        screening_id: screening.id(),
                        reminder_date: remind_on.and_utc(),
                        message: format!("{name} is due on {due}"),
                        is_sent: false,
                    },
                )
                .await?;
        }
    }
    Ok(())
}

async fn seed_financial_goals(service: &TrackerService, tenant: TenantId) -> Result<()> {
    let goal: Goal = service
        .create(
            tenant,
            GoalDraft {
                name: "Emergency Fund".to_string(),
                description: Some("Six months of expenses".to_string()),
                goal_type: GoalType::Emergency,
                target_amount: 15000.0,
                current_amount: 0.0,
                target_date: Some(date(2026, 12, 31)),
                is_completed: false,
            },
        )
        .await?;
    for (name, amount) in [("First month covered", 2500.0), ("Halfway", 7500.0)] {
        service
            .create::<Milestone>(
                tenant,
                MilestoneDraft {
                    goal_id: goal.id(),
                    name: name.to_string(),
                    target_amount: amount,
                    target_date: None,
                    is_completed: false,
                    completed_date: None,
                },
            )
            .await?;
    }
    service
        .create::<Contribution>(
            tenant,
            ContributionDraft {
                goal_id: goal.id(),
                amount: 1200.0,
                contribution_date: date(2025, 1, 31),
                notes: Some("January savings".to_string()),
            },
        )
        .await?;
    let mut goal = goal;
    goal.apply_contribution(1200.0);
    goal.meta = goal.meta.touched();
    service.persist(tenant, &goal).await
}

async fn seed_vehicle_maintenance(service: &TrackerService, tenant: TenantId) -> Result<()> {
    let vehicle: Vehicle = service
        .create(
            tenant,
            VehicleDraft {
                make: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2019,
                vehicle_type: VehicleType::Sedan,
                vin: None,
                license_plate: Some("ABC-1234".to_string()),
                purchase_date: Some(date(2019, 5, 15)),
                current_mileage: 42000.0,
                notes: None,
                is_active: true,
            },
        )
        .await?;
    let schedules = [
        (ServiceType::OilChange, 5000.0, 6),
        (ServiceType::TireService, 7500.0, 12),
    ];
    for (service_type, miles, months) in schedules {
        service
            .create::<MaintenanceSchedule>(
                tenant,
                MaintenanceScheduleDraft {
                    vehicle_id: vehicle.id(),
                    service_type,
                    description: None,
                    mileage_interval: Some(miles),
                    months_interval: Some(months),
                    last_service_date: None,
                    last_service_mileage: None,
                    notes: None,
                    is_active: true,
                },
            )
            .await?;
    }
    service
        .log_service(
            tenant,
            ServiceRecordDraft {
                vehicle_id: vehicle.id(),
                service_type: ServiceType::OilChange,
                description: Some("Synthetic 0W-20".to_string()),
                service_date: date(2025, 2, 1),
                mileage_at_service: 42150.0,
                cost: 79.99,
                service_provider: Some("Quick Lube".to_string()),
                invoice_number: None,
                notes: None,
            },
        )
        .await?;
    Ok(())
}

async fn seed_mortgage(service: &TrackerService, tenant: TenantId) -> Result<()> {
    let mortgage: Mortgage = service
        .create(
            tenant,
            MortgageDraft {
                property_address: "123 Main St".to_string(),
                lender: "First National Bank".to_string(),
                original_loan_amount: 300000.0,
                current_balance: 250000.0,
                interest_rate: 4.5,
                loan_term_years: 30,
                monthly_payment: 1520.06,
                start_date: date(2020, 6, 1),
                mortgage_type: MortgageType::Fixed,
            },
        )
        .await?;
    service
        .create::<RefinanceScenario>(
            tenant,
            RefinanceScenarioDraft {
                mortgage_id: mortgage.id(),
                name: "15-year at 3.75%".to_string(),
                new_interest_rate: 3.75,
                new_loan_term_years: 15,
                refinancing_costs: 4500.0,
                monthly_savings: 150.0,
            },
        )
        .await?;
    Ok(())
}

async fn seed_time_audit(service: &TrackerService, tenant: TenantId) -> Result<()> {
    let today = Utc::now().date_naive();
    let day = |offset: i64, hour: u32| {
        (today - Duration::days(offset))
            .and_hms_opt(hour, 0, 0)
            .unwrap_or_default()
            .and_utc()
    };
    let blocks = [
        (ActivityCategory::Work, "Project planning and design", day(7, 9), day(7, 11), true),
        (ActivityCategory::Work, "Code implementation", day(7, 13), day(7, 17), true),
        (ActivityCategory::Learning, "Online course on cloud architecture", day(6, 19), day(6, 21), true),
        (ActivityCategory::Exercise, "Morning run", day(5, 6), day(5, 7), true),
        (ActivityCategory::Entertainment, "Watching TV series", day(5, 20), day(5, 22), false),
        (ActivityCategory::SocialMedia, "Scrolling feeds", day(4, 21), day(4, 22), false),
    ];
    let mut created = Vec::with_capacity(blocks.len());
    for (category, description, start, end, productive) in blocks {
        let block: TimeBlock = service
            .create(
                tenant,
                TimeBlockDraft {
                    category,
                    description: description.to_string(),
                    start_time: start,
                    end_time: Some(end),
                    notes: None,
                    tags: None,
                    is_productive: productive,
                },
            )
            .await?;
        created.push(block);
    }

    for (category, target, description) in [
        (ActivityCategory::Exercise, 5.0, "Exercise at least 5 hours per week"),
        (ActivityCategory::Learning, 10.0, "Dedicate 10 hours to learning"),
    ] {
        service
            .create::<TimeGoal>(
                tenant,
                TimeGoalDraft {
                    category,
                    target_hours_per_week: target,
                    minimum_hours_per_week: None,
                    description: description.to_string(),
                    is_active: true,
                    start_date: today - Duration::days(30),
                    end_date: None,
                },
            )
            .await?;
    }

    let start = today - Duration::days(7);
    let draft = AuditReportDraft::from_blocks(
        format!("Weekly Time Audit {start} to {today}"),
        start,
        today,
        &created,
    );
    service.create::<AuditReport>(tenant, draft).await?;
    Ok(())
}
