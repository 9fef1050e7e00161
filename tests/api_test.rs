use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracker_core::{InMemoryStorage, TenantId};

use life_trackers::events::MemoryPublisher;
use life_trackers::{create_server, AppState, TrackerService};

struct TestApp {
    router: Router,
    publisher: MemoryPublisher,
}

fn app_with_default(default_tenant: Option<TenantId>) -> TestApp {
    let publisher = MemoryPublisher::new();
    let service = TrackerService::new(
        Arc::new(InMemoryStorage::new()),
        Arc::new(publisher.clone()),
    );
    TestApp {
        router: create_server(AppState {
            service,
            default_tenant,
        }),
        publisher,
    }
}

fn app() -> TestApp {
    app_with_default(None)
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    tenant: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-Id", tenant);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn tenant() -> String {
    TenantId::random().to_string()
}

fn vehicle_body(model: &str) -> Value {
    json!({ "make": "Honda", "model": model, "year": 2018, "current_mileage": 30000.0 })
}

#[tokio::test]
async fn health_reports_service_and_version() {
    let app = app();
    let (status, body) = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "life-trackers");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn vehicle_crud_round_trip() {
    let app = app();
    let t = tenant();

    let (status, created) = send(&app.router, "POST", "/api/vehicles", Some(&t), Some(vehicle_body("Civic"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["vehicle_id"].as_str().unwrap().to_string();
    assert_eq!(created["is_active"], true);

    let (status, fetched) = send(&app.router, "GET", &format!("/api/vehicles/{id}"), Some(&t), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["model"], "Civic");

    let (status, updated) = send(
        &app.router,
        "PUT",
        &format!("/api/vehicles/{id}"),
        Some(&t),
        Some(vehicle_body("Accord")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["model"], "Accord");
    assert_eq!(updated["vehicle_id"], id.as_str());

    let (status, listed) = send(&app.router, "GET", "/api/vehicles", Some(&t), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app.router, "DELETE", &format!("/api/vehicles/{id}"), Some(&t), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, "GET", &format!("/api/vehicles/{id}"), Some(&t), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("vehicle"));

    let events: Vec<_> = app.publisher.events().into_iter().map(|e| e.event_type).collect();
    assert_eq!(events, vec!["VehicleCreated", "VehicleUpdated", "VehicleDeleted"]);
}

#[tokio::test]
async fn vehicle_update_cannot_roll_back_odometer() {
    let app = app();
    let t = tenant();
    let body = json!({
        "make": "Subaru",
        "model": "Outback",
        "year": 2021,
        "vehicle_type": "SUV",
        "purchase_date": "2021-04-10",
        "current_mileage": 50000.0,
        "notes": "Roof rack"
    });
    let (status, created) = send(&app.router, "POST", "/api/vehicles", Some(&t), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["vehicle_type"], "SUV");
    assert_eq!(created["purchase_date"], "2021-04-10");
    assert_eq!(created["notes"], "Roof rack");
    let uri = format!("/api/vehicles/{}", created["vehicle_id"].as_str().unwrap());

    let mut rolled_back = body.clone();
    rolled_back["current_mileage"] = json!(10.0);
    let (status, err) = send(&app.router, "PUT", &uri, Some(&t), Some(rolled_back)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("current mileage"));

    let (_, fetched) = send(&app.router, "GET", &uri, Some(&t), None).await;
    assert_eq!(fetched["current_mileage"], 50000.0);

    let mut forward = body;
    forward["current_mileage"] = json!(50250.0);
    let (status, updated) = send(&app.router, "PUT", &uri, Some(&t), Some(forward)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["current_mileage"], 50250.0);
}

#[tokio::test]
async fn tenants_cannot_see_each_other() {
    let app = app();
    let (mine, theirs) = (tenant(), tenant());
    let (_, created) = send(&app.router, "POST", "/api/vehicles", Some(&mine), Some(vehicle_body("Fit"))).await;
    let id = created["vehicle_id"].as_str().unwrap();

    let (status, _) = send(&app.router, "GET", &format!("/api/vehicles/{id}"), Some(&theirs), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app.router, "DELETE", &format!("/api/vehicles/{id}"), Some(&theirs), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = send(&app.router, "GET", "/api/vehicles", Some(&theirs), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tenant_header_is_required_and_validated() {
    let app = app();
    let (status, body) = send(&app.router, "GET", "/api/goals", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("X-Tenant-Id"));

    let (status, _) = send(&app.router, "GET", "/api/goals", Some("not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn default_tenant_applies_without_header() {
    let default = TenantId::random();
    let app = app_with_default(Some(default));
    let (status, _) = send(&app.router, "POST", "/api/vehicles", None, Some(vehicle_body("Jazz"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = send(&app.router, "GET", "/api/vehicles", Some(&default.to_string()), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = app();
    let t = tenant();
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/goals",
        Some(&t),
        Some(json!({ "name": "Trip", "goal_type": "Savings", "target_amount": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app.router, "POST", "/api/goals", Some(&t), Some(json!({ "name": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, "GET", "/api/goals/not-a-uuid", Some(&t), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, "GET", "/api/goals?limit=lots", Some(&t), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn screening_delete_cascades_and_parent_filter_works() {
    let app = app();
    let t = tenant();
    let screening = json!({
        "screening_type": "PhysicalExam",
        "name": "Annual physical",
        "recommended_frequency_months": 12,
        "last_screening_date": "2024-01-15"
    });
    let (status, first) = send(&app.router, "POST", "/api/screenings", Some(&t), Some(screening.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["next_due_date"], "2025-01-15");
    let (_, second) = send(&app.router, "POST", "/api/screenings", Some(&t), Some(screening)).await;
    let first_id = first["screening_id"].as_str().unwrap().to_string();
    let second_id = second["screening_id"].as_str().unwrap().to_string();

    for id in [&first_id, &first_id, &second_id] {
        let (status, _) = send(
            &app.router,
            "POST",
            "/api/reminders",
            Some(&t),
            Some(json!({ "screening_id": id, "reminder_date": "2024-12-01T09:00:00Z", "message": "Book it" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, filtered) = send(
        &app.router,
        "GET",
        &format!("/api/reminders?screening_id={first_id}"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 2);

    let (status, _) = send(&app.router, "DELETE", &format!("/api/screenings/{first_id}"), Some(&t), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, remaining) = send(&app.router, "GET", "/api/reminders", Some(&t), None).await;
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["screening_id"], second_id.as_str());
}

#[tokio::test]
async fn child_with_unknown_parent_is_not_found() {
    let app = app();
    let t = tenant();
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/contributions",
        Some(&t),
        Some(json!({
            "goal_id": uuid::Uuid::new_v4(),
            "amount": 50.0,
            "contribution_date": "2025-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("goal"));
}

#[tokio::test]
async fn screening_actions() {
    let app = app();
    let t = tenant();
    let (_, screening) = send(
        &app.router,
        "POST",
        "/api/screenings",
        Some(&t),
        Some(json!({
            "screening_type": "DentalCheckup",
            "name": "Cleaning",
            "recommended_frequency_months": 6,
            "next_due_date": "2025-02-01"
        })),
    )
    .await;
    let id = screening["screening_id"].as_str().unwrap();

    let (_, due) = send(&app.router, "GET", "/api/screenings/due?on=2025-03-01", Some(&t), None).await;
    assert_eq!(due.as_array().unwrap().len(), 1);
    let (_, due) = send(&app.router, "GET", "/api/screenings/due?on=2025-01-01", Some(&t), None).await;
    assert!(due.as_array().unwrap().is_empty());

    let (status, completed) = send(
        &app.router,
        "POST",
        &format!("/api/screenings/{id}/complete?on=2025-03-01"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["last_screening_date"], "2025-03-01");
    assert_eq!(completed["next_due_date"], "2025-09-01");

    let (_, reminder) = send(
        &app.router,
        "POST",
        "/api/reminders",
        Some(&t),
        Some(json!({ "screening_id": id, "reminder_date": "2020-01-01T00:00:00Z", "message": "Overdue" })),
    )
    .await;
    let reminder_id = reminder["reminder_id"].as_str().unwrap();
    let (_, pending) = send(&app.router, "GET", "/api/reminders/pending", Some(&t), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, sent) = send(
        &app.router,
        "POST",
        &format!("/api/reminders/{reminder_id}/send"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["is_sent"], true);
    let (_, pending) = send(&app.router, "GET", "/api/reminders/pending", Some(&t), None).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn contribution_advances_goal() {
    let app = app();
    let t = tenant();
    let (_, goal) = send(
        &app.router,
        "POST",
        "/api/goals",
        Some(&t),
        Some(json!({ "name": "Laptop", "goal_type": "Purchase", "target_amount": 1000.0 })),
    )
    .await;
    let goal_id = goal["goal_id"].as_str().unwrap();
    send(
        &app.router,
        "POST",
        "/api/milestones",
        Some(&t),
        Some(json!({ "goal_id": goal_id, "name": "Half", "target_amount": 500.0 })),
    )
    .await;

    let (status, outcome) = send(
        &app.router,
        "POST",
        &format!("/api/goals/{goal_id}/contributions"),
        Some(&t),
        Some(json!({ "amount": 600.0, "contribution_date": "2025-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["goal"]["current_amount"], 600.0);
    assert_eq!(outcome["contribution"]["amount"], 600.0);
    assert_eq!(outcome["milestones_reached"], 1);

    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/goals/{}/contributions", uuid::Uuid::new_v4()),
        Some(&t),
        Some(json!({ "amount": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_log_and_maintenance_due() {
    let app = app();
    let t = tenant();
    let (_, vehicle) = send(&app.router, "POST", "/api/vehicles", Some(&t), Some(vehicle_body("CR-V"))).await;
    let vehicle_id = vehicle["vehicle_id"].as_str().unwrap();
    send(
        &app.router,
        "POST",
        "/api/maintenance-schedules",
        Some(&t),
        Some(json!({
            "vehicle_id": vehicle_id,
            "service_type": "OilChange",
            "mileage_interval": 5000.0,
            "last_service_mileage": 24000.0
        })),
    )
    .await;

    let (_, due) = send(
        &app.router,
        "GET",
        &format!("/api/vehicles/{vehicle_id}/maintenance-due?on=2025-01-01"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(due.as_array().unwrap().len(), 1);

    let (status, outcome) = send(
        &app.router,
        "POST",
        &format!("/api/vehicles/{vehicle_id}/services"),
        Some(&t),
        Some(json!({
            "service_type": "OilChange",
            "service_date": "2025-01-02",
            "mileage_at_service": 30500.0,
            "cost": 59.5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["vehicle"]["current_mileage"], 30500.0);
    assert_eq!(outcome["schedules_reset"], 1);

    let (_, due) = send(
        &app.router,
        "GET",
        &format!("/api/vehicles/{vehicle_id}/maintenance-due?on=2025-01-03"),
        Some(&t),
        None,
    )
    .await;
    assert!(due.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn mortgage_payment_and_payoff() {
    let app = app();
    let t = tenant();
    let (status, mortgage) = send(
        &app.router,
        "POST",
        "/api/mortgages",
        Some(&t),
        Some(json!({
            "property_address": "1 Elm St",
            "lender": "Credit Union",
            "original_loan_amount": 260000.0,
            "current_balance": 250000.0,
            "interest_rate": 4.5,
            "loan_term_years": 30,
            "monthly_payment": 1520.0,
            "start_date": "2022-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(mortgage["mortgage_type"], "Fixed");
    let id = mortgage["mortgage_id"].as_str().unwrap();

    let (status, outcome) = send(
        &app.router,
        "POST",
        &format!("/api/mortgages/{id}/payments"),
        Some(&t),
        Some(json!({ "amount": 1520.0, "payment_date": "2025-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["payment"]["interest_amount"], 937.5);
    assert_eq!(outcome["payment"]["principal_amount"], 582.5);
    assert_eq!(outcome["mortgage"]["current_balance"], 249417.5);

    let (status, payoff) = send(
        &app.router,
        "GET",
        &format!("/api/mortgages/{id}/payoff?extra=200"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(payoff["months_saved"].as_u64().unwrap() > 0);
    assert!(payoff["interest_saved"].as_f64().unwrap() > 0.0);

    let (_, scenario) = send(
        &app.router,
        "POST",
        "/api/refinance-scenarios",
        Some(&t),
        Some(json!({
            "mortgage_id": id,
            "name": "Drop to 3.5%",
            "new_interest_rate": 3.5,
            "new_loan_term_years": 30,
            "refinancing_costs": 6000.0,
            "monthly_savings": 200.0
        })),
    )
    .await;
    assert_eq!(scenario["break_even_months"], 30);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/refinance-scenarios",
        Some(&t),
        Some(json!({
            "mortgage_id": id,
            "name": "Forever loan",
            "new_interest_rate": 3.0,
            "new_loan_term_years": 400_000_000u32,
            "refinancing_costs": 1000.0,
            "monthly_savings": 100.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("50 years"));

    let (status, listed) = send(&app.router, "GET", "/api/refinance-scenarios", Some(&t), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn time_audit_flow() {
    let app = app();
    let t = tenant();
    let (_, block) = send(
        &app.router,
        "POST",
        "/api/time-blocks",
        Some(&t),
        Some(json!({
            "category": "Exercise",
            "description": "Run",
            "start_time": "2025-03-03T07:00:00Z",
            "is_productive": true
        })),
    )
    .await;
    let block_id = block["time_block_id"].as_str().unwrap();
    assert!(block["end_time"].is_null());

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/time-blocks/{block_id}/end"),
        Some(&t),
        Some(json!({ "end_time": "2025-03-03T06:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("End time must be after start time"));

    let (status, ended) = send(
        &app.router,
        "POST",
        &format!("/api/time-blocks/{block_id}/end"),
        Some(&t),
        Some(json!({ "end_time": "2025-03-03T08:30:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["end_time"], "2025-03-03T08:30:00Z");
    let ended_event = app
        .publisher
        .events()
        .into_iter()
        .find(|e| e.event_type == "TimeBlockEnded")
        .unwrap();
    assert_eq!(ended_event.payload["duration_minutes"], 90.0);

    let (status, report) = send(
        &app.router,
        "POST",
        "/api/audit-reports/generate",
        Some(&t),
        Some(json!({ "start_date": "2025-03-03", "end_date": "2025-03-09" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["total_tracked_hours"], 1.5);
    assert_eq!(report["title"], "Time Audit 2025-03-03 to 2025-03-09");

    let (_, goal) = send(
        &app.router,
        "POST",
        "/api/time-goals",
        Some(&t),
        Some(json!({
            "category": "Exercise",
            "target_hours_per_week": 3.0,
            "description": "Move more",
            "start_date": "2025-03-01"
        })),
    )
    .await;
    let goal_id = goal["time_goal_id"].as_str().unwrap();
    let (status, progress) = send(
        &app.router,
        "GET",
        &format!("/api/time-goals/{goal_id}/progress?week_start=2025-03-03"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["actual_hours"], 1.5);
    assert_eq!(progress["progress_percentage"], 50.0);
    assert_eq!(progress["is_goal_met"], false);

    let (status, deactivated) = send(
        &app.router,
        "POST",
        &format!("/api/time-goals/{goal_id}/deactivate?on=2025-03-10"),
        Some(&t),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deactivated["is_active"], false);
}
