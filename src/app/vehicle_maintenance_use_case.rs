use chrono::NaiveDate;
use tracker_core::domain::vehicle_maintenance::{
    MaintenanceSchedule, ServiceRecord, ServiceRecordDraft, Vehicle,
};
use tracker_core::{Entity, ListQuery, Result, TenantId};
use uuid::Uuid;

use super::TrackerService;

#[derive(Debug, Clone)]
pub struct ServiceLogOutcome {
    pub record: ServiceRecord,
    pub vehicle: Vehicle,
    pub schedules_reset: usize,
}

impl TrackerService {
    /// Stores a service record, moves the odometer forward if the service
    /// mileage is higher, and restarts every active schedule of that type.
    pub async fn log_service(
        &self,
        tenant: TenantId,
        draft: ServiceRecordDraft,
    ) -> Result<ServiceLogOutcome> {
        let record: ServiceRecord = self.create(tenant, draft).await?;
        let mut vehicle: Vehicle = self.require(tenant, record.vehicle_id).await?;

        if record.mileage_at_service > vehicle.current_mileage {
            vehicle.update_mileage(record.mileage_at_service)?;
            vehicle.meta = vehicle.meta.touched();
            self.persist(tenant, &vehicle).await?;
        }

        let mut schedules_reset = 0;
        for mut schedule in self
            .list::<MaintenanceSchedule>(tenant, &ListQuery::children_of(vehicle.id()))
            .await?
        {
            if schedule.is_active && schedule.service_type == record.service_type {
                schedule.record_service(record.service_date, record.mileage_at_service);
                schedule.meta = schedule.meta.touched();
                self.persist(tenant, &schedule).await?;
                schedules_reset += 1;
            }
        }

        Ok(ServiceLogOutcome {
            record,
            vehicle,
            schedules_reset,
        })
    }

    /// Active schedules of a vehicle that are due at its current mileage.
    pub async fn maintenance_due(
        &self,
        tenant: TenantId,
        vehicle_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<MaintenanceSchedule>> {
        let vehicle: Vehicle = self.require(tenant, vehicle_id).await?;
        Ok(self
            .list::<MaintenanceSchedule>(tenant, &ListQuery::children_of(vehicle_id))
            .await?
            .into_iter()
            .filter(|s| s.is_due(vehicle.current_mileage, today))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopPublisher;
    use std::sync::Arc;
    use tracker_core::domain::vehicle_maintenance::{
        MaintenanceScheduleDraft, ServiceType, VehicleDraft, VehicleType,
    };
    use tracker_core::{InMemoryStorage, TrackerError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup() -> (TrackerService, TenantId, Vehicle) {
        let service = TrackerService::new(Arc::new(InMemoryStorage::new()), Arc::new(NoopPublisher));
        let tenant = TenantId::random();
        let vehicle: Vehicle = service
            .create(
                tenant,
                VehicleDraft {
                    make: "Honda".to_string(),
                    model: "Civic".to_string(),
                    year: 2019,
                    vehicle_type: VehicleType::Sedan,
                    vin: None,
                    license_plate: Some("ABC123".to_string()),
                    purchase_date: None,
                    current_mileage: 14000.0,
                    notes: None,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        let schedules = [
            (ServiceType::OilChange, Some(5000.0), Some(6)),
            (ServiceType::TireService, Some(7500.0), None),
        ];
        for (service_type, miles, months) in schedules {
            service
                .create::<MaintenanceSchedule>(
                    tenant,
                    MaintenanceScheduleDraft {
                        vehicle_id: vehicle.id(),
                        service_type,
                        description: None,
                        mileage_interval: miles,
                        months_interval: months,
                        last_service_date: Some(date(2024, 1, 1)),
                        last_service_mileage: Some(10000.0),
                        notes: None,
                        is_active: true,
                    },
                )
                .await
                .unwrap();
        }
        (service, tenant, vehicle)
    }

    fn oil_change(vehicle_id: Uuid, mileage: f64) -> ServiceRecordDraft {
        ServiceRecordDraft {
            vehicle_id,
            service_type: ServiceType::OilChange,
            description: None,
            service_date: date(2024, 8, 1),
            mileage_at_service: mileage,
            cost: 59.99,
            service_provider: Some("Quick Lube".to_string()),
            invoice_number: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn due_list_uses_vehicle_mileage_and_date() {
        let (service, tenant, vehicle) = setup().await;
        assert!(service
            .maintenance_due(tenant, vehicle.id(), date(2024, 3, 1))
            .await
            .unwrap()
            .is_empty());

        // six months elapsed for the oil change
        let due = service
            .maintenance_due(tenant, vehicle.id(), date(2024, 7, 1))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].service_type, ServiceType::OilChange);
    }

    #[tokio::test]
    async fn logging_service_updates_vehicle_and_schedule() {
        let (service, tenant, vehicle) = setup().await;
        let outcome = service
            .log_service(tenant, oil_change(vehicle.id(), 15200.0))
            .await
            .unwrap();
        assert_eq!(outcome.vehicle.current_mileage, 15200.0);
        assert_eq!(outcome.schedules_reset, 1);

        // tire rotation still waits for 17,500 miles; oil change was reset
        assert!(service
            .maintenance_due(tenant, vehicle.id(), date(2024, 8, 2))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn older_service_does_not_roll_back_odometer() {
        let (service, tenant, vehicle) = setup().await;
        let outcome = service
            .log_service(tenant, oil_change(vehicle.id(), 12000.0))
            .await
            .unwrap();
        assert_eq!(outcome.vehicle.current_mileage, 14000.0);
    }

    #[tokio::test]
    async fn unknown_vehicle_is_not_found() {
        let (service, tenant, _) = setup().await;
        let err = service
            .log_service(tenant, oil_change(Uuid::new_v4(), 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { kind: "vehicle", .. }));
    }
}
