//! Vehicles, their service history and recurring maintenance schedules.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_cents;
use crate::common::error::{ensure, Result, TrackerError};
use crate::entity::{Entity, ParentRef, RecordMeta};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Sedan,
    SUV,
    Truck,
    Motorcycle,
    Van,
    Coupe,
    Convertible,
    Hatchback,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    OilChange,
    TireService,
    BrakeService,
    EngineService,
    TransmissionService,
    BatteryReplacement,
    AirFilterReplacement,
    Inspection,
    Alignment,
    CoolantFlush,
    Diagnostic,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    pub current_mileage: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

impl Vehicle {
    /// Odometer readings only move forward.
    pub fn update_mileage(&mut self, mileage: f64) -> Result<()> {
        if mileage < self.current_mileage {
            return Err(TrackerError::validation(format!(
                "new mileage {mileage} cannot be less than current mileage {}",
                self.current_mileage
            )));
        }
        self.current_mileage = mileage;
        Ok(())
    }

    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_mileage: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleDto {
    pub vehicle_id: Uuid,
    pub display_name: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: VehicleType,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub current_mileage: f64,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleDto {
    fn from(v: Vehicle) -> Self {
        Self {
            vehicle_id: v.meta.id,
            display_name: v.display_name(),
            make: v.make,
            model: v.model,
            year: v.year,
            vehicle_type: v.vehicle_type,
            vin: v.vin,
            license_plate: v.license_plate,
            purchase_date: v.purchase_date,
            current_mileage: v.current_mileage,
            notes: v.notes,
            is_active: v.is_active,
            created_at: v.meta.created_at,
        }
    }
}

impl Entity for Vehicle {
    const KIND: &'static str = "vehicle";
    const COLLECTION: &'static str = "vehicles";
    const CHILDREN: &'static [&'static str] = &[ServiceRecord::KIND, MaintenanceSchedule::KIND];

    type Draft = VehicleDraft;
    type Dto = VehicleDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn from_draft(draft: VehicleDraft, meta: RecordMeta) -> Result<Self> {
        ensure(!draft.make.trim().is_empty(), "vehicle make is required")?;
        ensure(!draft.model.trim().is_empty(), "vehicle model is required")?;
        ensure((1886..=2100).contains(&draft.year), "vehicle year is out of range")?;
        ensure(draft.current_mileage >= 0.0, "mileage cannot be negative")?;
        Ok(Self {
            meta,
            make: draft.make,
            model: draft.model,
            year: draft.year,
            vehicle_type: draft.vehicle_type,
            vin: draft.vin,
            license_plate: draft.license_plate,
            purchase_date: draft.purchase_date,
            current_mileage: draft.current_mileage,
            notes: draft.notes,
            is_active: draft.is_active,
        })
    }

    fn apply_update(existing: &Self, draft: VehicleDraft) -> Result<Self> {
        let mut updated = Self::from_draft(draft, existing.meta.touched())?;
        let reading = updated.current_mileage;
        updated.current_mileage = existing.current_mileage;
        updated.update_mileage(reading)?;
        Ok(updated)
    }
}

const VEHICLE_PARENT: ParentRef = ParentRef {
    kind: Vehicle::KIND,
    field: "vehicle_id",
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub vehicle_id: Uuid,
    pub service_type: ServiceType,
    pub description: Option<String>,
    pub service_date: NaiveDate,
    pub mileage_at_service: f64,
    pub cost: f64,
    pub service_provider: Option<String>,
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRecordDraft {
    pub vehicle_id: Uuid,
    pub service_type: ServiceType,
    #[serde(default)]
    pub description: Option<String>,
    pub service_date: NaiveDate,
    pub mileage_at_service: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub service_provider: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRecordDto {
    pub service_record_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_type: ServiceType,
    pub description: Option<String>,
    pub service_date: NaiveDate,
    pub mileage_at_service: f64,
    pub cost: f64,
    pub service_provider: Option<String>,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

impl From<ServiceRecord> for ServiceRecordDto {
    fn from(r: ServiceRecord) -> Self {
        Self {
            service_record_id: r.meta.id,
            vehicle_id: r.vehicle_id,
            service_type: r.service_type,
            description: r.description,
            service_date: r.service_date,
            mileage_at_service: r.mileage_at_service,
            cost: r.cost,
            service_provider: r.service_provider,
            invoice_number: r.invoice_number,
            notes: r.notes,
        }
    }
}

impl Entity for ServiceRecord {
    const KIND: &'static str = "service_record";
    const COLLECTION: &'static str = "service-records";
    const PARENT: Option<ParentRef> = Some(VEHICLE_PARENT);

    type Draft = ServiceRecordDraft;
    type Dto = ServiceRecordDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.vehicle_id)
    }

    fn from_draft(draft: ServiceRecordDraft, meta: RecordMeta) -> Result<Self> {
        ensure(draft.cost >= 0.0, "cost cannot be negative")?;
        ensure(draft.mileage_at_service >= 0.0, "mileage cannot be negative")?;
        Ok(Self {
            meta,
            vehicle_id: draft.vehicle_id,
            service_type: draft.service_type,
            description: draft.description,
            service_date: draft.service_date,
            mileage_at_service: draft.mileage_at_service,
            cost: round_cents(draft.cost),
            service_provider: draft.service_provider,
            invoice_number: draft.invoice_number,
            notes: draft.notes,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub vehicle_id: Uuid,
    pub service_type: ServiceType,
    pub description: Option<String>,
    pub mileage_interval: Option<f64>,
    pub months_interval: Option<u32>,
    pub last_service_date: Option<NaiveDate>,
    pub last_service_mileage: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

impl MaintenanceSchedule {
    pub fn next_due_mileage(&self) -> Option<f64> {
        let interval = self.mileage_interval?;
        Some(self.last_service_mileage.unwrap_or(0.0) + interval)
    }

    pub fn next_due_date(&self) -> Option<NaiveDate> {
        let months = self.months_interval?;
        self.last_service_date?.checked_add_months(Months::new(months))
    }

    /// Due when either interval has elapsed. The time interval only counts
    /// once a service date is known.
    pub fn is_due(&self, current_mileage: f64, today: NaiveDate) -> bool {
        if !self.is_active {
            return false;
        }
        let by_mileage = self
            .next_due_mileage()
            .map_or(false, |due| current_mileage >= due);
        let by_date = self.next_due_date().map_or(false, |due| today >= due);
        by_mileage || by_date
    }

    pub fn record_service(&mut self, on: NaiveDate, mileage: f64) {
        self.last_service_date = Some(on);
        self.last_service_mileage = Some(mileage);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceScheduleDraft {
    pub vehicle_id: Uuid,
    pub service_type: ServiceType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mileage_interval: Option<f64>,
    #[serde(default)]
    pub months_interval: Option<u32>,
    #[serde(default)]
    pub last_service_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_service_mileage: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceScheduleDto {
    pub maintenance_schedule_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_type: ServiceType,
    pub description: Option<String>,
    pub mileage_interval: Option<f64>,
    pub months_interval: Option<u32>,
    pub last_service_date: Option<NaiveDate>,
    pub last_service_mileage: Option<f64>,
    pub next_due_mileage: Option<f64>,
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl From<MaintenanceSchedule> for MaintenanceScheduleDto {
    fn from(s: MaintenanceSchedule) -> Self {
        Self {
            maintenance_schedule_id: s.meta.id,
            next_due_mileage: s.next_due_mileage(),
            next_due_date: s.next_due_date(),
            vehicle_id: s.vehicle_id,
            service_type: s.service_type,
            description: s.description,
            mileage_interval: s.mileage_interval,
            months_interval: s.months_interval,
            last_service_date: s.last_service_date,
            last_service_mileage: s.last_service_mileage,
            notes: s.notes,
            is_active: s.is_active,
        }
    }
}

impl Entity for MaintenanceSchedule {
    const KIND: &'static str = "maintenance_schedule";
    const COLLECTION: &'static str = "maintenance-schedules";
    const PARENT: Option<ParentRef> = Some(VEHICLE_PARENT);

    type Draft = MaintenanceScheduleDraft;
    type Dto = MaintenanceScheduleDto;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.vehicle_id)
    }

    fn from_draft(draft: MaintenanceScheduleDraft, meta: RecordMeta) -> Result<Self> {
        ensure(
            draft.mileage_interval.is_some() || draft.months_interval.is_some(),
            "a mileage or months interval is required",
        )?;
        ensure(
            draft.mileage_interval.map_or(true, |m| m > 0.0),
            "mileage interval must be positive",
        )?;
        ensure(
            draft.months_interval.map_or(true, |m| m > 0),
            "months interval must be positive",
        )?;
        Ok(Self {
            meta,
            vehicle_id: draft.vehicle_id,
            service_type: draft.service_type,
            description: draft.description,
            mileage_interval: draft.mileage_interval,
            months_interval: draft.months_interval,
            last_service_date: draft.last_service_date,
            last_service_mileage: draft.last_service_mileage,
            notes: draft.notes,
            is_active: draft.is_active,
        })
    }
}
