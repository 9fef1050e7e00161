//! REST handlers. Every entity gets the generic CRUD routes from
//! [`resource`]; each domain module adds its own action endpoints.

pub mod financial_goals;
pub mod health_screening;
pub mod mortgage;
pub mod resource;
pub mod tenant;
pub mod time_audit;
pub mod vehicle_maintenance;

pub use tenant::{Tenant, TENANT_HEADER};
