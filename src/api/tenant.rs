use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracker_core::TenantId;

use crate::error::ApiError;
use crate::server::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Caller's tenant, from the `X-Tenant-Id` header or the configured default.
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantId);

#[axum::async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.headers.get(TENANT_HEADER) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| ApiError::bad_request("X-Tenant-Id header is not valid text"))?;
                Ok(Tenant(raw.parse()?))
            }
            None => state
                .default_tenant
                .map(Tenant)
                .ok_or_else(|| ApiError::bad_request("missing X-Tenant-Id header")),
        }
    }
}
