//! Tenant authentication and request throttling

pub mod rate_limit;
pub mod tenant_auth;

pub use tenant_auth::TenantIdentity;
