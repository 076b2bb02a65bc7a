//! Database access layer

pub mod accounting;
pub mod pg_store;
pub mod subscriptions;
pub mod team_members;
pub mod tenants;
pub mod webhook_events;
pub mod work_orders;

pub use pg_store::PgSubscriptionStore;
