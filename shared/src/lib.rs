//! Shared types for Workdesk
//!
//! Domain types used by the cloud service and its clients: the plan
//! registry, subscription records, the unified error system and small
//! utilities.

pub mod error;
pub mod plan;
pub mod subscription;
pub mod util;

pub use plan::{Feature, PlanLimits, PlanTier, Quota, QuotaKind};
pub use subscription::{LimitAction, SubscriptionRecord, SubscriptionStatus};
