//! Billing events that change a tenant's plan
//!
//! Stripe webhook payloads are parsed into [`BillingEvent`] and applied to the
//! subscription store. A canceled subscription only deactivates the record;
//! the next gated action provisions a fresh free-tier record.

use serde_json::Value;
use shared::plan::PlanTier;
use shared::subscription::{SubscriptionRecord, SubscriptionStatus};

use crate::store::{StoreError, SubscriptionStore, SubscriptionUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// `checkout.session.completed`
    CheckoutCompleted {
        tenant_id: Option<String>,
        customer_id: Option<String>,
        tier: PlanTier,
    },
    /// `customer.subscription.updated`
    SubscriptionUpdated {
        tenant_id: Option<String>,
        customer_id: Option<String>,
        tier: Option<PlanTier>,
        status: String,
    },
    /// `customer.subscription.deleted`
    SubscriptionDeleted {
        tenant_id: Option<String>,
        customer_id: Option<String>,
    },
    /// Any other event type
    Ignored(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event has no data.object")]
    MissingObject,
    #[error("event is missing {0}")]
    MissingField(&'static str),
    #[error("unknown tier '{0}'")]
    UnknownTier(String),
}

/// Outcome of applying an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    TierChanged { tenant_id: String, tier: PlanTier },
    Deactivated { tenant_id: String },
    /// No tenant could be matched to the event
    Unresolved,
    Ignored,
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

fn metadata(obj: &Value, key: &str) -> Option<String> {
    obj.get("metadata").and_then(|m| str_field(m, key))
}

fn parse_tier(raw: Option<String>) -> Result<Option<PlanTier>, EventError> {
    raw.map(|t| PlanTier::from_db(&t).ok_or(EventError::UnknownTier(t)))
        .transpose()
}

impl BillingEvent {
    pub fn parse(event: &Value) -> Result<Self, EventError> {
        let event_type = event
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingField("type"))?;

        let handled = matches!(
            event_type,
            "checkout.session.completed"
                | "customer.subscription.updated"
                | "customer.subscription.deleted"
        );
        if !handled {
            return Ok(BillingEvent::Ignored(event_type.to_string()));
        }

        let obj = event
            .get("data")
            .and_then(|d| d.get("object"))
            .ok_or(EventError::MissingObject)?;
        let tenant_id = metadata(obj, "tenant_id");
        let customer_id = str_field(obj, "customer");

        Ok(match event_type {
            "checkout.session.completed" => BillingEvent::CheckoutCompleted {
                tenant_id,
                customer_id,
                tier: parse_tier(metadata(obj, "tier"))?
                    .ok_or(EventError::MissingField("metadata.tier"))?,
            },
            "customer.subscription.updated" => BillingEvent::SubscriptionUpdated {
                tenant_id,
                customer_id,
                tier: parse_tier(metadata(obj, "tier"))?,
                status: str_field(obj, "status").ok_or(EventError::MissingField("status"))?,
            },
            _ => BillingEvent::SubscriptionDeleted {
                tenant_id,
                customer_id,
            },
        })
    }

    pub async fn apply(
        &self,
        store: &dyn SubscriptionStore,
        now: i64,
    ) -> Result<Applied, StoreError> {
        match self {
            BillingEvent::CheckoutCompleted {
                tenant_id,
                customer_id,
                tier,
            } => {
                let Some(tenant_id) =
                    resolve_tenant(store, tenant_id.as_deref(), customer_id.as_deref()).await?
                else {
                    return Ok(Applied::Unresolved);
                };
                set_tier(store, &tenant_id, *tier, customer_id.as_deref(), now).await?;
                Ok(Applied::TierChanged { tenant_id, tier: *tier })
            }
            BillingEvent::SubscriptionUpdated {
                tenant_id,
                customer_id,
                tier,
                status,
            } => {
                let Some(tenant_id) =
                    resolve_tenant(store, tenant_id.as_deref(), customer_id.as_deref()).await?
                else {
                    return Ok(Applied::Unresolved);
                };
                if !matches!(status.as_str(), "active" | "trialing") {
                    store
                        .update_active(&tenant_id, &SubscriptionUpdate::deactivate(), now)
                        .await?;
                    return Ok(Applied::Deactivated { tenant_id });
                }
                let Some(tier) = tier else {
                    tracing::warn!(tenant_id = %tenant_id, "Subscription update without tier metadata");
                    return Ok(Applied::Ignored);
                };
                set_tier(store, &tenant_id, *tier, customer_id.as_deref(), now).await?;
                Ok(Applied::TierChanged { tenant_id, tier: *tier })
            }
            BillingEvent::SubscriptionDeleted {
                tenant_id,
                customer_id,
            } => {
                let Some(tenant_id) =
                    resolve_tenant(store, tenant_id.as_deref(), customer_id.as_deref()).await?
                else {
                    return Ok(Applied::Unresolved);
                };
                store
                    .update_active(&tenant_id, &SubscriptionUpdate::deactivate(), now)
                    .await?;
                Ok(Applied::Deactivated { tenant_id })
            }
            BillingEvent::Ignored(_) => Ok(Applied::Ignored),
        }
    }
}

/// Metadata tenant id first, then the tenant owning the customer reference.
/// A metadata id naming no tenant is not trusted.
async fn resolve_tenant(
    store: &dyn SubscriptionStore,
    tenant_id: Option<&str>,
    customer_id: Option<&str>,
) -> Result<Option<String>, StoreError> {
    if let Some(id) = tenant_id {
        if store.tenant_exists(id).await? {
            return Ok(Some(id.to_string()));
        }
        tracing::warn!(tenant_id = %id, "Billing event names an unknown tenant");
    }
    match customer_id {
        Some(cid) => store.find_tenant_by_customer(cid).await,
        None => Ok(None),
    }
}

/// Move the active record to `tier`, creating one if the tenant has none
async fn set_tier(
    store: &dyn SubscriptionStore,
    tenant_id: &str,
    tier: PlanTier,
    customer_id: Option<&str>,
    now: i64,
) -> Result<(), StoreError> {
    let mut update = SubscriptionUpdate::tier(tier);
    if let Some(cid) = customer_id {
        update = update.with_customer(cid);
    }
    if store.update_active(tenant_id, &update, now).await? {
        return Ok(());
    }

    let mut record = SubscriptionRecord::free(tenant_id, now);
    record.tier = tier;
    record.status = SubscriptionStatus::Active;
    record.billing_customer_id = customer_id.map(String::from);
    store.insert(&record).await
}
