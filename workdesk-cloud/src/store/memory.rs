//! In-memory [`SubscriptionStore`] with fault injection, for tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shared::subscription::{LimitAction, SubscriptionRecord, SubscriptionStatus};

use super::{StoreError, SubscriptionStore, SubscriptionUpdate};

#[derive(Default)]
struct Inner {
    records: Vec<SubscriptionRecord>,
    tenants: HashSet<String>,
    usage: HashMap<(String, LimitAction), u64>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_usage(&self, tenant_id: &str, action: LimitAction, count: u64) {
        self.inner
            .lock()
            .unwrap()
            .usage
            .insert((tenant_id.to_string(), action), count);
    }

    pub fn add_tenant(&self, tenant_id: &str) {
        self.inner.lock().unwrap().tenants.insert(tenant_id.to_string());
    }

    /// Insert a record, registering its tenant
    pub fn seed(&self, record: SubscriptionRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.tenants.insert(record.tenant_id.clone());
        inner.records.push(record);
    }

    pub fn records_for(&self, tenant_id: &str) -> Vec<SubscriptionRecord> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected fault".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn find_active(&self, tenant_id: &str) -> Result<Option<SubscriptionRecord>, StoreError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.status == SubscriptionStatus::Active)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn insert(&self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.lock().unwrap().records.push(record.clone());
        Ok(())
    }

    async fn update_active(
        &self,
        tenant_id: &str,
        update: &SubscriptionUpdate,
        now: i64,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(record) = inner
            .records
            .iter_mut()
            .filter(|r| r.tenant_id == tenant_id && r.status == SubscriptionStatus::Active)
            .max_by_key(|r| r.created_at)
        else {
            return Ok(false);
        };
        if let Some(tier) = update.tier {
            record.tier = tier;
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(ref customer) = update.billing_customer_id {
            record.billing_customer_id = Some(customer.clone());
        }
        record.updated_at = now;
        Ok(true)
    }

    async fn tenant_exists(&self, tenant_id: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.inner.lock().unwrap().tenants.contains(tenant_id))
    }

    async fn find_tenant_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, StoreError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .find(|r| r.billing_customer_id.as_deref() == Some(customer_id))
            .map(|r| r.tenant_id.clone()))
    }

    async fn usage_count(
        &self,
        tenant_id: &str,
        action: LimitAction,
        _period_start: i64,
    ) -> Result<u64, StoreError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .usage
            .get(&(tenant_id.to_string(), action))
            .copied()
            .unwrap_or(0))
    }
}
