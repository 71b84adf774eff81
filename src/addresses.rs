use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::ApiResult;
use crate::models::{AddressForm, AddressItem};
use crate::notify::Notifier;
use crate::query::{QueryClient, QueryKey};
use crate::services::FoodApi;
use crate::session::SessionStore;
use crate::validation;

pub const ADDRESSES: &str = "addresses";

pub fn addresses_key(user_id: &str) -> QueryKey {
    QueryKey::new(ADDRESSES, [user_id])
}

/// The user's saved addresses. The backend list is authoritative; the
/// persisted copy in the session store follows every successful read and
/// mutation.
#[derive(Clone)]
pub struct AddressBook {
    api: Arc<dyn FoodApi>,
    queries: QueryClient,
    notifier: Notifier,
    session: SessionStore,
    stale_time: Duration,
}

impl AddressBook {
    pub fn new(
        api: Arc<dyn FoodApi>,
        queries: QueryClient,
        notifier: Notifier,
        session: SessionStore,
        stale_time: Duration,
    ) -> Self {
        Self {
            api,
            queries,
            notifier,
            session,
            stale_time,
        }
    }

    /// Falls back to the persisted list when there is no identity.
    pub async fn load(&self) -> ApiResult<Vec<AddressItem>> {
        let Some(user_id) = self.session.user_id() else {
            return Ok(self.session.addresses());
        };
        let api = self.api.clone();
        let list = self
            .queries
            .fetch(&addresses_key(&user_id), self.stale_time, move || async move {
                api.addresses().await
            })
            .await?;
        if list != self.session.addresses() {
            if let Err(e) = self.session.replace_addresses(list.clone()).await {
                warn!("Could not persist address list: {}", e);
            }
        }
        Ok(list)
    }

    pub async fn add(&self, form: &AddressForm) -> ApiResult<AddressItem> {
        let result = self.try_add(form).await;
        self.report(&result, "Address added");
        result
    }

    pub async fn update(&self, id: &str, form: &AddressForm) -> ApiResult<AddressItem> {
        let result = self.try_update(id, form).await;
        self.report(&result, "Address updated");
        result
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let result = self.try_delete(id).await;
        self.report(&result, "Address deleted");
        result
    }

    async fn try_add(&self, form: &AddressForm) -> ApiResult<AddressItem> {
        let form = validation::address_form(form)?;
        let created = self.api.add_address(&form).await?;
        self.after_mutation().await;
        self.persist(self.session.upsert_address(created.clone()).await);
        Ok(created)
    }

    async fn try_update(&self, id: &str, form: &AddressForm) -> ApiResult<AddressItem> {
        let form = validation::address_form(form)?;
        let updated = self.api.update_address(id, &form).await?;
        self.after_mutation().await;
        self.persist(self.session.upsert_address(updated.clone()).await);
        Ok(updated)
    }

    async fn try_delete(&self, id: &str) -> ApiResult<()> {
        self.api.delete_address(id).await?;
        self.after_mutation().await;
        self.persist(self.session.remove_address(id).await);
        Ok(())
    }

    async fn after_mutation(&self) {
        if let Some(user_id) = self.session.user_id() {
            self.queries.invalidate(&addresses_key(&user_id));
        }
    }

    fn persist(&self, result: ApiResult<()>) {
        if let Err(e) = result {
            warn!("Could not persist address change: {}", e);
        }
    }

    fn report<T>(&self, result: &ApiResult<T>, success: &str) {
        match result {
            Ok(_) => {
                self.notifier.success(success);
            }
            Err(err) => {
                self.notifier.api_error(err);
            }
        }
    }
}
