use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{AddressItem, AuthUserItem};
use crate::storage::Storage;

pub const AUTH_USER_KEY: &str = "authUser";
pub const ADDRESS_KEY: &str = "address";

/// Client-side state mirrored to local storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    pub auth_user: Option<AuthUserItem>,
    pub address: Vec<AddressItem>,
}

impl ClientState {
    pub fn set_user(&mut self, user: AuthUserItem) {
        self.auth_user = Some(user);
    }

    pub fn clear_user(&mut self) {
        self.auth_user = None;
    }

    /// Inserts or replaces by id; the list behaves as a set keyed by id.
    pub fn upsert_address(&mut self, address: AddressItem) {
        match self.address.iter_mut().find(|a| a.id == address.id) {
            Some(existing) => *existing = address,
            None => self.address.push(address),
        }
    }

    pub fn remove_address(&mut self, id: &str) -> bool {
        let before = self.address.len();
        self.address.retain(|a| a.id != id);
        before != self.address.len()
    }

    pub fn replace_addresses(&mut self, addresses: Vec<AddressItem>) {
        self.address.clear();
        for address in addresses {
            self.upsert_address(address);
        }
    }
}

enum Slice {
    AuthUser,
    Address,
}

/// Shared handle over [`ClientState`] that writes every change through to storage.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<Mutex<ClientState>>,
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClientState::default())),
            storage,
        }
    }

    /// Loads persisted entries. Unreadable entries are dropped.
    pub async fn rehydrate(&self) -> ApiResult<()> {
        let user = match self.storage.get(AUTH_USER_KEY).await? {
            Some(raw) => match serde_json::from_str::<AuthUserItem>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Discarding unreadable {AUTH_USER_KEY} entry: {e}");
                    self.storage.remove(AUTH_USER_KEY).await?;
                    None
                }
            },
            None => None,
        };

        let addresses = match self.storage.get(ADDRESS_KEY).await? {
            Some(raw) => match serde_json::from_str::<Vec<AddressItem>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("Discarding unreadable {ADDRESS_KEY} entry: {e}");
                    self.storage.remove(ADDRESS_KEY).await?;
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut state = self.lock()?;
        state.auth_user = user;
        state.replace_addresses(addresses);
        debug!(
            authenticated = state.auth_user.is_some(),
            addresses = state.address.len(),
            "client state rehydrated"
        );
        Ok(())
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ApiResult<ClientState> {
        Ok(self.lock()?.clone())
    }

    pub fn user(&self) -> Option<AuthUserItem> {
        self.lock().ok().and_then(|s| s.auth_user.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.user().map(|u| u.id)
    }

    pub fn addresses(&self) -> Vec<AddressItem> {
        self.lock().map(|s| s.address.clone()).unwrap_or_default()
    }

    pub async fn set_user(&self, user: AuthUserItem) -> ApiResult<()> {
        self.update(Slice::AuthUser, |s| s.set_user(user)).await
    }

    pub async fn clear_user(&self) -> ApiResult<()> {
        self.update(Slice::AuthUser, ClientState::clear_user).await
    }

    pub async fn upsert_address(&self, address: AddressItem) -> ApiResult<()> {
        self.update(Slice::Address, |s| s.upsert_address(address)).await
    }

    pub async fn remove_address(&self, id: &str) -> ApiResult<()> {
        self.update(Slice::Address, |s| {
            s.remove_address(id);
        })
        .await
    }

    pub async fn replace_addresses(&self, addresses: Vec<AddressItem>) -> ApiResult<()> {
        self.update(Slice::Address, |s| s.replace_addresses(addresses)).await
    }

    /// Logout: identity and addresses both go.
    pub async fn clear(&self) -> ApiResult<()> {
        self.update(Slice::AuthUser, ClientState::clear_user).await?;
        self.update(Slice::Address, |s| s.address.clear()).await
    }

    async fn update<F>(&self, slice: Slice, mutate: F) -> ApiResult<()>
    where
        F: FnOnce(&mut ClientState),
    {
        // serialize under the lock, write after releasing it
        let serialized = {
            let mut state = self.lock()?;
            mutate(&mut state);
            match slice {
                Slice::AuthUser => state
                    .auth_user
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                Slice::Address => Some(serde_json::to_string(&state.address)?),
            }
        };

        let key = match slice {
            Slice::AuthUser => AUTH_USER_KEY,
            Slice::Address => ADDRESS_KEY,
        };
        match serialized {
            Some(value) if !(matches!(slice, Slice::Address) && value == "[]") => {
                self.storage.set(key, &value).await
            }
            _ => self.storage.remove(key).await,
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, ClientState>> {
        self.state
            .lock()
            .map_err(|_| ApiError::Storage("client state lock poisoned".to_string()))
    }
}
