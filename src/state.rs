use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::addresses::AddressBook;
use crate::auth_gate::AuthGate;
use crate::cart::CartHook;
use crate::catalog::Catalog;
use crate::checkout::CheckoutForm;
use crate::config::Config;
use crate::notify::Notifier;
use crate::query::QueryClient;
use crate::services::{FoodApi, PaymentRedirect};
use crate::session::SessionStore;
use crate::storage::Storage;

/// Everything a page needs, injected into handlers through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn FoodApi>,
    pub queries: QueryClient,
    pub session: SessionStore,
    pub notifier: Notifier,
    pub gate: AuthGate,
    pub checkout: Arc<Mutex<CheckoutForm>>,
    pub payment: PaymentRedirect,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(api: Arc<dyn FoodApi>, storage: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            api,
            queries: QueryClient::new(),
            session: SessionStore::new(storage),
            notifier: Notifier::new(),
            gate: AuthGate::new(),
            checkout: Arc::new(Mutex::new(CheckoutForm::default())),
            payment: PaymentRedirect::new(&config.payment_redirect_url),
            config: Arc::new(config),
        }
    }

    pub fn cart(&self) -> CartHook {
        CartHook::new(
            self.api.clone(),
            self.queries.clone(),
            self.notifier.clone(),
            self.session.clone(),
            self.config.cart_stale,
        )
    }

    pub fn addresses(&self) -> AddressBook {
        AddressBook::new(
            self.api.clone(),
            self.queries.clone(),
            self.notifier.clone(),
            self.session.clone(),
            self.config.address_stale,
        )
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.api.clone(), self.queries.clone(), self.config.catalog_stale)
    }

    pub fn checkout_form(&self) -> MutexGuard<'_, CheckoutForm> {
        self.checkout.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
