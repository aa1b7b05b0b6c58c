use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::gateways::{BlobStorage, DocumentStore};
use crate::notify::Notifier;
use fieldnote_atoms::users::Principal;

/// Backend handles shared by every screen
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn BlobStorage>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Notifier,
}

/// Services plus the signed-in user. Passed down explicitly instead of a global.
#[derive(Clone)]
pub struct AppContext {
    pub services: AppServices,
    pub principal: Principal,
}

impl AppContext {
    pub fn new(services: AppServices, principal: Principal) -> Self {
        Self { services, principal }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.services.store
    }

    pub fn storage(&self) -> &Arc<dyn BlobStorage> {
        &self.services.storage
    }

    pub fn notifier(&self) -> &Notifier {
        &self.services.notifier
    }
}
