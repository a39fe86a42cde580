//! Application state wiring

use std::sync::Arc;

use crate::email::Notifier;
use crate::identity::IdentityService;
use crate::store::CredentialStore;
use crate::token::AccessTokenSigner;

/// Shared application state
pub struct AppState<S, N, G> {
    pub identity: IdentityService<S, N, G>,
    /// Controls the Secure attribute on the refresh cookie
    pub production: bool,
}

impl<S, N, G> AppState<S, N, G>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    pub fn new(store: Arc<S>, notifier: N, signer: G, production: bool) -> Self {
        Self {
            identity: IdentityService::new(store, notifier, signer),
            production,
        }
    }
}
