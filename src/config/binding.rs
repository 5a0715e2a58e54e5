//! Model/auth bindings and the active-binding registry

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{AuthMethod, ProviderKind};
use crate::error::{AdapterError, Result};

/// Association of a model identifier and auth method with a concrete adapter
/// variant.
///
/// Bindings are created or updated only at configuration time (model switch,
/// auth change). Every request dispatch reads one; no request owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterBinding {
    /// Active model identifier
    pub model: String,

    /// Selected auth method, which also determines the adapter variant
    pub auth: AuthMethod,

    /// Explicit credential; when absent the auth method's environment
    /// variable is consulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl AdapterBinding {
    /// Binding with no explicit credential
    #[must_use]
    pub fn new(model: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            model: model.into(),
            auth,
            credential: None,
        }
    }

    /// Attach an explicit credential
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Provider family behind this binding
    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.auth.provider()
    }

    /// Resolve the credential, preferring the explicit value over the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when neither source yields a
    /// non-empty value. Adapters call this at construction, before any
    /// network traffic.
    pub fn resolve_credential(&self) -> Result<String> {
        if let Some(credential) = &self.credential {
            if !credential.is_empty() {
                return Ok(credential.clone());
            }
        }

        let env_var = self.auth.credential_env_var();
        std::env::var(env_var)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AdapterError::Configuration(format!(
                    "no credential for {}: set {env_var} or configure an API key",
                    self.provider().name()
                ))
            })
    }
}

/// Active-binding table shared across conversations.
///
/// The only shared mutable state in the crate. A request snapshots the
/// binding with [`BindingRegistry::capture`] at dispatch time; updates land
/// only at configuration-change points and are never observed by an
/// already-dispatched request.
pub struct BindingRegistry {
    active: RwLock<Arc<AdapterBinding>>,
}

impl BindingRegistry {
    #[must_use]
    pub fn new(initial: AdapterBinding) -> Self {
        Self {
            active: RwLock::new(Arc::new(initial)),
        }
    }

    /// Atomic snapshot of the active binding for one request
    #[must_use]
    pub fn capture(&self) -> Arc<AdapterBinding> {
        self.active.read().clone()
    }

    /// Replace the active binding (configuration-change point)
    pub fn set_active(&self, binding: AdapterBinding) {
        *self.active.write() = Arc::new(binding);
    }

    /// Switch the auth method, re-pointing the model at the new family's
    /// default when the current model belongs to another family. Credentials
    /// do not carry across families.
    pub fn switch_auth(&self, auth: AuthMethod) {
        let mut active = self.active.write();
        let current = active.as_ref();
        let family = auth.provider();

        let model = if family.owns_model(&current.model) {
            current.model.clone()
        } else {
            tracing::info!(model = family.default_model(), "switching active model for new auth method");
            family.default_model().to_string()
        };
        let credential = if family == current.auth.provider() {
            current.credential.clone()
        } else {
            None
        };

        *active = Arc::new(AdapterBinding {
            model,
            auth,
            credential,
        });
    }
}
