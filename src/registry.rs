//! Process-wide mapping from key type URL to key manager
//!
//! The map is copy-on-write. Writers are serialised by a mutex, build a new
//! map, and publish it by swapping an `Arc`; readers clone the current
//! snapshot and never block on a writer doing validation work.

use crate::error::{Error, Result};
use crate::key::{
    KeyData, KeyManager, KeyManagerImpl, KeyTemplate, KeyTypeManager, Primitive, PrimitiveKind,
};
use crate::metrics::REGISTRY_REGISTER;
use crate::Aead;
use log::{debug, warn};
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

#[derive(Clone)]
struct Entry {
    manager: Arc<dyn KeyManager>,
    new_key_allowed: bool,
}

type Snapshot = Arc<HashMap<String, Entry>>;

/// Registry of key managers keyed by type URL
///
/// Entries are never removed. See [`Registry::register_key_manager`] for the
/// rules governing re-registration.
#[derive(Default)]
pub struct Registry {
    write_lock: Mutex<()>,
    entries: RwLock<Snapshot>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("key_types", &self.key_types())
            .finish()
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    fn snapshot(&self) -> Snapshot {
        // A poisoned lock still guards a complete snapshot
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn entry(&self, type_url: &str) -> Result<Entry> {
        self.snapshot()
            .get(type_url)
            .cloned()
            .ok_or_else(|| Error::UnknownKeyType(type_url.to_string()))
    }

    /// Registers a manager that may create new keys
    ///
    /// Fails with [`Error::AlreadyRegisteredIncompatible`] if a manager of a
    /// different concrete type, material kind or primitive set, or of a lower
    /// version, is already registered for the type URL. Fails with
    /// [`Error::AlreadyRegisteredNoOverwrite`] if an equivalent manager is
    /// registered and `allow_overwrite` is false.
    pub fn register_key_manager(
        &self,
        manager: Arc<dyn KeyManager>,
        allow_overwrite: bool,
    ) -> Result<()> {
        self.register_key_manager_with(manager, allow_overwrite, true)
    }

    /// Registers a manager and records whether it may create new keys
    ///
    /// A type registered with `new_key_allowed == false` can never be
    /// re-registered with new keys allowed.
    pub fn register_key_manager_with(
        &self,
        manager: Arc<dyn KeyManager>,
        allow_overwrite: bool,
        new_key_allowed: bool,
    ) -> Result<()> {
        let type_url = manager.key_type().to_string();

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.snapshot();
        if let Some(existing) = current.get(&type_url) {
            check_compatible(existing, manager.as_ref(), new_key_allowed)?;
            if !allow_overwrite {
                debug!("key manager for {} already registered", type_url);
                return Err(Error::AlreadyRegisteredNoOverwrite(type_url));
            }
        }

        let mut next = HashMap::clone(&current);
        next.insert(
            type_url.clone(),
            Entry {
                manager,
                new_key_allowed,
            },
        );

        *self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        counter!(REGISTRY_REGISTER, 1);
        debug!("registered key manager for {}", type_url);
        Ok(())
    }

    /// Wraps a typed manager and registers it
    pub fn register_key_type_manager<M: KeyTypeManager>(
        &self,
        manager: M,
        allow_overwrite: bool,
    ) -> Result<()> {
        self.register_key_manager(Arc::new(KeyManagerImpl::new(manager)), allow_overwrite)
    }

    /// Returns the manager registered for `type_url`
    pub fn get_key_manager(&self, type_url: &str) -> Result<Arc<dyn KeyManager>> {
        self.entry(type_url).map(|e| e.manager)
    }

    /// Returns true if a manager is registered for `type_url`
    pub fn is_registered(&self, type_url: &str) -> bool {
        self.snapshot().contains_key(type_url)
    }

    /// Returns the registered type URLs, sorted
    pub fn key_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.snapshot().keys().cloned().collect();
        types.sort();
        types
    }

    /// Builds a primitive from key data
    pub fn get_primitive(&self, key_data: &KeyData, kind: PrimitiveKind) -> Result<Primitive> {
        let manager = self.get_key_manager(&key_data.type_url)?;
        if key_data.key_material_kind != manager.key_material_kind() {
            return Err(Error::UnsupportedKeyParameters(format!(
                "key material kind {:?} does not match {:?} for {}",
                key_data.key_material_kind,
                manager.key_material_kind(),
                key_data.type_url
            )));
        }
        manager.primitive(&key_data.value, kind)
    }

    /// Builds an [`Aead`] from key data
    pub fn get_aead(&self, key_data: &KeyData) -> Result<Arc<dyn Aead>> {
        self.get_primitive(key_data, PrimitiveKind::Aead)?.into_aead()
    }

    /// Creates new key data from a template
    pub fn new_key_data(&self, template: &KeyTemplate) -> Result<KeyData> {
        let entry = self.entry(&template.type_url)?;
        if !entry.new_key_allowed {
            return Err(Error::NewKeyNotAllowed(template.type_url.clone()));
        }
        entry.manager.new_key_data(&template.value)
    }
}

fn check_compatible(
    existing: &Entry,
    candidate: &dyn KeyManager,
    new_key_allowed: bool,
) -> Result<()> {
    let current = existing.manager.as_ref();
    let type_url = candidate.key_type();

    let reason = if current.as_any().type_id() != candidate.as_any().type_id() {
        Some("different manager type")
    } else if current.key_material_kind() != candidate.key_material_kind() {
        Some("different key material kind")
    } else if current.supported_primitives() != candidate.supported_primitives() {
        Some("different primitive set")
    } else if candidate.version() < current.version() {
        Some("lower version")
    } else if new_key_allowed && !existing.new_key_allowed {
        Some("new key creation was disabled")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            warn!("rejected key manager for {}: {}", type_url, reason);
            Err(Error::AlreadyRegisteredIncompatible(format!(
                "{}: {}",
                type_url, reason
            )))
        }
        None => Ok(()),
    }
}
