use crate::error::{Error, Result};
use crate::key::encoding::{decode_canonical, encode};
use crate::key::{KeyData, KeyMaterialKind, Primitive, PrimitiveKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use zeroize::Zeroizing;

/// Creates new keys of one type from a key format
pub trait KeyFactory: Send + Sync {
    /// Key produced by this factory
    type Key;

    /// Parameters needed to create a key
    type KeyFormat: Serialize + DeserializeOwned;

    /// Checks a key format independently of any key instance
    fn validate_key_format(&self, format: &Self::KeyFormat) -> Result<()>;

    /// Decodes a serialized key format
    fn parse_key_format(&self, serialized: &[u8]) -> Result<Self::KeyFormat> {
        decode_canonical(serialized).map_err(Error::InvalidKeyFormat)
    }

    /// Creates a new key stamped with the manager's version
    ///
    /// Implementations may use the secure RNG but perform no other I/O.
    fn create_key(&self, format: &Self::KeyFormat) -> Result<Self::Key>;
}

/// Rules for exactly one key type
///
/// Implementations are stateless apart from construction-time configuration
/// and cache nothing across [`primitive`](KeyTypeManager::primitive) calls.
pub trait KeyTypeManager: Send + Sync + 'static {
    /// Typed key handled by this manager
    type Key: Serialize + DeserializeOwned;

    /// Factory creating new keys
    type Factory: KeyFactory<Key = Self::Key>;

    /// Type URL handled by this manager
    fn key_type(&self) -> &str;

    /// Highest key version this manager accepts
    fn version(&self) -> u32;

    /// Material kind of the keys
    fn key_material_kind(&self) -> KeyMaterialKind;

    /// Primitives this manager can build
    fn supported_primitives(&self) -> &[PrimitiveKind];

    /// Checks version and type-specific constraints of a key
    fn validate_key(&self, key: &Self::Key) -> Result<()>;

    /// Decodes a serialized key, rejecting any non-canonical encoding
    fn parse_key(&self, serialized: &[u8]) -> Result<Self::Key> {
        decode_canonical(serialized).map_err(Error::MalformedKeyEncoding)
    }

    /// Returns the factory creating new keys
    fn key_factory(&self) -> &Self::Factory;

    /// Builds a primitive from a validated key
    fn primitive(&self, key: &Self::Key, kind: PrimitiveKind) -> Result<Primitive>;
}

/// Rejects keys newer than the manager
pub fn validate_version(version: u32, max: u32) -> Result<()> {
    if version > max {
        return Err(Error::InvalidKeyVersion { version, max });
    }
    Ok(())
}

/// Rejects key formats asking for a version newer than the manager
pub fn validate_format_version(version: u32, max: u32) -> Result<()> {
    if version > max {
        return Err(Error::InvalidKeyFormat(format!(
            "key format version {} exceeds supported version {}",
            version, max
        )));
    }
    Ok(())
}

/// Byte-level view of a key manager, as stored in the registry
pub trait KeyManager: Send + Sync {
    /// Type URL handled by this manager
    fn key_type(&self) -> &str;

    /// Highest key version this manager accepts
    fn version(&self) -> u32;

    /// Material kind of the keys
    fn key_material_kind(&self) -> KeyMaterialKind;

    /// Primitives this manager can build
    fn supported_primitives(&self) -> &[PrimitiveKind];

    /// Parses, validates and builds a primitive from a serialized key
    fn primitive(&self, serialized_key: &[u8], kind: PrimitiveKind) -> Result<Primitive>;

    /// Creates a serialized key from a serialized key format
    fn new_key(&self, serialized_key_format: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Creates key data from a serialized key format
    fn new_key_data(&self, serialized_key_format: &[u8]) -> Result<KeyData> {
        let value = self.new_key(serialized_key_format)?;
        Ok(KeyData {
            type_url: self.key_type().to_string(),
            value,
            key_material_kind: self.key_material_kind(),
        })
    }

    /// Used to compare concrete manager types on re-registration
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

/// Adapts a [`KeyTypeManager`] to the [`KeyManager`] interface
pub struct KeyManagerImpl<M> {
    inner: M,
}

impl<M: KeyTypeManager> KeyManagerImpl<M> {
    /// Wraps a typed manager
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: KeyTypeManager> KeyManager for KeyManagerImpl<M> {
    fn key_type(&self) -> &str {
        self.inner.key_type()
    }

    fn version(&self) -> u32 {
        self.inner.version()
    }

    fn key_material_kind(&self) -> KeyMaterialKind {
        self.inner.key_material_kind()
    }

    fn supported_primitives(&self) -> &[PrimitiveKind] {
        self.inner.supported_primitives()
    }

    fn primitive(&self, serialized_key: &[u8], kind: PrimitiveKind) -> Result<Primitive> {
        if !self.supported_primitives().contains(&kind) {
            return Err(Error::UnsupportedPrimitive(format!(
                "{:?} not supported by {}",
                kind,
                self.key_type()
            )));
        }

        let key = self.inner.parse_key(serialized_key)?;
        self.inner.validate_key(&key)?;
        self.inner.primitive(&key, kind)
    }

    fn new_key(&self, serialized_key_format: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let factory = self.inner.key_factory();
        let format = factory.parse_key_format(serialized_key_format)?;
        factory.validate_key_format(&format)?;

        let key = factory.create_key(&format)?;
        self.inner.validate_key(&key)?;
        Ok(Zeroizing::new(encode(&key)?))
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

impl<M: KeyTypeManager> std::fmt::Debug for KeyManagerImpl<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManagerImpl")
            .field("key_type", &self.inner.key_type())
            .field("version", &self.inner.version())
            .finish()
    }
}
