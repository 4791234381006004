use thiserror::Error;

/// Result type for cryptoagility operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used to route logging and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Operator or programmer error, detectable before any secret is touched
    Configuration,

    /// Corrupted, stale, or tampered data; possibly an attack
    Integrity,

    /// Failure of an external collaborator or the underlying engine
    Operational,
}

/// Errors that can occur in the cryptoagility library
///
/// Messages never carry key bytes, plaintext, or unwrapped DEKs.
#[derive(Error, Debug)]
pub enum Error {
    /// A manager with different parameters is already registered for the type
    #[error("key type already registered with incompatible manager: {0}")]
    AlreadyRegisteredIncompatible(String),

    /// An equivalent manager is registered and overwrite was not allowed
    #[error("key type already registered and overwrite not allowed: {0}")]
    AlreadyRegisteredNoOverwrite(String),

    /// No manager is registered for the type URL
    #[error("unknown key type: {0}")]
    UnknownKeyType(String),

    /// Key version is newer than the manager supports
    #[error("invalid key version {version}: manager supports up to {max}")]
    InvalidKeyVersion {
        /// Version stamped on the key
        version: u32,
        /// Highest version the manager accepts
        max: u32,
    },

    /// Type-specific key constraints are violated
    #[error("unsupported key parameters: {0}")]
    UnsupportedKeyParameters(String),

    /// Serialized key could not be decoded
    #[error("malformed key encoding: {0}")]
    MalformedKeyEncoding(String),

    /// Key format is missing fields or names an unsupported type
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// No KMS client supports the URI
    #[error("unsupported key URI: {0}")]
    UnsupportedUri(String),

    /// Envelope ciphertext framing is invalid
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The remote KEK could not unwrap the DEK, or the unwrapped DEK is unusable
    #[error("failed to unwrap data encryption key")]
    EnvelopeDekUnwrapFailed(#[source] Box<Error>),

    /// Authentication tag verification failed
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Ciphertext shorter than nonce plus tag
    #[error("input too short: {len} bytes, need at least {min}")]
    InputTooShort {
        /// Length of the rejected input
        len: usize,
        /// Minimum acceptable length
        min: usize,
    },

    /// The underlying engine failed to encrypt
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// DEK template names a type that is not a supported AEAD
    #[error("unsupported DEK key type: {0}")]
    UnsupportedDekType(String),

    /// Invalid argument error
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The manager cannot produce the requested primitive
    #[error("unsupported primitive: {0}")]
    UnsupportedPrimitive(String),

    /// The key type was registered with new key creation disabled
    #[error("new keys are not allowed for key type: {0}")]
    NewKeyNotAllowed(String),

    /// Errors reported by a key management service client
    #[error("KMS error: {0}")]
    Kms(String),

    /// Errors related to JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::AlreadyRegisteredIncompatible(_)
            | Error::AlreadyRegisteredNoOverwrite(_)
            | Error::UnknownKeyType(_)
            | Error::InvalidKeyFormat(_)
            | Error::UnsupportedUri(_)
            | Error::UnsupportedDekType(_)
            | Error::InvalidArgument(_)
            | Error::UnsupportedPrimitive(_)
            | Error::NewKeyNotAllowed(_) => ErrorCategory::Configuration,
            Error::InvalidKeyVersion { .. }
            | Error::UnsupportedKeyParameters(_)
            | Error::MalformedKeyEncoding(_)
            | Error::MalformedEnvelope(_)
            | Error::EnvelopeDekUnwrapFailed(_)
            | Error::AuthenticationFailed
            | Error::InputTooShort { .. } => ErrorCategory::Integrity,
            Error::EncryptionFailed(_) | Error::Kms(_) | Error::Json(_) => {
                ErrorCategory::Operational
            }
        }
    }

    /// Returns true for operator or programmer errors
    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Returns true for failures that may indicate tampering or corruption
    pub fn is_integrity_failure(&self) -> bool {
        self.category() == ErrorCategory::Integrity
    }
}
