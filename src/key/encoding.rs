//! Canonical JSON encoding for keys, key formats and templates

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

/// Serializes a value into its canonical compact JSON form
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes a value and rejects anything but its canonical encoding
///
/// The decoded value must re-encode to exactly `bytes`, which rules out
/// truncation, trailing data, whitespace, reordered and duplicated fields.
/// The error text carries only the failure class and position, never input.
pub(crate) fn decode_canonical<T>(bytes: &[u8]) -> std::result::Result<T, String>
where
    T: Serialize + DeserializeOwned,
{
    let value: T = serde_json::from_slice(bytes)
        .map_err(|e| format!("{:?} error at column {}", e.classify(), e.column()))?;

    let reencoded = Zeroizing::new(
        serde_json::to_vec(&value).map_err(|e| format!("{:?} error", e.classify()))?,
    );
    if reencoded.as_slice() != bytes {
        return Err("non-canonical encoding".into());
    }

    Ok(value)
}

/// Serde adapter storing `Vec<u8>` fields as standard base64
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|_| serde::de::Error::custom("invalid base64"))
    }
}

/// Serde adapter for secret bytes; intermediate strings are wiped
pub(crate) mod base64_secret {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};
    use zeroize::Zeroizing;

    pub(crate) fn serialize<S: Serializer>(
        bytes: &Zeroizing<Vec<u8>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded = Zeroizing::new(STANDARD.encode(bytes.as_slice()));
        s.serialize_str(&encoded)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Zeroizing<Vec<u8>>, D::Error> {
        let encoded = Zeroizing::new(String::deserialize(d)?);
        STANDARD
            .decode(encoded.as_bytes())
            .map(Zeroizing::new)
            .map_err(|_| serde::de::Error::custom("invalid base64"))
    }
}
