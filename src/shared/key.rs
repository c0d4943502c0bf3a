//! Keys of the shared propagation context.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A key in a [`SharedData`](super::SharedData) context.
///
/// Keys are strings. Besides explicit names, a key can be derived from a
/// value's type ([`DataKey::of_type`]) or digested from a structured value
/// ([`DataKey::hashed`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataKey(String);

impl DataKey {
    /// Creates a key from an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the key under which values of type `V` are stored by
    /// `SharedData::add_object`.
    #[must_use]
    pub fn of_type<V: ?Sized>() -> Self {
        Self(std::any::type_name::<V>().to_string())
    }

    /// Digests the JSON encoding of `key` into a hex SHA-256 key.
    pub fn hashed<K: Serialize + ?Sized>(key: &K) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(key)?;
        Ok(Self(hex::encode(Sha256::digest(&encoded))))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for DataKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&DataKey> for DataKey {
    fn from(key: &DataKey) -> Self {
        key.clone()
    }
}
