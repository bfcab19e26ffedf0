use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use ed25519_dalek::VerifyingKey;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Supply unit. All arithmetic on it is checked.
pub type Amount = primitive_types::U256;

/// Allowance value that is never decremented by a delegated spend.
pub const UNLIMITED: Amount = Amount::MAX;

#[derive(Debug, thiserror::Error)]
pub enum ParseIdError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

fn parse_id(s: &str) -> Result<[u8; 32], ParseIdError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| ParseIdError::Length(len))
}

/// Account identifier. The all-zero value is the null principal and is
/// never a valid owner, spender, recipient or grantee.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Principal([u8; 32]);

impl Principal {
    pub const NULL: Principal = Principal([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Principal {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<VerifyingKey> for Principal {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "principal({})", hex::encode(self.0))
    }
}

impl FromStr for Principal {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id(s).map(Self)
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(D::Error::custom)
    }
}

/// Opaque capability tag. Only [`Role::ADMIN`] carries built-in meaning.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role([u8; 32]);

impl Role {
    /// `ROLE_ADMIN`: must always have at least one holder.
    pub const ADMIN: Role = Role([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives a role identifier from a human readable name.
    ///
    /// The result is a SHA-256 digest, so no name maps to [`Role::ADMIN`].
    pub fn named(name: &str) -> Self {
        Self(Sha256::digest(name.as_bytes()).into())
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::ADMIN
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_admin() {
            write!(f, "role(ADMIN)")
        } else {
            write!(f, "role({})", hex::encode(self.0))
        }
    }
}

impl FromStr for Role {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id(s).map(Self)
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(D::Error::custom)
    }
}

/// Serializes an [`Amount`] as a base-10 string.
pub(crate) mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        Amount::from_dec_str(encoded.trim())
            .map_err(|e| D::Error::custom(format!("invalid amount {encoded:?}: {e:?}")))
    }
}
