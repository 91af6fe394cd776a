use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length in bytes of the canonical encoded form of every platform ID.
pub const ID_ENCODED_LEN: usize = 16;

/// Reasons an identifier fails to encode or decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The zero value is reserved for "unset" and never encodes.
    #[error("invalid ID: zero is not a valid identifier")]
    Zero,

    /// Encoded form has the wrong length.
    #[error("invalid ID: expected {ID_ENCODED_LEN} characters, got {0}")]
    Length(usize),

    /// Encoded form contains a non-hex character.
    #[error("invalid ID: `{0}` is not lowercase hexadecimal")]
    Hex(String),
}

/// Capabilities shared by every record identifier.
pub trait RecordId:
    Copy
    + fmt::Debug
    + fmt::Display
    + Eq
    + std::hash::Hash
    + Send
    + Sync
    + 'static
    + From<PlatformId>
    + Into<PlatformId>
{
    /// Returns `true` when the identifier can be encoded.
    fn is_valid(&self) -> bool;

    /// Canonical byte key used in the store.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Zero`] for the unset identifier.
    fn encode(&self) -> Result<[u8; ID_ENCODED_LEN], IdError>;

    /// Parses a canonical byte key.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] when the bytes are not a valid encoded identifier.
    fn decode(bytes: &[u8]) -> Result<Self, IdError>;
}

fn encode_u64(value: u64) -> Result<[u8; ID_ENCODED_LEN], IdError> {
    if value == 0 {
        return Err(IdError::Zero);
    }
    let mut out = [0u8; ID_ENCODED_LEN];
    out.copy_from_slice(format!("{value:016x}").as_bytes());
    Ok(out)
}

fn decode_u64(bytes: &[u8]) -> Result<u64, IdError> {
    if bytes.len() != ID_ENCODED_LEN {
        return Err(IdError::Length(bytes.len()));
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
    {
        return Err(IdError::Hex(String::from_utf8_lossy(bytes).into_owned()));
    }
    // Only [0-9a-f] remain, so the input is valid UTF-8 and valid hex.
    let text = std::str::from_utf8(bytes).map_err(|_| IdError::Hex(String::new()))?;
    let value =
        u64::from_str_radix(text, 16).map_err(|_| IdError::Hex(text.to_string()))?;
    if value == 0 {
        return Err(IdError::Zero);
    }
    Ok(value)
}

macro_rules! define_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Generates a new random, valid identifier.
            #[must_use]
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                loop {
                    let value: u64 = rand::random();
                    if value != 0 {
                        return Self(value);
                    }
                }
            }

            /// Wraps a raw integer value.
            #[must_use]
            pub const fn from_u64(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw integer value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl RecordId for $name {
            fn is_valid(&self) -> bool {
                self.0 != 0
            }

            fn encode(&self) -> Result<[u8; ID_ENCODED_LEN], IdError> {
                encode_u64(self.0)
            }

            fn decode(bytes: &[u8]) -> Result<Self, IdError> {
                decode_u64(bytes).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as RecordId>::decode(s.as_bytes())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

macro_rules! impl_platform_conversions {
    ($($name:ident),+ $(,)?) => {
        $(
            impl From<$name> for PlatformId {
                fn from(value: $name) -> Self {
                    PlatformId(value.0)
                }
            }

            impl From<PlatformId> for $name {
                fn from(value: PlatformId) -> Self {
                    Self(value.0)
                }
            }
        )+
    };
}

define_id!(
    PlatformId,
    "Untyped platform identifier, used where a resource of any kind is referenced."
);
define_id!(OrgId, "Unique identifier for an organization.");
define_id!(UserId, "Unique identifier for a user.");
define_id!(BucketId, "Unique identifier for a bucket in the newer data model.");
define_id!(MappingId, "Unique identifier for a DBRP mapping.");
define_id!(AuthorizationId, "Unique identifier for an API-token authorization.");

impl_platform_conversions!(OrgId, UserId, BucketId, MappingId, AuthorizationId);
