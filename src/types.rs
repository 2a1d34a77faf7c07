//! Core value types shared by the tree, the commitment scheme and the ledger.
//!
//! Every protocol value is a 32-byte field element. The newtypes below exist so
//! that a nullifier can never be passed where a voting ID is expected.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a field element in bytes.
pub const FIELD_BYTES: usize = 32;

/// A 32-byte big-endian field element.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldElement([u8; FIELD_BYTES]);

impl FieldElement {
    /// The zero element.
    pub const ZERO: FieldElement = FieldElement([0u8; FIELD_BYTES]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; FIELD_BYTES]) -> Self {
        Self(bytes)
    }

    /// Encode a `u64` as a big-endian element.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[FIELD_BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a hex string of at most 64 digits, with or without `0x` prefix.
    ///
    /// Shorter inputs are left-padded, so `0xa` and `0x0a` decode to the same
    /// element.
    pub fn from_hex(input: &str) -> Result<Self, ParseFieldError> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        if digits.is_empty() {
            return Err(ParseFieldError::Empty);
        }
        if digits.len() > FIELD_BYTES * 2 {
            return Err(ParseFieldError::TooLong(digits.len()));
        }

        let padded = format!("{:0>width$}", digits, width = FIELD_BYTES * 2);
        let mut bytes = [0u8; FIELD_BYTES];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| ParseFieldError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl FromStr for FieldElement {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FieldElement::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Errors parsing a hex field element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFieldError {
    #[error("empty field element")]
    Empty,

    #[error("field element has {0} hex digits, at most 64 allowed")]
    TooLong(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

macro_rules! field_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub FieldElement);

        impl $name {
            /// Underlying field element.
            pub fn element(&self) -> FieldElement {
                self.0
            }
        }

        impl From<FieldElement> for $name {
            fn from(element: FieldElement) -> Self {
                Self(element)
            }
        }

        impl From<$name> for FieldElement {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0.to_hex())
            }
        }
    };
}

field_newtype!(
    /// Merkle root snapshot published at poll-open.
    VotingId
);
field_newtype!(
    /// One-time value binding a voter to a single accepted vote.
    Nullifier
);
field_newtype!(
    /// Hiding commitment `hash(vote, r)`.
    VoteCommitment
);

/// A vote: the index of the chosen option.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Vote(pub u64);

impl Vote {
    pub fn as_field(&self) -> FieldElement {
        FieldElement::from_u64(self.0)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field-element encoding of a voter identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Leaf(pub FieldElement);

impl Leaf {
    /// Encode a normalized voter identity.
    ///
    /// `0x`-prefixed hex identities of at most 64 digits are read as numbers;
    /// anything else is encoded as the SHA-256 digest of its UTF-8 bytes.
    pub fn from_identity(identity: &str) -> Self {
        let is_hex_number = identity.starts_with("0x")
            && identity.len() > 2
            && identity.len() <= 2 + FIELD_BYTES * 2
            && identity[2..].chars().all(|c| c.is_ascii_hexdigit());

        if is_hex_number {
            if let Ok(element) = FieldElement::from_hex(identity) {
                return Leaf(element);
            }
        }

        let digest = Sha256::digest(identity.as_bytes());
        let mut bytes = [0u8; FIELD_BYTES];
        bytes.copy_from_slice(&digest);
        Leaf(FieldElement(bytes))
    }

    pub fn element(&self) -> FieldElement {
        self.0
    }
}
