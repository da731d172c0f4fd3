use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Size of a plain content reference in bytes
pub const REFERENCE_SIZE: usize = 32;
/// Size of an encrypted content reference (address + decryption key) in bytes
pub const ENCRYPTED_REFERENCE_SIZE: usize = 64;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("invalid reference length: expected {REFERENCE_SIZE} or {ENCRYPTED_REFERENCE_SIZE} bytes, got {0}")]
    InvalidLength(usize),
    #[error("reference hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Opaque address of immutable bytes in the storage network.
///
/// References are either 32 bytes (plain content) or 64 bytes
///  (encrypted content, address followed by the decryption key).
///  Anything else is rejected at construction time, so holding a
///  `Reference` means holding a well-formed one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference(Vec<u8>);

impl Reference {
    /// Hash arbitrary bytes into a plain reference.
    ///  Used by the local content stores for content addressing.
    pub fn from_content(data: &[u8]) -> Self {
        Reference(blake3::hash(data).as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_encrypted(&self) -> bool {
        self.0.len() == ENCRYPTED_REFERENCE_SIZE
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse a reference from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, ReferenceError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex)?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for Reference {
    type Error = ReferenceError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            REFERENCE_SIZE | ENCRYPTED_REFERENCE_SIZE => Ok(Reference(bytes.to_vec())),
            len => Err(ReferenceError::InvalidLength(len)),
        }
    }
}

impl From<[u8; REFERENCE_SIZE]> for Reference {
    fn from(bytes: [u8; REFERENCE_SIZE]) -> Self {
        Reference(bytes.to_vec())
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.to_hex())
    }
}

impl Serialize for Reference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Reference::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
