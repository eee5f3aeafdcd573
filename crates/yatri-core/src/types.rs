use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// An authenticated actor in the Yatri platform: a tourist (record owner),
/// a verifier, an admin, or an emergency responder. The upstream gateway
/// authenticates principals; the registry only trusts the resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create a principal, rejecting empty or whitespace-only names.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::InvalidPrincipal(
                "principal name must not be empty".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the principal name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Principal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier of an identity record. Assigned by the registry,
/// monotonically increasing from 1, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RegistryId(pub u64);

impl RegistryId {
    /// Get the numeric id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegistryId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| CoreError::ValidationError(format!("invalid registry id: {}", s)))
    }
}

/// Identifier of an onboarded verifier (UUID v7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifierId(pub Uuid);

impl VerifierId {
    /// Generate a fresh verifier id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for VerifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VerifierId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CoreError::ValidationError(format!("invalid verifier id: {}", s)))
    }
}

/// BLAKE3 content hash (32 bytes). Serialized as lowercase hex.
///
/// All personally identifying material enters the registry pre-hashed:
/// documents, itineraries, contact details. The raw values never cross
/// the registry boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash arbitrary data using BLAKE3.
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap an existing 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| CoreError::InvalidHash(format!("invalid hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            CoreError::InvalidHash(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash of an external identifier (passport number, national id number).
/// Distinct from [`ContentHash`] because it keys a uniqueness index:
/// at most one identity record may exist per external id hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalIdHash(pub ContentHash);

impl ExternalIdHash {
    /// Hash an external identifier using BLAKE3.
    pub fn digest(external_id: &[u8]) -> Self {
        Self(ContentHash::digest(external_id))
    }
}

impl fmt::Display for ExternalIdHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalIdHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Privileged roles recognized by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May register identities, change record status, onboard verifiers,
    /// manage role grants, and pause/resume the registry.
    Admin,
    /// May verify identities, singly or in bulk.
    Verifier,
    /// May access any record with a mandatory audited justification.
    EmergencyResponder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::Verifier => write!(f, "Verifier"),
            Self::EmergencyResponder => write!(f, "EmergencyResponder"),
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" | "admin" => Ok(Self::Admin),
            "Verifier" | "verifier" => Ok(Self::Verifier),
            "EmergencyResponder" | "emergency-responder" => Ok(Self::EmergencyResponder),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Kinds of identity documents accepted at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// International passport.
    Passport,
    /// National identity card.
    NationalId,
    /// Driver's license.
    DriversLicense,
    /// Other document type, named.
    Other(String),
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passport => write!(f, "Passport"),
            Self::NationalId => write!(f, "NationalId"),
            Self::DriversLicense => write!(f, "DriversLicense"),
            Self::Other(name) => write!(f, "Other({})", name),
        }
    }
}
