use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// URI prefix shared by every Tessera identifier.
pub const DID_PREFIX: &str = "did:tessera:";

/// Path segment that marks a self-certifying (light) identifier.
const LIGHT_SEGMENT: &str = "light";

/// Multibase-style marker in front of the encoded light DID details.
const DETAILS_MARKER: char = 'z';

/// Length in bytes of every public key handled by Tessera.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// The verification relationship a key is bound to inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyRole {
    Authentication,
    KeyAgreement,
    AssertionMethod,
    CapabilityDelegation,
}

impl KeyRole {
    /// All roles, in canonical document order.
    pub const ALL: [KeyRole; 4] = [
        KeyRole::Authentication,
        KeyRole::KeyAgreement,
        KeyRole::AssertionMethod,
        KeyRole::CapabilityDelegation,
    ];

    /// Whether keys for this role must use an encryption scheme.
    pub fn requires_encryption(&self) -> bool {
        matches!(self, Self::KeyAgreement)
    }

    /// Whether a key of `scheme` may be bound to this role.
    pub fn accepts(&self, scheme: KeyScheme) -> bool {
        if self.requires_encryption() {
            scheme.is_encryption()
        } else {
            scheme.is_signature()
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::KeyAgreement => write!(f, "keyAgreement"),
            Self::AssertionMethod => write!(f, "assertionMethod"),
            Self::CapabilityDelegation => write!(f, "capabilityDelegation"),
        }
    }
}

/// Cryptographic scheme of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// Ed25519 signatures.
    Ed25519,
    /// X25519 Diffie-Hellman key agreement.
    X25519,
}

impl KeyScheme {
    /// Whether keys of this scheme produce signatures.
    pub fn is_signature(&self) -> bool {
        matches!(self, Self::Ed25519)
    }

    /// Whether keys of this scheme are used for encryption.
    pub fn is_encryption(&self) -> bool {
        matches!(self, Self::X25519)
    }

    /// Single-byte tag used in key ids and light identifiers.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Ed25519 => 0,
            Self::X25519 => 1,
        }
    }

    /// Inverse of [`KeyScheme::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Ed25519),
            1 => Some(Self::X25519),
            _ => None,
        }
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ed25519"),
            Self::X25519 => write!(f, "x25519"),
        }
    }
}

fn decode_key(encoded: &str, uri: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], CoreError> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CoreError::InvalidDid(format!("invalid base58 key in {}: {}", uri, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        CoreError::InvalidDid(format!(
            "key in {} must be {} bytes, got {}",
            uri,
            PUBLIC_KEY_LENGTH,
            b.len()
        ))
    })
}

/// Ledger-anchored identifier: `did:tessera:<base58 authentication key>`.
///
/// The ledger indexes DID state by the authentication key, so the
/// identifier can be recomputed from the key alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullIdentifier {
    uri: String,
    authentication_key: [u8; PUBLIC_KEY_LENGTH],
}

impl FullIdentifier {
    /// Derive the full identifier for an authentication public key.
    pub fn from_authentication_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        let encoded = bs58::encode(public_key).into_string();
        Self {
            uri: format!("{}{}", DID_PREFIX, encoded),
            authentication_key: *public_key,
        }
    }

    /// Full URI string.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Authentication key the identifier was derived from.
    pub fn authentication_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.authentication_key
    }

    fn parse(uri: &str) -> Result<Self, CoreError> {
        let rest = uri
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| CoreError::InvalidDid(format!("missing '{}' prefix: {}", DID_PREFIX, uri)))?;
        if rest.is_empty() || rest.contains(':') {
            return Err(CoreError::InvalidDid(format!(
                "full DID must have format '{}<key>', got: {}",
                DID_PREFIX, uri
            )));
        }
        let key = decode_key(rest, uri)?;
        Ok(Self::from_authentication_key(&key))
    }
}

impl fmt::Display for FullIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Self-certifying identifier:
/// `did:tessera:light:<scheme tag><base58 authentication key>[:z<base58 details>]`.
///
/// The optional details segment carries the remaining document content
/// (key agreement key, services) so the document can be rebuilt without
/// any lookup. Interpreting the details is left to the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LightIdentifier {
    uri: String,
    authentication_scheme: KeyScheme,
    authentication_key: [u8; PUBLIC_KEY_LENGTH],
    details: Option<Vec<u8>>,
}

impl LightIdentifier {
    /// Encode a light identifier from its parts.
    ///
    /// Empty details are omitted from the URI.
    pub fn new(
        authentication_scheme: KeyScheme,
        authentication_key: &[u8; PUBLIC_KEY_LENGTH],
        details: Option<Vec<u8>>,
    ) -> Result<Self, CoreError> {
        if !authentication_scheme.is_signature() {
            return Err(CoreError::InvalidDid(format!(
                "light DID authentication key must use a signature scheme, got {}",
                authentication_scheme
            )));
        }
        let details = details.filter(|d| !d.is_empty());
        let mut uri = format!(
            "{}{}:{}{}",
            DID_PREFIX,
            LIGHT_SEGMENT,
            authentication_scheme.tag(),
            bs58::encode(authentication_key).into_string()
        );
        if let Some(ref bytes) = details {
            uri.push(':');
            uri.push(DETAILS_MARKER);
            uri.push_str(&bs58::encode(bytes).into_string());
        }
        Ok(Self {
            uri,
            authentication_scheme,
            authentication_key: *authentication_key,
            details,
        })
    }

    /// Full URI string.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn authentication_scheme(&self) -> KeyScheme {
        self.authentication_scheme
    }

    pub fn authentication_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.authentication_key
    }

    /// Raw encoded details, if the identifier carries any.
    pub fn details(&self) -> Option<&[u8]> {
        self.details.as_deref()
    }

    /// The full identifier this light identifier becomes once its
    /// authentication key is registered on the ledger.
    pub fn full_counterpart(&self) -> FullIdentifier {
        FullIdentifier::from_authentication_key(&self.authentication_key)
    }

    fn parse(uri: &str) -> Result<Self, CoreError> {
        let rest = uri
            .strip_prefix(DID_PREFIX)
            .and_then(|r| r.strip_prefix(LIGHT_SEGMENT))
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(|| CoreError::InvalidDid(format!("not a light DID: {}", uri)))?;

        let mut parts = rest.splitn(2, ':');
        let key_part = parts.next().unwrap_or_default();
        let details_part = parts.next();

        let mut chars = key_part.chars();
        let tag = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| CoreError::InvalidDid(format!("missing key scheme tag: {}", uri)))?;
        let scheme = KeyScheme::from_tag(tag as u8)
            .ok_or_else(|| CoreError::InvalidDid(format!("unknown key scheme tag {}: {}", tag, uri)))?;
        let key = decode_key(chars.as_str(), uri)?;

        let details = match details_part {
            None => None,
            Some(encoded) => {
                let body = encoded.strip_prefix(DETAILS_MARKER).ok_or_else(|| {
                    CoreError::InvalidDid(format!("details must start with '{}': {}", DETAILS_MARKER, uri))
                })?;
                let bytes = bs58::decode(body).into_vec().map_err(|e| {
                    CoreError::InvalidDid(format!("invalid base58 details in {}: {}", uri, e))
                })?;
                Some(bytes)
            }
        };

        let parsed = Self::new(scheme, &key, details)?;
        // Reject non-canonical spellings so one document maps to one URI.
        if parsed.uri != uri {
            return Err(CoreError::InvalidDid(format!("non-canonical light DID: {}", uri)));
        }
        Ok(parsed)
    }
}

impl fmt::Display for LightIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// A Tessera decentralized identifier.
///
/// Light and full identifiers live in distinct namespaces; the only way
/// from one to the other is the registration protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Identifier {
    Light(LightIdentifier),
    Full(FullIdentifier),
}

impl Identifier {
    /// Parse a DID URI into its light or full variant.
    pub fn parse(uri: &str) -> Result<Self, CoreError> {
        let rest = uri.strip_prefix(DID_PREFIX).ok_or_else(|| {
            CoreError::InvalidDid(format!("DID must start with '{}', got: {}", DID_PREFIX, uri))
        })?;
        if rest.starts_with(&format!("{}:", LIGHT_SEGMENT)) {
            LightIdentifier::parse(uri).map(Self::Light)
        } else {
            FullIdentifier::parse(uri).map(Self::Full)
        }
    }

    /// Full URI string.
    pub fn uri(&self) -> &str {
        match self {
            Self::Light(light) => light.uri(),
            Self::Full(full) => full.uri(),
        }
    }

    /// Authentication key encoded in the identifier.
    pub fn authentication_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        match self {
            Self::Light(light) => light.authentication_key(),
            Self::Full(full) => full.authentication_key(),
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, Self::Light(_))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

impl FromStr for Identifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.uri().to_string()
    }
}

impl From<FullIdentifier> for Identifier {
    fn from(full: FullIdentifier) -> Self {
        Self::Full(full)
    }
}

impl From<LightIdentifier> for Identifier {
    fn from(light: LightIdentifier) -> Self {
        Self::Light(light)
    }
}

/// Ledger account that submits and pays for transactions.
///
/// Kept separate from the identifier: the account that submits a
/// registration does not have to be the identity being registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Address of the account controlled by `public_key`.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bs58::encode(public_key).into_string())
    }

    /// Parse a base58 account address.
    pub fn parse(address: &str) -> Result<Self, CoreError> {
        let bytes = bs58::decode(address)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", address, e)))?;
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CoreError::InvalidAddress(format!(
                "{}: expected {} bytes, got {}",
                address,
                PUBLIC_KEY_LENGTH,
                bytes.len()
            )));
        }
        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
