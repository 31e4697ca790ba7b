//! # Multibase / Multicodec Key Codec
//!
//! Ed25519 key material travels as a single text token: a two-byte
//! multicodec header, the 32 raw key bytes, base58btc-encoded and prefixed
//! with the multibase tag `z`.
//!
//! | Kind    | Header   |
//! |---------|----------|
//! | public  | `0xED01` |
//! | private | `0x8026` |
//!
//! Signatures use the same multibase rule without a header: `z` followed by
//! the base58btc encoding of the raw 64 signature bytes.
//!
//! Output is byte-identical across implementations: Bitcoin base58
//! alphabet, no whitespace.

use crate::error::CryptoError;

/// Multibase prefix for base58btc.
pub const MULTIBASE_BASE58BTC: char = 'z';

/// Multicodec header for an Ed25519 public key.
pub const ED25519_PUB_HEADER: [u8; 2] = [0xed, 0x01];

/// Multicodec header for an Ed25519 private key seed.
pub const ED25519_PRIV_HEADER: [u8; 2] = [0x80, 0x26];

/// Which half of a keypair a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// 32-byte public key.
    Public,
    /// 32-byte private seed.
    Private,
}

impl KeyKind {
    /// The multicodec header for this kind.
    pub fn header(&self) -> [u8; 2] {
        match self {
            Self::Public => ED25519_PUB_HEADER,
            Self::Private => ED25519_PRIV_HEADER,
        }
    }

    fn from_header(header: &[u8]) -> Option<Self> {
        match header {
            [0xed, 0x01] => Some(Self::Public),
            [0x80, 0x26] => Some(Self::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private => f.write_str("private"),
        }
    }
}

/// Encode a raw key as a multibase token.
pub fn encode(kind: KeyKind, raw: &[u8; 32]) -> String {
    let mut bytes = Vec::with_capacity(34);
    bytes.extend_from_slice(&kind.header());
    bytes.extend_from_slice(raw);
    format!("{MULTIBASE_BASE58BTC}{}", bs58::encode(bytes).into_string())
}

/// Decode a multibase token expected to carry a key of `kind`.
///
/// # Errors
///
/// - `UnsupportedEncoding` if the token does not start with `z` or is not
///   valid base58btc.
/// - `InvalidKeyFormat` if the header does not match `kind` or the key is
///   not 32 bytes.
pub fn decode(kind: KeyKind, token: &str) -> Result<[u8; 32], CryptoError> {
    let (found, raw) = decode_any(token)?;
    if found != kind {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "expected {kind} key header {:02x?}, found {found} key",
            kind.header()
        )));
    }
    Ok(raw)
}

/// Decode a multibase key token, reporting which kind of key it carries.
pub fn decode_any(token: &str) -> Result<(KeyKind, [u8; 32]), CryptoError> {
    let bytes = decode_base58btc(token)?;
    if bytes.len() < 2 {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "decoded key is {} bytes, too short for a multicodec header",
            bytes.len()
        )));
    }
    let kind = KeyKind::from_header(&bytes[..2]).ok_or_else(|| {
        CryptoError::InvalidKeyFormat(format!(
            "unrecognized multicodec header {:02x?}",
            &bytes[..2]
        ))
    })?;
    let raw: [u8; 32] = bytes[2..].try_into().map_err(|_| {
        CryptoError::InvalidKeyFormat(format!(
            "expected 32 key bytes after header, got {}",
            bytes.len() - 2
        ))
    })?;
    Ok((kind, raw))
}

/// Encode raw signature bytes as multibase (no multicodec header).
pub fn encode_signature(signature: &[u8; 64]) -> String {
    format!("{MULTIBASE_BASE58BTC}{}", bs58::encode(signature).into_string())
}

/// Decode a multibase signature.
///
/// # Errors
///
/// `UnsupportedEncoding` for a non-`z` token; `MalformedSignature` if the
/// payload is not exactly 64 bytes.
pub fn decode_signature(token: &str) -> Result<[u8; 64], CryptoError> {
    let bytes = decode_base58btc(token)?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::MalformedSignature(format!("expected 64 signature bytes, got {}", bytes.len()))
    })
}

fn decode_base58btc(token: &str) -> Result<Vec<u8>, CryptoError> {
    let Some(payload) = token.strip_prefix(MULTIBASE_BASE58BTC) else {
        let prefix: String = token.chars().take(1).collect();
        return Err(CryptoError::UnsupportedEncoding(format!(
            "multibase prefix {prefix:?} is not base58btc 'z'"
        )));
    };
    bs58::decode(payload)
        .into_vec()
        .map_err(|e| CryptoError::UnsupportedEncoding(format!("invalid base58btc payload: {e}")))
}
