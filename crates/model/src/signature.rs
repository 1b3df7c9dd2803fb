//! Signature wire format and ECDSA recovery.
//!
//! A signature is a variable-length byte string whose final byte selects the
//! scheme; the leading bytes are the scheme-specific payload. Validity of the
//! delegated schemes (`Wallet`, `Validator`, `Eip1271Wallet`, `PreSigned`) is
//! decided by the settlement core, which owns the registries and verifier
//! capabilities; this module only encodes, decodes and recovers.

use crate::DomainSeparator;
use anyhow::{Context as _, Result};
use primitive_types::{H160, H256};
use serde::{de, Deserialize, Serialize};
use std::fmt;
use strum::AsRefStr;
use thiserror::Error;
use web3::{
    signing::{self, Key, SecretKeyRef},
    types::Recovery,
};

/// The scheme tag carried in the final byte of every signature.
#[derive(AsRefStr, Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SignatureScheme {
    /// Reserved tag that must never be used; catches zero-initialized input.
    Illegal = 0x00,
    /// An explicit "never valid" placeholder.
    Invalid = 0x01,
    /// Recoverable ECDSA signature over the raw order hash.
    Eip712 = 0x02,
    /// Recoverable ECDSA signature over the prefixed order hash, for wallets
    /// that always apply the textual message prefix before signing.
    EthSign = 0x03,
    /// The signer is itself a verifier capability queried with the hash.
    Wallet = 0x04,
    /// A third-party verifier pre-approved by the signer.
    Validator = 0x05,
    /// No cryptographic payload; valid iff the hash was pre-signed on ledger.
    PreSigned = 0x06,
    /// The signer is a verifier capability queried with the full structured
    /// message bytes rather than just the hash.
    Eip1271Wallet = 0x07,
}

impl SignatureScheme {
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::Illegal),
            0x01 => Some(Self::Invalid),
            0x02 => Some(Self::Eip712),
            0x03 => Some(Self::EthSign),
            0x04 => Some(Self::Wallet),
            0x05 => Some(Self::Validator),
            0x06 => Some(Self::PreSigned),
            0x07 => Some(Self::Eip1271Wallet),
            _ => None,
        }
    }
}

/// A decoded signature.
#[derive(Clone, Eq, Hash, PartialEq)]
pub enum Signature {
    Illegal,
    Invalid,
    Eip712(EcdsaSignature),
    EthSign(EcdsaSignature),
    Wallet(Vec<u8>),
    Validator { validator: H160, signature: Vec<u8> },
    PreSigned,
    Eip1271Wallet(Vec<u8>),
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SignatureDecodeError {
    #[error("signature bytes are empty")]
    Empty,
    #[error("signature of length {length} is malformed for scheme {scheme:?}")]
    InvalidLength {
        scheme: SignatureScheme,
        length: usize,
    },
    #[error("unsupported signature scheme tag {0:#04x}")]
    UnsupportedScheme(u8),
}

impl Signature {
    /// Decodes the wire format: scheme-specific payload followed by the tag
    /// byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureDecodeError> {
        let (&tag, payload) = bytes.split_last().ok_or(SignatureDecodeError::Empty)?;
        let scheme =
            SignatureScheme::from_tag(tag).ok_or(SignatureDecodeError::UnsupportedScheme(tag))?;
        let invalid_length = || SignatureDecodeError::InvalidLength {
            scheme,
            length: bytes.len(),
        };
        Ok(match scheme {
            SignatureScheme::Illegal => match payload.is_empty() {
                true => Self::Illegal,
                false => return Err(invalid_length()),
            },
            SignatureScheme::Invalid => match payload.is_empty() {
                true => Self::Invalid,
                false => return Err(invalid_length()),
            },
            scheme @ (SignatureScheme::Eip712 | SignatureScheme::EthSign) => {
                let bytes: &[u8; 65] = payload.try_into().map_err(|_| invalid_length())?;
                EcdsaSignature::from_bytes(bytes).to_signature(
                    scheme
                        .try_to_ecdsa_scheme()
                        .expect("scheme is an ecdsa scheme"),
                )
            }
            SignatureScheme::Wallet => Self::Wallet(payload.to_vec()),
            SignatureScheme::Validator => {
                if payload.len() < 20 {
                    return Err(invalid_length());
                }
                Self::Validator {
                    validator: H160::from_slice(&payload[..20]),
                    signature: payload[20..].to_vec(),
                }
            }
            SignatureScheme::PreSigned => match payload.is_empty() {
                true => Self::PreSigned,
                false => return Err(invalid_length()),
            },
            SignatureScheme::Eip1271Wallet => Self::Eip1271Wallet(payload.to_vec()),
        })
    }

    /// Payload followed by the scheme tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = match self {
            Self::Illegal | Self::Invalid | Self::PreSigned => Vec::with_capacity(1),
            Self::Eip712(signature) | Self::EthSign(signature) => signature.to_bytes().to_vec(),
            Self::Wallet(payload) | Self::Eip1271Wallet(payload) => payload.clone(),
            Self::Validator {
                validator,
                signature,
            } => [validator.as_bytes(), signature].concat(),
        };
        bytes.push(self.scheme().tag());
        bytes
    }

    pub fn scheme(&self) -> SignatureScheme {
        match self {
            Self::Illegal => SignatureScheme::Illegal,
            Self::Invalid => SignatureScheme::Invalid,
            Self::Eip712(_) => SignatureScheme::Eip712,
            Self::EthSign(_) => SignatureScheme::EthSign,
            Self::Wallet(_) => SignatureScheme::Wallet,
            Self::Validator { .. } => SignatureScheme::Validator,
            Self::PreSigned => SignatureScheme::PreSigned,
            Self::Eip1271Wallet(_) => SignatureScheme::Eip1271Wallet,
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scheme = format!("{:?}", self.scheme());
        let bytes = format!("0x{}", hex::encode(self.to_bytes()));
        f.debug_tuple(&scheme).field(&bytes).finish()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EcdsaSigningScheme {
    Eip712,
    EthSign,
}

impl From<EcdsaSigningScheme> for SignatureScheme {
    fn from(scheme: EcdsaSigningScheme) -> Self {
        match scheme {
            EcdsaSigningScheme::Eip712 => Self::Eip712,
            EcdsaSigningScheme::EthSign => Self::EthSign,
        }
    }
}

impl SignatureScheme {
    pub fn try_to_ecdsa_scheme(&self) -> Option<EcdsaSigningScheme> {
        match self {
            Self::Eip712 => Some(EcdsaSigningScheme::Eip712),
            Self::EthSign => Some(EcdsaSigningScheme::EthSign),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct EcdsaSignature {
    pub r: H256,
    pub s: H256,
    pub v: u8,
}

/// The hash of the EIP-712 encoded message: `\x19\x01 || domain || struct_hash`.
pub fn hashed_eip712_message(
    domain_separator: &DomainSeparator,
    struct_hash: &[u8; 32],
) -> [u8; 32] {
    let mut message = [0u8; 66];
    message[0..2].copy_from_slice(&[0x19, 0x01]);
    message[2..34].copy_from_slice(&domain_separator.0);
    message[34..66].copy_from_slice(struct_hash);
    signing::keccak256(&message)
}

/// Returns the message used for signing and recovery for the specified order
/// or transaction hash.
///
/// The signing message depends on the signature scheme that was used.
fn signing_message(signing_scheme: EcdsaSigningScheme, hash: &[u8; 32]) -> [u8; 32] {
    match signing_scheme {
        EcdsaSigningScheme::Eip712 => *hash,
        EcdsaSigningScheme::EthSign => {
            let mut buffer = [0u8; 60];
            buffer[..28].copy_from_slice(b"\x19Ethereum Signed Message:\n32");
            buffer[28..].copy_from_slice(hash);
            signing::keccak256(&buffer)
        }
    }
}

impl EcdsaSignature {
    pub fn to_signature(self, scheme: EcdsaSigningScheme) -> Signature {
        match scheme {
            EcdsaSigningScheme::Eip712 => Signature::Eip712(self),
            EcdsaSigningScheme::EthSign => Signature::EthSign(self),
        }
    }

    /// r + s + v
    pub fn to_bytes(self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_bytes());
        bytes[32..64].copy_from_slice(self.s.as_bytes());
        bytes[64] = self.v;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        EcdsaSignature {
            r: H256::from_slice(&bytes[..32]),
            s: H256::from_slice(&bytes[32..64]),
            v: bytes[64],
        }
    }

    pub fn recover(&self, signing_scheme: EcdsaSigningScheme, hash: &[u8; 32]) -> Result<H160> {
        let message = signing_message(signing_scheme, hash);
        let recovery = Recovery::new(message, self.v as u64, self.r, self.s);
        let (signature, recovery_id) = recovery
            .as_signature()
            .context("unexpectedly invalid signature")?;
        Ok(signing::recover(&message, &signature, recovery_id)?)
    }

    pub fn sign(signing_scheme: EcdsaSigningScheme, hash: &[u8; 32], key: SecretKeyRef) -> Self {
        let message = signing_message(signing_scheme, hash);
        // Unwrap because the only error is for invalid messages which we don't create.
        let signature = key.sign(&message, None).unwrap();
        Self {
            v: signature.v as u8,
            r: signature.r,
            s: signature.s,
        }
    }

    /// Returns an arbitrary non-zero signature that can be used for recovery
    /// when you don't actually care about the owner.
    pub fn non_zero() -> Self {
        Self {
            r: H256([1; 32]),
            s: H256([2; 32]),
            v: 27,
        }
    }
}

impl Serialize for EcdsaSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut bytes = [0u8; 2 + 65 * 2];
        bytes[..2].copy_from_slice(b"0x");
        // Can only fail if the buffer size does not match but we know it is correct.
        hex::encode_to_slice(self.to_bytes(), &mut bytes[2..]).unwrap();
        // Hex encoding is always valid utf8.
        let str = std::str::from_utf8(&bytes).unwrap();
        serializer.serialize_str(str)
    }
}

impl<'de> Deserialize<'de> for EcdsaSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor {}
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = EcdsaSignature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "the 65 ecdsa signature bytes as a hex encoded string, ordered as r, s, v, \
                     where v is either 27 or 28"
                )
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let s = s.strip_prefix("0x").ok_or_else(|| {
                    de::Error::custom(format!(
                        "{s:?} can't be decoded as hex ecdsa signature because it does not start \
                         with '0x'"
                    ))
                })?;
                let mut bytes = [0u8; 65];
                hex::decode_to_slice(s, &mut bytes).map_err(|err| {
                    de::Error::custom(format!(
                        "failed to decode {s:?} as hex ecdsa signature: {err}"
                    ))
                })?;
                Ok(EcdsaSignature::from_bytes(&bytes))
            }
        }

        deserializer.deserialize_str(Visitor {})
    }
}
