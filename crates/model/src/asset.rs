//! Asset descriptors: opaque tagged transfer targets carried inside orders.
//!
//! A descriptor says *what* to move and *how*; the settlement core never
//! interprets it beyond hashing and forwarding it to the transfer capability.

use primitive_types::{H160, H256, U256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const TAG_ERC20: u8 = 0x01;
const TAG_ERC721: u8 = 0x02;
const TAG_MULTI_ASSET: u8 = 0x03;
const TAG_ERC20_BRIDGE: u8 = 0x04;
const TAG_STATIC_CALL: u8 = 0x05;

/// A tagged transfer target.
///
/// Serialized on the wire as the 0x prefixed hex string of [`AssetData::encode`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum AssetData {
    /// A fungible token balance.
    Erc20 { token: H160 },
    /// A single non-fungible token; transfer amounts must be exactly 1.
    Erc721 { token: H160, token_id: U256 },
    /// A bundle of sub-descriptors. Transferring `amount` units moves
    /// `amount * amounts[i]` units of each nested descriptor.
    MultiAsset {
        amounts: Vec<U256>,
        nested: Vec<AssetData>,
    },
    /// Externally-bridged liquidity. The bridge must deliver at least the
    /// requested amount, crediting any surplus to the receiver.
    Erc20Bridge {
        token: H160,
        bridge: H160,
        bridge_data: Vec<u8>,
    },
    /// A conditional check. Moves nothing; the transfer succeeds iff calling
    /// `target` with `data` returns `expected_return`.
    StaticCall {
        target: H160,
        data: Vec<u8>,
        expected_return: H256,
    },
}

impl Default for AssetData {
    fn default() -> Self {
        Self::Erc20 {
            token: H160::zero(),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum AssetDataDecodeError {
    #[error("asset data bytes are empty")]
    Empty,
    #[error("unknown asset data tag {0:#04x}")]
    UnknownTag(u8),
    #[error("asset data bytes end before the encoded fields do")]
    Truncated,
    #[error("asset data has {0} bytes trailing the encoded fields")]
    TrailingBytes(usize),
}

impl AssetData {
    /// Deterministic byte encoding. Hashed into the order hash and handed to
    /// rich-payload verifiers, so it must never change for fixed fields.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        let mut word = [0u8; 32];
        match self {
            Self::Erc20 { token } => {
                buf.push(TAG_ERC20);
                buf.extend_from_slice(token.as_bytes());
            }
            Self::Erc721 { token, token_id } => {
                buf.push(TAG_ERC721);
                buf.extend_from_slice(token.as_bytes());
                token_id.to_big_endian(&mut word);
                buf.extend_from_slice(&word);
            }
            Self::MultiAsset { amounts, nested } => {
                buf.push(TAG_MULTI_ASSET);
                push_len(buf, amounts.len());
                for amount in amounts {
                    amount.to_big_endian(&mut word);
                    buf.extend_from_slice(&word);
                }
                push_len(buf, nested.len());
                for asset in nested {
                    let encoded = asset.encode();
                    push_len(buf, encoded.len());
                    buf.extend_from_slice(&encoded);
                }
            }
            Self::Erc20Bridge {
                token,
                bridge,
                bridge_data,
            } => {
                buf.push(TAG_ERC20_BRIDGE);
                buf.extend_from_slice(token.as_bytes());
                buf.extend_from_slice(bridge.as_bytes());
                push_len(buf, bridge_data.len());
                buf.extend_from_slice(bridge_data);
            }
            Self::StaticCall {
                target,
                data,
                expected_return,
            } => {
                buf.push(TAG_STATIC_CALL);
                buf.extend_from_slice(target.as_bytes());
                push_len(buf, data.len());
                buf.extend_from_slice(data);
                buf.extend_from_slice(expected_return.as_bytes());
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, AssetDataDecodeError> {
        let mut cursor = Cursor { bytes, offset: 0 };
        let asset = cursor.read_asset()?;
        match bytes.len() - cursor.offset {
            0 => Ok(asset),
            trailing => Err(AssetDataDecodeError::TrailingBytes(trailing)),
        }
    }
}

fn push_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&u32::try_from(len).expect("length fits in u32").to_be_bytes());
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Cursor<'_> {
    fn take(&mut self, len: usize) -> Result<&[u8], AssetDataDecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(AssetDataDecodeError::Truncated)?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_address(&mut self) -> Result<H160, AssetDataDecodeError> {
        Ok(H160::from_slice(self.take(20)?))
    }

    fn read_word(&mut self) -> Result<[u8; 32], AssetDataDecodeError> {
        // Unwrap because take() returned exactly 32 bytes.
        Ok(self.take(32)?.try_into().unwrap())
    }

    fn read_len(&mut self) -> Result<usize, AssetDataDecodeError> {
        // Unwrap because take() returned exactly 4 bytes.
        let len: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(u32::from_be_bytes(len) as usize)
    }

    fn read_asset(&mut self) -> Result<AssetData, AssetDataDecodeError> {
        let tag = self.take(1).map_err(|_| AssetDataDecodeError::Empty)?[0];
        match tag {
            TAG_ERC20 => Ok(AssetData::Erc20 {
                token: self.read_address()?,
            }),
            TAG_ERC721 => Ok(AssetData::Erc721 {
                token: self.read_address()?,
                token_id: U256::from_big_endian(&self.read_word()?),
            }),
            TAG_MULTI_ASSET => {
                let amount_count = self.read_len()?;
                let mut amounts = Vec::with_capacity(amount_count.min(32));
                for _ in 0..amount_count {
                    amounts.push(U256::from_big_endian(&self.read_word()?));
                }
                let nested_count = self.read_len()?;
                let mut nested = Vec::with_capacity(nested_count.min(32));
                for _ in 0..nested_count {
                    let len = self.read_len()?;
                    nested.push(AssetData::decode(self.take(len)?)?);
                }
                Ok(AssetData::MultiAsset { amounts, nested })
            }
            TAG_ERC20_BRIDGE => Ok(AssetData::Erc20Bridge {
                token: self.read_address()?,
                bridge: self.read_address()?,
                bridge_data: {
                    let len = self.read_len()?;
                    self.take(len)?.to_vec()
                },
            }),
            TAG_STATIC_CALL => Ok(AssetData::StaticCall {
                target: self.read_address()?,
                data: {
                    let len = self.read_len()?;
                    self.take(len)?.to_vec()
                },
                expected_return: H256::from_slice(&self.read_word()?),
            }),
            unknown => Err(AssetDataDecodeError::UnknownTag(unknown)),
        }
    }
}

impl Serialize for AssetData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        crate::bytes_hex::serialize(&self.encode(), serializer)
    }
}

impl<'de> Deserialize<'de> for AssetData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = crate::bytes_hex::deserialize(deserializer)?;
        AssetData::decode(&bytes)
            .map_err(|err| de::Error::custom(format!("invalid asset data: {err}")))
    }
}

impl fmt::Display for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.encode()))
    }
}
