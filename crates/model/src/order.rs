//! The order type, its domain-separated hash and signing helpers.

use crate::{
    asset::AssetData,
    signature::{hashed_eip712_message, EcdsaSignature, EcdsaSigningScheme, Signature},
    u256_decimal, DomainSeparator,
};
use lazy_static::lazy_static;
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use web3::signing::{self, SecretKeyRef};

lazy_static! {
    static ref ORDER_TYPE_HASH: [u8; 32] = signing::keccak256(
        b"Order(address maker,address taker,address feeRecipient,address sender,\
          uint256 makerAssetAmount,uint256 takerAssetAmount,uint256 makerFee,\
          uint256 takerFee,uint256 expirationTimeSeconds,uint256 salt,\
          bytes makerAssetData,bytes takerAssetData,bytes makerFeeAssetData,\
          bytes takerFeeAssetData)"
    );
}

/// An off-ledger order as handed to the settlement core.
///
/// The order itself carries no signature; operations that need one take the
/// signature bytes alongside. The zero address in `taker` or `sender` means
/// "unrestricted".
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub maker: H160,
    pub taker: H160,
    pub fee_recipient: H160,
    pub sender: H160,
    #[serde(with = "u256_decimal")]
    pub maker_asset_amount: U256,
    #[serde(with = "u256_decimal")]
    pub taker_asset_amount: U256,
    #[serde(with = "u256_decimal")]
    pub maker_fee: U256,
    #[serde(with = "u256_decimal")]
    pub taker_fee: U256,
    pub expiration_time_seconds: u64,
    #[serde(with = "u256_decimal")]
    pub salt: U256,
    pub maker_asset_data: AssetData,
    pub taker_asset_data: AssetData,
    pub maker_fee_asset_data: AssetData,
    pub taker_fee_asset_data: AssetData,
}

impl Order {
    /// The domain separated hash that uniquely identifies this order.
    ///
    /// Orders with identical fields hash identically, so the maker
    /// distinguishes otherwise equal orders through `salt`.
    pub fn hash(&self, domain_separator: &DomainSeparator) -> H256 {
        H256(hashed_eip712_message(
            domain_separator,
            &self.hash_struct(),
        ))
    }

    /// Signs the hash of this order under the given domain.
    pub fn sign(
        &self,
        signing_scheme: EcdsaSigningScheme,
        domain_separator: &DomainSeparator,
        key: SecretKeyRef,
    ) -> Signature {
        let hash = self.hash(domain_separator);
        EcdsaSignature::sign(signing_scheme, &hash.0, key).to_signature(signing_scheme)
    }

    /// The deterministic encoding of the full order handed to rich-payload
    /// verifiers, which see the complete message instead of only its hash.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut word = [0u8; 32];
        for address in [self.maker, self.taker, self.fee_recipient, self.sender] {
            bytes.extend_from_slice(address.as_bytes());
        }
        for amount in [
            self.maker_asset_amount,
            self.taker_asset_amount,
            self.maker_fee,
            self.taker_fee,
            self.salt,
        ] {
            amount.to_big_endian(&mut word);
            bytes.extend_from_slice(&word);
        }
        bytes.extend_from_slice(&self.expiration_time_seconds.to_be_bytes());
        for asset in [
            &self.maker_asset_data,
            &self.taker_asset_data,
            &self.maker_fee_asset_data,
            &self.taker_fee_asset_data,
        ] {
            let encoded = asset.encode();
            bytes.extend_from_slice(&u32::try_from(encoded.len()).unwrap().to_be_bytes());
            bytes.extend_from_slice(&encoded);
        }
        bytes
    }

    fn hash_struct(&self) -> [u8; 32] {
        let mut hash_data = [0u8; 480];
        hash_data[0..32].copy_from_slice(&*ORDER_TYPE_HASH);
        // Addresses are left padded to 32 bytes.
        hash_data[44..64].copy_from_slice(self.maker.as_bytes());
        hash_data[76..96].copy_from_slice(self.taker.as_bytes());
        hash_data[108..128].copy_from_slice(self.fee_recipient.as_bytes());
        hash_data[140..160].copy_from_slice(self.sender.as_bytes());
        self.maker_asset_amount
            .to_big_endian(&mut hash_data[160..192]);
        self.taker_asset_amount
            .to_big_endian(&mut hash_data[192..224]);
        self.maker_fee.to_big_endian(&mut hash_data[224..256]);
        self.taker_fee.to_big_endian(&mut hash_data[256..288]);
        hash_data[312..320].copy_from_slice(&self.expiration_time_seconds.to_be_bytes());
        self.salt.to_big_endian(&mut hash_data[320..352]);
        hash_data[352..384].copy_from_slice(&signing::keccak256(&self.maker_asset_data.encode()));
        hash_data[384..416].copy_from_slice(&signing::keccak256(&self.taker_asset_data.encode()));
        hash_data[416..448]
            .copy_from_slice(&signing::keccak256(&self.maker_fee_asset_data.encode()));
        hash_data[448..480]
            .copy_from_slice(&signing::keccak256(&self.taker_fee_asset_data.encode()));
        signing::keccak256(&hash_data)
    }
}

/// Builds orders for testing and examples.
#[derive(Clone, Debug, Default)]
pub struct OrderBuilder(Order);

impl OrderBuilder {
    pub fn new() -> Self {
        Self(Order {
            expiration_time_seconds: u64::MAX,
            ..Default::default()
        })
    }

    pub fn with_maker(mut self, maker: H160) -> Self {
        self.0.maker = maker;
        self
    }

    pub fn with_taker(mut self, taker: H160) -> Self {
        self.0.taker = taker;
        self
    }

    pub fn with_fee_recipient(mut self, fee_recipient: H160) -> Self {
        self.0.fee_recipient = fee_recipient;
        self
    }

    pub fn with_sender(mut self, sender: H160) -> Self {
        self.0.sender = sender;
        self
    }

    pub fn with_maker_asset_amount(mut self, amount: U256) -> Self {
        self.0.maker_asset_amount = amount;
        self
    }

    pub fn with_taker_asset_amount(mut self, amount: U256) -> Self {
        self.0.taker_asset_amount = amount;
        self
    }

    pub fn with_maker_fee(mut self, fee: U256) -> Self {
        self.0.maker_fee = fee;
        self
    }

    pub fn with_taker_fee(mut self, fee: U256) -> Self {
        self.0.taker_fee = fee;
        self
    }

    pub fn with_expiration_time_seconds(mut self, timestamp: u64) -> Self {
        self.0.expiration_time_seconds = timestamp;
        self
    }

    pub fn with_salt(mut self, salt: U256) -> Self {
        self.0.salt = salt;
        self
    }

    pub fn with_maker_asset_data(mut self, asset: AssetData) -> Self {
        self.0.maker_asset_data = asset;
        self
    }

    pub fn with_taker_asset_data(mut self, asset: AssetData) -> Self {
        self.0.taker_asset_data = asset;
        self
    }

    pub fn with_maker_fee_asset_data(mut self, asset: AssetData) -> Self {
        self.0.maker_fee_asset_data = asset;
        self
    }

    pub fn with_taker_fee_asset_data(mut self, asset: AssetData) -> Self {
        self.0.taker_fee_asset_data = asset;
        self
    }

    pub fn build(self) -> Order {
        self.0
    }
}
