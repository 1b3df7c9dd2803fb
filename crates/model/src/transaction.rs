//! Delegated transactions: a signed payload executed on someone's behalf.

use crate::{
    bytes_hex,
    signature::{hashed_eip712_message, EcdsaSignature, EcdsaSigningScheme, Signature},
    u256_decimal, DomainSeparator,
};
use lazy_static::lazy_static;
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use web3::signing::{self, SecretKeyRef};

lazy_static! {
    static ref TRANSACTION_TYPE_HASH: [u8; 32] = signing::keccak256(
        b"Transaction(uint256 salt,uint256 expirationTimeSeconds,address signer,bytes data)"
    );
}

/// A payload authorized by `signer` for execution by some other party.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(with = "u256_decimal")]
    pub salt: U256,
    pub expiration_time_seconds: u64,
    pub signer: H160,
    #[serde(with = "bytes_hex")]
    pub data: Vec<u8>,
}

impl Transaction {
    /// The domain separated hash that uniquely identifies this transaction.
    pub fn hash(&self, domain_separator: &DomainSeparator) -> H256 {
        H256(hashed_eip712_message(
            domain_separator,
            &self.hash_struct(),
        ))
    }

    /// Signs the hash of this transaction under the given domain.
    pub fn sign(
        &self,
        signing_scheme: EcdsaSigningScheme,
        domain_separator: &DomainSeparator,
        key: SecretKeyRef,
    ) -> Signature {
        let hash = self.hash(domain_separator);
        EcdsaSignature::sign(signing_scheme, &hash.0, key).to_signature(signing_scheme)
    }

    /// The deterministic encoding handed to rich-payload verifiers.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut word = [0u8; 32];
        self.salt.to_big_endian(&mut word);
        bytes.extend_from_slice(&word);
        bytes.extend_from_slice(&self.expiration_time_seconds.to_be_bytes());
        bytes.extend_from_slice(self.signer.as_bytes());
        bytes.extend_from_slice(&u32::try_from(self.data.len()).unwrap().to_be_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }

    fn hash_struct(&self) -> [u8; 32] {
        let mut hash_data = [0u8; 160];
        hash_data[0..32].copy_from_slice(&*TRANSACTION_TYPE_HASH);
        self.salt.to_big_endian(&mut hash_data[32..64]);
        hash_data[88..96].copy_from_slice(&self.expiration_time_seconds.to_be_bytes());
        hash_data[108..128].copy_from_slice(self.signer.as_bytes());
        hash_data[128..160].copy_from_slice(&signing::keccak256(&self.data));
        signing::keccak256(&hash_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_field_affects_the_hash() {
        let domain_separator = DomainSeparator::default();
        let base = Transaction::default();
        let variants = [
            Transaction {
                salt: 1.into(),
                ..base.clone()
            },
            Transaction {
                expiration_time_seconds: 1,
                ..base.clone()
            },
            Transaction {
                signer: H160([1; 20]),
                ..base.clone()
            },
            Transaction {
                data: vec![1],
                ..base.clone()
            },
        ];
        let mut hashes = variants
            .iter()
            .chain([&base])
            .map(|transaction| transaction.hash(&domain_separator))
            .collect::<Vec<_>>();
        let count = hashes.len();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), count);
    }

    #[test]
    fn serialization_round_trip() {
        let transaction = Transaction {
            salt: 3.into(),
            expiration_time_seconds: 1_700_000_000,
            signer: H160([0x11; 20]),
            data: vec![0xde, 0xad],
        };
        let json = json!({
            "salt": "3",
            "expirationTimeSeconds": 1_700_000_000u64,
            "signer": "0x1111111111111111111111111111111111111111",
            "data": "0xdead",
        });
        assert_eq!(json!(transaction), json);
        assert_eq!(
            serde_json::from_value::<Transaction>(json).unwrap(),
            transaction,
        );
    }
}
