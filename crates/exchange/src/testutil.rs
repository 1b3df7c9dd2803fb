//! In-memory asset ledger and fixtures shared by the unit tests.

use crate::{
    exchange::Exchange,
    transfer::{AssetTransfers, Transfer, TransferFailure},
};
use anyhow::{anyhow, Result};
use model::{asset::AssetData, DomainSeparator};
use primitive_types::{H160, H256, U256};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};
use web3::signing::keccak256;

pub(crate) fn domain_separator() -> DomainSeparator {
    DomainSeparator::new(1, H160([0xee; 20]))
}

pub(crate) fn exchange() -> Exchange {
    exchange_with(SharedLedger::default())
}

pub(crate) fn exchange_with(ledger: SharedLedger) -> Exchange {
    Exchange::new(domain_separator(), Box::new(ledger))
}

/// A deterministic secp256k1 key and its derived address.
pub(crate) fn keypair(seed: u8) -> (SecretKey, H160) {
    let key = SecretKey::from_slice(&[seed; 32]).unwrap();
    let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), &key);
    let hash = keccak256(&public.serialize_uncompressed()[1..]);
    (key, H160::from_slice(&hash[12..]))
}

/// A naive balance ledger implementing every asset kind.
#[derive(Clone, Default)]
pub(crate) struct TokenLedger {
    balances: HashMap<(H160, H160), U256>,
    nft_owners: HashMap<(H160, U256), H160>,
    bridge_surplus: U256,
    call_results: HashMap<(H160, Vec<u8>), H256>,
    failing_tokens: HashSet<H160>,
}

impl TokenLedger {
    fn transfer(&mut self, asset: &AssetData, from: H160, to: H160, amount: U256) -> Result<()> {
        match asset {
            AssetData::Erc20 { token } => {
                if self.failing_tokens.contains(token) {
                    return Err(anyhow!("token {token:?} rejects transfers"));
                }
                let debited = self
                    .balances
                    .get(&(*token, from))
                    .copied()
                    .unwrap_or_default()
                    .checked_sub(amount)
                    .ok_or_else(|| anyhow!("insufficient balance of {token:?}"))?;
                // Apply the debit before reading the credit side so a
                // self-transfer nets to zero.
                self.balances.insert((*token, from), debited);
                let credited = self
                    .balances
                    .get(&(*token, to))
                    .copied()
                    .unwrap_or_default()
                    .checked_add(amount)
                    .ok_or_else(|| anyhow!("balance overflow"))?;
                self.balances.insert((*token, to), credited);
                Ok(())
            }
            AssetData::Erc721 { token, token_id } => {
                if amount != U256::one() {
                    return Err(anyhow!(
                        "erc721 transfer amount must be exactly 1, got {amount}"
                    ));
                }
                match self.nft_owners.get(&(*token, *token_id)) {
                    Some(owner) if *owner == from => {
                        self.nft_owners.insert((*token, *token_id), to);
                        Ok(())
                    }
                    _ => Err(anyhow!("{from:?} does not own token {token_id} of {token:?}")),
                }
            }
            AssetData::MultiAsset { amounts, nested } => {
                if amounts.len() != nested.len() {
                    return Err(anyhow!("multi asset amounts and elements differ in length"));
                }
                for (unit, sub) in amounts.iter().zip(nested) {
                    let scaled = unit
                        .checked_mul(amount)
                        .ok_or_else(|| anyhow!("multi asset amount overflow"))?;
                    self.transfer(sub, from, to, scaled)?;
                }
                Ok(())
            }
            AssetData::Erc20Bridge { token, .. } => {
                // External liquidity: the receiver is credited at least the
                // requested amount, surplus included.
                let delivered = amount
                    .checked_add(self.bridge_surplus)
                    .ok_or_else(|| anyhow!("bridge amount overflow"))?;
                let credit = self.balances.entry((*token, to)).or_default();
                *credit = credit
                    .checked_add(delivered)
                    .ok_or_else(|| anyhow!("balance overflow"))?;
                Ok(())
            }
            AssetData::StaticCall {
                target,
                data,
                expected_return,
            } => match self.call_results.get(&(*target, data.clone())) {
                Some(result) if result == expected_return => Ok(()),
                _ => Err(anyhow!(
                    "static call to {target:?} did not return the expected value"
                )),
            },
        }
    }
}

/// Handle to a [`TokenLedger`] that stays inspectable after being boxed into
/// an [`Exchange`].
#[derive(Clone, Default)]
pub(crate) struct SharedLedger(Rc<RefCell<TokenLedger>>);

impl SharedLedger {
    pub fn fund(&self, token: H160, holder: H160, amount: U256) {
        self.0.borrow_mut().balances.insert((token, holder), amount);
    }

    pub fn balance(&self, token: H160, holder: H160) -> U256 {
        self.0
            .borrow()
            .balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn give_nft(&self, token: H160, token_id: U256, owner: H160) {
        self.0.borrow_mut().nft_owners.insert((token, token_id), owner);
    }

    pub fn nft_owner(&self, token: H160, token_id: U256) -> Option<H160> {
        self.0.borrow().nft_owners.get(&(token, token_id)).copied()
    }

    pub fn fail_token(&self, token: H160) {
        self.0.borrow_mut().failing_tokens.insert(token);
    }

    pub fn set_bridge_surplus(&self, surplus: U256) {
        self.0.borrow_mut().bridge_surplus = surplus;
    }

    pub fn expect_call(&self, target: H160, data: Vec<u8>, result: H256) {
        self.0.borrow_mut().call_results.insert((target, data), result);
    }
}

impl AssetTransfers for SharedLedger {
    fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<(), TransferFailure> {
        let mut ledger = self.0.borrow_mut();
        // Apply onto a snapshot so a refusal anywhere in the batch leaves
        // the observable ledger untouched.
        let snapshot = ledger.clone();
        for transfer in transfers {
            if let Err(cause) =
                ledger.transfer(&transfer.asset, transfer.from, transfer.to, transfer.amount)
            {
                *ledger = snapshot;
                return Err(TransferFailure::new(transfer.clone(), cause));
            }
        }
        Ok(())
    }
}
