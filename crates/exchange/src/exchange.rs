//! The shared bookkeeping container behind every entry point.

use crate::{
    events::Event,
    signatures::{RichVerifier, ValidatorVerifier, WalletVerifier},
    transfer::AssetTransfers,
};
use model::DomainSeparator;
use primitive_types::{H160, H256, U256};
use std::collections::{HashMap, HashSet};

/// The settlement core state.
///
/// One instance corresponds to one settlement domain: all hashes are
/// computed under its [`DomainSeparator`], so the same order terms submitted
/// to a different instance key different bookkeeping entries.
///
/// The surrounding ledger totally orders calls, so the core is plain
/// `&mut self` state with no internal locking. Each table has exactly one
/// writer: the fill engine for `filled`, cancellation for `cancelled` and
/// `order_epoch`, and signers themselves for `approved_validators` and
/// `presigned`.
pub struct Exchange {
    pub(crate) domain_separator: DomainSeparator,
    /// Taker asset units filled so far, keyed by order hash. Monotonically
    /// non-decreasing and capped by the order's taker asset amount, except
    /// transiently inside a fill that is being rolled back.
    pub(crate) filled: HashMap<H256, U256>,
    /// Individually cancelled order hashes. Write-once.
    pub(crate) cancelled: HashSet<H256>,
    /// Bulk cancellation epoch per (maker, sender) pair. Orders whose salt
    /// is at most the epoch are cancelled without a per-order write.
    pub(crate) order_epoch: HashMap<(H160, H160), U256>,
    /// (signer, validator) pairs the signer has approved for delegated
    /// verification.
    pub(crate) approved_validators: HashSet<(H160, H160)>,
    /// (signer, hash) pairs marked valid without a cryptographic signature.
    pub(crate) presigned: HashSet<(H160, H256)>,
    pub(crate) events: Vec<Event>,
    pub(crate) transfers: Box<dyn AssetTransfers>,
    pub(crate) wallet_verifier: Option<Box<dyn WalletVerifier>>,
    pub(crate) validator_verifier: Option<Box<dyn ValidatorVerifier>>,
    pub(crate) rich_verifier: Option<Box<dyn RichVerifier>>,
}

impl Exchange {
    pub fn new(domain_separator: DomainSeparator, transfers: Box<dyn AssetTransfers>) -> Self {
        Self {
            domain_separator,
            filled: Default::default(),
            cancelled: Default::default(),
            order_epoch: Default::default(),
            approved_validators: Default::default(),
            presigned: Default::default(),
            events: Default::default(),
            transfers,
            wallet_verifier: None,
            validator_verifier: None,
            rich_verifier: None,
        }
    }

    pub fn with_wallet_verifier(mut self, verifier: Box<dyn WalletVerifier>) -> Self {
        self.wallet_verifier = Some(verifier);
        self
    }

    pub fn with_validator_verifier(mut self, verifier: Box<dyn ValidatorVerifier>) -> Self {
        self.validator_verifier = Some(verifier);
        self
    }

    pub fn with_rich_verifier(mut self, verifier: Box<dyn RichVerifier>) -> Self {
        self.rich_verifier = Some(verifier);
        self
    }

    pub fn domain_separator(&self) -> &DomainSeparator {
        &self.domain_separator
    }

    /// The append-only notification log, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Taker asset units filled so far for the order hash, zero if never
    /// touched.
    pub fn filled_amount(&self, hash: H256) -> U256 {
        self.filled.get(&hash).copied().unwrap_or_default()
    }
}
