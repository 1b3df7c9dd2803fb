//! Error taxonomy of the settlement core.
//!
//! Four categories with distinct caller semantics:
//! - [`ValidationError`]: malformed input, never worth retrying as-is.
//! - [`StateError`]: the operation raced stale state; refresh and resubmit.
//! - [`AuthorizationError`]: the signature or approval was rejected.
//! - [`TransferError`]: asset movement failed; the whole fill was rolled
//!   back and nothing is observable.
//!
//! Every variant carries the hash, address or bytes needed to diagnose the
//! rejection without replaying the call.

use crate::{signatures::VerifierCallError, status::OrderStatus};
use model::{asset::AssetData, signature::SignatureScheme};
use primitive_types::{H160, H256, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Malformed input: bad signature layout, reserved scheme, null signer, or a
/// caller the order does not admit.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature 0x{} for hash {hash:?} and signer {signer:?} has invalid length", hex::encode(signature))]
    InvalidLength {
        hash: H256,
        signer: H160,
        signature: Vec<u8>,
    },
    #[error("signature for hash {hash:?} and signer {signer:?} uses the reserved illegal scheme")]
    IllegalScheme { hash: H256, signer: H160 },
    #[error("signature for hash {hash:?} and signer {signer:?} has unsupported scheme tag {tag:#04x}")]
    UnsupportedScheme { hash: H256, signer: H160, tag: u8 },
    #[error("scheme {scheme:?} requires full message context and cannot verify hash {hash:?} alone")]
    InappropriateSignatureType { hash: H256, scheme: SignatureScheme },
    #[error("signer for hash {hash:?} is the zero address")]
    InvalidSigner { hash: H256 },
    #[error("caller {caller:?} is not the maker {maker:?}")]
    InvalidMakerContext { caller: H160, maker: H160 },
    #[error("caller {caller:?} is not the designated taker {taker:?}")]
    InvalidTakerContext { caller: H160, taker: H160 },
    #[error("caller {caller:?} is not the designated sender {sender:?}")]
    InvalidSenderContext { caller: H160, sender: H160 },
}

/// The operation does not apply to the order's current derived state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("order {hash:?} has status {status:?}")]
    OrderStatus { hash: H256, status: OrderStatus },
    #[error("new epoch for maker {maker:?} and sender {sender:?} must be at least {min_epoch}")]
    OrderEpoch {
        maker: H160,
        sender: H160,
        min_epoch: U256,
    },
    #[error("order {hash:?} can only fill {taker_asset_filled_amount} more taker units")]
    IncompleteFill {
        hash: H256,
        taker_asset_filled_amount: U256,
    },
}

/// The signature or delegation check came back negative.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("signature for order {hash:?} does not authorize maker {signer:?}")]
    BadOrderSignature { hash: H256, signer: H160 },
    #[error("validator {validator:?} is not approved by signer {signer:?}")]
    ValidatorNotApproved { signer: H160, validator: H160 },
    #[error("wallet {wallet:?} failed to verify hash {hash:?}")]
    WalletError {
        hash: H256,
        wallet: H160,
        #[source]
        source: VerifierCallError,
    },
    #[error("validator {validator:?} failed to verify hash {hash:?}")]
    ValidatorError {
        hash: H256,
        validator: H160,
        #[source]
        source: VerifierCallError,
    },
}

/// An asset movement was rejected mid-fill. The fill engine has already
/// rolled its bookkeeping back when this surfaces, and the transfer
/// capability applied none of the staged batch.
#[derive(Debug, Error)]
#[error("transfer of {amount} units of {asset} from {from:?} to {to:?} for order {hash:?} failed")]
pub struct TransferError {
    pub hash: H256,
    pub asset: AssetData,
    pub from: H160,
    pub to: H160,
    pub amount: U256,
    #[source]
    pub source: anyhow::Error,
}

/// Proportional fill math could not produce a safe result.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MathError {
    #[error("{numerator} * {target} overflows")]
    Overflow { numerator: U256, target: U256 },
    #[error("proportional amount denominator is zero")]
    DivisionByZero,
    #[error("flooring {numerator} * {target} / {denominator} loses more than 1/1000")]
    RoundingError {
        numerator: U256,
        denominator: U256,
        target: U256,
    },
}
